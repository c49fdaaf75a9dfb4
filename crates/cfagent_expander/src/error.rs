// SPDX-License-Identifier: Apache-2.0

//! Errors the promise expander can produce: pre-eval type mismatches and
//! non-convergence warnings.

use cfagent_common::error::AgentError;

/// A problem found while expanding or pre-eval-rechecking one promise.
#[derive(Debug, Clone, thiserror::Error, miette::Diagnostic)]
pub enum ExpanderError {
    /// A constraint's expanded right-value no longer matches its declared
    /// data type.
    #[error("attribute {lval:?} expects a {expected}, found a {found} after expansion")]
    ConstraintTypeMismatch {
        lval: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Two `insert_lines` promises in the same bundle share a
    /// `select_line_matching` anchor, which is a contradiction between the two promises
    /// (non-convergent: whichever runs second finds its anchor already claimed).
    #[error("select_line_matching anchor {anchor:?} is used by more than one insert_lines promise in this bundle")]
    #[diagnostic(severity(warning))]
    ReusedInsertAnchor { anchor: String },

    /// Several non-fatal expander errors folded into one.
    #[error("{} promise expansion errors", .0.len())]
    Compound(Vec<ExpanderError>),
}

impl AgentError for ExpanderError {
    fn compound(errors: Vec<Self>) -> Self {
        ExpanderError::Compound(errors)
    }
}
