// SPDX-License-Identifier: Apache-2.0

//! Validation errors, one variant per pass in.

use cfagent_common::error::AgentError;
use cfagent_common::loc::SourceLoc;

/// One validation failure, carrying enough context to render as
/// `file:line:col: error: msg` via [`cfagent_common::diagnostic::DiagnosticMessage`].
#[derive(Debug, thiserror::Error, miette::Diagnostic, serde::Serialize)]
pub enum ValidationError {
    #[error("{loc}: bundle name '{name}' is reserved")]
    ReservedBundleName { name: String, loc: SourceLoc },

    #[error("{loc}: duplicate bundle '{namespace}:{bundle_type}.{name}', first defined at {first_loc}")]
    DuplicateBundle {
        namespace: String,
        bundle_type: String,
        name: String,
        loc: SourceLoc,
        first_loc: SourceLoc,
    },

    #[error("{loc}: duplicate body '{namespace}:{body_type}.{name}', first defined at {first_loc}")]
    DuplicateBody {
        namespace: String,
        body_type: String,
        name: String,
        loc: SourceLoc,
        first_loc: SourceLoc,
    },

    #[error("{loc}: unknown attribute '{lval}' for promise type '{promise_type}'")]
    UnknownAttribute {
        promise_type: String,
        lval: String,
        loc: SourceLoc,
    },

    #[error("{loc}: attribute '{lval}' on promise type '{promise_type}' has the wrong value kind")]
    AttributeTypeMismatch {
        promise_type: String,
        lval: String,
        loc: SourceLoc,
    },

    #[error("{loc}: '{lval}' references undefined body '{body_type}.{name}'")]
    UndefinedBodyReference {
        lval: String,
        body_type: String,
        name: String,
        loc: SourceLoc,
    },

    #[error("{loc}: promise is missing a required 'comment' attribute")]
    MissingRequiredComment { loc: SourceLoc },

    #[error("{loc}: duplicate handle '{handle}', first used at {first_loc}")]
    DuplicateHandle {
        handle: String,
        loc: SourceLoc,
        first_loc: SourceLoc,
    },

    #[error("{loc}: attribute '{lval}' is forbidden on custom promise type '{promise_type}'")]
    ForbiddenCustomPromiseTypeAttribute {
        promise_type: String,
        lval: String,
        loc: SourceLoc,
    },

    /// The result of folding several validation errors into one, for
    /// callers that want a plain `Result` rather than the full list
    /// ([`cfagent_common::result::Outcome::into_result`]).
    #[error("{} validation errors", .0.len())]
    Compound(Vec<ValidationError>),
}

impl AgentError for ValidationError {
    fn compound(errors: Vec<Self>) -> Self {
        ValidationError::Compound(errors)
    }
}
