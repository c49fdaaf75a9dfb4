// SPDX-License-Identifier: Apache-2.0

//! Errors the edit-line engine can produce.

use cfagent_common::error::AgentError;

/// A failure building or applying one edit-line operation.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum EditLineError {
    /// A regular expression built from policy attributes failed to
    /// compile.
    #[error("invalid pattern {pattern:?}: {source}")]
    BadPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// `exact_match` was combined with another whitespace policy.
    #[error("insert_match combines exact_match with an ignore policy")]
    ConflictingWhitespacePolicy,

    /// More than one negative line filter was set.
    #[error("more than one negative line-selection filter is set")]
    ConflictingLineFilters,

    /// `select_start`/`select_end` named an anchor line that could not be
    /// found, and the caller did not tolerate a missing end.
    #[error("region anchor not found: {0}")]
    RegionNotFound(String),

    /// The selected region is empty (e.g. `include_start = false` and the
    /// start anchor was the last line of the file).
    #[error("selected region is empty")]
    EmptyRegion,

    /// A `line_matching` anchor for insertion could not be found.
    #[error("insertion anchor not found: {0}")]
    AnchorNotFound(String),

    /// Underlying file I/O failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `select_field` named a column that does not exist and
    /// `extend_columns` was not set.
    #[error("field {field} out of range for a row of {len} fields")]
    FieldOutOfRange { field: usize, len: usize },

    /// Several non-fatal edit-line errors folded into one.
    #[error("{} edit-line errors", .0.len())]
    Compound(Vec<EditLineError>),
}

impl AgentError for EditLineError {
    fn compound(errors: Vec<Self>) -> Self {
        EditLineError::Compound(errors)
    }
}
