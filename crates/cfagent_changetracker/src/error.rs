// SPDX-License-Identifier: Apache-2.0

//! Errors the Change Tracker can produce.

use cfagent_common::error::AgentError;
use std::path::PathBuf;

/// A failure reading, writing, or logging a change record.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ChangeTrackerError {
    /// The underlying store could not be read or written.
    #[error(transparent)]
    Store(#[from] cfagent_store::StoreError),

    /// A stat or directory record in the database was the wrong size to
    /// decode.
    #[error("corrupt {kind} record for {path} ({len} bytes)")]
    CorruptRecord { kind: &'static str, path: String, len: usize },

    /// Writing or rotating the newline-delimited change log failed.
    #[error("change log I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The change log file is group- or other-writable and logging was
    /// refused.
    #[error("refusing to write change log {0}: file is group- or other-writable")]
    InsecureLogPermissions(PathBuf),

    /// Several non-fatal change-tracker errors folded into one.
    #[error("{} change-tracker errors", .0.len())]
    Compound(Vec<ChangeTrackerError>),
}

impl AgentError for ChangeTrackerError {
    fn compound(errors: Vec<Self>) -> Self {
        ChangeTrackerError::Compound(errors)
    }
}
