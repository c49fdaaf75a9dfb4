// SPDX-License-Identifier: Apache-2.0

//! Errors the Package Module Protocol can produce.

use cfagent_common::error::AgentError;
use std::path::PathBuf;

/// A failure talking to, or interpreting the response of, a package
/// provider.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum PkgModuleError {
    /// The provider executable could not be spawned.
    #[error("failed to start package module {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the request or reading the response failed.
    #[error("I/O error talking to package module {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The provider did not respond within its configured timeout and
    /// was killed.
    #[error("package module {0} timed out")]
    Timeout(PathBuf),

    /// The provider exited with a non-zero status.
    #[error("package module {path} exited with status {code:?}")]
    NonZeroExit { path: PathBuf, code: Option<i32> },

    /// `supports-api-version` did not reply with exactly `1`.
    #[error("package module {path} reports unsupported API version {reported:?}")]
    UnsupportedApiVersion { path: PathBuf, reported: String },

    /// The provider's response carried an `Error`/`ErrorMessage` pair.
    #[error("package module reported an error: {0}")]
    ProviderError(String),

    /// `version = "latest"` was requested for an `Absent` promise,
    /// which is invalid.
    #[error("version=\"latest\" is not valid for an absent package promise")]
    LatestInvalidForAbsent,

    /// The underlying cache store could not be read or written.
    #[error(transparent)]
    Store(#[from] cfagent_store::StoreError),

    /// The global package lock could not be acquired or released.
    #[error(transparent)]
    Lock(#[from] cfagent_locks::LockError),

    /// After an install/remove, the cache refresh did not reflect the
    /// expected new state.
    #[error("package {0} did not appear in the refreshed cache after install")]
    ConfirmationFailed(String),

    /// Several non-fatal package-module errors folded into one.
    #[error("{} package module errors", .0.len())]
    Compound(Vec<PkgModuleError>),
}

impl AgentError for PkgModuleError {
    fn compound(errors: Vec<Self>) -> Self {
        PkgModuleError::Compound(errors)
    }
}
