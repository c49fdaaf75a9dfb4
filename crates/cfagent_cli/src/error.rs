// SPDX-License-Identifier: Apache-2.0

//! The CLI's top-level error type, folding every subsystem error this
//! crate drives into one value `main` can render and turn into an exit
//! code.

use std::path::PathBuf;

/// Something that stopped a `validate` or `run` invocation outright.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum CliError {
    /// The policy JSON file could not be read from disk.
    #[error("failed to read policy file {path}: {source}")]
    ReadPolicy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The policy file's contents were not valid JSON, or did not match
    /// the JSON bridge schema.
    #[error("{path}: not a valid policy document: {source}")]
    ParsePolicy {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The JSON bridge could not reconstruct a policy from the document.
    #[error(transparent)]
    JsonBridge(#[from] cfagent_json::JsonBridgeError),

    /// The policy failed validation and `--full-check` promotes every finding to fatal.
    #[error(transparent)]
    Validation(#[from] cfagent_validator::ValidationError),

    /// The state store could not be opened.
    #[error(transparent)]
    Store(#[from] cfagent_store::StoreError),

    /// The Lock Manager could not be opened.
    #[error(transparent)]
    Lock(#[from] cfagent_locks::LockError),

    /// The Change Tracker could not be opened.
    #[error(transparent)]
    ChangeTracker(#[from] cfagent_changetracker::ChangeTrackerError),

    /// A package provider call failed fatally (not a per-promise FAIL
    /// outcome — an I/O or protocol-level failure).
    #[error(transparent)]
    PkgModule(#[from] cfagent_pkgmodule::PkgModuleError),

    /// The edit-line engine could not apply its operations to a file.
    #[error(transparent)]
    EditLine(#[from] cfagent_editline::EditLineError),

    /// `--list-modules` could not read the configured module directory.
    #[error("failed to list package modules under {path}: {source}")]
    ListModules {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A promise or the body it references carried a malformed or missing
    /// attribute the orchestrator could not turn into a typed spec.
    #[error("{promiser}: attribute {lval:?} is invalid: {reason}")]
    InvalidAttribute {
        promiser: String,
        lval: &'static str,
        reason: String,
    },
}
