// SPDX-License-Identifier: Apache-2.0

//! Support for folding a list of non-fatal errors into a single compound
//! error, mirrored by every fatal error enum in this workspace.

/// Implemented by every fatal error type so [`crate::result::Outcome`] can
/// collapse accumulated non-fatal errors into one value when a caller wants
/// a plain [`Result`].
pub trait AgentError: Sized {
    /// Folds a non-empty list of errors of this type into a single compound
    /// error. Called only when the list is non-empty.
    fn compound(errors: Vec<Self>) -> Self;
}
