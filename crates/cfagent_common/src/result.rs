// SPDX-License-Identifier: Apache-2.0

//! `Outcome`, this workspace's result type supporting both non-fatal errors
//! (NFEs) and a single fatal error.
//!
//! NFEs do not prevent the rest of an operation from completing: a policy
//! with three duplicate-handle errors still produces a fully-built `Policy`
//! value, with the three errors attached. A fatal error means no value could
//! be produced at all.

use crate::diagnostic::{DiagnosticMessage, DiagnosticMessages};
use crate::error::AgentError;
use miette::Diagnostic;
use std::error::Error;

/// This crate's result type: either a value plus zero or more non-fatal
/// errors, or a single fatal error.
#[must_use]
pub enum Outcome<T, E> {
    /// The operation produced a value, possibly with non-fatal errors.
    Ok(T, Vec<E>),
    /// The operation failed outright.
    Err(E),
}

impl<T, E> Outcome<T, E>
where
    E: AgentError + Error + Diagnostic + serde::Serialize + Send + Sync + 'static,
{
    /// Builds a success carrying non-fatal errors.
    pub fn with_non_fatal_errors(result: T, non_fatal_errors: Vec<E>) -> Self {
        Outcome::Ok(result, non_fatal_errors)
    }

    /// Builds a fatal failure.
    pub fn with_fatal_error(error: E) -> Self {
        Outcome::Err(error)
    }

    /// Moves every non-fatal error into `diagnostics` and returns a plain
    /// [`Result`] (fatal errors still short-circuit).
    pub fn capture_non_fatal_errors(
        self,
        diagnostics: &mut Vec<DiagnosticMessage>,
    ) -> Result<T, E> {
        match self {
            Outcome::Ok(result, nfes) => {
                for nfe in nfes {
                    diagnostics.push(DiagnosticMessage::new(nfe));
                }
                Ok(result)
            }
            Outcome::Err(fatal) => Err(fatal),
        }
    }

    /// Splits non-fatal errors into warnings (moved into `diag_msgs`) and
    /// errors (kept attached to the returned `Outcome`).
    pub fn capture_warnings(self, diag_msgs: &mut DiagnosticMessages) -> Outcome<T, E> {
        if let Outcome::Ok(result, nfes) = self {
            let (warnings, errors): (Vec<_>, Vec<_>) = nfes
                .into_iter()
                .partition(|e| matches!(e.severity(), Some(miette::Severity::Warning)));
            diag_msgs.extend_from_vec(warnings.into_iter().map(DiagnosticMessage::new).collect());
            Outcome::Ok(result, errors)
        } else {
            self
        }
    }

    /// Drops warning-severity non-fatal errors, keeping only errors.
    pub fn ignore_warnings(self) -> Outcome<T, E> {
        match self {
            Outcome::Ok(result, nfes) => {
                let errors = nfes
                    .into_iter()
                    .filter(|e| !matches!(e.severity(), Some(miette::Severity::Warning)))
                    .collect();
                Outcome::Ok(result, errors)
            }
            Outcome::Err(e) => Outcome::Err(e),
        }
    }

    /// Inspects a successful value and its non-fatal errors without
    /// consuming the `Outcome`.
    pub fn inspect<F: FnOnce(&T, &[E])>(self, f: F) -> Self {
        if let Outcome::Ok(ref result, ref nfes) = self {
            f(result, nfes);
        }
        self
    }

    /// Converts to a plain [`Result`], folding any non-fatal errors into a
    /// single compound error via [`AgentError::compound`].
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Outcome::Ok(result, errors) => {
                if errors.is_empty() {
                    Ok(result)
                } else {
                    Err(E::compound(errors))
                }
            }
            Outcome::Err(e) => Err(e),
        }
    }

    /// Converts to a plain [`Result`], keeping the value and its non-fatal
    /// errors side by side instead of folding them.
    pub fn into_result_with_nfes(self) -> Result<(T, Vec<E>), E> {
        match self {
            Outcome::Ok(result, errors) => Ok((result, errors)),
            Outcome::Err(e) => Err(e),
        }
    }

    /// True if this outcome carries no fatal error and no non-fatal errors.
    pub fn is_clean(&self) -> bool {
        matches!(self, Outcome::Ok(_, nfes) if nfes.is_empty())
    }
}
