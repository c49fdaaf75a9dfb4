// SPDX-License-Identifier: Apache-2.0

//! Shared error, diagnostic, result, and logging plumbing used by every
//! crate in the promise evaluation engine workspace.

pub mod diagnostic;
pub mod error;
pub mod loc;
pub mod outcome;
pub mod result;

use crate::outcome::PromiseOutcome;

/// Path of a promise within a policy, used in structured log lines:
/// `/namespace/bundle/section/'promiser'`.
#[derive(Debug, Clone)]
pub struct PromisePath {
    /// The bundle's namespace.
    pub namespace: String,
    /// The bundle name.
    pub bundle: String,
    /// The promise-type / section name.
    pub section: String,
    /// The promiser string.
    pub promiser: String,
}

impl std::fmt::Display for PromisePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "/{}/{}/{}/'{}'",
            self.namespace, self.bundle, self.section, self.promiser
        )
    }
}

/// A trait implemented by every diagnostic sink this workspace ships
/// (`ConsoleLogger`, `QuietLogger` in `cfagent_logger`). Mirrors the
/// teacher-stack's leveled-logging shape, plus a `promise` method for the
/// structured per-promise outcome line requires.
pub trait Logger {
    /// Logs a trace message (only with debug enabled).
    fn trace(&self, message: &str);
    /// Logs an info message.
    fn info(&self, message: &str);
    /// Logs a warning message.
    fn warn(&self, message: &str);
    /// Logs an error message.
    fn error(&self, message: &str);
    /// Logs a success message.
    fn success(&self, message: &str);
    /// Logs a plain message without an icon.
    fn log(&self, message: &str);
    /// Logs the outcome of actuating one promise: severity, promise path,
    /// and a human sentence.
    fn promise(&self, outcome: PromiseOutcome, path: &PromisePath, sentence: &str) {
        let line = format!("{outcome} {path}: {sentence}");
        match outcome {
            PromiseOutcome::Fail | PromiseOutcome::Interrupted => self.error(&line),
            PromiseOutcome::Warn | PromiseOutcome::Skipped => self.warn(&line),
            PromiseOutcome::Change => self.success(&line),
            PromiseOutcome::Noop => self.trace(&line),
        }
    }
}
