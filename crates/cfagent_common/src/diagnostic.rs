// SPDX-License-Identifier: Apache-2.0

//! Generic, serializable diagnostic messages collected while validating or
//! evaluating a policy.

use miette::{Diagnostic, Severity};
use std::error::Error;
use std::fmt::Debug;

/// A rendered diagnostic: the original error plus the text a reporter
/// should show the user.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DiagnosticMessage {
    /// The error, serialized so it survives across the JSON bridge.
    error: serde_json::Value,
    /// `file:line:col: error: msg`-style rendering of the error.
    rendered: String,
    /// Severity, defaulting to [`Severity::Error`] when the source error
    /// does not specify one.
    severity: Severity,
}

impl DiagnosticMessage {
    /// Builds a diagnostic message from any error that can render itself
    /// with `miette::Diagnostic` and serialize with `serde::Serialize`.
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Diagnostic + serde::Serialize,
    {
        let severity = error.severity().unwrap_or(Severity::Error);
        let rendered = format!("{error}");
        let error = serde_json::to_value(&error).unwrap_or(serde_json::Value::Null);
        Self {
            error,
            rendered,
            severity,
        }
    }

    /// The severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// The rendered, human-readable message.
    pub fn rendered(&self) -> &str {
        &self.rendered
    }
}

/// An ordered collection of [`DiagnosticMessage`]s.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(transparent)]
pub struct DiagnosticMessages(Vec<DiagnosticMessage>);

impl DiagnosticMessages {
    /// An empty collection.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends one message.
    pub fn push(&mut self, message: DiagnosticMessage) {
        self.0.push(message);
    }

    /// Appends every message from `other`, draining it.
    pub fn extend_from_vec(&mut self, other: Vec<DiagnosticMessage>) {
        self.0.extend(other);
    }

    /// True if no diagnostics have been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates the recorded diagnostics in the order they were pushed.
    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticMessage> {
        self.0.iter()
    }

    /// True if any recorded diagnostic has [`Severity::Error`] (or no
    /// severity set, which defaults to error).
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|m| m.severity == Severity::Error)
    }
}

impl From<DiagnosticMessage> for DiagnosticMessages {
    fn from(value: DiagnosticMessage) -> Self {
        Self(vec![value])
    }
}

impl IntoIterator for DiagnosticMessages {
    type Item = DiagnosticMessage;
    type IntoIter = std::vec::IntoIter<DiagnosticMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
