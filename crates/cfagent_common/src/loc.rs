// SPDX-License-Identifier: Apache-2.0

//! Source locations attached to policy model nodes.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// A location within a policy source file: the file path plus a 1-based
/// line and column. Every AST node that is called a "source offset" carries one of these so
/// validator and actuator errors can be rendered as `file:line:col: error: msg`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SourceLoc {
    /// Path of the source file the node was parsed from.
    pub path: Arc<str>,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

impl SourceLoc {
    /// Builds a new source location.
    pub fn new(path: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self {
            path: path.into(),
            line,
            column,
        }
    }

    /// A placeholder location for nodes synthesized in-memory (expansion
    /// output, test fixtures) rather than parsed from a file.
    pub fn synthetic() -> Self {
        Self {
            path: Arc::from("<synthetic>"),
            line: 0,
            column: 0,
        }
    }
}

impl Display for SourceLoc {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.path, self.line, self.column)
    }
}

impl Default for SourceLoc {
    fn default() -> Self {
        Self::synthetic()
    }
}
