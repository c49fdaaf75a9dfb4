// SPDX-License-Identifier: Apache-2.0

//! Errors the JSON bridge can raise when reconstructing a
//! [`cfagent_model::Policy`] from its wire form.

use cfagent_common::error::AgentError;

/// A problem found while converting a [`crate::JsonPolicy`] back into a
/// [`cfagent_model::Policy`].
#[derive(Debug, Clone, thiserror::Error, miette::Diagnostic, serde::Serialize)]
pub enum JsonBridgeError {
    /// A constraint's `rval` carried `type = "symbol"` but referenced a body
    /// this policy never declares. Round-tripping a policy produced by
    /// [`crate::to_json`] never hits this; it only fires on hand-authored
    /// or foreign JSON.
    #[error("attribute {lval:?} references undefined body {name:?}")]
    UndefinedBodyReference { lval: String, name: String },

    /// Several non-fatal bridge errors folded into one.
    #[error("{} json bridge errors", .0.len())]
    Compound(Vec<JsonBridgeError>),
}

impl AgentError for JsonBridgeError {
    fn compound(errors: Vec<Self>) -> Self {
        JsonBridgeError::Compound(errors)
    }
}
