// SPDX-License-Identifier: Apache-2.0

//! C10: the JSON Bridge — a bidirectional, stable wire mirror of
//! [`cfagent_model::Policy`]. The wire shape follows the AST directly: bundle → promise type
//! ("section") → context (promises grouped by class guard) → promise → attribute. Right-values
//! are a tagged union; the `symbol` variant is the one piece of information that doesn't live
//! on [`cfagent_model::RightValue`] itself — it mirrors
//! [`cfagent_model::Constraint::references_body`] so a body reference survives a round trip
//! distinguishable from a same-looking literal string.

pub mod convert;
pub mod error;
pub mod schema;

pub use convert::{from_json, to_json};
pub use error::JsonBridgeError;
pub use schema::{
    JsonAttribute, JsonBody, JsonBundle, JsonContext, JsonPolicy, JsonPromise, JsonPromiseType,
    JsonRightValue,
};
