// SPDX-License-Identifier: Apache-2.0

//! The wire shape of the JSON bridge: a plain serde mirror of [`cfagent_model`], with
//! camelCase field names and a tagged right-value union. Grounded on
//! `weaver_resolved_schema`'s plain serde-derive JSON model: no codegen, `#[serde(rename_all =
//! "camelCase")]` derives on ordinary structs.

use serde::{Deserialize, Serialize};

/// Top-level wire document: every bundle and body reachable from one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonPolicy {
    pub bundles: Vec<JsonBundle>,
    pub bodies: Vec<JsonBody>,
}

/// `bundle → {name, namespace, bundleType, sourcePath, line, arguments,
/// promiseTypes:[..]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonBundle {
    pub name: String,
    pub namespace: String,
    pub bundle_type: String,
    pub source_path: String,
    pub line: u32,
    pub arguments: Vec<String>,
    pub promise_types: Vec<JsonPromiseType>,
}

/// `{name, line, contexts:[...]}` — one entry per promise type (section) a
/// bundle declares.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonPromiseType {
    pub name: String,
    pub line: u32,
    pub contexts: Vec<JsonContext>,
}

/// `{name, promises:[...]}` — promises in this promise type sharing one
/// class-guard expression, grouped in order of first appearance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonContext {
    pub name: String,
    pub promises: Vec<JsonPromise>,
}

/// `{promiser, promisee, line, attributes:[...]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonPromise {
    pub promiser: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub promisee: Option<JsonRightValue>,
    pub line: u32,
    pub attributes: Vec<JsonAttribute>,
}

/// `{lval, rval, line}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonAttribute {
    pub lval: String,
    pub rval: JsonRightValue,
    pub line: u32,
}

/// A named, reusable set of constraints, mirroring [`cfagent_model::Body`].
/// Not part of the bundle mirror spells out verbatim, but bodies are reachable from a `symbol`
/// right-value and must round-trip alongside the bundles that reference them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonBody {
    pub name: String,
    pub namespace: String,
    pub body_type: String,
    pub source_path: String,
    pub line: u32,
    pub arguments: Vec<String>,
    pub attributes: Vec<JsonAttribute>,
}

/// A right-value on the wire: `type ∈ {string, symbol, list, functionCall,
/// container}`. `symbol` encodes a body reference — the
/// [`cfagent_model::Constraint::references_body`] flag — and must survive a round trip
/// distinct from an ordinary `string`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum JsonRightValue {
    String { value: String },
    Symbol { name: String },
    List { value: Vec<JsonRightValue> },
    FunctionCall { name: String, arguments: Vec<JsonRightValue> },
    Container { value: serde_json::Value },
}
