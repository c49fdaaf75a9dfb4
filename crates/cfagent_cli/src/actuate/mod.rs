// SPDX-License-Identifier: Apache-2.0

//! Bridges from the policy model's attribute/body shapes into the typed specs
//! [`cfagent_editline`] and [`cfagent_pkgmodule`] actually run.

pub mod files;
pub mod packages;

use cfagent_editline::EditLineError;
use cfagent_eval::context::EvalContext;
use cfagent_expander::expand::{expand_scalar, ConcretePromise};
use cfagent_model::syntax::{data_type_of, DataType};
use cfagent_model::{BodyId, Policy};
use regex::Regex;
use std::collections::HashMap;

/// Compiles `pattern`, wrapping a failure as the same error the edit-line
/// engine itself raises for a bad policy-supplied pattern.
pub fn compile(pattern: &str) -> Result<Regex, EditLineError> {
    Regex::new(pattern).map_err(|source| EditLineError::BadPattern {
        pattern: pattern.to_owned(),
        source,
    })
}

/// Resolves `lval` on `concrete` as a reference to a body of
/// `expected_body_type`, following the declared [`DataType::BodyReference`]
/// for `(promise_type, lval)`. Returns `None` if the attribute is absent or
/// the referenced body does not exist — callers treat that as "use the
/// default behavior", not an error, since every such attribute is optional.
pub fn resolve_body_ref(
    policy: &Policy,
    namespace: &str,
    concrete: &ConcretePromise,
    promise_type: &str,
    lval: &str,
    expected_body_type: &str,
) -> Option<BodyId> {
    match data_type_of(promise_type, lval) {
        Some(DataType::BodyReference(bt)) if bt == expected_body_type => {}
        _ => return None,
    }
    let name = concrete.constraint(lval)?.as_scalar()?;
    policy.lookup_body(namespace, expected_body_type, name)
}

/// Reads and variable-expands a scalar attribute from a body.
pub fn body_scalar(policy: &Policy, ctx: &EvalContext<'_>, body_id: BodyId, lval: &str) -> Option<String> {
    let raw = policy.body_constraint(body_id, lval)?.rval.as_scalar()?;
    Some(expand_scalar(raw, &HashMap::new(), ctx))
}

/// Reads a `"true"`/`"false"` body attribute, defaulting to `default` when
/// absent.
pub fn body_bool(policy: &Policy, ctx: &EvalContext<'_>, body_id: BodyId, lval: &str, default: bool) -> bool {
    body_scalar(policy, ctx, body_id, lval)
        .map(|s| s == "true")
        .unwrap_or(default)
}
