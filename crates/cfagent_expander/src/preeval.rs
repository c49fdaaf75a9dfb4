// SPDX-License-Identifier: Apache-2.0

//! Pre-eval recheck: re-run constraint type checking after expansion, and flag `insert_lines`
//! promises whose anchor is reused elsewhere in the same bundle.

use crate::error::ExpanderError;
use crate::expand::ConcretePromise;
use cfagent_model::ids::PromiseId;
use cfagent_model::syntax::{self, DataType};
use cfagent_model::RightValue;
use std::collections::HashMap;

fn kind_name(v: &RightValue) -> &'static str {
    match v {
        RightValue::Scalar(_) => "scalar",
        RightValue::List(_) => "list",
        RightValue::FunctionCall(_) => "function call",
        RightValue::Container(_) => "container",
    }
}

/// Re-checks every constraint on `promise` against the syntax tables for
/// `promise_type`, this time against the post-expansion right-value kind.
/// Unknown attributes and body references are not rechecked here — those
/// were already validated pre-expansion by
/// [`cfagent_validator::passes::check_constraints`], which runs over the
/// unexpanded AST and is not re-invoked per concrete instance.
pub fn recheck_constraint_types(promise_type: &str, promise: &ConcretePromise) -> Vec<ExpanderError> {
    let mut errors = Vec::new();
    for constraint in &promise.constraints {
        let Some(data_type) = syntax::data_type_of(promise_type, &constraint.lval) else {
            continue;
        };
        let ok = match data_type {
            DataType::Scalar => matches!(constraint.rval, RightValue::Scalar(_) | RightValue::FunctionCall(_)),
            DataType::List => matches!(constraint.rval, RightValue::List(_)),
            DataType::Container => matches!(constraint.rval, RightValue::Container(_)),
            DataType::Boolean => matches!(&constraint.rval, RightValue::Scalar(s) if s == "true" || s == "false"),
            // Body references are resolved by name before expansion; a
            // post-expansion scalar is expected and not rechecked here.
            DataType::BodyReference(_) => true,
        };
        if !ok {
            errors.push(ExpanderError::ConstraintTypeMismatch {
                lval: constraint.lval.clone(),
                expected: match data_type {
                    DataType::Scalar => "scalar",
                    DataType::List => "list",
                    DataType::Boolean => "boolean scalar",
                    DataType::Container => "container",
                    DataType::BodyReference(_) => "body reference",
                },
                found: kind_name(&constraint.rval),
            });
        }
    }
    errors
}

/// Flags `insert_lines` promises within one bundle whose
/// `select_line_matching` anchor is also used by a different promise.
/// Expects every concrete instance expanded from every `insert_lines`
/// promise in one bundle; instances that share an `original`
/// [`PromiseId`] (the same promise, expanded multiple times by
/// iteration) do not conflict with each other.
pub fn detect_reused_insert_anchors<'a>(
    promises: impl IntoIterator<Item = &'a ConcretePromise>,
) -> Vec<ExpanderError> {
    let mut seen: HashMap<String, PromiseId> = HashMap::new();
    let mut warnings = Vec::new();
    for promise in promises {
        let Some(RightValue::Scalar(anchor)) = promise.constraint("select_line_matching") else {
            continue;
        };
        match seen.get(anchor) {
            Some(&owner) if owner != promise.original => {
                warnings.push(ExpanderError::ReusedInsertAnchor { anchor: anchor.clone() });
            }
            Some(_) => {}
            None => {
                seen.insert(anchor.clone(), promise.original);
            }
        }
    }
    warnings
}
