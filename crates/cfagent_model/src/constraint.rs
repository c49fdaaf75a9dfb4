// SPDX-License-Identifier: Apache-2.0

//! Constraints: a single `lval => rval` attribute on a promise or body.

use crate::ids::ConstraintParent;
use crate::value::{FunctionCall, RightValue};
use cfagent_common::loc::SourceLoc;
use serde::{Deserialize, Serialize};

/// The two left-values whose repeated appearance on one promise merges as
/// logical AND instead of replacing.
pub const MERGE_AS_AND: [&str; 2] = ["if", "ifvarclass"];

/// A single `lval => rval` attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// The attribute name.
    pub lval: String,
    /// The attribute's value.
    pub rval: RightValue,
    /// The class guard this constraint is conditional on (default `"any"`).
    pub class_guard: String,
    /// True if `rval` is a symbolic reference to a body by name rather
    /// than a literal scalar.
    pub references_body: bool,
    /// Which promise or body owns this constraint.
    pub parent: ConstraintParent,
    /// Where this constraint was written.
    pub loc: SourceLoc,
}

impl Constraint {
    /// Builds a new constraint with `class_guard` defaulted to `"any"`.
    pub fn new(lval: impl Into<String>, rval: RightValue, parent: ConstraintParent) -> Self {
        Self {
            lval: lval.into(),
            rval,
            class_guard: "any".to_owned(),
            references_body: false,
            parent,
            loc: SourceLoc::synthetic(),
        }
    }

    /// Builder-style setter for `class_guard`.
    #[must_use]
    pub fn with_class_guard(mut self, guard: impl Into<String>) -> Self {
        self.class_guard = guard.into();
        self
    }

    /// Builder-style setter for `references_body`.
    #[must_use]
    pub fn with_references_body(mut self, references_body: bool) -> Self {
        self.references_body = references_body;
        self
    }

    /// Builder-style setter for `loc`.
    #[must_use]
    pub fn with_loc(mut self, loc: SourceLoc) -> Self {
        self.loc = loc;
        self
    }
}

/// Combines two right-values for an `if`/`ifvarclass` constraint merge:
/// scalar-scalar joined with `"(a)&(b)"` syntax; scalar-function-call
/// promoted to `and(scalar, fncall)`; function-call plus function-call
/// promoted to `and(a, b)`.
pub fn merge_class_guard_values(existing: &RightValue, incoming: &RightValue) -> RightValue {
    match (existing, incoming) {
        (RightValue::Scalar(a), RightValue::Scalar(b)) => {
            RightValue::Scalar(format!("({a})&({b})"))
        }
        (a, b) => RightValue::FunctionCall(FunctionCall {
            name: "and".to_owned(),
            args: vec![a.clone(), b.clone()],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_scalar_merge_uses_paren_and_syntax() {
        let a = RightValue::scalar("role_a");
        let b = RightValue::scalar("role_b");
        let merged = merge_class_guard_values(&a, &b);
        assert_eq!(merged, RightValue::scalar("(role_a)&(role_b)"));
    }

    #[test]
    fn scalar_fncall_merge_promotes_to_and_call() {
        let a = RightValue::scalar("role_a");
        let b = RightValue::FunctionCall(FunctionCall {
            name: "classmatch".to_owned(),
            args: vec![RightValue::scalar("role_.*")],
        });
        let merged = merge_class_guard_values(&a, &b);
        match merged {
            RightValue::FunctionCall(call) => {
                assert_eq!(call.name, "and");
                assert_eq!(call.args.len(), 2);
            }
            other => panic!("expected a function call, got {other:?}"),
        }
    }
}
