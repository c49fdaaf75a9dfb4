// SPDX-License-Identifier: Apache-2.0

//! Reusable attribute bundles referenced by name from a promise attribute.

use crate::constraint::Constraint;
use crate::ids::ConstraintId;
use cfagent_common::loc::SourceLoc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A named, reusable set of constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    /// The body's namespace.
    pub namespace: String,
    /// The body type (e.g. `"perms"`, `"edit_line"`, `"file"`).
    pub body_type: String,
    /// The body name.
    pub name: String,
    /// Formal arguments, in declaration order.
    pub args: Vec<String>,
    /// This body's constraints, in append order.
    pub constraints: Vec<ConstraintId>,
    /// Path of the source file this body was parsed from.
    pub source_path: Arc<str>,
    /// Where this body was declared.
    pub loc: SourceLoc,
    /// True for a body of a custom (non-builtin) type.
    pub is_custom: bool,
}

impl Body {
    /// Builds a new, empty body in the `"default"` namespace.
    pub fn new(body_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: "default".to_owned(),
            body_type: body_type.into(),
            name: name.into(),
            args: Vec::new(),
            constraints: Vec::new(),
            source_path: Arc::from(""),
            loc: SourceLoc::synthetic(),
            is_custom: false,
        }
    }

    /// Bodies of type `"file"` allow multiple definitions with the same
    /// (namespace, type, name) — they are treated as textual includes
    /// rather than a single canonical definition.
    pub fn allows_duplicates(&self) -> bool {
        self.body_type == "file"
    }

    /// The (namespace, type, name) triple bodies are keyed by.
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.namespace, &self.body_type, &self.name)
    }
}

/// Appends a constraint to a body's constraint list, implementing the body
/// merge rule from: "replacement occurs only when both left-value and class guard match";
/// otherwise the constraint is appended (bodies do not get the promise's `if`/`ifvarclass`
/// AND-merge treatment).
pub fn merge_body_constraint(
    body: &mut Body,
    existing_constraints: &mut [Constraint],
    new_constraint: Constraint,
    new_id: ConstraintId,
) -> ConstraintId {
    let existing_slot = body.constraints.iter().position(|&id| {
        let existing = &existing_constraints[id.index()];
        existing.lval == new_constraint.lval && existing.class_guard == new_constraint.class_guard
    });

    match existing_slot {
        Some(slot) => {
            let existing_id = body.constraints[slot];
            existing_constraints[existing_id.index()] = new_constraint;
            existing_id
        }
        None => {
            body.constraints.push(new_id);
            existing_constraints[new_id.index()] = new_constraint;
            new_id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ConstraintParent;
    use crate::value::RightValue;

    #[test]
    fn replaces_only_when_lval_and_class_guard_both_match() {
        let mut b = Body::new("perms", "p1");
        let parent = ConstraintParent::Body(crate::ids::BodyId(0));
        let mut store = vec![
            Constraint::new("mode", RightValue::scalar(""), parent),
            Constraint::new("mode", RightValue::scalar(""), parent),
        ];

        let c1 = Constraint::new("mode", RightValue::scalar("0644"), parent)
            .with_class_guard("linux");
        let id1 = merge_body_constraint(&mut b, &mut store, c1, ConstraintId(0));

        // Same lval, different class guard: appended, not replaced.
        let c2 = Constraint::new("mode", RightValue::scalar("0600"), parent)
            .with_class_guard("windows");
        let id2 = merge_body_constraint(&mut b, &mut store, c2, ConstraintId(1));
        assert_ne!(id1, id2);
        assert_eq!(b.constraints.len(), 2);

        // Same lval and same class guard as the first: replaced in place.
        let mut store2 = vec![
            store[0].clone(),
            store[1].clone(),
            Constraint::new("mode", RightValue::scalar(""), parent),
        ];
        let c3 = Constraint::new("mode", RightValue::scalar("0400"), parent)
            .with_class_guard("linux");
        let id3 = merge_body_constraint(&mut b, &mut store2, c3, ConstraintId(2));
        assert_eq!(id3, id1);
        assert_eq!(b.constraints.len(), 2);
        assert_eq!(store2[id1.index()].rval, RightValue::scalar("0400"));
    }
}
