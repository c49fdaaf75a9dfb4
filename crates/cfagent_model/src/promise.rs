// SPDX-License-Identifier: Apache-2.0

//! Promises and bundle sections.

use crate::constraint::{merge_class_guard_values, Constraint, MERGE_AS_AND};
use crate::ids::{BundleId, ConstraintId, PromiseId, SectionId};
use crate::value::RightValue;
use cfagent_common::loc::SourceLoc;
use serde::{Deserialize, Serialize};

/// A convergent declaration that some subject (the promiser) shall be in a
/// described state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promise {
    /// The subject of the promise (file path, package name, pattern, …).
    pub promiser: String,
    /// The promisee, if any.
    pub promisee: Option<RightValue>,
    /// The class-guard expression gating this promise (default `"any"`).
    pub class_guard: String,
    /// An optional human comment.
    pub comment: Option<String>,
    /// Where this promise was written.
    pub loc: SourceLoc,
    /// This promise's constraints, in append order.
    pub constraints: Vec<ConstraintId>,
    /// The section this promise belongs to.
    pub section: SectionId,
    /// Self-reference to the pre-expansion form of this promise, for
    /// concrete promises produced by the expander. `None` for a promise that has not been
    /// expanded.
    pub original: Option<PromiseId>,
}

impl Promise {
    /// Builds a new promise with `class_guard` defaulted to `"any"`.
    pub fn new(promiser: impl Into<String>, section: SectionId) -> Self {
        Self {
            promiser: promiser.into(),
            promisee: None,
            class_guard: "any".to_owned(),
            comment: None,
            loc: SourceLoc::synthetic(),
            constraints: Vec::new(),
            section,
            original: None,
        }
    }

    /// Invariant from: the promiser is non-empty and not an empty variable reference (`"$"` or
    /// `"${}"`).
    pub fn is_well_formed(&self) -> bool {
        !self.promiser.is_empty() && self.promiser != "$()" && self.promiser != "${}"
    }
}

/// A collection of promises of one type inside a bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleSection {
    /// The promise-type string, e.g. `"files"`, `"insert_lines"`.
    pub promise_type: String,
    /// Where this section starts in the source.
    pub loc: SourceLoc,
    /// Promises in source order.
    pub promises: Vec<PromiseId>,
    /// The bundle this section belongs to.
    pub bundle: BundleId,
}

impl BundleSection {
    /// Builds a new, empty section.
    pub fn new(promise_type: impl Into<String>, bundle: BundleId) -> Self {
        Self {
            promise_type: promise_type.into(),
            loc: SourceLoc::synthetic(),
            promises: Vec::new(),
            bundle,
        }
    }
}

/// Appends a constraint to a promise's constraint list, implementing the
/// merge rule from: - For `lval` in `{"if", "ifvarclass"}`, an existing constraint with the
/// same `lval` is combined with the new one as logical AND, in place. - For any other `lval`,
/// an existing constraint with the same `lval` is replaced in place (position preserved, per
/// ordering guarantees: "the first occurrence of a left-value defines its slot"). - Otherwise
/// the constraint is appended. Returns the index (within `promise.constraints`) of the slot
/// the constraint ended up in, and the (possibly merged) constraint to store at
/// `constraints[constraint_id]`.
pub fn merge_promise_constraint(
    promise: &mut Promise,
    existing_constraints: &mut [Constraint],
    new_constraint: Constraint,
    new_id: ConstraintId,
) -> ConstraintId {
    let existing_slot = promise
        .constraints
        .iter()
        .position(|&id| existing_constraints[id.index()].lval == new_constraint.lval);

    match existing_slot {
        Some(slot) if MERGE_AS_AND.contains(&new_constraint.lval.as_str()) => {
            let existing_id = promise.constraints[slot];
            let existing = &existing_constraints[existing_id.index()];
            let merged_rval = merge_class_guard_values(&existing.rval, &new_constraint.rval);
            existing_constraints[existing_id.index()].rval = merged_rval;
            existing_id
        }
        Some(slot) => {
            let existing_id = promise.constraints[slot];
            existing_constraints[existing_id.index()] = new_constraint;
            existing_id
        }
        None => {
            promise.constraints.push(new_id);
            existing_constraints[new_id.index()] = new_constraint;
            new_id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ConstraintParent;

    fn promise(section: SectionId) -> Promise {
        Promise::new("/etc/motd", section)
    }

    #[test]
    fn well_formed_rejects_empty_variable_promiser() {
        let section = SectionId(0);
        let mut p = promise(section);
        assert!(p.is_well_formed());
        p.promiser = "$()".to_owned();
        assert!(!p.is_well_formed());
        p.promiser = "${}".to_owned();
        assert!(!p.is_well_formed());
        p.promiser = String::new();
        assert!(!p.is_well_formed());
    }

    #[test]
    fn merging_if_twice_combines_as_and_not_append() {
        let section = SectionId(0);
        let mut p = promise(section);
        let parent = ConstraintParent::Promise(PromiseId(0));

        let mut store = vec![
            Constraint::new("if", RightValue::scalar(""), parent),
            Constraint::new("if", RightValue::scalar(""), parent),
        ];

        let c1 = Constraint::new("if", RightValue::scalar("role_a"), parent);
        let id1 = merge_promise_constraint(&mut p, &mut store, c1, ConstraintId(0));
        assert_eq!(p.constraints, vec![id1]);

        let c2 = Constraint::new("if", RightValue::scalar("role_b"), parent);
        let id2 = merge_promise_constraint(&mut p, &mut store, c2, ConstraintId(1));

        assert_eq!(id2, id1, "merge must reuse the existing slot");
        assert_eq!(p.constraints.len(), 1);
        assert_eq!(store[id1.index()].rval, RightValue::scalar("(role_a)&(role_b)"));
    }

    #[test]
    fn merging_other_lval_twice_replaces_in_place() {
        let section = SectionId(0);
        let mut p = promise(section);
        let parent = ConstraintParent::Promise(PromiseId(0));
        let mut store = vec![
            Constraint::new("mode", RightValue::scalar(""), parent),
            Constraint::new("mode", RightValue::scalar(""), parent),
        ];

        let c1 = Constraint::new("mode", RightValue::scalar("0644"), parent);
        let id1 = merge_promise_constraint(&mut p, &mut store, c1, ConstraintId(0));

        let c2 = Constraint::new("mode", RightValue::scalar("0600"), parent);
        let id2 = merge_promise_constraint(&mut p, &mut store, c2, ConstraintId(1));

        assert_eq!(id2, id1);
        assert_eq!(p.constraints.len(), 1);
        assert_eq!(store[id1.index()].rval, RightValue::scalar("0600"));
    }
}
