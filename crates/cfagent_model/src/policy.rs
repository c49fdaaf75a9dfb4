// SPDX-License-Identifier: Apache-2.0

//! The top-level policy document: flat arenas of bundles, bodies, sections,
//! promises and constraints, addressed by the index types in
//! [`crate::ids`].

use crate::body::{merge_body_constraint, Body};
use crate::bundle::Bundle;
use crate::constraint::Constraint;
use crate::ids::{BodyId, BundleId, ConstraintId, ConstraintParent, PromiseId, SectionId};
use crate::promise::{merge_promise_constraint, BundleSection, Promise};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A fully parsed and (not yet validated) policy document: every bundle,
/// body, section, promise and constraint reachable from every source file
/// fed to one agent run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Policy {
    bundles: Vec<Bundle>,
    bodies: Vec<Body>,
    sections: Vec<BundleSection>,
    promises: Vec<Promise>,
    constraints: Vec<Constraint>,

    /// `(namespace, bundle_type, name) -> BundleId`, maintained alongside
    /// `bundles` for the duplicate-bundle validation pass.
    #[serde(skip)]
    bundle_index: HashMap<(String, String, String), BundleId>,
    /// `(namespace, body_type, name) -> BodyId`. Only the first body with a
    /// given key is indexed; later same-key bodies of a duplicate-
    /// forbidding type are a validator error, and same-key `file` bodies
    /// are intentionally allowed to repeat (see [`Body::allows_duplicates`]).
    #[serde(skip)]
    body_index: HashMap<(String, String, String), BodyId>,

    /// Per-source-file content hash, populated as files are parsed; used
    /// to detect stale re-runs and surfaced through the JSON bridge.
    pub source_hashes: HashMap<String, String>,
    /// The release identifier of the policy set this run loaded, if known.
    pub release_id: Option<String>,
}

impl Policy {
    /// An empty policy document.
    pub fn new() -> Self {
        Self::default()
    }

    // ---- bundles ---------------------------------------------------

    /// Appends a new bundle and returns its id. Does not check for
    /// duplicate keys or reserved names — that is the validator's job;
    /// this layer only maintains the lookup index.
    pub fn append_bundle(&mut self, bundle: Bundle) -> BundleId {
        let id = BundleId(self.bundles.len());
        let key = (
            bundle.namespace.clone(),
            bundle.bundle_type.clone(),
            bundle.name.clone(),
        );
        self.bundles.push(bundle);
        self.bundle_index.entry(key).or_insert(id);
        id
    }

    pub fn bundle(&self, id: BundleId) -> &Bundle {
        &self.bundles[id.index()]
    }

    pub fn bundle_mut(&mut self, id: BundleId) -> &mut Bundle {
        &mut self.bundles[id.index()]
    }

    pub fn bundles(&self) -> impl Iterator<Item = (BundleId, &Bundle)> {
        self.bundles.iter().enumerate().map(|(i, b)| (BundleId(i), b))
    }

    /// Looks up a previously appended bundle by its (namespace, type, name)
    /// key. Returns the *first* bundle appended with that key — later
    /// duplicates are a validator error, not silently shadowed, so this is purely a lookup,
    /// not a merge.
    pub fn lookup_bundle(&self, namespace: &str, bundle_type: &str, name: &str) -> Option<BundleId> {
        self.bundle_index
            .get(&(namespace.to_owned(), bundle_type.to_owned(), name.to_owned()))
            .copied()
    }

    /// All bundle ids sharing a (namespace, type, name) key, for the
    /// duplicate-bundle validation pass.
    pub fn bundles_with_key<'a>(
        &'a self,
        namespace: &'a str,
        bundle_type: &'a str,
        name: &'a str,
    ) -> impl Iterator<Item = BundleId> + 'a {
        self.bundles().filter_map(move |(id, b)| {
            (b.namespace == namespace && b.bundle_type == bundle_type && b.name == name).then_some(id)
        })
    }

    // ---- bodies ------------------------------------------------------

    /// Appends a new body and returns its id.
    pub fn append_body(&mut self, body: Body) -> BodyId {
        let id = BodyId(self.bodies.len());
        let key = (body.namespace.clone(), body.body_type.clone(), body.name.clone());
        self.bodies.push(body);
        self.body_index.entry(key).or_insert(id);
        id
    }

    pub fn body(&self, id: BodyId) -> &Body {
        &self.bodies[id.index()]
    }

    pub fn body_mut(&mut self, id: BodyId) -> &mut Body {
        &mut self.bodies[id.index()]
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.bodies.iter().enumerate().map(|(i, b)| (BodyId(i), b))
    }

    /// Looks up a previously defined body by its (namespace, type, name)
    /// key, used when resolving a body-reference constraint.
    pub fn lookup_body(&self, namespace: &str, body_type: &str, name: &str) -> Option<BodyId> {
        self.body_index
            .get(&(namespace.to_owned(), body_type.to_owned(), name.to_owned()))
            .copied()
    }

    pub fn bodies_with_key<'a>(
        &'a self,
        namespace: &'a str,
        body_type: &'a str,
        name: &'a str,
    ) -> impl Iterator<Item = BodyId> + 'a {
        self.bodies().filter_map(move |(id, b)| {
            (b.namespace == namespace && b.body_type == body_type && b.name == name).then_some(id)
        })
    }

    // ---- sections ------------------------------------------------------

    /// Appends a section to a bundle's section list and returns its id.
    pub fn append_section(&mut self, bundle_id: BundleId, section: BundleSection) -> SectionId {
        let id = SectionId(self.sections.len());
        let is_builtin = crate::syntax::promise_types_for_bundle_type(&self.bundle(bundle_id).bundle_type)
            .map(|types| types.contains(&section.promise_type.as_str()))
            .unwrap_or(false);
        self.sections.push(section);
        let bundle = self.bundle_mut(bundle_id);
        if is_builtin {
            bundle.builtin_sections.push(id);
        } else {
            bundle.custom_sections.push(id);
        }
        id
    }

    pub fn section(&self, id: SectionId) -> &BundleSection {
        &self.sections[id.index()]
    }

    pub fn section_mut(&mut self, id: SectionId) -> &mut BundleSection {
        &mut self.sections[id.index()]
    }

    // ---- promises ------------------------------------------------------

    /// Appends a promise to a section's promise list and returns its id.
    pub fn append_promise(&mut self, section_id: SectionId, promise: Promise) -> PromiseId {
        let id = PromiseId(self.promises.len());
        self.promises.push(promise);
        self.section_mut(section_id).promises.push(id);
        id
    }

    pub fn promise(&self, id: PromiseId) -> &Promise {
        &self.promises[id.index()]
    }

    pub fn promise_mut(&mut self, id: PromiseId) -> &mut Promise {
        &mut self.promises[id.index()]
    }

    // ---- constraints ----------------------------------------------------

    /// Adds a constraint onto a promise, applying the promise merge rule
    /// from [`merge_promise_constraint`]. Returns the id the constraint
    /// ended up stored at (either freshly appended, or an existing slot it
    /// was merged into).
    pub fn add_promise_constraint(&mut self, promise_id: PromiseId, mut constraint: Constraint) -> ConstraintId {
        constraint.parent = ConstraintParent::Promise(promise_id);
        let placeholder_id = ConstraintId(self.constraints.len());
        self.constraints.push(constraint.clone());
        let promise = self.promise_mut(promise_id);
        merge_promise_constraint(promise, &mut self.constraints, constraint, placeholder_id)
    }

    /// Adds a constraint onto a body, applying the body merge rule from
    /// [`merge_body_constraint`].
    pub fn add_body_constraint(&mut self, body_id: BodyId, mut constraint: Constraint) -> ConstraintId {
        constraint.parent = ConstraintParent::Body(body_id);
        let placeholder_id = ConstraintId(self.constraints.len());
        self.constraints.push(constraint.clone());
        let body = self.body_mut(body_id);
        merge_body_constraint(body, &mut self.constraints, constraint, placeholder_id)
    }

    pub fn constraint(&self, id: ConstraintId) -> &Constraint {
        &self.constraints[id.index()]
    }

    pub fn constraint_mut(&mut self, id: ConstraintId) -> &mut Constraint {
        &mut self.constraints[id.index()]
    }

    /// Looks up a constraint on a promise by `lval`, following the
    /// first-occurrence-defines-the-slot rule.
    pub fn promise_constraint(&self, promise_id: PromiseId, lval: &str) -> Option<&Constraint> {
        self.promise(promise_id)
            .constraints
            .iter()
            .map(|&id| self.constraint(id))
            .find(|c| c.lval == lval)
    }

    /// Looks up a constraint on a body by `lval`.
    pub fn body_constraint(&self, body_id: BodyId, lval: &str) -> Option<&Constraint> {
        self.body(body_id)
            .constraints
            .iter()
            .map(|&id| self.constraint(id))
            .find(|c| c.lval == lval)
    }

    // ---- whole-policy queries -------------------------------------------

    /// True if some bundle declares a `common control` body reference —
    /// the minimum a policy needs to be runnable as an agent bundle
    /// sequence.
    pub fn is_runnable(&self) -> bool {
        self.bodies()
            .any(|(_, b)| b.namespace == "default" && b.body_type == "control" && b.name == "common")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::RightValue;

    #[test]
    fn append_bundle_then_lookup_round_trips() {
        let mut p = Policy::new();
        let id = p.append_bundle(Bundle::new("agent", "main"));
        assert_eq!(p.lookup_bundle("default", "agent", "main"), Some(id));
        assert_eq!(p.lookup_bundle("default", "agent", "other"), None);
    }

    #[test]
    fn append_body_then_lookup_round_trips() {
        let mut p = Policy::new();
        let id = p.append_body(Body::new("perms", "p1"));
        assert_eq!(p.lookup_body("default", "perms", "p1"), Some(id));
    }

    #[test]
    fn section_is_classified_builtin_or_custom_by_syntax_table() {
        let mut p = Policy::new();
        let bundle_id = p.append_bundle(Bundle::new("agent", "main"));
        let builtin = p.append_section(bundle_id, BundleSection::new("files", bundle_id));
        let custom = p.append_section(bundle_id, BundleSection::new("my_custom_type", bundle_id));

        assert!(p.bundle(bundle_id).builtin_sections.contains(&builtin));
        assert!(p.bundle(bundle_id).custom_sections.contains(&custom));
    }

    #[test]
    fn add_promise_constraint_merges_through_policy() {
        let mut p = Policy::new();
        let bundle_id = p.append_bundle(Bundle::new("agent", "main"));
        let section_id = p.append_section(bundle_id, BundleSection::new("files", bundle_id));
        let promise_id = p.append_promise(section_id, Promise::new("/etc/motd", section_id));

        let parent = ConstraintParent::Promise(promise_id);
        p.add_promise_constraint(promise_id, Constraint::new("if", RightValue::scalar("a"), parent));
        p.add_promise_constraint(promise_id, Constraint::new("if", RightValue::scalar("b"), parent));

        let merged = p.promise_constraint(promise_id, "if").expect("constraint present");
        assert_eq!(merged.rval, RightValue::scalar("(a)&(b)"));
        assert_eq!(p.promise(promise_id).constraints.len(), 1);
    }

    #[test]
    fn is_runnable_requires_common_control_body() {
        let mut p = Policy::new();
        assert!(!p.is_runnable());
        let mut control = Body::new("control", "common");
        control.namespace = "default".to_owned();
        p.append_body(control);
        assert!(p.is_runnable());
    }
}
