// SPDX-License-Identifier: Apache-2.0

//! The layered class heap: global heap, bundle-local heap, negated-class
//! set, and a stack of private-class contexts pushed per promise
//! expansion.

use crate::classalgebra::ClassLookup;
use std::collections::HashMap;

/// A set of class names with a decaying reference count per class, modeling
/// "membership bit-per-class and decaying counters": presence in the map means the class is
/// defined; the counter is how many overlapping scopes currently assert it, so popping one
/// scope's classes doesn't un-define a class another scope also asserted.
#[derive(Debug, Clone, Default)]
pub struct ClassSet {
    counts: HashMap<String, u32>,
}

impl ClassSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one reference to `name`, defining it if not already present.
    pub fn add(&mut self, name: impl Into<String>) {
        *self.counts.entry(name.into()).or_insert(0) += 1;
    }

    /// Removes one reference to `name`; the class becomes undefined once
    /// its count reaches zero.
    pub fn remove(&mut self, name: &str) {
        if let Some(count) = self.counts.get_mut(name) {
            if *count <= 1 {
                self.counts.remove(name);
            } else {
                *count -= 1;
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.counts.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }
}

/// One private-class context: classes scoped to a single promise
/// expansion, discarded when its frame pops.
#[derive(Debug, Clone, Default)]
pub struct PrivateClassFrame {
    pub classes: ClassSet,
}

/// The full layered class heap for one agent run.
#[derive(Debug, Clone, Default)]
pub struct ClassHeap {
    global: ClassSet,
    negated: ClassSet,
    bundle_local: ClassSet,
    private_stack: Vec<PrivateClassFrame>,
}

/// Which heap layer `AddClass` writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassScope {
    Global,
    Bundle,
    /// The innermost currently-pushed private-class frame.
    Private,
}

impl ClassHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// `AddClass(name)`.
    pub fn add_class(&mut self, scope: ClassScope, name: impl Into<String>) {
        let name = name.into();
        match scope {
            ClassScope::Global => self.global.add(name),
            ClassScope::Bundle => self.bundle_local.add(name),
            ClassScope::Private => {
                if let Some(frame) = self.private_stack.last_mut() {
                    frame.classes.add(name);
                } else {
                    self.global.add(name);
                }
            }
        }
    }

    /// Marks `name` as negated: `IsDefinedClass` returns `false` for it
    /// regardless of positive membership.
    pub fn negate_class(&mut self, name: impl Into<String>) {
        self.negated.add(name.into());
    }

    pub fn un_negate_class(&mut self, name: &str) {
        self.negated.remove(name);
    }

    /// Resets the bundle-local heap; called when entering a new bundle
    /// frame.
    pub fn clear_bundle_local(&mut self) {
        self.bundle_local = ClassSet::new();
    }

    pub fn push_private_frame(&mut self) {
        self.private_stack.push(PrivateClassFrame::default());
    }

    /// Pops the innermost private-class frame, discarding its classes.
    pub fn pop_private_frame(&mut self) {
        self.private_stack.pop();
    }

    /// Clears bundle-local classes and drops any dangling private frames;
    /// used when resetting between top-level bundle runs.
    pub fn reset_scoped(&mut self) {
        self.clear_bundle_local();
        self.private_stack.clear();
    }
}

impl ClassLookup for ClassHeap {
    fn is_defined(&self, name: &str) -> bool {
        if self.negated.contains(name) {
            return false;
        }
        self.global.contains(name)
            || self.bundle_local.contains(name)
            || self.private_stack.iter().any(|f| f.classes.contains(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classalgebra::is_defined_class;

    #[test]
    fn negated_class_overrides_positive_membership() {
        let mut heap = ClassHeap::new();
        heap.add_class(ClassScope::Global, "linux");
        heap.negate_class("linux");
        assert!(!is_defined_class("linux", &heap).unwrap());
    }

    #[test]
    fn private_frame_classes_are_visible_only_while_pushed() {
        let mut heap = ClassHeap::new();
        heap.push_private_frame();
        heap.add_class(ClassScope::Private, "in_loop");
        assert!(heap.is_defined("in_loop"));
        heap.pop_private_frame();
        assert!(!heap.is_defined("in_loop"));
    }

    #[test]
    fn bundle_local_reset_does_not_touch_global() {
        let mut heap = ClassHeap::new();
        heap.add_class(ClassScope::Global, "host_ok");
        heap.add_class(ClassScope::Bundle, "bundle_local_flag");
        heap.clear_bundle_local();
        assert!(heap.is_defined("host_ok"));
        assert!(!heap.is_defined("bundle_local_flag"));
    }

    #[test]
    fn ref_counted_class_survives_until_last_reference_removed() {
        let mut heap = ClassHeap::new();
        heap.add_class(ClassScope::Global, "shared");
        heap.add_class(ClassScope::Global, "shared");
        heap.global.remove("shared");
        assert!(heap.is_defined("shared"));
        heap.global.remove("shared");
        assert!(!heap.is_defined("shared"));
    }
}
