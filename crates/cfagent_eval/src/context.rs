// SPDX-License-Identifier: Apache-2.0

//! `EvalContext`: the per-agent-run singleton threaded through every
//! actuator.

use crate::classalgebra::{self, ClassExprError};
use crate::classes::{ClassHeap, ClassScope};
use crate::frames::{Frame, FrameStack};
use crate::vars::{Scope, VariableTable};
use cfagent_model::{BundleId, Policy, PromiseId, RightValue, SectionId};

/// The default namespace every bundle starts in absent an explicit
/// `namespace` declaration.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Evaluation state for one agent run, scoped to the lifetime of the
/// [`Policy`] it was built from.
pub struct EvalContext<'p> {
    policy: &'p Policy,
    pub classes: ClassHeap,
    pub vars: VariableTable,
    frames: FrameStack,
    namespace_stack: Vec<String>,
    /// Regex match captures from the last successful match.
    pub match_captures: Vec<String>,
    abort: bool,
}

impl<'p> EvalContext<'p> {
    /// Builds a fresh context over `policy`, with the default namespace on
    /// the namespace stack and no frames pushed.
    pub fn new(policy: &'p Policy) -> Self {
        Self {
            policy,
            classes: ClassHeap::new(),
            vars: VariableTable::new(),
            frames: FrameStack::new(),
            namespace_stack: vec![DEFAULT_NAMESPACE.to_owned()],
            match_captures: Vec::new(),
            abort: false,
        }
    }

    pub fn policy(&self) -> &'p Policy {
        self.policy
    }

    pub fn current_namespace(&self) -> &str {
        self.namespace_stack.last().map(String::as_str).unwrap_or(DEFAULT_NAMESPACE)
    }

    fn current_bundle_name(&self) -> &str {
        match self.frames.current_bundle() {
            Some(id) => &self.policy.bundle(id).name,
            None => "",
        }
    }

    /// Pushes a bundle frame: its namespace onto the namespace stack, and
    /// resets the bundle-local class heap.
    pub fn push_bundle_frame(&mut self, bundle_id: BundleId) {
        self.classes.clear_bundle_local();
        self.namespace_stack.push(self.policy.bundle(bundle_id).namespace.clone());
        self.frames.push(Frame::Bundle(bundle_id));
    }

    pub fn pop_bundle_frame(&mut self) {
        if matches!(self.frames.top(), Some(Frame::Bundle(_))) {
            self.frames.pop();
            self.namespace_stack.pop();
        }
    }

    pub fn push_section_frame(&mut self, section_id: SectionId) {
        self.frames.push(Frame::Section(section_id));
    }

    pub fn pop_section_frame(&mut self) {
        if matches!(self.frames.top(), Some(Frame::Section(_))) {
            self.frames.pop();
        }
    }

    /// Pushes a promise frame and clears the `this`-scoped variables left
    /// over from a sibling promise.
    pub fn push_promise_frame(&mut self, promise_id: PromiseId) {
        self.vars.clear_scope(&Scope::This);
        self.frames.push(Frame::Promise(promise_id));
    }

    pub fn pop_promise_frame(&mut self) {
        if matches!(self.frames.top(), Some(Frame::Promise(_))) {
            self.frames.pop();
        }
        self.vars.clear_scope(&Scope::This);
    }

    /// Pushes a private-class context, used while expanding one promise.
    pub fn push_private_class_frame(&mut self) {
        self.classes.push_private_frame();
        self.frames.push(Frame::PrivateClass);
    }

    pub fn pop_private_class_frame(&mut self) {
        if matches!(self.frames.top(), Some(Frame::PrivateClass)) {
            self.frames.pop();
            self.classes.pop_private_frame();
        }
    }

    /// `AddClass(name)`, writing to the active heap implied by the current frame: bundle-local
    /// while a bundle frame is active, global otherwise.
    pub fn add_class(&mut self, name: impl Into<String>) {
        let scope = if self.frames.current_bundle().is_some() {
            ClassScope::Bundle
        } else {
            ClassScope::Global
        };
        self.classes.add_class(scope, name);
    }

    /// `Abort`: sets the abort flag, observed at loop boundaries.
    pub fn abort(&mut self) {
        self.abort = true;
    }

    pub fn is_aborted(&self) -> bool {
        self.abort
    }

    /// `IsDefinedClass`: parses and evaluates a class guard expression
    /// against the current heap state.
    pub fn is_defined_class(&self, expr: &str) -> Result<bool, ClassExprError> {
        classalgebra::is_defined_class(expr, &self.classes)
    }

    /// Resolves a (possibly qualified) variable reference against the
    /// current namespace and bundle.
    pub fn resolve_var(&self, qualified: &str) -> Option<&RightValue> {
        self.vars.resolve(qualified, self.current_namespace(), self.current_bundle_name())
    }

    pub fn set_var(&mut self, scope: Scope, name: impl Into<String>, value: RightValue) {
        let namespace = self.current_namespace().to_owned();
        self.vars.set(scope, namespace, name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfagent_model::Bundle;

    #[test]
    fn bundle_frame_switches_namespace_and_restores_on_pop() {
        let mut policy = Policy::new();
        let mut b = Bundle::new("agent", "main");
        b.namespace = "custom".to_owned();
        let bundle_id = policy.append_bundle(b);

        let mut ctx = EvalContext::new(&policy);
        assert_eq!(ctx.current_namespace(), DEFAULT_NAMESPACE);
        ctx.push_bundle_frame(bundle_id);
        assert_eq!(ctx.current_namespace(), "custom");
        ctx.pop_bundle_frame();
        assert_eq!(ctx.current_namespace(), DEFAULT_NAMESPACE);
    }

    #[test]
    fn add_class_targets_bundle_local_heap_while_bundle_frame_active() {
        let mut policy = Policy::new();
        let bundle_id = policy.append_bundle(Bundle::new("agent", "main"));
        let mut ctx = EvalContext::new(&policy);

        ctx.push_bundle_frame(bundle_id);
        ctx.add_class("in_bundle");
        assert!(ctx.is_defined_class("in_bundle").unwrap());
        ctx.pop_bundle_frame();
        assert!(!ctx.is_defined_class("in_bundle").unwrap());
    }

    #[test]
    fn abort_flag_is_observable() {
        let policy = Policy::new();
        let mut ctx = EvalContext::new(&policy);
        assert!(!ctx.is_aborted());
        ctx.abort();
        assert!(ctx.is_aborted());
    }
}
