// SPDX-License-Identifier: Apache-2.0

//! Variable/function expansion and the Cartesian-product iteration over a
//! promise's list-valued constraints.

use cfagent_eval::context::EvalContext;
use cfagent_model::ids::PromiseId;
use cfagent_model::value::{FunctionCall, RightValue};
use cfagent_model::Policy;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// One constraint on a [`ConcretePromise`], its right-value fully expanded.
#[derive(Debug, Clone)]
pub struct ConcreteConstraint {
    pub lval: String,
    pub rval: RightValue,
    pub class_guard: String,
}

/// A single expanded instance of a promise: every `$(var)` reference
/// resolved, every list-valued constraint bound to one tuple element of
/// the Cartesian product.
#[derive(Debug, Clone)]
pub struct ConcretePromise {
    pub promiser: String,
    pub promisee: Option<RightValue>,
    pub class_guard: String,
    pub constraints: Vec<ConcreteConstraint>,
    /// The [`PromiseId`] this instance was expanded from.
    pub original: PromiseId,
}

impl ConcretePromise {
    /// The expanded right-value of `lval`, if this instance carries a
    /// constraint with that name.
    pub fn constraint(&self, lval: &str) -> Option<&RightValue> {
        self.constraints.iter().find(|c| c.lval == lval).map(|c| &c.rval)
    }
}

static VAR_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$[({]([A-Za-z0-9_.:\[\]]+)[)}]").unwrap());

fn scalar_repr(v: &RightValue) -> String {
    match v {
        RightValue::Scalar(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Expands every `$(name)`/`${name}` reference in `s`: first against the
/// loop-local bindings for this expansion tuple, then against the
/// [`EvalContext`]'s variable table. An unresolved reference is left in
/// place, matching the reference implementation's tolerance of
/// not-yet-defined variables across convergence passes.
pub fn expand_scalar(s: &str, local: &HashMap<String, RightValue>, ctx: &EvalContext<'_>) -> String {
    VAR_REF
        .replace_all(s, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            if let Some(v) = local.get(name) {
                scalar_repr(v)
            } else if let Some(v) = ctx.resolve_var(name) {
                scalar_repr(v)
            } else {
                caps[0].to_owned()
            }
        })
        .into_owned()
}

/// Recursively expands a right-value: scalars are variable-substituted,
/// lists and function-call arguments are expanded element-wise, and JSON
/// containers pass through unchanged.
pub fn expand_rvalue(v: &RightValue, local: &HashMap<String, RightValue>, ctx: &EvalContext<'_>) -> RightValue {
    match v {
        RightValue::Scalar(s) => RightValue::Scalar(expand_scalar(s, local, ctx)),
        RightValue::List(items) => RightValue::List(items.iter().map(|i| expand_rvalue(i, local, ctx)).collect()),
        RightValue::FunctionCall(call) => RightValue::FunctionCall(FunctionCall {
            name: call.name.clone(),
            args: call.args.iter().map(|a| expand_rvalue(a, local, ctx)).collect(),
        }),
        RightValue::Container(json) => RightValue::Container(json.clone()),
    }
}

/// A lazy iterator over the concrete promises produced by expanding one
/// promise: the Cartesian product of its list-valued constraints, each
/// tuple element bound under its constraint's `lval` while the promiser,
/// promisee, and every constraint's right-value are re-expanded.
pub struct Expansion<'p> {
    policy: &'p Policy,
    ctx: &'p EvalContext<'p>,
    promise_id: PromiseId,
    iterable_lvals: Vec<String>,
    combos: itertools::MultiProduct<std::vec::IntoIter<RightValue>>,
}

impl<'p> Expansion<'p> {
    /// Builds the expansion iterator for `promise_id`. A promise with no
    /// list-valued constraints yields exactly one concrete instance (the
    /// Cartesian product of zero factors is the single empty tuple).
    pub fn new(policy: &'p Policy, ctx: &'p EvalContext<'p>, promise_id: PromiseId) -> Self {
        let promise = policy.promise(promise_id);
        let mut iterable_lvals = Vec::new();
        let mut factors: Vec<Vec<RightValue>> = Vec::new();
        for &cid in &promise.constraints {
            let c = policy.constraint(cid);
            if let Some(items) = c.rval.as_list() {
                iterable_lvals.push(c.lval.clone());
                factors.push(items.to_vec());
            }
        }
        let combos = factors.into_iter().multi_cartesian_product();
        Self {
            policy,
            ctx,
            promise_id,
            iterable_lvals,
            combos,
        }
    }
}

impl<'p> Iterator for Expansion<'p> {
    type Item = ConcretePromise;

    fn next(&mut self) -> Option<ConcretePromise> {
        let combo = self.combos.next()?;
        let local: HashMap<String, RightValue> =
            self.iterable_lvals.iter().cloned().zip(combo).collect();

        let promise = self.policy.promise(self.promise_id);
        let promiser = expand_scalar(&promise.promiser, &local, self.ctx);
        let promisee = promise.promisee.as_ref().map(|rv| expand_rvalue(rv, &local, self.ctx));
        let class_guard = expand_scalar(&promise.class_guard, &local, self.ctx);
        let constraints = promise
            .constraints
            .iter()
            .map(|&cid| {
                let c = self.policy.constraint(cid);
                ConcreteConstraint {
                    lval: c.lval.clone(),
                    rval: expand_rvalue(&c.rval, &local, self.ctx),
                    class_guard: c.class_guard.clone(),
                }
            })
            .collect();

        Some(ConcretePromise {
            promiser,
            promisee,
            class_guard,
            constraints,
            original: self.promise_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfagent_eval::vars::Scope;
    use cfagent_model::ids::ConstraintParent;
    use cfagent_model::{Bundle, BundleSection, Constraint, Promise};

    fn build_policy_with_list_constraint() -> (Policy, PromiseId) {
        let mut policy = Policy::new();
        let bundle_id = policy.append_bundle(Bundle::new("agent", "main"));
        let section_id = policy.append_section(bundle_id, BundleSection::new("files", bundle_id));
        let promise_id = policy.append_promise(section_id, Promise::new("/etc/$(name)", section_id));
        let parent = ConstraintParent::Promise(promise_id);
        policy.add_promise_constraint(
            promise_id,
            Constraint::new(
                "name",
                RightValue::List(vec![RightValue::scalar("a"), RightValue::scalar("b")]),
                parent,
            ),
        );
        (policy, promise_id)
    }

    #[test]
    fn expand_scalar_substitutes_from_local_bindings_first() {
        let policy = Policy::new();
        let ctx = EvalContext::new(&policy);
        let mut local = HashMap::new();
        local.insert("x".to_owned(), RightValue::scalar("bound"));
        assert_eq!(expand_scalar("/etc/$(x)", &local, &ctx), "/etc/bound");
    }

    #[test]
    fn expand_scalar_falls_back_to_context_then_leaves_unresolved() {
        let policy = Policy::new();
        let mut ctx = EvalContext::new(&policy);
        ctx.set_var(Scope::Const, "y", RightValue::scalar("ctxval"));
        let local = HashMap::new();
        assert_eq!(expand_scalar("$(y)", &local, &ctx), "ctxval");
        assert_eq!(expand_scalar("$(missing)", &local, &ctx), "$(missing)");
    }

    #[test]
    fn promise_with_no_list_constraint_yields_exactly_one_instance() {
        let mut policy = Policy::new();
        let bundle_id = policy.append_bundle(Bundle::new("agent", "main"));
        let section_id = policy.append_section(bundle_id, BundleSection::new("files", bundle_id));
        let promise_id = policy.append_promise(section_id, Promise::new("/etc/motd", section_id));

        let ctx = EvalContext::new(&policy);
        let instances: Vec<_> = Expansion::new(&policy, &ctx, promise_id).collect();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].promiser, "/etc/motd");
    }

    #[test]
    fn list_valued_constraint_drives_cartesian_expansion() {
        let (policy, promise_id) = build_policy_with_list_constraint();
        let ctx = EvalContext::new(&policy);
        let instances: Vec<_> = Expansion::new(&policy, &ctx, promise_id).collect();
        let mut promisers: Vec<_> = instances.iter().map(|p| p.promiser.clone()).collect();
        promisers.sort();
        assert_eq!(promisers, vec!["/etc/a".to_owned(), "/etc/b".to_owned()]);
    }
}
