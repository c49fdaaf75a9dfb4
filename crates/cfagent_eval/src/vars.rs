// SPDX-License-Identifier: Apache-2.0

//! Variable tables keyed by (scope, namespace, name).

use cfagent_model::RightValue;
use std::collections::HashMap;

/// The named scopes enumerates, plus one per active bundle frame (`Bundle(name)`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Host facts.
    Sys,
    /// Global constants.
    Const,
    /// Scratch variables for edit bundles.
    Edit,
    /// The current promise context.
    This,
    /// Regex match captures from the last successful match.
    Match,
    /// An active bundle frame, named by bundle name.
    Bundle(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct VarKey {
    scope: Scope,
    namespace: String,
    name: String,
}

/// The variable table for one [`crate::context::EvalContext`].
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    values: HashMap<(Scope, String, String), RightValue>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, scope: Scope, namespace: impl Into<String>, name: impl Into<String>, value: RightValue) {
        self.values.insert((scope, namespace.into(), name.into()), value);
    }

    pub fn get(&self, scope: &Scope, namespace: &str, name: &str) -> Option<&RightValue> {
        self.values.get(&(scope.clone(), namespace.to_owned(), name.to_owned()))
    }

    /// Removes every variable belonging to `scope`; used when a frame pops.
    pub fn clear_scope(&mut self, scope: &Scope) {
        self.values.retain(|(s, _, _), _| s != scope);
    }

    /// Resolves `qualified`, a name that may be plain (`"name"`), bundle-
    /// qualified (`"bundle.name"`), or fully namespace-qualified
    /// (`"ns:bundle.name"`), following the lookup order from: explicit scope qualifier →
    /// current bundle → global (`const`).
    pub fn resolve(&self, qualified: &str, current_namespace: &str, current_bundle: &str) -> Option<&RightValue> {
        let (namespace, rest) = match qualified.split_once(':') {
            Some((ns, rest)) => (ns, rest),
            None => (current_namespace, qualified),
        };
        if let Some((bundle, name)) = rest.split_once('.') {
            let scope = match bundle {
                "sys" => Scope::Sys,
                "const" => Scope::Const,
                "edit" => Scope::Edit,
                "this" => Scope::This,
                "match" => Scope::Match,
                other => Scope::Bundle(other.to_owned()),
            };
            if let Some(v) = self.get(&scope, namespace, name) {
                return Some(v);
            }
        }
        let name = rest.rsplit('.').next().unwrap_or(rest);
        self.get(&Scope::Bundle(current_bundle.to_owned()), namespace, name)
            .or_else(|| self.get(&Scope::Const, namespace, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_qualified_lookup_takes_priority_over_global() {
        let mut t = VariableTable::new();
        t.set(Scope::Const, "default", "x", RightValue::scalar("global"));
        t.set(Scope::Bundle("main".into()), "default", "x", RightValue::scalar("local"));

        assert_eq!(
            t.resolve("main.x", "default", "main"),
            Some(&RightValue::scalar("local"))
        );
    }

    #[test]
    fn unqualified_lookup_falls_back_to_global() {
        let mut t = VariableTable::new();
        t.set(Scope::Const, "default", "x", RightValue::scalar("global"));
        assert_eq!(t.resolve("x", "default", "main"), Some(&RightValue::scalar("global")));
    }

    #[test]
    fn clear_scope_drops_only_that_scopes_variables() {
        let mut t = VariableTable::new();
        t.set(Scope::This, "default", "x", RightValue::scalar("a"));
        t.set(Scope::Const, "default", "y", RightValue::scalar("b"));
        t.clear_scope(&Scope::This);
        assert!(t.get(&Scope::This, "default", "x").is_none());
        assert!(t.get(&Scope::Const, "default", "y").is_some());
    }
}
