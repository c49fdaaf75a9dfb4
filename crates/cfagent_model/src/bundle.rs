// SPDX-License-Identifier: Apache-2.0

//! Bundles: named, typed, scoped units of policy.

use crate::ids::SectionId;
use cfagent_common::loc::SourceLoc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Bundle names reserved by the engine.
pub const RESERVED_BUNDLE_NAMES: [&str; 6] = ["sys", "const", "mon", "edit", "match", "this"];

/// The fixed set of bundle types the engine understands.
pub const BUNDLE_TYPES: [&str; 6] = [
    "agent", "edit_line", "edit_xml", "server", "monitor", "knowledge",
];

/// A named, scoped unit of policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    /// The bundle's namespace (default `"default"`).
    pub namespace: String,
    /// The bundle type, one of [`BUNDLE_TYPES`].
    pub bundle_type: String,
    /// The bundle name.
    pub name: String,
    /// Formal arguments, in declaration order.
    pub args: Vec<String>,
    /// Path of the source file this bundle was parsed from.
    pub source_path: Arc<str>,
    /// Where this bundle was declared.
    pub loc: SourceLoc,
    /// Built-in-type sections, in append order.
    pub builtin_sections: Vec<SectionId>,
    /// Custom-promise-type sections, in append order.
    pub custom_sections: Vec<SectionId>,
}

impl Bundle {
    /// Builds a new bundle in the `"default"` namespace with no sections.
    pub fn new(bundle_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: "default".to_owned(),
            bundle_type: bundle_type.into(),
            name: name.into(),
            args: Vec::new(),
            source_path: Arc::from(""),
            loc: SourceLoc::synthetic(),
            builtin_sections: Vec::new(),
            custom_sections: Vec::new(),
        }
    }

    /// The (namespace, type, name) triple bundles of a built-in type must
    /// be unique on.
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.namespace, &self.bundle_type, &self.name)
    }

    /// True if `name` is reserved and cannot be used as a bundle name.
    pub fn is_reserved_name(name: &str) -> bool {
        RESERVED_BUNDLE_NAMES.contains(&name)
    }

    /// All section ids, built-in then custom, in append order.
    pub fn all_sections(&self) -> impl Iterator<Item = SectionId> + '_ {
        self.builtin_sections
            .iter()
            .chain(self.custom_sections.iter())
            .copied()
    }
}
