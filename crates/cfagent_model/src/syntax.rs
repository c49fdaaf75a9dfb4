// SPDX-License-Identifier: Apache-2.0

//! Static description of known promise types, their attributes, data
//! types, and which bundle types may contain them.
//!
//! Expressed as data (`once_cell::sync::Lazy` tables) rather than inline
//! `match` arms, since the tables are large and declarative and the
//! promise-type vocabulary is much bigger than one enum can comfortably
//! hold.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// The declared data type of a constraint's right-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// A scalar string (function calls are also accepted here, validated
    /// again after expansion once their result is known).
    Scalar,
    /// A list of right-values.
    List,
    /// A boolean-ish scalar (`"true"`/`"false"`).
    Boolean,
    /// A reference to a body of the given body type.
    BodyReference(&'static str),
    /// An arbitrary JSON container.
    Container,
}

/// One attribute a promise-type or body-type may carry.
#[derive(Debug, Clone, Copy)]
pub struct AttributeDef {
    /// The attribute (`lval`) name.
    pub name: &'static str,
    /// Its declared data type.
    pub data_type: DataType,
}

/// Attributes valid on every promise regardless of type.
pub static COMMON_ATTRIBUTES: &[&str] = &[
    "comment",
    "handle",
    "depends_on",
    "action",
    "if",
    "unless",
    "ifvarclass",
    "meta",
];

/// `promise_type -> attributes declared for that section type`.
static PROMISE_TYPE_ATTRIBUTES: Lazy<HashMap<&'static str, Vec<AttributeDef>>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, Vec<AttributeDef>> = HashMap::new();
    m.insert(
        "files",
        vec![
            AttributeDef { name: "create", data_type: DataType::Boolean },
            AttributeDef { name: "perms", data_type: DataType::BodyReference("perms") },
            AttributeDef { name: "edit_line", data_type: DataType::BodyReference("edit_line") },
            AttributeDef { name: "edit_xml", data_type: DataType::BodyReference("edit_xml") },
            AttributeDef { name: "copy_from", data_type: DataType::BodyReference("copy_from") },
            AttributeDef { name: "depth_search", data_type: DataType::BodyReference("depth_search") },
            AttributeDef { name: "file_select", data_type: DataType::BodyReference("file_select") },
            AttributeDef { name: "changes", data_type: DataType::BodyReference("changes") },
            AttributeDef { name: "delete", data_type: DataType::BodyReference("delete") },
        ],
    );
    m.insert(
        "packages",
        vec![
            AttributeDef { name: "package_policy", data_type: DataType::Scalar },
            AttributeDef { name: "package_method", data_type: DataType::BodyReference("package_module") },
            AttributeDef { name: "version", data_type: DataType::Scalar },
            AttributeDef { name: "architecture", data_type: DataType::Scalar },
        ],
    );
    m.insert(
        "vars",
        vec![
            AttributeDef { name: "string", data_type: DataType::Scalar },
            AttributeDef { name: "int", data_type: DataType::Scalar },
            AttributeDef { name: "real", data_type: DataType::Scalar },
            AttributeDef { name: "slist", data_type: DataType::List },
            AttributeDef { name: "data", data_type: DataType::Container },
        ],
    );
    m.insert(
        "classes",
        vec![
            AttributeDef { name: "expression", data_type: DataType::Scalar },
            AttributeDef { name: "and", data_type: DataType::List },
            AttributeDef { name: "or", data_type: DataType::List },
            AttributeDef { name: "not", data_type: DataType::Scalar },
            AttributeDef { name: "persistence", data_type: DataType::Scalar },
        ],
    );
    m.insert(
        "commands",
        vec![
            AttributeDef { name: "args", data_type: DataType::Scalar },
            AttributeDef { name: "contain", data_type: DataType::BodyReference("exec_contain") },
        ],
    );
    m.insert(
        "methods",
        vec![AttributeDef { name: "usebundle", data_type: DataType::Scalar }],
    );
    m.insert(
        "processes",
        vec![
            AttributeDef { name: "process_count", data_type: DataType::BodyReference("process_count") },
            AttributeDef { name: "restart_class", data_type: DataType::Scalar },
        ],
    );
    m.insert(
        "reports",
        vec![AttributeDef { name: "friend_pattern", data_type: DataType::Scalar }],
    );
    // Edit-line section types.
    m.insert(
        "insert_lines",
        vec![
            AttributeDef { name: "insert_type", data_type: DataType::Scalar },
            AttributeDef { name: "location", data_type: DataType::BodyReference("location") },
            AttributeDef { name: "select_line_matching", data_type: DataType::Scalar },
            AttributeDef { name: "insert_match", data_type: DataType::Scalar },
            AttributeDef { name: "select_region", data_type: DataType::BodyReference("edit_region") },
            AttributeDef { name: "not_matching", data_type: DataType::Scalar },
            AttributeDef { name: "startwith_from_list", data_type: DataType::List },
            AttributeDef { name: "not_startwith_from_list", data_type: DataType::List },
            AttributeDef { name: "match_from_list", data_type: DataType::List },
            AttributeDef { name: "not_match_from_list", data_type: DataType::List },
            AttributeDef { name: "contains_from_list", data_type: DataType::List },
            AttributeDef { name: "not_contains_from_list", data_type: DataType::List },
        ],
    );
    m.insert(
        "delete_lines",
        vec![
            AttributeDef { name: "select_region", data_type: DataType::BodyReference("edit_region") },
            AttributeDef { name: "not_matching", data_type: DataType::Scalar },
        ],
    );
    m.insert(
        "replace_patterns",
        vec![
            AttributeDef { name: "replace_value", data_type: DataType::Scalar },
            AttributeDef { name: "occurrences", data_type: DataType::Scalar },
            AttributeDef { name: "select_region", data_type: DataType::BodyReference("edit_region") },
        ],
    );
    m.insert(
        "field_edits",
        vec![
            AttributeDef { name: "select_field", data_type: DataType::Scalar },
            AttributeDef { name: "value_separator", data_type: DataType::Scalar },
            AttributeDef { name: "field_separator", data_type: DataType::Scalar },
            AttributeDef { name: "field_value", data_type: DataType::Scalar },
            AttributeDef { name: "field_operation", data_type: DataType::Scalar },
            AttributeDef { name: "extend_columns", data_type: DataType::Boolean },
            AttributeDef { name: "allow_blank_fields", data_type: DataType::Boolean },
        ],
    );
    m
});

/// `bundle_type -> promise types valid within a bundle of that type`.
static BUNDLE_SECTION_TYPES: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(
        "agent",
        vec![
            "files", "packages", "vars", "classes", "commands", "methods", "processes",
            "services", "reports",
        ],
    );
    m.insert(
        "edit_line",
        vec![
            "vars",
            "classes",
            "delete_lines",
            "field_edits",
            "insert_lines",
            "replace_patterns",
            "reports",
        ],
    );
    m.insert("edit_xml", vec!["vars", "classes", "build_xpath", "reports"]);
    m.insert("server", vec!["vars", "classes", "access_rules", "roles"]);
    m.insert("monitor", vec!["vars", "classes", "measurements"]);
    m.insert("knowledge", vec!["vars", "classes", "topics", "things", "inferences"]);
    m
});

/// Known body types, for the "undefined bodies" validation pass.
pub static KNOWN_BODY_TYPES: &[&str] = &[
    "perms",
    "edit_line",
    "edit_xml",
    "copy_from",
    "depth_search",
    "file_select",
    "changes",
    "delete",
    "package_module",
    "exec_contain",
    "process_count",
    "location",
    "edit_region",
    "file",
];

/// Returns the attribute table for a promise type, or `None` if the
/// promise type is unknown to the syntax tables (a custom promise type).
pub fn attributes_for_promise_type(promise_type: &str) -> Option<&'static [AttributeDef]> {
    PROMISE_TYPE_ATTRIBUTES.get(promise_type).map(Vec::as_slice)
}

/// Returns the set of promise types valid within a bundle of the given
/// type, or `None` if the bundle type is unknown.
pub fn promise_types_for_bundle_type(bundle_type: &str) -> Option<&'static [&'static str]> {
    BUNDLE_SECTION_TYPES.get(bundle_type).map(Vec::as_slice)
}

/// True if `lval` is declared for `promise_type`, or is one of the common
/// attributes valid on every promise.
pub fn is_known_attribute(promise_type: &str, lval: &str) -> bool {
    if COMMON_ATTRIBUTES.contains(&lval) {
        return true;
    }
    match attributes_for_promise_type(promise_type) {
        Some(attrs) => attrs.iter().any(|a| a.name == lval),
        // Unknown (custom) promise types accept any attribute; the
        // custom-promise-type validation pass restricts the small set of
        // forbidden attributes separately.
        None => true,
    }
}

/// Looks up the declared [`DataType`] of `lval` within `promise_type`.
/// Returns `None` if the attribute is not declared (unknown promise type,
/// or an attribute not in its table — including the common attributes,
/// which have no single data type).
pub fn data_type_of(promise_type: &str, lval: &str) -> Option<DataType> {
    attributes_for_promise_type(promise_type)?
        .iter()
        .find(|a| a.name == lval)
        .map(|a| a.data_type)
}

/// Attributes forbidden on a custom promise type.
pub static CUSTOM_PROMISE_TYPE_FORBIDDEN_ATTRIBUTES: &[&str] =
    &["ifvarclass", "action_policy", "expireafter", "meta"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_attributes_are_known_everywhere() {
        assert!(is_known_attribute("files", "comment"));
        assert!(is_known_attribute("totally_custom", "comment"));
    }

    #[test]
    fn files_perms_is_a_body_reference() {
        assert_eq!(
            data_type_of("files", "perms"),
            Some(DataType::BodyReference("perms"))
        );
    }

    #[test]
    fn edit_line_bundle_type_excludes_insert_lines_free_standing_section_order() {
        let types = promise_types_for_bundle_type("edit_line").expect("known bundle type");
        assert!(types.contains(&"insert_lines"));
        assert!(!types.contains(&"files"));
    }
}
