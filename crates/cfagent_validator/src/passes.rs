// SPDX-License-Identifier: Apache-2.0

//! The individual validation passes from, each returning the errors it found;
//! [`crate::validate`] runs all of them and merges the results.

use crate::error::ValidationError;
use cfagent_model::syntax::{self, DataType, CUSTOM_PROMISE_TYPE_FORBIDDEN_ATTRIBUTES};
use cfagent_model::{Bundle, Policy, RightValue};
use std::collections::HashMap;

/// *Bundle name reservation*: names in the reserved set are forbidden.
pub fn check_reserved_bundle_names(policy: &Policy) -> Vec<ValidationError> {
    policy
        .bundles()
        .filter(|(_, b)| Bundle::is_reserved_name(&b.name))
        .map(|(_, b)| ValidationError::ReservedBundleName {
            name: b.name.clone(),
            loc: b.loc.clone(),
        })
        .collect()
}

/// *Duplicate bundle/body*: flagged except bodies of type `"file"`.
pub fn check_duplicate_bundles(policy: &Policy) -> Vec<ValidationError> {
    let mut first_seen: HashMap<(String, String, String), cfagent_common::loc::SourceLoc> = HashMap::new();
    let mut errors = Vec::new();
    for (_, bundle) in policy.bundles() {
        let key = (bundle.namespace.clone(), bundle.bundle_type.clone(), bundle.name.clone());
        match first_seen.get(&key) {
            Some(first_loc) => errors.push(ValidationError::DuplicateBundle {
                namespace: bundle.namespace.clone(),
                bundle_type: bundle.bundle_type.clone(),
                name: bundle.name.clone(),
                loc: bundle.loc.clone(),
                first_loc: first_loc.clone(),
            }),
            None => {
                first_seen.insert(key, bundle.loc.clone());
            }
        }
    }
    errors
}

pub fn check_duplicate_bodies(policy: &Policy) -> Vec<ValidationError> {
    let mut first_seen: HashMap<(String, String, String), cfagent_common::loc::SourceLoc> = HashMap::new();
    let mut errors = Vec::new();
    for (_, body) in policy.bodies() {
        if body.allows_duplicates() {
            continue;
        }
        let key = (body.namespace.clone(), body.body_type.clone(), body.name.clone());
        match first_seen.get(&key) {
            Some(first_loc) => errors.push(ValidationError::DuplicateBody {
                namespace: body.namespace.clone(),
                body_type: body.body_type.clone(),
                name: body.name.clone(),
                loc: body.loc.clone(),
                first_loc: first_loc.clone(),
            }),
            None => {
                first_seen.insert(key, body.loc.clone());
            }
        }
    }
    errors
}

fn matches_data_type(dt: DataType, rval: &RightValue) -> bool {
    if matches!(rval, RightValue::FunctionCall(_)) {
        // Function calls are accepted everywhere; validated again after
        // expansion, once their result is known.
        return true;
    }
    match dt {
        DataType::List => matches!(rval, RightValue::List(_)),
        DataType::Container => matches!(rval, RightValue::Container(_)),
        DataType::Scalar | DataType::Boolean | DataType::BodyReference(_) => {
            matches!(rval, RightValue::Scalar(_))
        }
    }
}

/// *Constraint type check* and *undefined bodies*, run together since both
/// walk every constraint of every promise.
pub fn check_constraints(policy: &Policy) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (_, bundle) in policy.bundles() {
        for section_id in bundle.all_sections() {
            let section = policy.section(section_id);
            let promise_type = &section.promise_type;
            for &promise_id in &section.promises {
                let promise = policy.promise(promise_id);
                for &constraint_id in &promise.constraints {
                    let constraint = policy.constraint(constraint_id);
                    if !syntax::is_known_attribute(promise_type, &constraint.lval) {
                        errors.push(ValidationError::UnknownAttribute {
                            promise_type: promise_type.clone(),
                            lval: constraint.lval.clone(),
                            loc: constraint.loc.clone(),
                        });
                        continue;
                    }
                    let Some(dt) = syntax::data_type_of(promise_type, &constraint.lval) else {
                        continue;
                    };
                    if !matches_data_type(dt, &constraint.rval) {
                        errors.push(ValidationError::AttributeTypeMismatch {
                            promise_type: promise_type.clone(),
                            lval: constraint.lval.clone(),
                            loc: constraint.loc.clone(),
                        });
                        continue;
                    }
                    if let (DataType::BodyReference(body_type), Some(name)) =
                        (dt, constraint.rval.as_scalar().filter(|_| constraint.references_body))
                    {
                        if policy.lookup_body(&bundle.namespace, body_type, name).is_none() {
                            errors.push(ValidationError::UndefinedBodyReference {
                                lval: constraint.lval.clone(),
                                body_type: body_type.to_owned(),
                                name: name.to_owned(),
                                loc: constraint.loc.clone(),
                            });
                        }
                    }
                }
            }
        }
    }
    errors
}

/// *Custom promise type*: if a promise's type is not in the syntax tables,
/// the migration-path attributes are forbidden on it.
pub fn check_custom_promise_type_attributes(policy: &Policy) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (_, bundle) in policy.bundles() {
        for section_id in bundle.all_sections() {
            let section = policy.section(section_id);
            if syntax::attributes_for_promise_type(&section.promise_type).is_some() {
                continue;
            }
            for &promise_id in &section.promises {
                let promise = policy.promise(promise_id);
                for &constraint_id in &promise.constraints {
                    let constraint = policy.constraint(constraint_id);
                    if CUSTOM_PROMISE_TYPE_FORBIDDEN_ATTRIBUTES.contains(&constraint.lval.as_str()) {
                        errors.push(ValidationError::ForbiddenCustomPromiseTypeAttribute {
                            promise_type: section.promise_type.clone(),
                            lval: constraint.lval.clone(),
                            loc: constraint.loc.clone(),
                        });
                    }
                }
            }
        }
    }
    errors
}

/// *Required comments*: active only if `common control.require_comments`
/// is the scalar `"true"`.
pub fn check_required_comments(policy: &Policy) -> Vec<ValidationError> {
    let require_comments = policy
        .lookup_body("default", "control", "common")
        .and_then(|id| policy.body_constraint(id, "require_comments"))
        .and_then(|c| c.rval.as_scalar())
        .map(|v| v == "true")
        .unwrap_or(false);

    if !require_comments {
        return Vec::new();
    }

    let mut errors = Vec::new();
    for (_, bundle) in policy.bundles() {
        for section_id in bundle.all_sections() {
            let section = policy.section(section_id);
            for &promise_id in &section.promises {
                let promise = policy.promise(promise_id);
                if promise.comment.is_none() {
                    errors.push(ValidationError::MissingRequiredComment { loc: promise.loc.clone() });
                }
            }
        }
    }
    errors
}

/// *Duplicate handles*: within a policy, no two promises may share the
/// same `handle` when their class guards are string-identical. Handles
/// containing unexpanded variable references are excluded.
pub fn check_duplicate_handles(policy: &Policy) -> Vec<ValidationError> {
    let mut first_seen: HashMap<(String, String), cfagent_common::loc::SourceLoc> = HashMap::new();
    let mut errors = Vec::new();
    for (_, bundle) in policy.bundles() {
        for section_id in bundle.all_sections() {
            let section = policy.section(section_id);
            for &promise_id in &section.promises {
                let promise = policy.promise(promise_id);
                let Some(handle_constraint) = policy.promise_constraint(promise_id, "handle") else {
                    continue;
                };
                let Some(handle) = handle_constraint.rval.as_scalar() else {
                    continue;
                };
                if handle.contains("$(") || handle.contains("${") {
                    continue;
                }
                let key = (handle.to_owned(), promise.class_guard.clone());
                match first_seen.get(&key) {
                    Some(first_loc) => errors.push(ValidationError::DuplicateHandle {
                        handle: handle.to_owned(),
                        loc: promise.loc.clone(),
                        first_loc: first_loc.clone(),
                    }),
                    None => {
                        first_seen.insert(key, promise.loc.clone());
                    }
                }
            }
        }
    }
    errors
}
