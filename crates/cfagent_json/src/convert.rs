// SPDX-License-Identifier: Apache-2.0

//! `Policy <-> JsonPolicy` conversions.

use crate::error::JsonBridgeError;
use crate::schema::{
    JsonAttribute, JsonBody, JsonBundle, JsonContext, JsonPolicy, JsonPromise, JsonPromiseType,
    JsonRightValue,
};
use cfagent_common::result::Outcome;
use cfagent_model::bundle::Bundle;
use cfagent_model::body::Body;
use cfagent_model::constraint::Constraint;
use cfagent_model::ids::{BodyId, BundleId, ConstraintParent};
use cfagent_model::promise::{BundleSection, Promise};
use cfagent_model::value::{FunctionCall, RightValue};
use cfagent_model::Policy;

/// Serializes `policy` to its wire form. Infallible: every in-memory policy
/// has a representable JSON mirror.
pub fn to_json(policy: &Policy) -> JsonPolicy {
    JsonPolicy {
        bundles: policy.bundles().map(|(id, _)| bundle_to_json(policy, id)).collect(),
        bodies: policy.bodies().map(|(id, _)| body_to_json(policy, id)).collect(),
    }
}

fn bundle_to_json(policy: &Policy, id: BundleId) -> JsonBundle {
    let bundle = policy.bundle(id);
    JsonBundle {
        name: bundle.name.clone(),
        namespace: bundle.namespace.clone(),
        bundle_type: bundle.bundle_type.clone(),
        source_path: bundle.source_path.to_string(),
        line: bundle.loc.line,
        arguments: bundle.args.clone(),
        promise_types: bundle
            .all_sections()
            .map(|section_id| {
                let section = policy.section(section_id);
                JsonPromiseType {
                    name: section.promise_type.clone(),
                    line: section.loc.line,
                    contexts: group_by_context(policy, &section.promises),
                }
            })
            .collect(),
    }
}

/// Groups a section's promises by class-guard expression, in order of first
/// appearance, so re-expanded copies of the same promise stay adjacent on
/// the wire.
fn group_by_context(policy: &Policy, promise_ids: &[cfagent_model::ids::PromiseId]) -> Vec<JsonContext> {
    let mut contexts: Vec<JsonContext> = Vec::new();
    for &promise_id in promise_ids {
        let promise = policy.promise(promise_id);
        let slot = contexts.iter().position(|c| c.name == promise.class_guard);
        let json_promise = promise_to_json(policy, promise_id);
        match slot {
            Some(i) => contexts[i].promises.push(json_promise),
            None => contexts.push(JsonContext {
                name: promise.class_guard.clone(),
                promises: vec![json_promise],
            }),
        }
    }
    contexts
}

fn promise_to_json(policy: &Policy, id: cfagent_model::ids::PromiseId) -> JsonPromise {
    let promise = policy.promise(id);
    JsonPromise {
        promiser: promise.promiser.clone(),
        promisee: promise.promisee.as_ref().map(|v| rightvalue_to_json(v, false)),
        line: promise.loc.line,
        attributes: promise
            .constraints
            .iter()
            .map(|&cid| constraint_to_json(policy.constraint(cid)))
            .collect(),
    }
}

fn body_to_json(policy: &Policy, id: BodyId) -> JsonBody {
    let body = policy.body(id);
    JsonBody {
        name: body.name.clone(),
        namespace: body.namespace.clone(),
        body_type: body.body_type.clone(),
        source_path: body.source_path.to_string(),
        line: body.loc.line,
        arguments: body.args.clone(),
        attributes: body
            .constraints
            .iter()
            .map(|&cid| constraint_to_json(policy.constraint(cid)))
            .collect(),
    }
}

fn constraint_to_json(constraint: &Constraint) -> JsonAttribute {
    JsonAttribute {
        lval: constraint.lval.clone(),
        rval: rightvalue_to_json(&constraint.rval, constraint.references_body),
        line: constraint.loc.line,
    }
}

fn rightvalue_to_json(rval: &RightValue, references_body: bool) -> JsonRightValue {
    match rval {
        RightValue::Scalar(s) if references_body => JsonRightValue::Symbol { name: s.clone() },
        RightValue::Scalar(s) => JsonRightValue::String { value: s.clone() },
        RightValue::List(items) => JsonRightValue::List {
            value: items.iter().map(|v| rightvalue_to_json(v, false)).collect(),
        },
        RightValue::FunctionCall(call) => JsonRightValue::FunctionCall {
            name: call.name.clone(),
            arguments: call.args.iter().map(|v| rightvalue_to_json(v, false)).collect(),
        },
        RightValue::Container(json) => JsonRightValue::Container { value: json.clone() },
    }
}

/// Reconstructs a [`Policy`] from its wire form. Non-fatal errors are
/// attached to bodies referenced by a `symbol` right-value that this
/// document never declares; the policy is still built, body resolution is
/// the validator's job.
pub fn from_json(doc: &JsonPolicy) -> Outcome<Policy, JsonBridgeError> {
    let mut policy = Policy::new();
    let mut errors = Vec::new();

    for json_body in &doc.bodies {
        let body_id = policy.append_body(Body {
            namespace: json_body.namespace.clone(),
            body_type: json_body.body_type.clone(),
            name: json_body.name.clone(),
            args: json_body.arguments.clone(),
            constraints: Vec::new(),
            source_path: std::sync::Arc::from(json_body.source_path.as_str()),
            loc: cfagent_common::loc::SourceLoc::new(json_body.source_path.clone(), json_body.line, 0),
            is_custom: !cfagent_model::syntax::KNOWN_BODY_TYPES.contains(&json_body.body_type.as_str()),
        });
        for attr in &json_body.attributes {
            let constraint = attribute_to_constraint(attr, ConstraintParent::Body(body_id), &json_body.source_path, &mut errors);
            policy.add_body_constraint(body_id, constraint);
        }
    }

    for json_bundle in &doc.bundles {
        let bundle_id = policy.append_bundle(Bundle {
            namespace: json_bundle.namespace.clone(),
            bundle_type: json_bundle.bundle_type.clone(),
            name: json_bundle.name.clone(),
            args: json_bundle.arguments.clone(),
            source_path: std::sync::Arc::from(json_bundle.source_path.as_str()),
            loc: cfagent_common::loc::SourceLoc::new(json_bundle.source_path.clone(), json_bundle.line, 0),
            builtin_sections: Vec::new(),
            custom_sections: Vec::new(),
        });

        for json_type in &json_bundle.promise_types {
            let section_id = policy.append_section(bundle_id, BundleSection::new(json_type.name.clone(), bundle_id));
            policy.section_mut(section_id).loc =
                cfagent_common::loc::SourceLoc::new(json_bundle.source_path.clone(), json_type.line, 0);

            for context in &json_type.contexts {
                for json_promise in &context.promises {
                    let mut promise = Promise::new(json_promise.promiser.clone(), section_id);
                    promise.class_guard = context.name.clone();
                    promise.promisee = json_promise.promisee.as_ref().map(|v| json_to_rightvalue(v));
                    promise.loc = cfagent_common::loc::SourceLoc::new(json_bundle.source_path.clone(), json_promise.line, 0);
                    let promise_id = policy.append_promise(section_id, promise);

                    for attr in &json_promise.attributes {
                        let constraint = attribute_to_constraint(
                            attr,
                            ConstraintParent::Promise(promise_id),
                            &json_bundle.source_path,
                            &mut errors,
                        );
                        policy.add_promise_constraint(promise_id, constraint);
                    }
                }
            }
        }
    }

    Outcome::with_non_fatal_errors(policy, errors)
}

fn attribute_to_constraint(
    attr: &JsonAttribute,
    parent: ConstraintParent,
    source_path: &str,
    errors: &mut Vec<JsonBridgeError>,
) -> Constraint {
    let references_body = matches!(attr.rval, JsonRightValue::Symbol { .. });
    if references_body {
        if let JsonRightValue::Symbol { name } = &attr.rval {
            if name.is_empty() {
                errors.push(JsonBridgeError::UndefinedBodyReference {
                    lval: attr.lval.clone(),
                    name: name.clone(),
                });
            }
        }
    }
    let _ = source_path;
    Constraint::new(attr.lval.clone(), json_to_rightvalue(&attr.rval), parent)
        .with_references_body(references_body)
        .with_loc(cfagent_common::loc::SourceLoc::new(source_path, attr.line, 0))
}

fn json_to_rightvalue(rval: &JsonRightValue) -> RightValue {
    match rval {
        JsonRightValue::String { value } => RightValue::Scalar(value.clone()),
        JsonRightValue::Symbol { name } => RightValue::Scalar(name.clone()),
        JsonRightValue::List { value } => RightValue::List(value.iter().map(json_to_rightvalue).collect()),
        JsonRightValue::FunctionCall { name, arguments } => RightValue::FunctionCall(FunctionCall {
            name: name.clone(),
            args: arguments.iter().map(json_to_rightvalue).collect(),
        }),
        JsonRightValue::Container { value } => RightValue::Container(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfagent_model::ids::{BundleId, SectionId};

    fn sample_policy() -> Policy {
        let mut p = Policy::new();
        let body_id = p.append_body(Body::new("perms", "secure"));
        let bundle_id = p.append_bundle(Bundle::new("agent", "main"));
        let section_id = p.append_section(bundle_id, BundleSection::new("files", bundle_id));
        let promise_id = p.append_promise(section_id, Promise::new("/etc/motd", section_id));

        let parent = ConstraintParent::Promise(promise_id);
        p.add_promise_constraint(
            promise_id,
            Constraint::new("perms", RightValue::scalar("secure"), parent).with_references_body(true),
        );
        p.add_promise_constraint(
            promise_id,
            Constraint::new("comment", RightValue::scalar("hello"), parent),
        );
        p.add_promise_constraint(
            promise_id,
            Constraint::new(
                "depends_on",
                RightValue::List(vec![RightValue::scalar("a"), RightValue::scalar("b")]),
                parent,
            ),
        );
        let _ = body_id;
        p
    }

    #[test]
    fn symbol_right_value_round_trips_distinct_from_a_string() {
        let policy = sample_policy();
        let doc = to_json(&policy);
        let promise = &doc.bundles[0].promise_types[0].contexts[0].promises[0];
        let perms_attr = promise.attributes.iter().find(|a| a.lval == "perms").unwrap();
        assert!(matches!(perms_attr.rval, JsonRightValue::Symbol { .. }));
        let comment_attr = promise.attributes.iter().find(|a| a.lval == "comment").unwrap();
        assert!(matches!(comment_attr.rval, JsonRightValue::String { .. }));

        let rebuilt = from_json(&doc).into_result().expect("no fatal error");
        let rebuilt_promise_id = rebuilt.promise(cfagent_model::ids::PromiseId(0));
        let rebuilt_constraint = rebuilt
            .promise_constraint(cfagent_model::ids::PromiseId(0), "perms")
            .unwrap();
        assert!(rebuilt_constraint.references_body);
        assert_eq!(rebuilt_constraint.rval, RightValue::scalar("secure"));
        let _ = rebuilt_promise_id;
    }

    #[test]
    fn list_valued_attribute_round_trips() {
        let policy = sample_policy();
        let doc = to_json(&policy);
        let rebuilt = from_json(&doc).into_result().expect("no fatal error");
        let constraint = rebuilt
            .promise_constraint(cfagent_model::ids::PromiseId(0), "depends_on")
            .unwrap();
        assert_eq!(
            constraint.rval,
            RightValue::List(vec![RightValue::scalar("a"), RightValue::scalar("b")])
        );
    }

    #[test]
    fn promises_sharing_a_class_guard_group_into_one_context() {
        let mut p = Policy::new();
        let bundle_id = p.append_bundle(Bundle::new("agent", "main"));
        let section_id = p.append_section(bundle_id, BundleSection::new("files", bundle_id));
        let mut promise_a = Promise::new("/a", section_id);
        promise_a.class_guard = "linux".to_owned();
        let mut promise_b = Promise::new("/b", section_id);
        promise_b.class_guard = "linux".to_owned();
        let mut promise_c = Promise::new("/c", section_id);
        promise_c.class_guard = "windows".to_owned();
        p.append_promise(section_id, promise_a);
        p.append_promise(section_id, promise_b);
        p.append_promise(section_id, promise_c);

        let doc = to_json(&p);
        let contexts = &doc.bundles[0].promise_types[0].contexts;
        assert_eq!(contexts.len(), 2);
        assert_eq!(contexts[0].name, "linux");
        assert_eq!(contexts[0].promises.len(), 2);
        assert_eq!(contexts[1].name, "windows");
        assert_eq!(contexts[1].promises.len(), 1);
        let _ = BundleId(0);
        let _ = SectionId(0);
    }
}
