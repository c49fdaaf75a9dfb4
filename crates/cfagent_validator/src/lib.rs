// SPDX-License-Identifier: Apache-2.0

//! The semantic validation passes, run over a fully parsed
//! [`cfagent_model::Policy`] before it is handed to the evaluator.

pub mod error;
pub mod passes;

pub use error::ValidationError;

use cfagent_common::result::Outcome;
use cfagent_model::Policy;

/// Runs every validation pass and returns the complete, ordered list of
/// errors found — a clean [`Policy`] produces an empty list, not an error
/// of its own, since validation never changes the policy value.
pub fn validate(policy: &Policy) -> Outcome<(), ValidationError> {
    let mut errors = Vec::new();
    errors.extend(passes::check_reserved_bundle_names(policy));
    errors.extend(passes::check_duplicate_bundles(policy));
    errors.extend(passes::check_duplicate_bodies(policy));
    errors.extend(passes::check_constraints(policy));
    errors.extend(passes::check_custom_promise_type_attributes(policy));
    errors.extend(passes::check_required_comments(policy));
    errors.extend(passes::check_duplicate_handles(policy));
    Outcome::with_non_fatal_errors((), errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfagent_model::ids::ConstraintParent;
    use cfagent_model::{Body, Bundle, BundleSection, Constraint, Promise, RightValue};

    #[test]
    fn clean_policy_validates_without_errors() {
        let mut policy = Policy::new();
        let bundle_id = policy.append_bundle(Bundle::new("agent", "main"));
        let section_id = policy.append_section(bundle_id, BundleSection::new("files", bundle_id));
        policy.append_promise(section_id, Promise::new("/etc/motd", section_id));

        let outcome = validate(&policy);
        match outcome {
            Outcome::Ok((), errors) => assert!(errors.is_empty()),
            Outcome::Err(e) => panic!("unexpected fatal error: {e}"),
        }
    }

    #[test]
    fn reserved_bundle_name_is_flagged() {
        let mut policy = Policy::new();
        policy.append_bundle(Bundle::new("agent", "sys"));

        let Outcome::Ok((), errors) = validate(&policy) else {
            panic!("expected Ok with non-fatal errors")
        };
        assert!(matches!(errors[0], ValidationError::ReservedBundleName { .. }));
    }

    #[test]
    fn duplicate_bundle_is_flagged_but_file_body_duplicates_are_allowed() {
        let mut policy = Policy::new();
        policy.append_bundle(Bundle::new("agent", "main"));
        policy.append_bundle(Bundle::new("agent", "main"));
        policy.append_body(Body::new("file", "shared"));
        policy.append_body(Body::new("file", "shared"));

        let Outcome::Ok((), errors) = validate(&policy) else {
            panic!("expected Ok with non-fatal errors")
        };
        assert_eq!(errors.iter().filter(|e| matches!(e, ValidationError::DuplicateBundle { .. })).count(), 1);
        assert!(!errors.iter().any(|e| matches!(e, ValidationError::DuplicateBody { .. })));
    }

    #[test]
    fn unknown_attribute_and_undefined_body_reference_are_flagged() {
        let mut policy = Policy::new();
        let bundle_id = policy.append_bundle(Bundle::new("agent", "main"));
        let section_id = policy.append_section(bundle_id, BundleSection::new("files", bundle_id));
        let promise_id = policy.append_promise(section_id, Promise::new("/etc/motd", section_id));
        let parent = ConstraintParent::Promise(promise_id);

        policy.add_promise_constraint(
            promise_id,
            Constraint::new("not_a_real_attribute", RightValue::scalar("x"), parent),
        );
        policy.add_promise_constraint(
            promise_id,
            Constraint::new("perms", RightValue::scalar("missing_body"), parent).with_references_body(true),
        );

        let Outcome::Ok((), errors) = validate(&policy) else {
            panic!("expected Ok with non-fatal errors")
        };
        assert!(errors.iter().any(|e| matches!(e, ValidationError::UnknownAttribute { .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::UndefinedBodyReference { .. })));
    }

    #[test]
    fn forbidden_attribute_on_custom_promise_type_is_flagged() {
        let mut policy = Policy::new();
        let bundle_id = policy.append_bundle(Bundle::new("agent", "main"));
        let section_id = policy.append_section(bundle_id, BundleSection::new("my_custom_type", bundle_id));
        let promise_id = policy.append_promise(section_id, Promise::new("thing", section_id));
        let parent = ConstraintParent::Promise(promise_id);
        policy.add_promise_constraint(promise_id, Constraint::new("ifvarclass", RightValue::scalar("linux"), parent));

        let Outcome::Ok((), errors) = validate(&policy) else {
            panic!("expected Ok with non-fatal errors")
        };
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::ForbiddenCustomPromiseTypeAttribute { .. })));
    }
}
