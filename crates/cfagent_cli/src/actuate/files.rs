// SPDX-License-Identifier: Apache-2.0

//! `files` promises whose `edit_line` attribute names an `edit_line`
//! bundle: resolving the referenced bundle's sections into a
//! [`cfagent_editline::EditOperation`] list and running them to a fixed point against the
//! promiser path.

use super::{body_bool, body_scalar, compile, resolve_body_ref};
use crate::error::CliError;
use cfagent_editline::delete::DeleteSpec;
use cfagent_editline::fields::{FieldOp, FieldSpec};
use cfagent_editline::filters::LineFilters;
use cfagent_editline::insert::{InsertLocation, InsertSpec, InsertType, Placement};
use cfagent_editline::region::RegionSpec;
use cfagent_editline::replace::{Occurrences, ReplaceSpec};
use cfagent_editline::whitespace::WhitespacePolicy;
use cfagent_editline::EditOperation;
use cfagent_eval::context::EvalContext;
use cfagent_expander::expand::{ConcretePromise, Expansion};
use cfagent_model::value::RightValue;
use cfagent_model::{BundleId, Policy};

/// The (invented, not part of `cfagent_model::syntax`'s promise-attribute
/// tables since those only describe promise-type vocabularies, not
/// body-internal ones) slist attribute on an `edit_line`-typed body
/// naming the `edit_line`-bundle-type bundles it runs, in order — the
/// natural generalization of CFEngine's `edit_line => default:my_bundle`
/// body-attribute convention to a list of bundles run in sequence.
const EDIT_BUNDLES_ATTR: &str = "edit_bundles";

fn scalar_attr<'c>(concrete: &'c ConcretePromise, lval: &str) -> Option<&'c str> {
    concrete.constraint(lval).and_then(RightValue::as_scalar)
}

fn list_attr(concrete: &ConcretePromise, lval: &str) -> Option<Vec<String>> {
    concrete
        .constraint(lval)
        .and_then(RightValue::as_list)
        .map(|items| items.iter().filter_map(RightValue::as_scalar).map(str::to_owned).collect())
}

fn whitespace_policy_of(word: &str) -> Option<WhitespacePolicy> {
    match word.trim() {
        "exact_match" => Some(WhitespacePolicy::ExactMatch),
        "ignore_leading_whitespace" => Some(WhitespacePolicy::IgnoreLeading),
        "ignore_trailing_whitespace" => Some(WhitespacePolicy::IgnoreTrailing),
        "ignore_embedded_whitespace" => Some(WhitespacePolicy::IgnoreEmbedded),
        _ => None,
    }
}

/// Collects the `edit_line`-bundle-type bundle names an `edit_line`-typed
/// body names via [`EDIT_BUNDLES_ATTR`].
fn edit_bundle_names(policy: &Policy, ctx: &EvalContext<'_>, body_id: cfagent_model::BodyId) -> Vec<String> {
    let Some(constraint) = policy.body_constraint(body_id, EDIT_BUNDLES_ATTR) else {
        return Vec::new();
    };
    match &constraint.rval {
        RightValue::List(items) => items
            .iter()
            .filter_map(RightValue::as_scalar)
            .map(|s| cfagent_expander::expand::expand_scalar(s, &Default::default(), ctx))
            .collect(),
        RightValue::Scalar(s) => vec![cfagent_expander::expand::expand_scalar(s, &Default::default(), ctx)],
        _ => Vec::new(),
    }
}

fn build_region_spec(
    policy: &Policy,
    ctx: &EvalContext<'_>,
    namespace: &str,
    concrete: &ConcretePromise,
    promise_type: &str,
) -> Result<RegionSpec, CliError> {
    let Some(body_id) = resolve_body_ref(policy, namespace, concrete, promise_type, "select_region", "edit_region") else {
        return Ok(RegionSpec::whole_file());
    };
    let select_start = body_scalar(policy, ctx, body_id, "select_start")
        .map(|s| compile(&s))
        .transpose()?;
    let select_end = body_scalar(policy, ctx, body_id, "select_end")
        .map(|s| compile(&s))
        .transpose()?;
    Ok(RegionSpec {
        select_start,
        select_end,
        include_start: body_bool(policy, ctx, body_id, "include_start", true),
        include_end: body_bool(policy, ctx, body_id, "include_end", true),
        select_end_match_eof: body_bool(policy, ctx, body_id, "select_end_match_eof", false),
    })
}

fn build_line_filters(concrete: &ConcretePromise) -> Result<LineFilters, CliError> {
    let match_list = |lval: &str| -> Result<Option<Vec<regex::Regex>>, CliError> {
        match list_attr(concrete, lval) {
            Some(patterns) => Ok(Some(patterns.iter().map(|p| compile(p)).collect::<Result<Vec<_>, _>>()?)),
            None => Ok(None),
        }
    };

    Ok(LineFilters {
        select_line_matching: scalar_attr(concrete, "select_line_matching").map(compile).transpose()?,
        not_matching: scalar_attr(concrete, "not_matching").map(compile).transpose()?,
        startwith_from_list: list_attr(concrete, "startwith_from_list"),
        not_startwith_from_list: list_attr(concrete, "not_startwith_from_list"),
        match_from_list: match_list("match_from_list")?,
        not_match_from_list: match_list("not_match_from_list")?,
        contains_from_list: list_attr(concrete, "contains_from_list"),
        not_contains_from_list: list_attr(concrete, "not_contains_from_list"),
    })
}

fn build_delete_spec(concrete: &ConcretePromise) -> Result<DeleteSpec, CliError> {
    let filters = build_line_filters(concrete)?;
    if concrete.promiser.contains('\n') {
        let block = concrete
            .promiser
            .split('\n')
            .map(compile)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(DeleteSpec { filters, block: Some(block) });
    }

    let mut filters = filters;
    if filters.select_line_matching.is_none() {
        filters.select_line_matching = Some(compile(&concrete.promiser)?);
    }
    Ok(DeleteSpec { filters, block: None })
}

fn build_replace_spec(concrete: &ConcretePromise) -> Result<ReplaceSpec, CliError> {
    let pattern = compile(&concrete.promiser)?;
    let replacement = scalar_attr(concrete, "replace_value").unwrap_or("").to_owned();
    let occurrences = match scalar_attr(concrete, "occurrences") {
        Some("first") => Occurrences::First,
        _ => Occurrences::All,
    };
    Ok(ReplaceSpec { pattern, replacement, occurrences })
}

fn build_field_spec(concrete: &ConcretePromise) -> Result<FieldSpec, CliError> {
    let line_matching = compile(&concrete.promiser)?;
    let field_separator = compile(scalar_attr(concrete, "field_separator").unwrap_or(":"))?;
    let select_field: usize = scalar_attr(concrete, "select_field")
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| CliError::InvalidAttribute {
            promiser: concrete.promiser.clone(),
            lval: "select_field",
            reason: "must be a positive integer".to_owned(),
        })?;
    let value_separator = scalar_attr(concrete, "value_separator").and_then(|s| s.chars().next());
    let value = scalar_attr(concrete, "field_value").unwrap_or("").to_owned();
    let operation = match scalar_attr(concrete, "field_operation") {
        Some("delete") => FieldOp::Delete(value),
        Some("prepend") => FieldOp::Prepend(value),
        Some("append") => FieldOp::Append(value),
        Some("alphanum") => FieldOp::Alphanum(value),
        _ => FieldOp::Set(value),
    };
    Ok(FieldSpec {
        line_matching,
        field_separator,
        select_field,
        extend_columns: scalar_attr(concrete, "extend_columns") == Some("true"),
        value_separator,
        operation,
    })
}

fn build_insert_location(
    policy: &Policy,
    ctx: &EvalContext<'_>,
    namespace: &str,
    concrete: &ConcretePromise,
) -> Result<InsertLocation, CliError> {
    let Some(body_id) = resolve_body_ref(policy, namespace, concrete, "insert_lines", "location", "location") else {
        return Ok(InsertLocation::default());
    };
    let anchor = body_scalar(policy, ctx, body_id, "select_line_matching")
        .map(|s| compile(&s))
        .transpose()?;
    let placement = match body_scalar(policy, ctx, body_id, "before_after").as_deref() {
        Some("after") => Some(Placement::After),
        Some("before") => Some(Placement::Before),
        _ => None,
    };
    Ok(InsertLocation { anchor, pick: None, placement })
}

fn build_insert_spec(
    policy: &Policy,
    ctx: &EvalContext<'_>,
    namespace: &str,
    concrete: &ConcretePromise,
) -> Result<InsertSpec, CliError> {
    let content: Vec<String> = concrete.promiser.split('\n').map(str::to_owned).collect();
    let insert_type = match scalar_attr(concrete, "insert_type") {
        Some("preserve_all_lines") => InsertType::PreserveAllLines,
        Some("preserve_block") => InsertType::PreserveBlock,
        Some("file") => InsertType::File,
        Some("file_preserve_block") => InsertType::FilePreserveBlock,
        _ => InsertType::Literal,
    };
    let whitespace = scalar_attr(concrete, "insert_match")
        .map(|s| s.split(',').filter_map(whitespace_policy_of).collect())
        .unwrap_or_default();
    Ok(InsertSpec {
        content,
        insert_type,
        location: build_insert_location(policy, ctx, namespace, concrete)?,
        whitespace,
        filters: build_line_filters(concrete)?,
    })
}

/// Builds the full `edit_line`-bundle operation list, in section-then-
/// promise order, for every section type this crate actuates.
pub fn build_edit_operations(
    policy: &Policy,
    ctx: &mut EvalContext<'_>,
    bundle_id: BundleId,
) -> Result<Vec<EditOperation>, CliError> {
    let namespace = policy.bundle(bundle_id).namespace.clone();
    ctx.push_bundle_frame(bundle_id);

    let mut ops = Vec::new();
    for section_id in policy.bundle(bundle_id).all_sections() {
        let section = policy.section(section_id);
        let promise_type = section.promise_type.clone();
        for &promise_id in &section.promises {
            let promise = policy.promise(promise_id);
            if !ctx.is_defined_class(&promise.class_guard).unwrap_or(false) {
                continue;
            }
            for concrete in Expansion::new(policy, ctx, promise_id) {
                let region = build_region_spec(policy, ctx, &namespace, &concrete, &promise_type)?;
                let op = match promise_type.as_str() {
                    "delete_lines" => EditOperation::DeleteLines { region, spec: build_delete_spec(&concrete)? },
                    "field_edits" => EditOperation::FieldEdits { region, spec: build_field_spec(&concrete)? },
                    "insert_lines" => {
                        EditOperation::InsertLines { region, spec: build_insert_spec(policy, ctx, &namespace, &concrete)? }
                    }
                    "replace_patterns" => EditOperation::ReplacePatterns { region, spec: build_replace_spec(&concrete)? },
                    _ => continue,
                };
                ops.push(op);
            }
        }
    }

    ctx.pop_bundle_frame();
    Ok(ops)
}

/// Resolves every bundle named by an `edit_line` body's [`EDIT_BUNDLES_ATTR`]
/// into its combined operation list.
pub fn build_operations_for_edit_line_body(
    policy: &Policy,
    ctx: &mut EvalContext<'_>,
    namespace: &str,
    body_id: cfagent_model::BodyId,
) -> Result<Vec<EditOperation>, CliError> {
    let mut ops = Vec::new();
    for name in edit_bundle_names(policy, ctx, body_id) {
        let Some(bundle_id) = policy.lookup_bundle(namespace, "edit_line", &name) else {
            continue;
        };
        ops.append(&mut build_edit_operations(policy, ctx, bundle_id)?);
    }
    Ok(ops)
}
