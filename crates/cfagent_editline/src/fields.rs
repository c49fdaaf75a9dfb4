// SPDX-License-Identifier: Apache-2.0

//! `field_edits` actuation.

use crate::error::EditLineError;
use crate::region::Region;
use cfagent_common::outcome::PromiseOutcome;
use regex::Regex;

/// An operation on the sub-list produced by splitting a field on
/// `value_separator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOp {
    Set(String),
    Delete(String),
    Prepend(String),
    /// Idempotent sort-insert: inserts the value in sorted position if
    /// absent, otherwise leaves the sub-list untouched.
    Alphanum(String),
    Append(String),
}

/// One `field_edits` promise, fully resolved.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Only lines matching this pattern are edited.
    pub line_matching: Regex,
    /// The separator that splits a line into fields.
    pub field_separator: Regex,
    /// 1-based field index to operate on.
    pub select_field: usize,
    /// If `select_field` is out of range, pad the row with empty fields
    /// up to the requested index rather than failing.
    pub extend_columns: bool,
    /// If set, the selected field is itself split on this character
    /// into a sub-list before `operation` is applied.
    pub value_separator: Option<char>,
    pub operation: FieldOp,
}

/// Applies `spec` to every line in `region` that matches
/// `spec.line_matching`, returning the worst outcome across lines
/// touched.
pub fn field_edits(lines: &mut [String], region: Region, spec: &FieldSpec) -> Result<PromiseOutcome, EditLineError> {
    let mut worst = PromiseOutcome::Noop;
    for line in &mut lines[region.start..region.end] {
        if !spec.line_matching.is_match(line) {
            continue;
        }
        let outcome = edit_line(line, spec)?;
        worst = worst.max(outcome);
    }
    Ok(worst)
}

fn edit_line(line: &mut String, spec: &FieldSpec) -> Result<PromiseOutcome, EditLineError> {
    let mut fields: Vec<String> = spec.field_separator.split(line).map(str::to_owned).collect();

    if spec.select_field == 0 {
        return Err(EditLineError::FieldOutOfRange {
            field: spec.select_field,
            len: fields.len(),
        });
    }
    let idx = spec.select_field - 1;

    if idx >= fields.len() {
        if !spec.extend_columns {
            return Err(EditLineError::FieldOutOfRange {
                field: spec.select_field,
                len: fields.len(),
            });
        }
        fields.resize(idx + 1, String::new());
    }

    let before = fields[idx].clone();
    fields[idx] = apply_field_op(&fields[idx], spec);

    if fields[idx] == before {
        return Ok(PromiseOutcome::Noop);
    }

    let sep = separator_literal(&spec.field_separator);
    *line = fields.join(&sep);
    Ok(PromiseOutcome::Change)
}

fn apply_field_op(field: &str, spec: &FieldSpec) -> String {
    let Some(sep) = spec.value_separator else {
        return match &spec.operation {
            FieldOp::Set(v) | FieldOp::Prepend(v) | FieldOp::Append(v) | FieldOp::Alphanum(v) => v.clone(),
            FieldOp::Delete(_) => String::new(),
        };
    };

    let mut items: Vec<String> = if field.is_empty() {
        Vec::new()
    } else {
        field.split(sep).map(str::to_owned).collect()
    };

    match &spec.operation {
        FieldOp::Set(v) => items = vec![v.clone()],
        FieldOp::Delete(v) => items.retain(|item| item != v),
        FieldOp::Prepend(v) => {
            if !items.iter().any(|item| item == v) {
                items.insert(0, v.clone());
            }
        }
        FieldOp::Append(v) => {
            if !items.iter().any(|item| item == v) {
                items.push(v.clone());
            }
        }
        FieldOp::Alphanum(v) => {
            if !items.iter().any(|item| item == v) {
                let at = items.partition_point(|item| item.as_str() < v.as_str());
                items.insert(at, v.clone());
            }
        }
    }

    items.join(&sep.to_string())
}

fn separator_literal(re: &Regex) -> String {
    // `field_separator` is conventionally a plain character or short
    // literal string (e.g. `:` in S4); reuse its source text verbatim
    // when rejoining fields.
    re.as_str().to_owned()
}
