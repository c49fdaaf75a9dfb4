// SPDX-License-Identifier: Apache-2.0

//! Line-oriented text editing for `edit_line` bundles. This crate owns the four line-mutating
//! promise kinds of an `edit_line` bundle — `delete_lines`, `field_edits`, `insert_lines`,
//! `replace_patterns` — plus the supporting region/whitespace/filter machinery they share. It
//! knows nothing about the policy model or evaluation context; callers resolve variables and
//! class guards first and hand this crate fully-resolved specs to apply to an [`EditFile`].

pub mod delete;
pub mod editfile;
pub mod error;
pub mod fields;
pub mod filters;
pub mod insert;
pub mod region;
pub mod replace;
pub mod template;
pub mod whitespace;

pub use editfile::{EditFile, LineEnding, SaveOutcome};
pub use error::EditLineError;
pub use region::{Region, RegionSpec};

use cfagent_common::outcome::PromiseOutcome;
use delete::DeleteSpec;
use fields::FieldSpec;
use insert::InsertSpec;
use replace::ReplaceSpec;

/// The maximum number of times a section's full promise list is
/// re-applied before giving up on reaching a fixed point.
pub const MAX_PASSES: usize = 10;

/// One promise in the edit-line section order this crate is
/// responsible for. `vars`, `classes`, and `reports` sections are
/// evaluated by the caller against the bundle's [`cfagent_eval`]
/// context and are not represented here.
#[derive(Debug, Clone)]
pub enum EditOperation {
    DeleteLines { region: RegionSpec, spec: DeleteSpec },
    FieldEdits { region: RegionSpec, spec: FieldSpec },
    InsertLines { region: RegionSpec, spec: InsertSpec },
    ReplacePatterns { region: RegionSpec, spec: ReplaceSpec },
}

impl EditOperation {
    fn region_spec(&self) -> &RegionSpec {
        match self {
            EditOperation::DeleteLines { region, .. }
            | EditOperation::FieldEdits { region, .. }
            | EditOperation::InsertLines { region, .. }
            | EditOperation::ReplacePatterns { region, .. } => region,
        }
    }

    fn apply(&self, lines: &mut Vec<String>) -> Result<PromiseOutcome, EditLineError> {
        let region = region::select_region(lines, self.region_spec())?;
        match self {
            EditOperation::DeleteLines { spec, .. } => delete::delete_lines(lines, region, spec),
            EditOperation::FieldEdits { spec, .. } => fields::field_edits(lines, region, spec),
            EditOperation::InsertLines { spec, .. } => insert::insert_lines(lines, region, spec),
            EditOperation::ReplacePatterns { spec, .. } => replace::replace_patterns(lines, region, spec),
        }
    }
}

/// Applies every operation in `ops`, in the order given, to `file`'s
/// lines. One "pass" is one pass over the whole list; the whole list is
/// re-applied until a pass makes no further change or [`MAX_PASSES`] is
/// reached, matching the fixed-point convergence loop `edit_line`
/// bundles run under.
pub fn run_passes(file: &mut EditFile, ops: &[EditOperation]) -> Result<PromiseOutcome, EditLineError> {
    let mut worst = PromiseOutcome::Noop;
    let mut errors = Vec::new();

    for _ in 0..MAX_PASSES {
        let mut pass_changed = false;
        for op in ops {
            match op.apply(file.lines_mut()) {
                Ok(outcome) => {
                    if outcome == PromiseOutcome::Change {
                        pass_changed = true;
                    }
                    worst = worst.max(outcome);
                }
                Err(err) => errors.push(err),
            }
        }
        if !pass_changed {
            break;
        }
    }

    if !errors.is_empty() {
        return Err(EditLineError::Compound(errors));
    }
    Ok(worst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filters::LineFilters;
    use regex::Regex;

    #[test]
    fn fixed_point_loop_converges_after_dependent_passes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("f");
        std::fs::write(&path, "keep\nold\n").expect("write");

        let mut file = EditFile::load(&path).expect("load");

        let delete = EditOperation::DeleteLines {
            region: RegionSpec::whole_file(),
            spec: DeleteSpec {
                filters: LineFilters {
                    select_line_matching: Some(Regex::new("^old$").unwrap()),
                    ..Default::default()
                },
                block: None,
            },
        };
        let insert = EditOperation::InsertLines {
            region: RegionSpec::whole_file(),
            spec: InsertSpec {
                content: vec!["new".to_owned()],
                insert_type: insert::InsertType::Literal,
                location: insert::InsertLocation::default(),
                whitespace: vec![],
                filters: LineFilters::default(),
            },
        };

        let outcome = run_passes(&mut file, &[delete, insert]).expect("run_passes");
        assert_eq!(outcome, PromiseOutcome::Change);
        assert_eq!(file.lines(), ["keep", "new"]);

        let second_outcome = run_passes(&mut file, &[
            EditOperation::DeleteLines {
                region: RegionSpec::whole_file(),
                spec: DeleteSpec {
                    filters: LineFilters {
                        select_line_matching: Some(Regex::new("^old$").unwrap()),
                        ..Default::default()
                    },
                    block: None,
                },
            },
            EditOperation::InsertLines {
                region: RegionSpec::whole_file(),
                spec: InsertSpec {
                    content: vec!["new".to_owned()],
                    insert_type: insert::InsertType::Literal,
                    location: insert::InsertLocation::default(),
                    whitespace: vec![],
                    filters: LineFilters::default(),
                },
            },
        ])
        .expect("run_passes idempotent");
        assert_eq!(second_outcome, PromiseOutcome::Noop);
    }
}
