// SPDX-License-Identifier: Apache-2.0

//! `insert_lines` actuation.

use crate::error::EditLineError;
use crate::filters::LineFilters;
use crate::region::Region;
use crate::whitespace::{self, WhitespacePolicy};
use cfagent_common::outcome::PromiseOutcome;
use regex::Regex;

/// `insert_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertType {
    /// A single line, or several lines each tested and inserted
    /// independently.
    Literal,
    /// Every line of a multi-line promiser, each tested and inserted
    /// independently.
    PreserveAllLines,
    /// A multi-line promiser tested and inserted as one atomic block.
    PreserveBlock,
    /// Content sourced from an external file, tested/inserted line by
    /// line.
    File,
    /// Content sourced from an external file, tested/inserted as one
    /// atomic block.
    FilePreserveBlock,
}

impl InsertType {
    fn is_block_mode(self) -> bool {
        matches!(self, InsertType::PreserveBlock | InsertType::FilePreserveBlock)
    }
}

/// Where to place new content relative to an anchor, or the region
/// boundary when no anchor is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    After,
}

/// Which occurrence of the anchor to use when more than one line matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorPick {
    First,
    Last,
}

/// The `location` body attribute.
#[derive(Debug, Clone, Default)]
pub struct InsertLocation {
    pub anchor: Option<Regex>,
    pub pick: Option<AnchorPick>,
    pub placement: Option<Placement>,
}

/// One `insert_lines` promise, fully resolved (variables already
/// expanded).
#[derive(Debug, Clone)]
pub struct InsertSpec {
    pub content: Vec<String>,
    pub insert_type: InsertType,
    pub location: InsertLocation,
    pub whitespace: Vec<WhitespacePolicy>,
    pub filters: LineFilters,
}

/// Runs one `insert_lines` promise against `lines`, restricted to
/// `region`. Mutates `lines` in place and returns the outcome.
pub fn insert_lines(
    lines: &mut Vec<String>,
    region: Region,
    spec: &InsertSpec,
) -> Result<PromiseOutcome, EditLineError> {
    spec.filters.validate()?;

    if lines.is_empty() {
        // An empty file is unconditionally prepended to.
        let existing = std::mem::take(lines);
        *lines = spec.content.clone();
        let _ = existing;
        return Ok(PromiseOutcome::Change);
    }

    if spec.insert_type.is_block_mode() {
        insert_block(lines, region, spec)
    } else {
        insert_each_line(lines, region, spec)
    }
}

fn insert_block(lines: &mut Vec<String>, region: Region, spec: &InsertSpec) -> Result<PromiseOutcome, EditLineError> {
    if block_present(&lines[region.start..region.end], &spec.content, &spec.whitespace)? {
        return Ok(PromiseOutcome::Noop);
    }
    let at = resolve_anchor(lines, region, spec)?;
    lines.splice(at..at, spec.content.iter().cloned());
    Ok(PromiseOutcome::Change)
}

fn insert_each_line(
    lines: &mut Vec<String>,
    region: Region,
    spec: &InsertSpec,
) -> Result<PromiseOutcome, EditLineError> {
    let mut missing = Vec::new();
    for candidate in &spec.content {
        let re = whitespace::match_regex(candidate, &spec.whitespace)?;
        let present = lines[region.start..region.end]
            .iter()
            .any(|l| spec.filters.matches(l) && re.is_match(l))
            || lines[region.start..region.end].iter().any(|l| re.is_match(l));
        if !present {
            missing.push(candidate.clone());
        }
    }
    if missing.is_empty() {
        return Ok(PromiseOutcome::Noop);
    }
    let at = resolve_anchor(lines, region, spec)?;
    lines.splice(at..at, missing);
    Ok(PromiseOutcome::Change)
}

fn block_present(region_lines: &[String], block: &[String], policies: &[WhitespacePolicy]) -> Result<bool, EditLineError> {
    if block.is_empty() || region_lines.len() < block.len() {
        return Ok(false);
    }
    let regexes: Result<Vec<Regex>, EditLineError> =
        block.iter().map(|l| whitespace::match_regex(l, policies)).collect();
    let regexes = regexes?;
    for window in region_lines.windows(block.len()) {
        if window.iter().zip(regexes.iter()).all(|(line, re)| re.is_match(line)) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn resolve_anchor(lines: &[String], region: Region, spec: &InsertSpec) -> Result<usize, EditLineError> {
    let placement = spec.location.placement.unwrap_or(Placement::Before);
    let Some(anchor) = &spec.location.anchor else {
        return Ok(match placement {
            Placement::Before => region.start,
            Placement::After => region.end,
        });
    };

    let matches: Vec<usize> = lines[region.start..region.end]
        .iter()
        .enumerate()
        .filter(|(_, l)| anchor.is_match(l))
        .map(|(i, _)| region.start + i)
        .collect();

    let picked = match spec.location.pick.unwrap_or(AnchorPick::First) {
        AnchorPick::First => matches.first(),
        AnchorPick::Last => matches.last(),
    };

    let idx = *picked.ok_or_else(|| EditLineError::AnchorNotFound(anchor.to_string()))?;
    Ok(match placement {
        Placement::Before => idx,
        Placement::After => idx + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::select_region;
    use crate::region::RegionSpec;

    fn spec(content: &[&str], insert_type: InsertType) -> InsertSpec {
        InsertSpec {
            content: content.iter().map(|s| s.to_string()).collect(),
            insert_type,
            location: InsertLocation::default(),
            whitespace: vec![],
            filters: LineFilters::default(),
        }
    }

    #[test]
    fn s1_insert_convergent_scenario() {
        // File `a\nb\n`. Promise: insert_lines "b" with no region.
        let mut lines: Vec<String> = vec!["a".into(), "b".into()];
        let region = select_region(&lines, &RegionSpec::whole_file()).unwrap();
        let outcome = insert_lines(&mut lines, region, &spec(&["b"], InsertType::Literal)).unwrap();
        assert_eq!(outcome, PromiseOutcome::Noop);
        assert_eq!(lines, vec!["a", "b"]);

        // Replace content with `a\nc\n`. Second run inserts `b` after `c`.
        let mut lines: Vec<String> = vec!["a".into(), "c".into()];
        let region = select_region(&lines, &RegionSpec::whole_file()).unwrap();
        let mut insert_spec = spec(&["b"], InsertType::Literal);
        insert_spec.location.placement = Some(Placement::After);
        let outcome = insert_lines(&mut lines, region, &insert_spec).unwrap();
        assert_eq!(outcome, PromiseOutcome::Change);
        assert_eq!(lines, vec!["a", "c", "b"]);
    }

    #[test]
    fn insert_into_empty_file_unconditionally_prepends() {
        let mut lines: Vec<String> = vec![];
        let region = Region { start: 0, end: 0 };
        let outcome = insert_lines(&mut lines, region, &spec(&["first"], InsertType::Literal)).unwrap();
        assert_eq!(outcome, PromiseOutcome::Change);
        assert_eq!(lines, vec!["first"]);
    }

    #[test]
    fn preserve_block_tests_the_whole_block_for_convergence() {
        let mut lines: Vec<String> = vec!["x".into(), "y".into(), "z".into()];
        let region = Region { start: 0, end: 3 };
        let block_spec = spec(&["y", "z"], InsertType::PreserveBlock);
        let outcome = insert_lines(&mut lines, region, &block_spec).unwrap();
        assert_eq!(outcome, PromiseOutcome::Noop);
    }

    #[test]
    fn anchor_not_found_is_an_error() {
        let mut lines: Vec<String> = vec!["a".into()];
        let region = Region { start: 0, end: 1 };
        let mut insert_spec = spec(&["new"], InsertType::Literal);
        insert_spec.location.anchor = Some(Regex::new("^nomatch$").unwrap());
        let err = insert_lines(&mut lines, region, &insert_spec);
        assert!(matches!(err, Err(EditLineError::AnchorNotFound(_))));
    }
}
