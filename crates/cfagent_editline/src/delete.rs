// SPDX-License-Identifier: Apache-2.0

//! `delete_lines` actuation.

use crate::error::EditLineError;
use crate::filters::LineFilters;
use crate::region::Region;
use cfagent_common::outcome::PromiseOutcome;
use regex::Regex;

/// One `delete_lines` promise, fully resolved.
#[derive(Debug, Clone, Default)]
pub struct DeleteSpec {
    /// Delete every line matching these filters. An empty (default)
    /// filter set deletes every line in the region — used together with
    /// `not_matching` to delete every line except the ones listed. Used
    /// only when `block` is `None`.
    pub filters: LineFilters,
    /// A multi-line promiser: one regex per line of the block, matched
    /// against consecutive lines in the region. When set, this takes
    /// over from `filters` entirely — the promise deletes whole matched
    /// windows rather than testing lines independently.
    pub block: Option<Vec<Regex>>,
}

/// Deletes from `region` every occurrence of `spec`, keeping the rest in
/// their original relative order.
pub fn delete_lines(lines: &mut Vec<String>, region: Region, spec: &DeleteSpec) -> Result<PromiseOutcome, EditLineError> {
    spec.filters.validate()?;

    if let Some(block) = &spec.block {
        return delete_block(lines, region, block);
    }

    let before = lines[region.start..region.end].len();
    let mut kept = Vec::with_capacity(before);
    let mut removed = 0usize;
    for line in &lines[region.start..region.end] {
        if spec.filters.matches(line) {
            removed += 1;
        } else {
            kept.push(line.clone());
        }
    }

    if removed == 0 {
        return Ok(PromiseOutcome::Noop);
    }

    lines.splice(region.start..region.end, kept);
    Ok(PromiseOutcome::Change)
}

/// Excises every non-overlapping run of consecutive lines in `region`
/// that matches `block` line-for-line (the `delete_lines "beta\ngamma"`
/// case).
fn delete_block(lines: &mut Vec<String>, region: Region, block: &[Regex]) -> Result<PromiseOutcome, EditLineError> {
    if block.is_empty() {
        return Ok(PromiseOutcome::Noop);
    }

    let mut changed = false;
    let mut start = region.start;
    let mut end = region.end;
    while start + block.len() <= end {
        let found = (start..=end - block.len())
            .find(|&i| lines[i..i + block.len()].iter().zip(block).all(|(line, re)| re.is_match(line)));
        let Some(i) = found else { break };
        lines.drain(i..i + block.len());
        end -= block.len();
        start = i;
        changed = true;
    }

    Ok(if changed { PromiseOutcome::Change } else { PromiseOutcome::Noop })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::select_region;
    use crate::region::RegionSpec;
    use regex::Regex;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn deletes_matching_lines_and_preserves_order() {
        let mut l = lines(&["keep1", "drop", "keep2", "drop"]);
        let region = Region::whole(l.len());
        let spec = DeleteSpec {
            filters: LineFilters {
                select_line_matching: Some(Regex::new("^drop$").unwrap()),
                ..Default::default()
            },
            block: None,
        };
        let outcome = delete_lines(&mut l, region, &spec).unwrap();
        assert_eq!(outcome, PromiseOutcome::Change);
        assert_eq!(l, vec!["keep1", "keep2"]);
    }

    #[test]
    fn s2_block_delete_removes_consecutive_run() {
        let mut l = lines(&["alpha", "beta", "gamma"]);
        let region = Region::whole(l.len());
        let spec = DeleteSpec {
            filters: LineFilters::default(),
            block: Some(vec![Regex::new("^beta$").unwrap(), Regex::new("^gamma$").unwrap()]),
        };
        let outcome = delete_lines(&mut l, region, &spec).unwrap();
        assert_eq!(outcome, PromiseOutcome::Change);
        assert_eq!(l, vec!["alpha"]);
    }

    #[test]
    fn block_delete_with_no_matching_window_is_noop() {
        let mut l = lines(&["alpha", "beta", "delta"]);
        let region = Region::whole(l.len());
        let spec = DeleteSpec {
            filters: LineFilters::default(),
            block: Some(vec![Regex::new("^beta$").unwrap(), Regex::new("^gamma$").unwrap()]),
        };
        let outcome = delete_lines(&mut l, region, &spec).unwrap();
        assert_eq!(outcome, PromiseOutcome::Noop);
        assert_eq!(l, vec!["alpha", "beta", "delta"]);
    }

    #[test]
    fn no_matches_is_a_noop() {
        let mut l = lines(&["a", "b"]);
        let region = Region::whole(l.len());
        let spec = DeleteSpec {
            filters: LineFilters {
                select_line_matching: Some(Regex::new("^nomatch$").unwrap()),
                ..Default::default()
            },
            block: None,
        };
        assert_eq!(delete_lines(&mut l, region, &spec).unwrap(), PromiseOutcome::Noop);
        assert_eq!(l, vec!["a", "b"]);
    }

    #[test]
    fn respects_region_boundaries() {
        let mut l = lines(&["drop_outside", "start", "drop_inside", "end", "drop_outside"]);
        let region = select_region(
            &l,
            &RegionSpec {
                select_start: Some(Regex::new("^start$").unwrap()),
                select_end: Some(Regex::new("^end$").unwrap()),
                include_start: true,
                include_end: true,
                select_end_match_eof: false,
            },
        )
        .unwrap();
        let spec = DeleteSpec {
            filters: LineFilters {
                select_line_matching: Some(Regex::new("^drop").unwrap()),
                ..Default::default()
            },
            block: None,
        };
        delete_lines(&mut l, region, &spec).unwrap();
        assert_eq!(l, vec!["drop_outside", "start", "end", "drop_outside"]);
    }
}
