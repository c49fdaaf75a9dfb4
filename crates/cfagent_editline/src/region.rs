// SPDX-License-Identifier: Apache-2.0

//! Region selection: picking the contiguous sub-range of lines an
//! edit-line promise operates over.

use crate::error::EditLineError;
use regex::Regex;

/// The `select_region` body attributes, translated into selection
/// behavior.
#[derive(Debug, Clone, Default)]
pub struct RegionSpec {
    pub select_start: Option<Regex>,
    pub select_end: Option<Regex>,
    pub include_start: bool,
    pub include_end: bool,
    pub select_end_match_eof: bool,
}

impl RegionSpec {
    /// The default region spec (no start/end markers): the whole file,
    /// with `include_start`/`include_end` at their documented defaults.
    pub fn whole_file() -> Self {
        Self {
            include_start: true,
            include_end: true,
            ..Default::default()
        }
    }
}

/// A half-open `[start, end)` range of line indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start: usize,
    pub end: usize,
}

impl Region {
    pub fn whole(len: usize) -> Self {
        Self { start: 0, end: len }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Selects the region `spec` describes within `lines`.
pub fn select_region(lines: &[String], spec: &RegionSpec) -> Result<Region, EditLineError> {
    if spec.select_start.is_none() && spec.select_end.is_none() {
        return Ok(Region::whole(lines.len()));
    }

    let start_idx = match &spec.select_start {
        Some(re) => lines
            .iter()
            .position(|l| re.is_match(l))
            .ok_or_else(|| EditLineError::RegionNotFound(format!("select_start {re}")))?,
        None => 0,
    };

    if !spec.include_start && start_idx + 1 >= lines.len() {
        return Err(EditLineError::EmptyRegion);
    }

    let begin = if spec.include_start { start_idx } else { start_idx + 1 };

    let search_from = start_idx + 1;
    let end = match &spec.select_end {
        Some(re) => {
            let matched = lines[search_from.min(lines.len())..]
                .iter()
                .position(|l| re.is_match(l))
                .map(|i| search_from + i);
            match matched {
                Some(idx) => {
                    if spec.include_end {
                        idx + 1
                    } else {
                        idx
                    }
                }
                None if spec.select_end_match_eof => lines.len(),
                None => return Err(EditLineError::RegionNotFound(format!("select_end {re}"))),
            }
        }
        None => lines.len(),
    };

    let end = end.max(begin).min(lines.len());
    Ok(Region { start: begin, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_markers_selects_whole_file() {
        let l = lines(&["a", "b", "c"]);
        let region = select_region(&l, &RegionSpec::whole_file()).unwrap();
        assert_eq!(region, Region { start: 0, end: 3 });
    }

    #[test]
    fn markers_select_inclusive_range_by_default() {
        let l = lines(&["start", "middle", "end", "trailing"]);
        let spec = RegionSpec {
            select_start: Some(Regex::new("^start$").unwrap()),
            select_end: Some(Regex::new("^end$").unwrap()),
            include_start: true,
            include_end: true,
            select_end_match_eof: false,
        };
        let region = select_region(&l, &spec).unwrap();
        assert_eq!(region, Region { start: 0, end: 3 });
    }

    #[test]
    fn exclude_start_on_last_line_is_an_empty_region() {
        let l = lines(&["only_start"]);
        let spec = RegionSpec {
            select_start: Some(Regex::new("^only_start$").unwrap()),
            select_end: None,
            include_start: false,
            include_end: true,
            select_end_match_eof: false,
        };
        assert!(matches!(select_region(&l, &spec), Err(EditLineError::EmptyRegion)));
    }

    #[test]
    fn missing_end_without_eof_fallback_fails() {
        let l = lines(&["start", "a", "b"]);
        let spec = RegionSpec {
            select_start: Some(Regex::new("^start$").unwrap()),
            select_end: Some(Regex::new("^nomatch$").unwrap()),
            include_start: true,
            include_end: true,
            select_end_match_eof: false,
        };
        assert!(matches!(select_region(&l, &spec), Err(EditLineError::RegionNotFound(_))));
    }

    #[test]
    fn missing_end_with_eof_fallback_runs_to_end_of_file() {
        let l = lines(&["start", "a", "b"]);
        let spec = RegionSpec {
            select_start: Some(Regex::new("^start$").unwrap()),
            select_end: Some(Regex::new("^nomatch$").unwrap()),
            include_start: true,
            include_end: true,
            select_end_match_eof: true,
        };
        let region = select_region(&l, &spec).unwrap();
        assert_eq!(region, Region { start: 0, end: 3 });
    }
}
