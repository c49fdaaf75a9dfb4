// SPDX-License-Identifier: Apache-2.0

//! Line selection filters shared by `insert_lines` and `delete_lines`.

use crate::error::EditLineError;
use regex::Regex;

/// The full set of line filters a promise may declare. Every `Some` field
/// is ANDed together; the negative variants invert their test.
#[derive(Debug, Clone, Default)]
pub struct LineFilters {
    pub select_line_matching: Option<Regex>,
    pub not_matching: Option<Regex>,
    pub startwith_from_list: Option<Vec<String>>,
    pub not_startwith_from_list: Option<Vec<String>>,
    pub match_from_list: Option<Vec<Regex>>,
    pub not_match_from_list: Option<Vec<Regex>>,
    pub contains_from_list: Option<Vec<String>>,
    pub not_contains_from_list: Option<Vec<String>>,
}

impl LineFilters {
    /// Validates that at most one negative filter family is in use.
    pub fn validate(&self) -> Result<(), EditLineError> {
        let negatives = [
            self.not_matching.is_some(),
            self.not_startwith_from_list.is_some(),
            self.not_match_from_list.is_some(),
            self.not_contains_from_list.is_some(),
        ];
        if negatives.iter().filter(|set| **set).count() > 1 {
            return Err(EditLineError::ConflictingLineFilters);
        }
        Ok(())
    }

    /// True if `line` satisfies every configured filter.
    pub fn matches(&self, line: &str) -> bool {
        self.select_line_matching.as_ref().map_or(true, |re| re.is_match(line))
            && self.not_matching.as_ref().map_or(true, |re| !re.is_match(line))
            && self
                .startwith_from_list
                .as_ref()
                .map_or(true, |list| list.iter().any(|p| line.starts_with(p.as_str())))
            && self
                .not_startwith_from_list
                .as_ref()
                .map_or(true, |list| !list.iter().any(|p| line.starts_with(p.as_str())))
            && self
                .match_from_list
                .as_ref()
                .map_or(true, |list| list.iter().any(|re| re.is_match(line)))
            && self
                .not_match_from_list
                .as_ref()
                .map_or(true, |list| !list.iter().any(|re| re.is_match(line)))
            && self
                .contains_from_list
                .as_ref()
                .map_or(true, |list| list.iter().any(|p| line.contains(p.as_str())))
            && self
                .not_contains_from_list
                .as_ref()
                .map_or(true, |list| !list.iter().any(|p| line.contains(p.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_filters_matches_everything() {
        assert!(LineFilters::default().matches("anything"));
    }

    #[test]
    fn positive_and_negative_combine_as_and() {
        let filters = LineFilters {
            select_line_matching: Some(Regex::new("^role_").unwrap()),
            not_contains_from_list: Some(vec!["deprecated".to_owned()]),
            ..Default::default()
        };
        assert!(filters.matches("role_web"));
        assert!(!filters.matches("role_deprecated_web"));
        assert!(!filters.matches("other_web"));
    }

    #[test]
    fn two_negative_families_is_rejected() {
        let filters = LineFilters {
            not_matching: Some(Regex::new("x").unwrap()),
            not_contains_from_list: Some(vec!["y".to_owned()]),
            ..Default::default()
        };
        assert!(matches!(filters.validate(), Err(EditLineError::ConflictingLineFilters)));
    }
}
