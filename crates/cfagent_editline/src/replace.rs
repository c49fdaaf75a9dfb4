// SPDX-License-Identifier: Apache-2.0

//! `replace_patterns` actuation.

use crate::error::EditLineError;
use crate::region::Region;
use cfagent_common::outcome::PromiseOutcome;
use regex::Regex;

/// Caps runaway replacement loops caused by a replacement value that
/// reintroduces its own search pattern.
const MAX_SUBSTITUTIONS_PER_LINE: usize = 20;

/// Which occurrences of the pattern on a line to replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Occurrences {
    /// Replace every match, repeatedly, up to the substitution cap.
    #[default]
    All,
    /// Replace only the first match. Always non-convergent by
    /// construction, so this always reports a warning.
    First,
}

/// One `replace_patterns` promise, fully resolved.
#[derive(Debug, Clone)]
pub struct ReplaceSpec {
    pub pattern: Regex,
    pub replacement: String,
    pub occurrences: Occurrences,
}

/// Applies `spec` to every line in `region`, returning the worst outcome
/// across all lines touched.
pub fn replace_patterns(lines: &mut [String], region: Region, spec: &ReplaceSpec) -> Result<PromiseOutcome, EditLineError> {
    let mut worst = PromiseOutcome::Noop;
    for line in &mut lines[region.start..region.end] {
        let outcome = replace_in_line(line, spec)?;
        worst = worst.max(outcome);
    }
    Ok(worst)
}

fn replace_in_line(line: &mut String, spec: &ReplaceSpec) -> Result<PromiseOutcome, EditLineError> {
    if !spec.pattern.is_match(line) {
        return Ok(PromiseOutcome::Noop);
    }

    if spec.occurrences == Occurrences::First {
        *line = spec.pattern.replacen(line, 1, spec.replacement.as_str()).into_owned();
        // Replacing only the first occurrence can never converge: the
        // pattern may still match the untouched remainder, or the
        // replacement itself may reintroduce it.
        return Ok(PromiseOutcome::Warn);
    }

    let mut pass = 0;
    let mut changed_any = false;
    loop {
        let replaced = spec.pattern.replace_all(line, spec.replacement.as_str());
        let changed = replaced != line.as_str();
        *line = replaced.into_owned();
        changed_any |= changed;
        pass += 1;
        if !changed || pass >= MAX_SUBSTITUTIONS_PER_LINE {
            break;
        }
    }

    // The pattern still matches its own post-state: the replacement
    // reintroduces the search pattern, so re-running would try again
    // forever. Reported regardless of whether this pass changed anything.
    if spec.pattern.is_match(line) {
        return Ok(PromiseOutcome::Interrupted);
    }
    Ok(if changed_any { PromiseOutcome::Change } else { PromiseOutcome::Noop })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(pattern: &str, replacement: &str) -> ReplaceSpec {
        ReplaceSpec {
            pattern: Regex::new(pattern).unwrap(),
            replacement: replacement.to_owned(),
            occurrences: Occurrences::All,
        }
    }

    #[test]
    fn replaces_and_converges() {
        // Unlike the `x=\d+` -> `x=1` case below, the replacement here
        // ("x=1") no longer matches the search pattern ("x=2"), so the
        // line has genuinely reached a fixed point.
        let mut lines = vec!["x=2".to_owned()];
        let region = Region::whole(1);
        let outcome = replace_patterns(&mut lines, region, &spec(r"x=2", "x=1")).unwrap();
        assert_eq!(outcome, PromiseOutcome::Change);
        assert_eq!(lines, vec!["x=1"]);
    }

    #[test]
    fn s3_replace_non_convergent_reports_interrupted() {
        let mut lines = vec!["x=1".to_owned()];
        let region = Region::whole(1);
        let outcome = replace_patterns(&mut lines, region, &spec(r"x=\d+", "x=1")).unwrap();
        assert_eq!(outcome, PromiseOutcome::Interrupted);
    }

    #[test]
    fn first_occurrence_always_warns() {
        let mut lines = vec!["aaa".to_owned()];
        let region = Region::whole(1);
        let mut s = spec("a", "b");
        s.occurrences = Occurrences::First;
        let outcome = replace_patterns(&mut lines, region, &s).unwrap();
        assert_eq!(outcome, PromiseOutcome::Warn);
        assert_eq!(lines, vec!["baa"]);
    }

    #[test]
    fn no_match_is_noop() {
        let mut lines = vec!["unchanged".to_owned()];
        let region = Region::whole(1);
        let outcome = replace_patterns(&mut lines, region, &spec("nomatch", "x")).unwrap();
        assert_eq!(outcome, PromiseOutcome::Noop);
        assert_eq!(lines, vec!["unchanged"]);
    }
}
