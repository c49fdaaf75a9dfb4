// SPDX-License-Identifier: Apache-2.0

//! The five-valued per-promise outcome lattice from.

use std::fmt::{Display, Formatter};

/// The result of actuating a single promise (or one of its sub-operations).
/// Ordered from least to most severe so a promise's outcome is the `.max()`
/// of its sub-operations', and a bundle's outcome is the `.max()` of its
/// promises'.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromiseOutcome {
    /// Already compliant; nothing was done.
    Noop,
    /// A change was applied (or, in dry-run mode, would have been).
    Change,
    /// Completed with a warning (e.g. a non-convergent pattern that was
    /// still applied once).
    Warn,
    /// Skipped entirely (lock held, throttled by `ifelapsed`, …).
    Skipped,
    /// A convergence violation: the promise's post-state still matches its
    /// own precondition.
    Interrupted,
    /// The promise could not be actuated.
    Fail,
}

impl PromiseOutcome {
    /// True for [`PromiseOutcome::Fail`] or [`PromiseOutcome::Interrupted`]
    /// — the two outcomes that make the overall run exit non-zero.
    pub fn is_failure(self) -> bool {
        matches!(self, PromiseOutcome::Fail | PromiseOutcome::Interrupted)
    }

    /// Folds an iterator of outcomes into the single worst (most severe)
    /// outcome, defaulting to [`PromiseOutcome::Noop`] for an empty
    /// iterator (a section with no promises did nothing).
    pub fn worst_of(outcomes: impl IntoIterator<Item = PromiseOutcome>) -> PromiseOutcome {
        outcomes.into_iter().max().unwrap_or(PromiseOutcome::Noop)
    }
}

impl Display for PromiseOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PromiseOutcome::Noop => "NOOP",
            PromiseOutcome::Change => "CHANGE",
            PromiseOutcome::Warn => "WARN",
            PromiseOutcome::Fail => "FAIL",
            PromiseOutcome::Interrupted => "INTERRUPTED",
            PromiseOutcome::Skipped => "SKIPPED",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_places_fail_and_interrupted_as_most_severe() {
        assert!(PromiseOutcome::Fail > PromiseOutcome::Interrupted);
        assert!(PromiseOutcome::Interrupted > PromiseOutcome::Skipped);
        assert!(PromiseOutcome::Warn > PromiseOutcome::Change);
        assert!(PromiseOutcome::Change > PromiseOutcome::Noop);
    }

    #[test]
    fn worst_of_empty_is_noop() {
        assert_eq!(PromiseOutcome::worst_of(vec![]), PromiseOutcome::Noop);
    }

    #[test]
    fn worst_of_picks_the_max() {
        let outcomes = vec![
            PromiseOutcome::Noop,
            PromiseOutcome::Change,
            PromiseOutcome::Warn,
        ];
        assert_eq!(PromiseOutcome::worst_of(outcomes), PromiseOutcome::Warn);
    }

    #[test]
    fn is_failure_only_for_fail_and_interrupted() {
        assert!(PromiseOutcome::Fail.is_failure());
        assert!(PromiseOutcome::Interrupted.is_failure());
        assert!(!PromiseOutcome::Warn.is_failure());
        assert!(!PromiseOutcome::Skipped.is_failure());
    }
}
