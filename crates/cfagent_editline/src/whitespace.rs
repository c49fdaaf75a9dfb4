// SPDX-License-Identifier: Apache-2.0

//! `insert_match` whitespace policy: translating a convergence-comparison
//! policy into a regex that tests whether a candidate line already exists
//! in the file.

use crate::error::EditLineError;
use regex::Regex;

/// One `insert_match` policy word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhitespacePolicy {
    ExactMatch,
    IgnoreLeading,
    IgnoreTrailing,
    IgnoreEmbedded,
}

/// Builds the regex that tests whether `literal` (the candidate line to
/// insert) already exists in the file, per the combination of policies in
/// `policies` (an empty slice behaves like `[ExactMatch]`).
///
/// `ignore_embedded` collapses runs of inner whitespace in `literal` to
/// `\s+`; `ignore_leading`/`ignore_trailing` allow arbitrary whitespace
/// before/after the (trimmed) literal. `exact_match` may not be combined
/// with any other policy.
pub fn match_regex(literal: &str, policies: &[WhitespacePolicy]) -> Result<Regex, EditLineError> {
    let exact = policies.contains(&WhitespacePolicy::ExactMatch);
    if exact && policies.len() > 1 {
        return Err(EditLineError::ConflictingWhitespacePolicy);
    }
    if exact || policies.is_empty() {
        return compile(format!("^{}$", regex::escape(literal)));
    }

    let ignore_embedded = policies.contains(&WhitespacePolicy::IgnoreEmbedded);
    let ignore_leading = policies.contains(&WhitespacePolicy::IgnoreLeading);
    let ignore_trailing = policies.contains(&WhitespacePolicy::IgnoreTrailing);

    let body = if ignore_embedded {
        literal
            .split_whitespace()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s+")
    } else {
        regex::escape(literal.trim())
    };

    let prefix = if ignore_leading { r"\s*" } else { "" };
    let suffix = if ignore_trailing { r"\s*" } else { "" };
    compile(format!("^{prefix}{body}{suffix}$"))
}

fn compile(pattern: String) -> Result<Regex, EditLineError> {
    Regex::new(&pattern).map_err(|source| EditLineError::BadPattern { pattern, source })
}
