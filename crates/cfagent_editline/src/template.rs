// SPDX-License-Identifier: Apache-2.0

//! CFEngine-style template block expansion.

use once_cell::sync::Lazy;
use regex::Regex;

static BEGIN_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\[%CFEngine BEGIN(?:\s+([A-Za-z0-9_:|.!() ]+))?\s*%\]\s*$").expect("static pattern"));
static END_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\[%CFEngine END\s*%\]\s*$").expect("static pattern"));

/// A failure parsing template markers.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum TemplateError {
    /// A `BEGIN` marker was encountered while already inside a block.
    #[error("nested CFEngine template block at line {0}")]
    NestedBlock(usize),
    /// An `END` marker was encountered with no open block.
    #[error("unmatched CFEngine END marker at line {0}")]
    UnmatchedEnd(usize),
    /// A `BEGIN` marker was never closed.
    #[error("unterminated CFEngine BEGIN block starting at line {0}")]
    Unterminated(usize),
}

/// One expanded `[%CFEngine BEGIN %]` / `[%CFEngine END %]` block: its
/// accumulated content lines and the class guard (if any) named in its
/// `BEGIN` marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateBlock {
    pub class_guard: Option<String>,
    pub content: Vec<String>,
}

/// Scans `template` for CFEngine-style blocks. Each becomes a
/// [`TemplateBlock`], destined to be turned into an `insert_lines`
/// promise with `insert_type = preserve_all_lines` by the caller.
pub fn expand_blocks(template: &[String]) -> Result<Vec<TemplateBlock>, TemplateError> {
    let mut blocks = Vec::new();
    let mut open: Option<(usize, Option<String>, Vec<String>)> = None;

    for (idx, line) in template.iter().enumerate() {
        if let Some(caps) = BEGIN_MARKER.captures(line) {
            if open.is_some() {
                return Err(TemplateError::NestedBlock(idx));
            }
            let class_guard = caps.get(1).map(|m| m.as_str().trim().to_owned());
            open = Some((idx, class_guard, Vec::new()));
            continue;
        }
        if END_MARKER.is_match(line) {
            let Some((_, class_guard, content)) = open.take() else {
                return Err(TemplateError::UnmatchedEnd(idx));
            };
            blocks.push(TemplateBlock { class_guard, content });
            continue;
        }
        if let Some((_, _, content)) = open.as_mut() {
            content.push(line.clone());
        }
    }

    if let Some((start, ..)) = open {
        return Err(TemplateError::Unterminated(start));
    }

    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn extracts_a_single_block_with_class_guard() {
        let tmpl = lines(&[
            "before",
            "[%CFEngine BEGIN role_web %]",
            "listen 80;",
            "listen 443;",
            "[%CFEngine END %]",
            "after",
        ]);
        let blocks = expand_blocks(&tmpl).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].class_guard.as_deref(), Some("role_web"));
        assert_eq!(blocks[0].content, vec!["listen 80;", "listen 443;"]);
    }

    #[test]
    fn block_without_class_guard_has_none() {
        let tmpl = lines(&["[%CFEngine BEGIN %]", "x", "[%CFEngine END %]"]);
        let blocks = expand_blocks(&tmpl).unwrap();
        assert_eq!(blocks[0].class_guard, None);
    }

    #[test]
    fn nested_blocks_are_rejected() {
        let tmpl = lines(&["[%CFEngine BEGIN a %]", "[%CFEngine BEGIN b %]", "[%CFEngine END %]"]);
        assert!(matches!(expand_blocks(&tmpl), Err(TemplateError::NestedBlock(1))));
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let tmpl = lines(&["[%CFEngine BEGIN a %]", "x"]);
        assert!(matches!(expand_blocks(&tmpl), Err(TemplateError::Unterminated(0))));
    }

    #[test]
    fn unmatched_end_is_an_error() {
        let tmpl = lines(&["[%CFEngine END %]"]);
        assert!(matches!(expand_blocks(&tmpl), Err(TemplateError::UnmatchedEnd(0))));
    }
}
