// SPDX-License-Identifier: Apache-2.0

//! A file loaded as an ordered sequence of lines, mutated in memory by the
//! promise actuators in this crate, then atomically saved back.

use crate::error::EditLineError;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// The line-ending style detected on load, preserved on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    fn detect(raw: &str) -> Self {
        if raw.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// A file as a mutable sequence of lines.
#[derive(Debug, Clone)]
pub struct EditFile {
    path: PathBuf,
    lines: Vec<String>,
    original: Vec<String>,
    ending: LineEnding,
    existed: bool,
}

/// The result of [`EditFile::save`].
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    /// True if the in-memory content differs from what was on disk.
    pub changed: bool,
    /// A unified diff of the change, rendered even in dry-run mode so
    /// callers can report what would happen.
    pub diff: Option<String>,
}

impl EditFile {
    /// Loads `path`, or starts an empty in-memory file if it does not yet
    /// exist (a `files` promise with `create = true` may target a file
    /// that the edit-line bundle is expected to populate from scratch).
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, EditLineError> {
        let path = path.into();
        match fs::read_to_string(&path) {
            Ok(raw) => {
                let ending = LineEnding::detect(&raw);
                let lines = split_lines(&raw);
                Ok(Self {
                    path,
                    original: lines.clone(),
                    lines,
                    ending,
                    existed: true,
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self {
                path,
                lines: Vec::new(),
                original: Vec::new(),
                ending: LineEnding::Lf,
                existed: false,
            }),
            Err(source) => Err(EditLineError::Io { path, source }),
        }
    }

    pub fn existed(&self) -> bool {
        self.existed
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut Vec<String> {
        &mut self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Compares the in-memory content to what was last loaded (or, absent
    /// a prior load, to "no file"). Writes via an atomic temp-file-then-
    /// rename sequence unless `dry_run` is set or the content is
    /// unchanged.
    pub fn save(&mut self, dry_run: bool) -> Result<SaveOutcome, EditLineError> {
        if self.lines == self.original {
            return Ok(SaveOutcome {
                changed: false,
                diff: None,
            });
        }

        let before = join_lines(&self.original, self.ending);
        let after = join_lines(&self.lines, self.ending);
        let diff = Some(similar_diff(&before, &after));

        if dry_run {
            return Ok(SaveOutcome { changed: true, diff });
        }

        self.atomic_write(&after)?;
        self.original = self.lines.clone();
        Ok(SaveOutcome { changed: true, diff })
    }

    fn atomic_write(&self, content: &str) -> Result<(), EditLineError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|source| EditLineError::Io {
            path: self.path.clone(),
            source,
        })?;
        tmp.write_all(content.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|source| EditLineError::Io {
                path: self.path.clone(),
                source,
            })?;
        tmp.persist(&self.path)
            .map_err(|e| EditLineError::Io {
                path: self.path.clone(),
                source: e.error,
            })?;
        Ok(())
    }
}

fn split_lines(raw: &str) -> Vec<String> {
    let normalized = raw.replace("\r\n", "\n");
    let mut lines: Vec<String> = normalized.split('\n').map(str::to_owned).collect();
    if lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines
}

fn join_lines(lines: &[String], ending: LineEnding) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let mut out = lines.join(ending.as_str());
    out.push_str(ending.as_str());
    out
}

fn similar_diff(before: &str, after: &str) -> String {
    let diff = similar::TextDiff::from_lines(before, after);
    let mut out = String::new();
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            similar::ChangeTag::Delete => "-",
            similar::ChangeTag::Insert => "+",
            similar::ChangeTag::Equal => " ",
        };
        out.push_str(sign);
        out.push(' ');
        out.push_str(&change.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_file_starts_empty_and_unsaved_equal_content_is_a_noop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nonexistent");
        let mut file = EditFile::load(&path).expect("load");
        assert!(!file.existed());
        assert!(file.is_empty());

        let outcome = file.save(false).expect("save");
        assert!(!outcome.changed, "no lines added, nothing to save");
        assert!(!path.exists());
    }

    #[test]
    fn detects_and_preserves_crlf() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("f");
        fs::write(&path, "a\r\nb\r\n").expect("write");

        let mut file = EditFile::load(&path).expect("load");
        assert_eq!(file.lines(), ["a", "b"]);
        file.lines_mut().push("c".to_owned());
        file.save(false).expect("save");

        let saved = fs::read_to_string(&path).expect("read back");
        assert_eq!(saved, "a\r\nb\r\nc\r\n");
    }

    #[test]
    fn dry_run_reports_would_be_change_without_writing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("f");
        fs::write(&path, "a\n").expect("write");

        let mut file = EditFile::load(&path).expect("load");
        file.lines_mut().push("b".to_owned());
        let outcome = file.save(true).expect("save");
        assert!(outcome.changed);
        assert!(outcome.diff.is_some());

        let on_disk = fs::read_to_string(&path).expect("read back");
        assert_eq!(on_disk, "a\n", "dry run must not touch the file");
    }
}
