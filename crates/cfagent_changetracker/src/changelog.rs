// SPDX-License-Identifier: Apache-2.0

//! The newline-delimited append-only change log.

use crate::error::ChangeTrackerError;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// The single-letter change-kind tags the log format uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A new record was created (no prior hash/stat/directory entry).
    New,
    /// An entry present in the database no longer exists on disk.
    Removed,
    /// A recorded hash changed.
    ContentChanged,
    /// A recorded stat field changed.
    StatChanged,
}

impl ChangeKind {
    fn letter(self) -> char {
        match self {
            ChangeKind::New => 'N',
            ChangeKind::Removed => 'R',
            ChangeKind::ContentChanged => 'C',
            ChangeKind::StatChanged => 'S',
        }
    }
}

/// Appends one line to the change log at `path`: `<unix-ts>,<promise-
/// handle>,<path>,<N|R|C|S>,<free-text>`, fsyncing after the write.
pub fn append(
    log_path: &Path,
    now_unix: u64,
    promise_handle: &str,
    changed_path: &str,
    kind: ChangeKind,
    free_text: &str,
) -> Result<(), ChangeTrackerError> {
    if let Ok(metadata) = std::fs::metadata(log_path) {
        if is_group_or_other_writable(&metadata) {
            return Err(ChangeTrackerError::InsecureLogPermissions(log_path.to_path_buf()));
        }
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|source| io_err(log_path, source))?;

    let line = format!(
        "{now_unix},{promise_handle},{changed_path},{},{free_text}\n",
        kind.letter()
    );
    file.write_all(line.as_bytes()).map_err(|source| io_err(log_path, source))?;
    file.sync_all().map_err(|source| io_err(log_path, source))?;
    Ok(())
}

fn io_err(path: &Path, source: std::io::Error) -> ChangeTrackerError {
    ChangeTrackerError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(unix)]
fn is_group_or_other_writable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o022 != 0
}

#[cfg(not(unix))]
fn is_group_or_other_writable(_metadata: &std::fs::Metadata) -> bool {
    false
}

/// The default change-log path under a state directory.
pub fn default_log_path(state_dir: &Path) -> PathBuf {
    state_dir.join("promise_summary.log")
}
