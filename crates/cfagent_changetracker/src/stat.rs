// SPDX-License-Identifier: Apache-2.0

//! `S_` key family: per-file stat fingerprints.

use crate::error::ChangeTrackerError;
use cfagent_store::Tree;

const RECORD_LEN: usize = 36;

/// The six stat fields tracked, packed little-endian on write for
/// portability across hosts of differing endianness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatRecord {
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub device: u64,
    pub inode: u64,
    pub mtime: i64,
}

impl StatRecord {
    fn to_bytes(self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        buf[0..4].copy_from_slice(&self.mode.to_le_bytes());
        buf[4..8].copy_from_slice(&self.uid.to_le_bytes());
        buf[8..12].copy_from_slice(&self.gid.to_le_bytes());
        buf[12..20].copy_from_slice(&self.device.to_le_bytes());
        buf[20..28].copy_from_slice(&self.inode.to_le_bytes());
        buf[28..36].copy_from_slice(&self.mtime.to_le_bytes());
        buf
    }

    fn from_bytes(path: &str, bytes: &[u8]) -> Result<Self, ChangeTrackerError> {
        if bytes.len() != RECORD_LEN {
            return Err(ChangeTrackerError::CorruptRecord {
                kind: "stat",
                path: path.to_owned(),
                len: bytes.len(),
            });
        }
        let field = |range: std::ops::Range<usize>| -> [u8; 8] {
            let mut buf = [0u8; 8];
            buf[..range.len()].copy_from_slice(&bytes[range]);
            buf
        };
        Ok(Self {
            mode: u32::from_le_bytes(bytes[0..4].try_into().expect("4 bytes")),
            uid: u32::from_le_bytes(bytes[4..8].try_into().expect("4 bytes")),
            gid: u32::from_le_bytes(bytes[8..12].try_into().expect("4 bytes")),
            device: u64::from_le_bytes(field(12..20)),
            inode: u64::from_le_bytes(field(20..28)),
            mtime: i64::from_le_bytes(field(28..36)),
        })
    }
}

fn stat_key(path: &str) -> String {
    format!("S_{path}")
}

/// One field-level change detected by [`check_and_update_stats`],
/// rendered in the style describes ("permissions in octal, ids as decimal, times as
/// ctime-format").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatChange {
    pub field: &'static str,
    pub description: String,
}

/// Compares `new` against the stored stat record for `path`, returning
/// one [`StatChange`] per differing field. Writes the new record back
/// only if `update` is set and at least one field differed.
pub fn check_and_update_stats(
    tree: &Tree,
    path: &str,
    new: StatRecord,
    update: bool,
) -> Result<Vec<StatChange>, ChangeTrackerError> {
    let key = stat_key(path);
    let prev = match tree.get(&key)? {
        Some(bytes) => Some(StatRecord::from_bytes(path, &bytes)?),
        None => None,
    };

    let changes = match prev {
        None => Vec::new(),
        Some(prev) => diff_fields(prev, new),
    };

    if prev.is_none() || (update && !changes.is_empty()) {
        tree.put(&key, &new.to_bytes())?;
    }

    Ok(changes)
}

/// Removes the stored stat record for `path`, if any.
pub fn forget_stat(tree: &Tree, path: &str) -> Result<(), ChangeTrackerError> {
    tree.delete(&stat_key(path))?;
    Ok(())
}

fn diff_fields(prev: StatRecord, new: StatRecord) -> Vec<StatChange> {
    let mut changes = Vec::new();
    if prev.mode != new.mode {
        changes.push(StatChange {
            field: "mode",
            description: format!("permissions changed from {:o} to {:o}", prev.mode, new.mode),
        });
    }
    if prev.uid != new.uid {
        changes.push(StatChange {
            field: "uid",
            description: format!("owner changed from {} to {}", prev.uid, new.uid),
        });
    }
    if prev.gid != new.gid {
        changes.push(StatChange {
            field: "gid",
            description: format!("group changed from {} to {}", prev.gid, new.gid),
        });
    }
    if prev.device != new.device {
        changes.push(StatChange {
            field: "device",
            description: format!("device changed from {} to {}", prev.device, new.device),
        });
    }
    if prev.inode != new.inode {
        changes.push(StatChange {
            field: "inode",
            description: format!("inode changed from {} to {}", prev.inode, new.inode),
        });
    }
    if prev.mtime != new.mtime {
        changes.push(StatChange {
            field: "mtime",
            description: format!("mtime changed from {} to {}", prev.mtime, new.mtime),
        });
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfagent_store::Store;

    fn record(mode: u32, mtime: i64) -> StatRecord {
        StatRecord {
            mode,
            uid: 0,
            gid: 0,
            device: 1,
            inode: 100,
            mtime,
        }
    }

    #[test]
    fn first_write_has_no_changes_and_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path().join("db")).expect("open");
        let tree = store.tree("stats").expect("tree");

        let changes = check_and_update_stats(&tree, "/etc/passwd", record(0o644, 1_000), true).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn detects_mode_and_mtime_changes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path().join("db")).expect("open");
        let tree = store.tree("stats").expect("tree");

        check_and_update_stats(&tree, "/etc/passwd", record(0o644, 1_000), true).unwrap();
        let changes = check_and_update_stats(&tree, "/etc/passwd", record(0o600, 2_000), true).unwrap();

        assert_eq!(changes.len(), 2);
        assert!(changes.iter().any(|c| c.field == "mode"));
        assert!(changes.iter().any(|c| c.field == "mtime"));
    }

    #[test]
    fn update_false_detects_but_does_not_persist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path().join("db")).expect("open");
        let tree = store.tree("stats").expect("tree");

        check_and_update_stats(&tree, "/f", record(0o644, 1_000), true).unwrap();
        check_and_update_stats(&tree, "/f", record(0o600, 2_000), false).unwrap();
        let changes_again = check_and_update_stats(&tree, "/f", record(0o600, 2_000), true).unwrap();
        assert_eq!(changes_again.len(), 2, "stored record should still be the original");
    }
}
