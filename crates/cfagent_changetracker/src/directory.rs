// SPDX-License-Identifier: Apache-2.0

//! `D_` key family: per-directory child-name indices.

use crate::error::ChangeTrackerError;
use crate::hash::{forget_hash, DigestTag};
use crate::stat::forget_stat;
use cfagent_store::Tree;

fn directory_key(dir: &str) -> String {
    format!("D_{dir}")
}

fn encode(names: &[String]) -> Vec<u8> {
    let mut out = Vec::new();
    for name in names {
        out.extend_from_slice(name.as_bytes());
        out.push(0);
    }
    out
}

fn decode(bytes: &[u8]) -> Vec<String> {
    bytes
        .split(|b| *b == 0)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect()
}

/// The result of merge-joining the on-disk listing against the
/// previously recorded one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryDiff {
    /// Present on disk but not in the database (new entries; logged
    /// elsewhere by the caller).
    pub new: Vec<String>,
    /// Present in the database but absent on disk; all hash/stat/
    /// directory traces of these entries are erased as part of this
    /// call.
    pub removed: Vec<String>,
}

/// Merge-joins `on_disk` (assumed sorted, as produced by a directory
/// listing) against the stored index for `dir`, persisting the new
/// sorted set if it changed and erasing every trace of removed entries.
pub fn check_and_update_directory(
    dirs: &Tree,
    hashes: &Tree,
    stats: &Tree,
    dir: &str,
    on_disk: &[String],
) -> Result<DirectoryDiff, ChangeTrackerError> {
    let key = directory_key(dir);
    let previous = dirs.get(&key)?.map(|bytes| decode(&bytes)).unwrap_or_default();

    let mut new = Vec::new();
    let mut removed = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    while i < on_disk.len() || j < previous.len() {
        match (on_disk.get(i), previous.get(j)) {
            (Some(disk_name), Some(db_name)) => match disk_name.cmp(db_name) {
                std::cmp::Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                std::cmp::Ordering::Less => {
                    new.push(disk_name.clone());
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    removed.push(db_name.clone());
                    j += 1;
                }
            },
            (Some(disk_name), None) => {
                new.push(disk_name.clone());
                i += 1;
            }
            (None, Some(db_name)) => {
                removed.push(db_name.clone());
                j += 1;
            }
            (None, None) => unreachable!("loop condition excludes this case"),
        }
    }

    for name in &removed {
        let child_path = format!("{}/{}", dir.trim_end_matches('/'), name);
        forget_stat(stats, &child_path)?;
        for tag in [
            DigestTag::Md5,
            DigestTag::Sha1,
            DigestTag::Sha224,
            DigestTag::Sha256,
            DigestTag::Sha384,
            DigestTag::Sha512,
            DigestTag::Best,
        ] {
            forget_hash(hashes, &child_path, tag)?;
        }
    }

    if !new.is_empty() || !removed.is_empty() {
        dirs.put(&key, &encode(on_disk))?;
    }

    Ok(DirectoryDiff { new, removed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::check_and_update_hash;
    use cfagent_store::Store;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn first_listing_reports_everything_as_new() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path().join("db")).expect("open");
        let dirs = store.tree("dirs").expect("tree");
        let hashes = store.tree("hashes").expect("tree");
        let stats = store.tree("stats").expect("tree");

        let diff = check_and_update_directory(&dirs, &hashes, &stats, "/etc", &names(&["a", "b"])).unwrap();
        assert_eq!(diff.new, names(&["a", "b"]));
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn stable_listing_round_trips_with_no_changes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path().join("db")).expect("open");
        let dirs = store.tree("dirs").expect("tree");
        let hashes = store.tree("hashes").expect("tree");
        let stats = store.tree("stats").expect("tree");

        check_and_update_directory(&dirs, &hashes, &stats, "/etc", &names(&["a", "b"])).unwrap();
        let diff = check_and_update_directory(&dirs, &hashes, &stats, "/etc", &names(&["a", "b"])).unwrap();
        assert!(diff.new.is_empty());
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn removed_entry_erases_its_hash_and_stat_traces() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path().join("db")).expect("open");
        let dirs = store.tree("dirs").expect("tree");
        let hashes = store.tree("hashes").expect("tree");
        let stats = store.tree("stats").expect("tree");

        check_and_update_directory(&dirs, &hashes, &stats, "/etc", &names(&["gone", "stay"])).unwrap();
        check_and_update_hash(&hashes, "/etc/gone", DigestTag::Sha256, b"digest", true).unwrap();

        let diff = check_and_update_directory(&dirs, &hashes, &stats, "/etc", &names(&["stay"])).unwrap();
        assert_eq!(diff.removed, names(&["gone"]));

        // The hash record was erased: re-recording the same digest now
        // reports "new" rather than "unchanged".
        let outcome = check_and_update_hash(&hashes, "/etc/gone", DigestTag::Sha256, b"digest", true).unwrap();
        assert_eq!(outcome, crate::hash::HashOutcome::New);
    }
}
