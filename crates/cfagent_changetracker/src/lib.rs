// SPDX-License-Identifier: Apache-2.0

//! The change tracker: a persistent record of per-file content
//! hashes, stat fingerprints, and directory listings, plus the
//! newline-delimited change log promises report into. Backed by [`cfagent_store`], one
//! [`cfagent_store::Store`] per agent run opened at the configured state directory and dropped
//! immediately after the promise that used it.

pub mod changelog;
pub mod directory;
pub mod error;
pub mod hash;
pub mod legacy;
pub mod stat;

pub use changelog::ChangeKind;
pub use directory::DirectoryDiff;
pub use error::ChangeTrackerError;
pub use hash::{DigestTag, HashOutcome};
pub use legacy::{LegacyImporter, NoLegacyImport};
pub use stat::{StatChange, StatRecord};

use cfagent_store::{Store, Tree};
use std::path::Path;

const HASHES_TREE: &str = "hashes";
const STATS_TREE: &str = "stats";
const DIRS_TREE: &str = "dirs";

/// A handle to the three trees a Change Tracker operation needs, opened
/// together against one [`Store`].
pub struct ChangeTracker {
    hashes: Tree,
    stats: Tree,
    dirs: Tree,
}

impl ChangeTracker {
    /// Opens the tracker's trees against `store`, running legacy
    /// migration first if either legacy database is still present next
    /// to it.
    pub fn open(store: &Store, state_dir: &Path, importer: &dyn LegacyImporter) -> Result<Self, ChangeTrackerError> {
        let hashes = store.tree(HASHES_TREE)?;
        let stats = store.tree(STATS_TREE)?;
        let dirs = store.tree(DIRS_TREE)?;
        legacy::migrate_legacy(state_dir, &hashes, &stats, importer)?;
        Ok(Self { hashes, stats, dirs })
    }

    pub fn check_and_update_hash(&self, path: &str, tag: DigestTag, digest: &[u8], update: bool) -> Result<HashOutcome, ChangeTrackerError> {
        hash::check_and_update_hash(&self.hashes, path, tag, digest, update)
    }

    pub fn check_and_update_stats(&self, path: &str, new: StatRecord, update: bool) -> Result<Vec<StatChange>, ChangeTrackerError> {
        stat::check_and_update_stats(&self.stats, path, new, update)
    }

    pub fn check_and_update_directory(&self, dir: &str, on_disk_sorted: &[String]) -> Result<DirectoryDiff, ChangeTrackerError> {
        directory::check_and_update_directory(&self.dirs, &self.hashes, &self.stats, dir, on_disk_sorted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_tracker_round_trips_hash_stat_and_directory_via_one_handle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path().join("db")).expect("open");
        let tracker = ChangeTracker::open(&store, dir.path(), &NoLegacyImport).expect("open tracker");

        let outcome = tracker.check_and_update_hash("/etc/motd", DigestTag::Sha256, b"digest-1", true).unwrap();
        assert_eq!(outcome, HashOutcome::New);
        // CheckAndUpdateHash returns "unchanged" immediately after a
        // successful write of the same digest.
        let outcome = tracker.check_and_update_hash("/etc/motd", DigestTag::Sha256, b"digest-1", true).unwrap();
        assert_eq!(outcome, HashOutcome::Unchanged);

        let listing = vec!["a".to_owned(), "b".to_owned()];
        let diff = tracker.check_and_update_directory("/etc", &listing).unwrap();
        assert_eq!(diff.new, listing);
        let diff_again = tracker.check_and_update_directory("/etc", &listing).unwrap();
        assert_eq!(diff_again, DirectoryDiff::default());
    }
}
