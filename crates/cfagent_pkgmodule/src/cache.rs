// SPDX-License-Identifier: Apache-2.0

//! Per-provider installed/updates caches. One [`PackageCache`] wraps the two trees a single
//! provider needs: `installed` (membership keys `N<name>V<ver>A<arch>` plus an `<inventory>`
//! blob) and `updates` (per-name available version/arch pairs). Each tree also carries a
//! `<refreshed_at>` marker used for the `ifelapsed` throttle describes.

use crate::error::PkgModuleError;
use cfagent_store::{Store, Tree};

const REFRESHED_AT_KEY: &str = "<refreshed_at>";
const INVENTORY_KEY: &str = "<inventory>";
const POPULATED_KEY: &str = "<populated>";

fn installed_key(name: &str, version: &str, arch: &str) -> String {
    format!("N{name}V{version}A{arch}")
}

/// The two caches one package provider needs.
pub struct PackageCache {
    installed: Tree,
    updates: Tree,
}

impl PackageCache {
    /// Opens (or creates) the installed/updates trees for `provider`.
    pub fn open(store: &Store, provider: &str) -> Result<Self, PkgModuleError> {
        Ok(Self {
            installed: store.tree(&format!("pkg_installed_{provider}"))?,
            updates: store.tree(&format!("pkg_updates_{provider}"))?,
        })
    }

    /// True if `(name, version, arch)` is recorded as installed.
    pub fn is_installed(&self, name: &str, version: &str, arch: &str) -> Result<bool, PkgModuleError> {
        Ok(self.installed.contains(&installed_key(name, version, arch))?)
    }

    /// Seconds-since-epoch the installed cache was last fully refreshed,
    /// if it ever was.
    pub fn installed_refreshed_at(&self) -> Result<Option<u64>, PkgModuleError> {
        read_timestamp(&self.installed, REFRESHED_AT_KEY)
    }

    /// True if this cache should be refreshed: never populated, a forced
    /// refresh was requested, or `ifelapsed_secs` has passed since the
    /// last refresh.
    pub fn installed_needs_refresh(&self, now: u64, ifelapsed_secs: u64, force: bool) -> Result<bool, PkgModuleError> {
        if force {
            return Ok(true);
        }
        Ok(match self.installed_refreshed_at()? {
            None => true,
            Some(last) => now.saturating_sub(last) >= ifelapsed_secs,
        })
    }

    /// Replaces the installed-set membership keys wholesale with
    /// `entries` and stores `inventory` as the raw provider listing,
    /// stamping the refresh time.
    pub fn replace_installed(
        &self,
        entries: &[(String, String, String)],
        inventory: &[u8],
        now: u64,
    ) -> Result<(), PkgModuleError> {
        for (key, _) in self.installed.iter_prefix("N") {
            self.installed.delete(&key)?;
        }
        for (name, version, arch) in entries {
            self.installed.put(&installed_key(name, version, arch), b"")?;
        }
        self.installed.put(INVENTORY_KEY, inventory)?;
        write_timestamp(&self.installed, REFRESHED_AT_KEY, now)?;
        Ok(())
    }

    /// True once [`PackageCache::replace_updates`] has populated at least
    /// one name. If never populated, a `list-updates-local` request must
    /// be promoted to a full `list-updates`.
    pub fn updates_populated(&self) -> Result<bool, PkgModuleError> {
        Ok(self.updates.contains(POPULATED_KEY)?)
    }

    pub fn updates_needs_refresh(&self, now: u64, ifelapsed_secs: u64, force: bool) -> Result<bool, PkgModuleError> {
        if force || !self.updates_populated()? {
            return Ok(true);
        }
        Ok(match read_timestamp(&self.updates, REFRESHED_AT_KEY)? {
            None => true,
            Some(last) => now.saturating_sub(last) >= ifelapsed_secs,
        })
    }

    /// The available `(version, architecture)` pairs recorded for `name`.
    pub fn updates_for(&self, name: &str) -> Result<Vec<(String, String)>, PkgModuleError> {
        let key = format!("U{name}");
        Ok(match self.updates.get(&key)? {
            Some(raw) => String::from_utf8_lossy(&raw)
                .lines()
                .filter_map(|line| line.split_once(','))
                .map(|(v, a)| (v.to_owned(), a.to_owned()))
                .collect(),
            None => Vec::new(),
        })
    }

    /// Replaces the full per-name update map and stamps the refresh time.
    pub fn replace_updates(
        &self,
        entries: &[(String, Vec<(String, String)>)],
        now: u64,
    ) -> Result<(), PkgModuleError> {
        for (key, _) in self.updates.iter_prefix("U") {
            self.updates.delete(&key)?;
        }
        for (name, pairs) in entries {
            let value = pairs.iter().map(|(v, a)| format!("{v},{a}")).collect::<Vec<_>>().join("\n");
            self.updates.put(&format!("U{name}"), value.as_bytes())?;
        }
        self.updates.put(POPULATED_KEY, b"1")?;
        write_timestamp(&self.updates, REFRESHED_AT_KEY, now)?;
        Ok(())
    }
}

fn read_timestamp(tree: &Tree, key: &str) -> Result<Option<u64>, PkgModuleError> {
    Ok(tree
        .get(key)?
        .and_then(|raw| String::from_utf8_lossy(&raw).parse::<u64>().ok()))
}

fn write_timestamp(tree: &Tree, key: &str, now: u64) -> Result<(), PkgModuleError> {
    tree.put(key, now.to_string().as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installed_cache_round_trips_membership() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path().join("db")).expect("open");
        let cache = PackageCache::open(&store, "apt").expect("open cache");

        assert!(!cache.is_installed("bash", "5.1", "amd64").unwrap());
        cache
            .replace_installed(&[("bash".to_owned(), "5.1".to_owned(), "amd64".to_owned())], b"inventory", 1000)
            .unwrap();
        // After `list-installed` returns an entry, the lookup is true.
        assert!(cache.is_installed("bash", "5.1", "amd64").unwrap());
        assert_eq!(cache.installed_refreshed_at().unwrap(), Some(1000));
    }

    #[test]
    fn installed_needs_refresh_respects_ifelapsed_and_force() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path().join("db")).expect("open");
        let cache = PackageCache::open(&store, "apt").expect("open cache");

        assert!(cache.installed_needs_refresh(1000, 60, false).unwrap());
        cache.replace_installed(&[], b"", 1000).unwrap();
        assert!(!cache.installed_needs_refresh(1010, 60, false).unwrap());
        assert!(cache.installed_needs_refresh(1010, 60, true).unwrap());
        assert!(cache.installed_needs_refresh(1100, 60, false).unwrap());
    }

    #[test]
    fn updates_cache_promotes_local_request_until_first_populated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path().join("db")).expect("open");
        let cache = PackageCache::open(&store, "apt").expect("open cache");

        assert!(!cache.updates_populated().unwrap());
        assert!(cache.updates_needs_refresh(0, 60, false).unwrap());

        cache
            .replace_updates(&[("bash".to_owned(), vec![("5.2".to_owned(), "amd64".to_owned())])], 500)
            .unwrap();
        assert!(cache.updates_populated().unwrap());
        assert_eq!(cache.updates_for("bash").unwrap(), vec![("5.2".to_owned(), "amd64".to_owned())]);
        assert!(!cache.updates_needs_refresh(510, 60, false).unwrap());
    }

    #[test]
    fn after_remove_lookup_is_false() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path().join("db")).expect("open");
        let cache = PackageCache::open(&store, "apt").expect("open cache");

        cache
            .replace_installed(&[("bash".to_owned(), "5.1".to_owned(), "amd64".to_owned())], b"", 1)
            .unwrap();
        assert!(cache.is_installed("bash", "5.1", "amd64").unwrap());
        // `remove` succeeded: refreshed installed cache no longer lists it.
        cache.replace_installed(&[], b"", 2).unwrap();
        assert!(!cache.is_installed("bash", "5.1", "amd64").unwrap());
    }
}
