// SPDX-License-Identifier: Apache-2.0

//! A thin, typed wrapper over an embedded key-value store, backing the
//! lock manager, the change tracker, the package module protocol's
//! installed/updates caches, and persistent-class storage. Every caller
//! wants the same contract — atomic get, put, delete, iterate — so it
//! lives here once behind a small typed API rather than each caller
//! hand-rolling its own file format.

use std::path::{Path, PathBuf};

/// Failures opening or operating on the store.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum StoreError {
    /// The embedded database could not be opened at the given path.
    #[error("failed to open store at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: sled::Error,
    },
    /// A read, write, or flush against an open tree failed.
    #[error("store operation failed: {0}")]
    Io(#[from] sled::Error),
}

/// A single named tree (table) within a [`Store`].
#[derive(Clone)]
pub struct Tree {
    tree: sled::Tree,
}

impl Tree {
    /// Reads the raw bytes at `key`, if present.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.tree.get(key)?.map(|ivec| ivec.to_vec()))
    }

    /// Atomically writes `value` at `key`, returning the previous value if
    /// any.
    pub fn put(&self, key: &str, value: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.tree.insert(key, value)?.map(|ivec| ivec.to_vec()))
    }

    /// Atomically removes `key`, returning its former value if any.
    pub fn delete(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.tree.remove(key)?.map(|ivec| ivec.to_vec()))
    }

    /// True if `key` is present.
    pub fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.tree.contains_key(key)?)
    }

    /// Iterates every `(key, value)` pair whose key starts with `prefix`,
    /// in key order.
    pub fn iter_prefix(&self, prefix: &str) -> impl Iterator<Item = (String, Vec<u8>)> {
        self.tree.scan_prefix(prefix).filter_map(|entry| {
            let (k, v) = entry.ok()?;
            Some((String::from_utf8_lossy(&k).into_owned(), v.to_vec()))
        })
    }

    /// Iterates every `(key, value)` pair in the tree, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (String, Vec<u8>)> {
        self.tree.iter().filter_map(|entry| {
            let (k, v) = entry.ok()?;
            Some((String::from_utf8_lossy(&k).into_owned(), v.to_vec()))
        })
    }

    /// Forces the tree's writes to durable storage.
    pub fn flush(&self) -> Result<(), StoreError> {
        let _ = self.tree.flush()?;
        Ok(())
    }
}

/// A handle to an embedded database on disk, opened for the duration of
/// one operation and dropped immediately after.
pub struct Store {
    db: sled::Db,
}

impl Store {
    /// Opens (creating if absent) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let db = sled::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { db })
    }

    /// Opens a named tree within this database.
    pub fn tree(&self, name: &str) -> Result<Tree, StoreError> {
        Ok(Tree {
            tree: self.db.open_tree(name)?,
        })
    }

    /// The default state directory used when no explicit path is
    /// configured: `$CFAGENT_STATEDIR`, falling back to the OS state/data
    /// directory, falling back to a temp directory.
    pub fn default_state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(std::env::temp_dir)
            .join("cfagent")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_delete_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path().join("db")).expect("open");
        let tree = store.tree("locks").expect("tree");

        assert_eq!(tree.get("k").unwrap(), None);
        let prev = tree.put("k", b"v1").unwrap();
        assert_eq!(prev, None);
        assert_eq!(tree.get("k").unwrap(), Some(b"v1".to_vec()));

        let prev = tree.put("k", b"v2").unwrap();
        assert_eq!(prev, Some(b"v1".to_vec()));

        let removed = tree.delete("k").unwrap();
        assert_eq!(removed, Some(b"v2".to_vec()));
        assert_eq!(tree.get("k").unwrap(), None);
    }

    #[test]
    fn iter_prefix_is_sorted_and_scoped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path().join("db")).expect("open");
        let tree = store.tree("dirs").expect("tree");

        tree.put("D_/etc", b"a").unwrap();
        tree.put("D_/var", b"b").unwrap();
        tree.put("H_MD5\0/etc/passwd", b"c").unwrap();

        let matches: Vec<_> = tree.iter_prefix("D_").map(|(k, _)| k).collect();
        assert_eq!(matches, vec!["D_/etc".to_string(), "D_/var".to_string()]);
    }

    #[test]
    fn separate_trees_are_isolated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path().join("db")).expect("open");
        let locks = store.tree("locks").expect("tree");
        let hashes = store.tree("hashes").expect("tree");

        locks.put("shared", b"lock-value").unwrap();
        assert_eq!(hashes.get("shared").unwrap(), None);
    }
}
