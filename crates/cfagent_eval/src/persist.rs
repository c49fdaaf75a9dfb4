// SPDX-License-Identifier: Apache-2.0

//! Persistent (time-to-live) classes: a keyed table surviving between agent
//! runs, injected as a trait so this crate never dictates a storage engine.

use std::collections::HashMap;

/// What happens to a persistent class entry once it expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistPolicy {
    /// The class is re-armed for another TTL window on next set.
    Preserve,
    /// The class is dropped once expired and must be explicitly re-added.
    Reset,
}

/// One persistent-class entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistentClass {
    pub name: String,
    /// Unix-epoch seconds at which this entry expires.
    pub expires_at: u64,
    pub policy: PersistPolicy,
}

/// A keyed, time-to-live table of persistent classes. Implemented against
/// an embedded store in `cfagent_store`; an in-memory implementation is
/// provided here for tests and for runs with no persistence requirement.
pub trait PersistentClassStore {
    /// Loads every entry not yet expired at `now`, purging expired ones as
    /// a side effect.
    fn load(&mut self, now: u64) -> Vec<PersistentClass>;

    /// Sets or refreshes an entry with `ttl_seconds` remaining from `now`.
    fn set(&mut self, name: &str, ttl_seconds: u64, policy: PersistPolicy, now: u64);
}

/// A simple in-process [`PersistentClassStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistentClassStore {
    entries: HashMap<String, PersistentClass>,
}

impl MemoryPersistentClassStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistentClassStore for MemoryPersistentClassStore {
    fn load(&mut self, now: u64) -> Vec<PersistentClass> {
        self.entries.retain(|_, e| e.expires_at > now);
        self.entries.values().cloned().collect()
    }

    fn set(&mut self, name: &str, ttl_seconds: u64, policy: PersistPolicy, now: u64) {
        self.entries.insert(
            name.to_owned(),
            PersistentClass {
                name: name.to_owned(),
                expires_at: now + ttl_seconds,
                policy,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_entries_are_purged_on_load() {
        let mut store = MemoryPersistentClassStore::new();
        store.set("rebooted", 60, PersistPolicy::Reset, 1_000);
        assert_eq!(store.load(1_030).len(), 1);
        assert_eq!(store.load(1_100).len(), 0);
    }

    #[test]
    fn set_refreshes_an_existing_entry() {
        let mut store = MemoryPersistentClassStore::new();
        store.set("patched", 60, PersistPolicy::Preserve, 0);
        store.set("patched", 60, PersistPolicy::Preserve, 50);
        let loaded = store.load(90);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].expires_at, 110);
    }
}
