// SPDX-License-Identifier: Apache-2.0

//! Named locks with `ifelapsed`/`expireafter` semantics used to throttle
//! promise re-execution. Lock records are stored via `cfagent_store` (a
//! sled tree named `"locks"`) as a 16-byte record of
//! `{last_started: u64, last_completed: u64}`, always written
//! little-endian for portability across hosts.

use cfagent_common::Logger;
use cfagent_store::{Store, StoreError};

/// The lock name package actuators take before calling a provider.
pub const GLOBAL_PACKAGE_LOCK: &str = "cf_lock_global";

const LOCKS_TREE: &str = "locks";

/// A lock record: seconds-since-epoch of the last completed run and the
/// last (possibly still in-flight) start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct LockRecord {
    last_started: u64,
    last_completed: u64,
}

impl LockRecord {
    fn to_bytes(self) -> [u8; 16] {
        let mut buf = [0u8; 16];
        buf[0..8].copy_from_slice(&self.last_started.to_le_bytes());
        buf[8..16].copy_from_slice(&self.last_completed.to_le_bytes());
        buf
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.len() != 16 {
            return Self::default();
        }
        let mut started = [0u8; 8];
        let mut completed = [0u8; 8];
        started.copy_from_slice(&bytes[0..8]);
        completed.copy_from_slice(&bytes[8..16]);
        Self {
            last_started: u64::from_le_bytes(started),
            last_completed: u64::from_le_bytes(completed),
        }
    }
}

/// Failures acquiring or releasing a lock.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum LockError {
    /// The underlying store could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A lock successfully acquired: the caller must eventually call
/// [`LockManager::yield_lock`] with this handle's name once the guarded
/// promise has finished actuating.
#[derive(Debug, Clone)]
pub struct LockHandle {
    /// The fully qualified lock name this handle was acquired for.
    pub name: String,
}

/// The three outcomes `AcquireLock` can produce.
#[derive(Debug)]
pub enum AcquireOutcome {
    /// `now - last_completed < ifelapsed`: the promise ran recently enough
    /// that re-running it is pointless.
    Skipped,
    /// Another run started this lock within `expireafter` and has not yet
    /// yielded it.
    Held,
    /// The lock was acquired; actuation may proceed.
    Acquired(LockHandle),
}

/// Owns the lock store and grants/releases named locks.
pub struct LockManager {
    tree: cfagent_store::Tree,
}

impl LockManager {
    /// Opens the lock tree of `store`.
    pub fn open(store: &Store) -> Result<Self, LockError> {
        Ok(Self {
            tree: store.tree(LOCKS_TREE)?,
        })
    }

    /// Builds the per-promise lock name from a promiser and the file it
    /// names, as described above ("Locks are per-promise (keyed by promiser + filename)").
    pub fn promise_lock_name(promiser: &str, filename: &str) -> String {
        format!("{promiser}\0{filename}")
    }

    fn load(&self, name: &str) -> Result<LockRecord, LockError> {
        Ok(self
            .tree
            .get(name)?
            .map(|bytes| LockRecord::from_bytes(&bytes))
            .unwrap_or_default())
    }

    fn store(&self, name: &str, record: LockRecord) -> Result<(), LockError> {
        self.tree.put(name, &record.to_bytes())?;
        Ok(())
    }

    /// Attempts to acquire `name`, throttled by `ifelapsed_secs` since the
    /// last completion and bounded by `expireafter_secs` since the last
    /// (possibly abandoned) start.
    pub fn acquire_lock(
        &self,
        name: &str,
        ifelapsed_secs: u64,
        expireafter_secs: u64,
        now: u64,
        logger: &dyn Logger,
    ) -> Result<AcquireOutcome, LockError> {
        let record = self.load(name)?;

        if now.saturating_sub(record.last_completed) < ifelapsed_secs {
            logger.trace(&format!("lock '{name}' skipped: ifelapsed not yet satisfied"));
            return Ok(AcquireOutcome::Skipped);
        }

        if record.last_started != 0 && now.saturating_sub(record.last_started) < expireafter_secs {
            logger.warn(&format!("lock '{name}' held by another run"));
            return Ok(AcquireOutcome::Held);
        }

        self.store(
            name,
            LockRecord {
                last_started: now,
                last_completed: record.last_completed,
            },
        )?;
        logger.trace(&format!("lock '{name}' acquired"));
        Ok(AcquireOutcome::Acquired(LockHandle { name: name.to_owned() }))
    }

    /// Marks `handle`'s lock as completed at `now` and clears its
    /// in-flight start.
    pub fn yield_lock(&self, handle: &LockHandle, now: u64) -> Result<(), LockError> {
        let mut record = self.load(&handle.name)?;
        record.last_completed = now;
        record.last_started = 0;
        self.store(&handle.name, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullLogger;
    impl Logger for NullLogger {
        fn trace(&self, _message: &str) {}
        fn info(&self, _message: &str) {}
        fn warn(&self, _message: &str) {}
        fn error(&self, _message: &str) {}
        fn success(&self, _message: &str) {}
        fn log(&self, _message: &str) {}
    }

    #[test]
    fn first_acquire_succeeds_then_yielded_lock_can_be_reacquired() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path().join("db")).expect("open");
        let mgr = LockManager::open(&store).expect("open locks");

        let outcome = mgr.acquire_lock("demo", 60, 3600, 1_000, &NullLogger).unwrap();
        let handle = match outcome {
            AcquireOutcome::Acquired(h) => h,
            other => panic!("expected Acquired, got {other:?}"),
        };
        mgr.yield_lock(&handle, 1_010).unwrap();

        // Not yet ifelapsed past completion: skipped.
        let outcome = mgr.acquire_lock("demo", 60, 3600, 1_020, &NullLogger).unwrap();
        assert!(matches!(outcome, AcquireOutcome::Skipped));

        // Past ifelapsed: acquired again.
        let outcome = mgr.acquire_lock("demo", 60, 3600, 2_000, &NullLogger).unwrap();
        assert!(matches!(outcome, AcquireOutcome::Acquired(_)));
    }

    #[test]
    fn concurrent_start_without_yield_is_held_until_expireafter() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path().join("db")).expect("open");
        let mgr = LockManager::open(&store).expect("open locks");

        let outcome = mgr.acquire_lock("demo", 0, 1_000, 0, &NullLogger).unwrap();
        assert!(matches!(outcome, AcquireOutcome::Acquired(_)));

        // Started but never yielded; still within expireafter: held.
        let outcome = mgr.acquire_lock("demo", 0, 1_000, 500, &NullLogger).unwrap();
        assert!(matches!(outcome, AcquireOutcome::Held));

        // Past expireafter: treated as abandoned, reacquired.
        let outcome = mgr.acquire_lock("demo", 0, 1_000, 2_000, &NullLogger).unwrap();
        assert!(matches!(outcome, AcquireOutcome::Acquired(_)));
    }

    #[test]
    fn global_package_lock_name_is_stable() {
        assert_eq!(GLOBAL_PACKAGE_LOCK, "cf_lock_global");
    }

    #[test]
    fn promise_lock_name_keys_by_promiser_and_filename() {
        let a = LockManager::promise_lock_name("/etc/motd", "file:///etc/motd");
        let b = LockManager::promise_lock_name("/etc/motd", "file:///etc/other");
        assert_ne!(a, b);
    }
}
