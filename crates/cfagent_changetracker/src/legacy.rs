// SPDX-License-Identifier: Apache-2.0

//! One-time migration of the two legacy databases. The concrete legacy on-disk format is out
//! of scope for this engine (building new file-format parsers is explicitly excluded); this
//! module implements the import *hook* and the post-import rename so a caller can plug in a
//! real parser without touching the rest of the tracker.

use cfagent_store::Tree;
use std::path::Path;

/// Imports legacy records into the current hash/stat trees.
pub trait LegacyImporter {
    /// Imports whatever this implementation knows how to read into
    /// `hashes`/`stats`. The default does nothing, leaving migration as
    /// a no-op for callers with no legacy database to import.
    fn import(&self, hashes: &Tree, stats: &Tree) -> Result<(), crate::error::ChangeTrackerError> {
        let _ = (hashes, stats);
        Ok(())
    }
}

/// The default importer: no legacy database, nothing to do.
pub struct NoLegacyImport;

impl LegacyImporter for NoLegacyImport {}

const LEGACY_NAMES: [&str; 2] = ["checksums", "filestats"];

/// Runs `importer` against `hashes`/`stats`, then renames any legacy
/// database files found directly under `state_dir` by appending
/// `.imported` so a later run does not re-import them.
pub fn migrate_legacy(
    state_dir: &Path,
    hashes: &Tree,
    stats: &Tree,
    importer: &dyn LegacyImporter,
) -> Result<(), crate::error::ChangeTrackerError> {
    importer.import(hashes, stats)?;

    for name in LEGACY_NAMES {
        let path = state_dir.join(name);
        if path.exists() {
            let renamed = state_dir.join(format!("{name}.imported"));
            let _ = std::fs::rename(&path, &renamed);
        }
    }
    Ok(())
}
