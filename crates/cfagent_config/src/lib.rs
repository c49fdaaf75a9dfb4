// SPDX-License-Identifier: Apache-2.0

//! Project-level configuration for `cfagent`.
//!
//! Resolution order (highest priority first): explicit CLI overrides passed
//! into [`Config::resolve`], `CFAGENT_*` environment variables, an optional
//! `.cfagent.toml` discovered by walking up from the working directory,
//! then compiled defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = ".cfagent.toml";

/// CLI-supplied overrides, all optional; `None` falls through to the next
/// resolution tier.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Override for `work_dir`.
    pub work_dir: Option<PathBuf>,
    /// Override for `state_dir`.
    pub state_dir: Option<PathBuf>,
    /// Override for `bin_dir`.
    pub bin_dir: Option<PathBuf>,
    /// Forces dry-run mode on regardless of file/env config.
    pub dry_run: bool,
    /// Forces the strict "full check" validation mode on.
    pub full_check: bool,
}

/// On-disk `.cfagent.toml` shape. All fields optional; absent fields fall
/// through to environment variables then compiled defaults.
#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
#[serde(default)]
struct FileConfig {
    work_dir: Option<PathBuf>,
    state_dir: Option<PathBuf>,
    bin_dir: Option<PathBuf>,
    dry_run: Option<bool>,
    full_check: Option<bool>,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Scratch/work directory used for transient agent state.
    pub work_dir: PathBuf,
    /// Directory holding the change-tracking DB and lock DB.
    pub state_dir: PathBuf,
    /// Directory the package-module protocol looks for provider
    /// executables in.
    pub bin_dir: PathBuf,
    /// When true, actuators report would-be changes without applying them.
    pub dry_run: bool,
    /// When true, the validator promotes advisory findings to errors.
    pub full_check: bool,
}

impl Config {
    /// Resolves configuration starting from the given working directory,
    /// applying `overrides` last (highest priority).
    pub fn resolve(start_dir: &Path, overrides: &CliOverrides) -> Self {
        let file = discover_file_config(start_dir);

        let work_dir = overrides
            .work_dir
            .clone()
            .or_else(|| env_path("CFAGENT_WORKDIR"))
            .or_else(|| file.as_ref().and_then(|f| f.work_dir.clone()))
            .unwrap_or_else(default_work_dir);

        let state_dir = overrides
            .state_dir
            .clone()
            .or_else(|| env_path("CFAGENT_STATEDIR"))
            .or_else(|| file.as_ref().and_then(|f| f.state_dir.clone()))
            .unwrap_or_else(default_state_dir);

        let bin_dir = overrides
            .bin_dir
            .clone()
            .or_else(|| env_path("CFAGENT_BINDIR"))
            .or_else(|| file.as_ref().and_then(|f| f.bin_dir.clone()))
            .unwrap_or_else(default_bin_dir);

        let dry_run = overrides.dry_run
            || env_bool("CFAGENT_DRY_RUN")
            || file.as_ref().and_then(|f| f.dry_run).unwrap_or(false);

        let full_check = overrides.full_check
            || env_bool("CFAGENT_FULL_CHECK")
            || file.as_ref().and_then(|f| f.full_check).unwrap_or(false);

        Config {
            work_dir,
            state_dir,
            bin_dir,
            dry_run,
            full_check,
        }
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name).map(PathBuf::from)
}

fn env_bool(name: &str) -> bool {
    matches!(
        std::env::var(name).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn default_work_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("cfagent")
}

fn default_state_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("cfagent")
}

fn default_bin_dir() -> PathBuf {
    PathBuf::from("/var/cfagent/modules")
}

/// Walks up from `start_dir` looking for `.cfagent.toml`, parsing the first
/// one found. Returns `None` if none is found or the file fails to parse
/// (a malformed config file is not fatal: we fall back silently, logging
/// through the `log` facade so the CLI can surface it if it wants to).
fn discover_file_config(start_dir: &Path) -> Option<FileConfig> {
    let mut dir = Some(start_dir);
    while let Some(d) = dir {
        let candidate = d.join(CONFIG_FILENAME);
        if candidate.is_file() {
            return match std::fs::read_to_string(&candidate) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(cfg) => Some(cfg),
                    Err(err) => {
                        log::warn!("{}: failed to parse: {err}", candidate.display());
                        None
                    }
                },
                Err(err) => {
                    log::warn!("{}: failed to read: {err}", candidate.display());
                    None
                }
            };
        }
        dir = d.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::resolve(dir.path(), &CliOverrides::default());
        assert!(!cfg.dry_run);
        assert!(!cfg.full_check);
    }

    #[test]
    fn cli_override_wins_over_everything() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(CONFIG_FILENAME), "dry_run = false\n")
            .expect("write config");
        let overrides = CliOverrides {
            dry_run: true,
            ..Default::default()
        };
        let cfg = Config::resolve(dir.path(), &overrides);
        assert!(cfg.dry_run);
    }

    #[test]
    fn file_config_is_discovered_from_a_nested_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).expect("mkdir");
        std::fs::write(dir.path().join(CONFIG_FILENAME), "full_check = true\n")
            .expect("write config");
        let cfg = Config::resolve(&nested, &CliOverrides::default());
        assert!(cfg.full_check);
    }
}
