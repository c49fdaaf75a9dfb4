// SPDX-License-Identifier: Apache-2.0

//! The `present`/`absent` package actuators, wired over [`crate::protocol`] and
//! [`crate::cache`].

use crate::cache::PackageCache;
use crate::error::PkgModuleError;
use crate::protocol::{self, Verb};
use cfagent_common::outcome::PromiseOutcome;
use cfagent_common::Logger;
use cfagent_locks::{AcquireOutcome, LockManager, GLOBAL_PACKAGE_LOCK};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The package type a provider reports for one name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageType {
    Repo,
    File,
}

/// The version an actuator is asked to bring about. `Latest` is valid only
/// for [`PackageRequest::present`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedVersion {
    Exact(String),
    Latest,
}

/// A fully resolved `packages` promise instance, everything a variable
/// reference in it already expanded by [`cfagent_expander`].
#[derive(Debug, Clone)]
pub struct PackageRequest {
    pub name: String,
    pub version: RequestedVersion,
    pub architecture: Option<String>,
    pub provider_name: String,
    pub provider_path: PathBuf,
    pub file_path: Option<PathBuf>,
    pub timeout: Duration,
    pub ifelapsed_secs: u64,
}

fn attrs_for(req: &PackageRequest, version: Option<&str>) -> Vec<(String, String)> {
    let mut attrs = vec![("Name".to_owned(), req.name.clone())];
    if let Some(v) = version {
        attrs.push(("Version".to_owned(), v.to_owned()));
    }
    if let Some(arch) = &req.architecture {
        attrs.push(("Architecture".to_owned(), arch.clone()));
    }
    if let Some(path) = &req.file_path {
        attrs.push(("File".to_owned(), path.display().to_string()));
    }
    attrs
}

fn get_package_data(req: &PackageRequest) -> Result<(PackageType, Option<String>), PkgModuleError> {
    let response = protocol::call_module(&req.provider_path, Verb::GetPackageData, &attrs_for(req, None), req.timeout)?;
    let package_type = match response.get("PackageType") {
        Some("file") => PackageType::File,
        _ => PackageType::Repo,
    };
    Ok((package_type, response.get("Version").map(str::to_owned)))
}

fn refresh_installed(req: &PackageRequest, cache: &PackageCache, now: u64, force: bool) -> Result<(), PkgModuleError> {
    if !cache.installed_needs_refresh(now, req.ifelapsed_secs, force)? {
        return Ok(());
    }
    let response = protocol::call_module(&req.provider_path, Verb::ListInstalled, &[], req.timeout)?;
    let entries: Vec<(String, String, String)> = response
        .get_all("Name")
        .zip(response.get_all("Version"))
        .zip(response.get_all("Architecture"))
        .map(|((n, v), a)| (n.to_owned(), v.to_owned(), a.to_owned()))
        .collect();
    let inventory = entries
        .iter()
        .map(|(n, v, a)| format!("{n}={v}:{a}"))
        .collect::<Vec<_>>()
        .join("\n");
    cache.replace_installed(&entries, inventory.as_bytes(), now)
}

fn refresh_updates(req: &PackageRequest, cache: &PackageCache, now: u64, force: bool, local: bool) -> Result<(), PkgModuleError> {
    // If the DB file is missing, a local-updates request is promoted to a
    // full updates request so the cache gets populated from the network.
    let promote = local && !cache.updates_populated()?;
    if !promote && !cache.updates_needs_refresh(now, req.ifelapsed_secs, force)? {
        return Ok(());
    }
    let verb = if local && !promote { Verb::ListUpdatesLocal } else { Verb::ListUpdates };
    let response = protocol::call_module(&req.provider_path, verb, &[], req.timeout)?;
    let mut by_name: std::collections::HashMap<String, Vec<(String, String)>> = std::collections::HashMap::new();
    for ((name, version), arch) in response
        .get_all("Name")
        .zip(response.get_all("Version"))
        .zip(response.get_all("Architecture"))
    {
        by_name.entry(name.to_owned()).or_default().push((version.to_owned(), arch.to_owned()));
    }
    let entries: Vec<_> = by_name.into_iter().collect();
    cache.replace_updates(&entries, now)
}

fn install(req: &PackageRequest, package_type: PackageType, version: &str) -> Result<(), PkgModuleError> {
    let verb = match package_type {
        PackageType::Repo => Verb::RepoInstall,
        PackageType::File => Verb::FileInstall,
    };
    protocol::call_module(&req.provider_path, verb, &attrs_for(req, Some(version)), req.timeout)?;
    Ok(())
}

fn architectures_to_install(req: &PackageRequest, cache: &PackageCache) -> Result<Vec<(String, String)>, PkgModuleError> {
    let updates = cache.updates_for(&req.name)?;
    let mut targets = Vec::new();
    for (version, arch) in updates {
        if let Some(wanted) = &req.architecture {
            if wanted != &arch {
                continue;
            }
        }
        if !cache.is_installed(&req.name, &version, &arch)? {
            targets.push((version, arch));
        }
    }
    Ok(targets)
}

/// Brings `req.name` into the `present` state. Takes [`GLOBAL_PACKAGE_LOCK`] for the duration
/// of the call.
pub fn present(
    req: &PackageRequest,
    cache: &PackageCache,
    locks: &LockManager,
    logger: &dyn Logger,
    now: u64,
) -> Result<PromiseOutcome, PkgModuleError> {
    let lock = match locks.acquire_lock(GLOBAL_PACKAGE_LOCK, 0, req.timeout.as_secs().max(1), now, logger)? {
        AcquireOutcome::Acquired(handle) => handle,
        AcquireOutcome::Held | AcquireOutcome::Skipped => return Ok(PromiseOutcome::Skipped),
    };

    let result = present_locked(req, cache, now);
    locks.yield_lock(&lock, now)?;
    result
}

fn present_locked(req: &PackageRequest, cache: &PackageCache, now: u64) -> Result<PromiseOutcome, PkgModuleError> {
    let (package_type, policy_version) = get_package_data(req)?;

    if package_type == PackageType::File {
        if let (RequestedVersion::Exact(wanted), Some(reported)) = (&req.version, &policy_version) {
            if wanted != reported {
                return Ok(PromiseOutcome::Fail);
            }
        }
    }

    refresh_installed(req, cache, now, false)?;

    match &req.version {
        RequestedVersion::Latest => {
            refresh_updates(req, cache, now, true, false)?;
            let targets = architectures_to_install(req, cache)?;
            if targets.is_empty() {
                return Ok(PromiseOutcome::Noop);
            }
            for (version, _arch) in &targets {
                install(req, package_type, version)?;
            }
            refresh_installed(req, cache, now, true)?;
            refresh_updates(req, cache, now, false, true)?;
            for (version, arch) in &targets {
                if !cache.is_installed(&req.name, version, arch)? {
                    return Err(PkgModuleError::ConfirmationFailed(req.name.clone()));
                }
            }
            Ok(PromiseOutcome::Change)
        }
        RequestedVersion::Exact(version) => {
            let arch = req.architecture.clone().unwrap_or_default();
            if cache.is_installed(&req.name, version, &arch)? {
                return Ok(PromiseOutcome::Noop);
            }
            install(req, package_type, version)?;
            refresh_installed(req, cache, now, true)?;
            refresh_updates(req, cache, now, false, true)?;
            if !cache.is_installed(&req.name, version, &arch)? {
                return Err(PkgModuleError::ConfirmationFailed(req.name.clone()));
            }
            Ok(PromiseOutcome::Change)
        }
    }
}

/// Brings `req.name` into the `absent` state. Takes [`GLOBAL_PACKAGE_LOCK`] for the duration
/// of the call.
pub fn absent(
    req: &PackageRequest,
    cache: &PackageCache,
    locks: &LockManager,
    logger: &dyn Logger,
    now: u64,
) -> Result<PromiseOutcome, PkgModuleError> {
    if req.version == RequestedVersion::Latest {
        return Err(PkgModuleError::LatestInvalidForAbsent);
    }

    let lock = match locks.acquire_lock(GLOBAL_PACKAGE_LOCK, 0, req.timeout.as_secs().max(1), now, logger)? {
        AcquireOutcome::Acquired(handle) => handle,
        AcquireOutcome::Held | AcquireOutcome::Skipped => return Ok(PromiseOutcome::Skipped),
    };

    let result = absent_locked(req, cache, now);
    locks.yield_lock(&lock, now)?;
    result
}

fn absent_locked(req: &PackageRequest, cache: &PackageCache, now: u64) -> Result<PromiseOutcome, PkgModuleError> {
    let RequestedVersion::Exact(version) = &req.version else {
        unreachable!("checked by caller")
    };
    let arch = req.architecture.clone().unwrap_or_default();

    refresh_installed(req, cache, now, false)?;
    if !cache.is_installed(&req.name, version, &arch)? {
        return Ok(PromiseOutcome::Noop);
    }

    protocol::call_module(&req.provider_path, Verb::Remove, &attrs_for(req, Some(version)), req.timeout)?;
    refresh_installed(req, cache, now, true)?;
    refresh_updates(req, cache, now, false, true)?;

    if cache.is_installed(&req.name, version, &arch)? {
        return Err(PkgModuleError::ConfirmationFailed(req.name.clone()));
    }
    Ok(PromiseOutcome::Change)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attrs_for_includes_version_and_architecture_when_present() {
        let req = PackageRequest {
            name: "bash".to_owned(),
            version: RequestedVersion::Exact("5.1".to_owned()),
            architecture: Some("amd64".to_owned()),
            provider_name: "apt".to_owned(),
            provider_path: Path::new("/bin/true").to_path_buf(),
            file_path: None,
            timeout: Duration::from_secs(30),
            ifelapsed_secs: 60,
        };
        let attrs = attrs_for(&req, Some("5.1"));
        assert!(attrs.contains(&("Name".to_owned(), "bash".to_owned())));
        assert!(attrs.contains(&("Version".to_owned(), "5.1".to_owned())));
        assert!(attrs.contains(&("Architecture".to_owned(), "amd64".to_owned())));
    }
}
