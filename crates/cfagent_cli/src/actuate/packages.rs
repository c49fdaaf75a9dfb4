// SPDX-License-Identifier: Apache-2.0

//! `packages` promises whose `package_method` attribute names a
//! `package_module` body: resolving the provider executable and dispatching to
//! [`cfagent_pkgmodule::present`] / [`cfagent_pkgmodule::absent`].

use super::{body_scalar, resolve_body_ref};
use crate::error::CliError;
use cfagent_config::Config;
use cfagent_eval::context::EvalContext;
use cfagent_expander::expand::ConcretePromise;
use cfagent_model::value::RightValue;
use cfagent_model::Policy;
use cfagent_pkgmodule::{PackageRequest, RequestedVersion};
use std::path::PathBuf;
use std::time::Duration;

/// The (invented, for the same reason [`super::files::build_edit_operations`]
/// invents `edit_bundles`: `cfagent_model::syntax` only tracks promise-type
/// attribute vocabularies, not body-internal ones) attributes a
/// `package_module`-typed body carries: the provider executable's path
/// (relative paths resolve against `--bin-dir`), its call timeout in
/// seconds, and its `ifelapsed` cache-refresh throttle in seconds.
const PROVIDER_PATH_ATTR: &str = "provider_path";
const PROVIDER_NAME_ATTR: &str = "provider_name";
const TIMEOUT_ATTR: &str = "timeout";
const IFELAPSED_ATTR: &str = "ifelapsed";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_IFELAPSED_SECS: u64 = 600;

/// Builds the [`PackageRequest`] for one concrete `packages` promise, and
/// the `package_policy` value (`"present"` by default) deciding whether to
/// call `present` or `absent`. Returns `None` if the promise's
/// `package_method` does not resolve to a known `package_module` body —
/// logged by the caller as a skip rather than treated as fatal, since a
/// dangling reference there is a validator-level concern, not an
/// actuation-time one.
pub fn build_package_request(
    policy: &Policy,
    ctx: &EvalContext<'_>,
    namespace: &str,
    concrete: &ConcretePromise,
    config: &Config,
) -> Result<Option<(PackageRequest, String)>, CliError> {
    let Some(body_id) = resolve_body_ref(policy, namespace, concrete, "packages", "package_method", "package_module") else {
        return Ok(None);
    };

    let scalar = |lval: &str| concrete.constraint(lval).and_then(RightValue::as_scalar);

    let version = match scalar("version") {
        Some("latest") => RequestedVersion::Latest,
        Some(other) => RequestedVersion::Exact(other.to_owned()),
        None => RequestedVersion::Latest,
    };
    let architecture = scalar("architecture").map(str::to_owned);
    let package_policy = scalar("package_policy").unwrap_or("present").to_owned();

    let provider_name = body_scalar(policy, ctx, body_id, PROVIDER_NAME_ATTR).unwrap_or_else(|| "default".to_owned());
    let provider_path_raw = body_scalar(policy, ctx, body_id, PROVIDER_PATH_ATTR).ok_or_else(|| CliError::InvalidAttribute {
        promiser: concrete.promiser.clone(),
        lval: "package_method",
        reason: format!("referenced body carries no {PROVIDER_PATH_ATTR:?} attribute"),
    })?;
    let mut provider_path = PathBuf::from(provider_path_raw);
    if provider_path.is_relative() {
        provider_path = config.bin_dir.join(provider_path);
    }

    let timeout_secs = body_scalar(policy, ctx, body_id, TIMEOUT_ATTR)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let ifelapsed_secs = body_scalar(policy, ctx, body_id, IFELAPSED_ATTR)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_IFELAPSED_SECS);

    let req = PackageRequest {
        name: concrete.promiser.clone(),
        version,
        architecture,
        provider_name: provider_name.clone(),
        provider_path,
        file_path: None,
        timeout: Duration::from_secs(timeout_secs),
        ifelapsed_secs,
    };
    Ok(Some((req, package_policy)))
}
