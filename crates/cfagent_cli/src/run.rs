// SPDX-License-Identifier: Apache-2.0

//! The `validate`/`run`/`list-modules` subcommand bodies: loading a policy
//! document through the JSON bridge, validating it, then — for `run` — evaluating every
//! bundle's sections and dispatching each promise to its actuator. This engine has no policy
//! parser: a policy document must already be in the JSON bridge wire format before it reaches
//! this crate.

use crate::actuate::{files, packages, resolve_body_ref};
use crate::cli::{Cli, Commands, ConfigArgs, ListModulesCommand, RunCommand, ValidateCommand};
use crate::error::CliError;
use cfagent_changetracker::{ChangeTracker, NoLegacyImport};
use cfagent_common::error::AgentError;
use cfagent_common::outcome::PromiseOutcome;
use cfagent_common::result::Outcome;
use cfagent_common::{Logger, PromisePath};
use cfagent_config::{CliOverrides, Config};
use cfagent_editline::EditFile;
use cfagent_eval::context::EvalContext;
use cfagent_expander::expand::Expansion;
use cfagent_locks::LockManager;
use cfagent_model::Policy;
use cfagent_pkgmodule::PackageCache;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

fn resolve_config(args: &ConfigArgs) -> Config {
    let overrides = CliOverrides {
        work_dir: args.work_dir.clone(),
        state_dir: args.state_dir.clone(),
        bin_dir: args.bin_dir.clone(),
        dry_run: args.dry_run,
        full_check: args.full_check,
    };
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    Config::resolve(&cwd, &overrides)
}

fn load_policy(path: &Path, logger: &dyn Logger) -> Result<Policy, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::ReadPolicy { path: path.to_owned(), source })?;
    let doc: cfagent_json::JsonPolicy =
        serde_json::from_str(&raw).map_err(|source| CliError::ParsePolicy { path: path.to_owned(), source })?;
    match cfagent_json::from_json(&doc) {
        Outcome::Ok(policy, nfes) => {
            for nfe in &nfes {
                logger.warn(&nfe.to_string());
            }
            Ok(policy)
        }
        Outcome::Err(e) => Err(CliError::JsonBridge(e)),
    }
}

/// Validates `policy`, logging every finding. With `full_check` any
/// finding is promoted to fatal; otherwise findings are advisory only.
fn validate_policy_document(policy: &Policy, full_check: bool, logger: &dyn Logger) -> Result<(), CliError> {
    match cfagent_validator::validate(policy) {
        Outcome::Ok((), errors) => {
            if errors.is_empty() {
                return Ok(());
            }
            for e in &errors {
                logger.warn(&e.to_string());
            }
            if full_check {
                return Err(CliError::Validation(cfagent_validator::ValidationError::compound(errors)));
            }
            Ok(())
        }
        Outcome::Err(e) => Err(CliError::Validation(e)),
    }
}

/// Top-level dispatch for the three subcommands.
pub fn run_command(cli: &Cli, logger: &dyn Logger) -> i32 {
    match &cli.command {
        Some(Commands::Validate(cmd)) => validate_subcommand(cmd, logger),
        Some(Commands::Run(cmd)) => run_subcommand(cmd, logger),
        Some(Commands::ListModules(cmd)) => list_modules_subcommand(cmd, logger),
        None => 0,
    }
}

fn validate_subcommand(cmd: &ValidateCommand, logger: &dyn Logger) -> i32 {
    let config = resolve_config(&cmd.config);
    let policy = match load_policy(&cmd.policy, logger) {
        Ok(policy) => policy,
        Err(err) => {
            logger.error(&err.to_string());
            return 1;
        }
    };
    match validate_policy_document(&policy, config.full_check, logger) {
        Ok(()) => {
            logger.success(&format!("{}: policy is valid", cmd.policy.display()));
            0
        }
        Err(err) => {
            logger.error(&err.to_string());
            1
        }
    }
}

fn list_modules_subcommand(cmd: &ListModulesCommand, logger: &dyn Logger) -> i32 {
    let config = resolve_config(&cmd.config);
    match list_modules(&config.bin_dir) {
        Ok(names) => {
            if names.is_empty() {
                logger.info(&format!("no package modules found in {}", config.bin_dir.display()));
            }
            for name in names {
                logger.log(&name);
            }
            0
        }
        Err(err) => {
            logger.error(&err.to_string());
            1
        }
    }
}

fn list_modules(bin_dir: &Path) -> Result<Vec<String>, CliError> {
    let entries = match std::fs::read_dir(bin_dir) {
        Ok(entries) => entries,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(CliError::ListModules { path: bin_dir.to_owned(), source }),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CliError::ListModules { path: bin_dir.to_owned(), source })?;
        if is_executable(&entry) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(unix)]
fn is_executable(entry: &std::fs::DirEntry) -> bool {
    use std::os::unix::fs::PermissionsExt;
    entry.metadata().map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0).unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(entry: &std::fs::DirEntry) -> bool {
    entry.metadata().map(|m| m.is_file()).unwrap_or(false)
}

fn run_subcommand(cmd: &RunCommand, logger: &dyn Logger) -> i32 {
    let config = resolve_config(&cmd.config);

    let policy = match load_policy(&cmd.policy, logger) {
        Ok(policy) => policy,
        Err(err) => {
            logger.error(&err.to_string());
            return 1;
        }
    };
    if let Err(err) = validate_policy_document(&policy, config.full_check, logger) {
        logger.error(&err.to_string());
        return 1;
    }

    let store = match cfagent_store::Store::open(&config.state_dir) {
        Ok(store) => store,
        Err(err) => {
            logger.error(&err.to_string());
            return 1;
        }
    };
    let locks = match LockManager::open(&store) {
        Ok(locks) => locks,
        Err(err) => {
            logger.error(&err.to_string());
            return 1;
        }
    };
    // Change-tracking is opened so its databases exist and migrate on
    // first run; this pass of the orchestrator only actuates `files`
    // (via `edit_line`) and `packages`, neither of which consults the
    // hash/stat/directory tables directly — `edit_line` convergence is
    // driven entirely by re-reading the file, and package state by the
    // provider's own inventory. Recorded in DESIGN.md as an explicit
    // scoping decision.
    let _tracker = match ChangeTracker::open(&store, &config.state_dir, &NoLegacyImport) {
        Ok(tracker) => tracker,
        Err(err) => {
            logger.error(&err.to_string());
            return 1;
        }
    };

    let mut ctx = EvalContext::new(&policy);
    let now = now_secs();
    let mut outcomes = Vec::new();

    for (bundle_id, bundle) in policy.bundles() {
        if bundle.bundle_type != "agent" {
            continue;
        }
        ctx.push_bundle_frame(bundle_id);
        for section_id in policy.bundle(bundle_id).all_sections() {
            let section = policy.section(section_id);
            let promise_type = section.promise_type.clone();
            ctx.push_section_frame(section_id);
            for &promise_id in &section.promises {
                let promise = policy.promise(promise_id);
                if !ctx.is_defined_class(&promise.class_guard).unwrap_or(false) {
                    continue;
                }
                ctx.push_promise_frame(promise_id);
                ctx.push_private_class_frame();

                let concretes: Vec<_> = Expansion::new(&policy, &ctx, promise_id).collect();
                for concrete in concretes {
                    let path = PromisePath {
                        namespace: bundle.namespace.clone(),
                        bundle: bundle.name.clone(),
                        section: promise_type.clone(),
                        promiser: concrete.promiser.clone(),
                    };
                    let result = match promise_type.as_str() {
                        "files" => actuate_files_promise(&policy, &mut ctx, &bundle.namespace, &concrete, &config),
                        "packages" => actuate_packages_promise(&policy, &ctx, &bundle.namespace, &concrete, &config, &store, &locks, logger, now),
                        _ => Ok(PromiseOutcome::Noop),
                    };
                    match result {
                        Ok(outcome) => {
                            logger.promise(outcome, &path, "actuated");
                            outcomes.push(outcome);
                        }
                        Err(err) => {
                            logger.promise(PromiseOutcome::Fail, &path, &err.to_string());
                            outcomes.push(PromiseOutcome::Fail);
                        }
                    }
                }

                ctx.pop_private_class_frame();
                ctx.pop_promise_frame();
            }
            ctx.pop_section_frame();
        }
        ctx.pop_bundle_frame();
    }

    let worst = PromiseOutcome::worst_of(outcomes);
    logger.info(&format!("run complete: {worst}"));
    if worst.is_failure() {
        1
    } else {
        0
    }
}

fn actuate_files_promise(
    policy: &Policy,
    ctx: &mut EvalContext<'_>,
    namespace: &str,
    concrete: &cfagent_expander::expand::ConcretePromise,
    config: &Config,
) -> Result<PromiseOutcome, CliError> {
    let Some(body_id) = resolve_body_ref(policy, namespace, concrete, "files", "edit_line", "edit_line") else {
        return Ok(PromiseOutcome::Noop);
    };

    let ops = files::build_operations_for_edit_line_body(policy, ctx, namespace, body_id)?;
    if ops.is_empty() {
        return Ok(PromiseOutcome::Noop);
    }

    let mut file = EditFile::load(&concrete.promiser)?;
    let outcome = cfagent_editline::run_passes(&mut file, &ops)?;
    file.save(config.dry_run)?;
    Ok(outcome)
}

#[allow(clippy::too_many_arguments)]
fn actuate_packages_promise(
    policy: &Policy,
    ctx: &EvalContext<'_>,
    namespace: &str,
    concrete: &cfagent_expander::expand::ConcretePromise,
    config: &Config,
    store: &cfagent_store::Store,
    locks: &LockManager,
    logger: &dyn Logger,
    now: u64,
) -> Result<PromiseOutcome, CliError> {
    let Some((req, package_policy)) = packages::build_package_request(policy, ctx, namespace, concrete, config)? else {
        return Ok(PromiseOutcome::Noop);
    };

    let cache = PackageCache::open(store, &req.provider_name)?;
    let outcome = match package_policy.as_str() {
        "absent" | "purged" | "deleted" => cfagent_pkgmodule::absent(&req, &cache, locks, logger, now)?,
        _ => cfagent_pkgmodule::present(&req, &cache, locks, logger, now)?,
    };
    Ok(outcome)
}
