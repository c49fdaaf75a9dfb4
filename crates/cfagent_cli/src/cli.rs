// SPDX-License-Identifier: Apache-2.0

//! Manage command line arguments

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command line arguments.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Turn debugging information on
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Turn the quiet mode on (i.e., minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// List of supported commands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Supported commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Validate a policy document without actuating it
    Validate(ValidateCommand),
    /// Evaluate and actuate a policy document
    Run(RunCommand),
    /// List the package provider executables found in the module directory
    ListModules(ListModulesCommand),
}

/// Shared overrides every subcommand that touches [`cfagent_config`]
/// accepts.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Scratch/work directory for transient agent state.
    #[arg(long)]
    pub work_dir: Option<PathBuf>,
    /// Directory holding the change-tracking and lock databases.
    #[arg(long)]
    pub state_dir: Option<PathBuf>,
    /// Directory the package module protocol looks for provider
    /// executables in.
    #[arg(long)]
    pub bin_dir: Option<PathBuf>,
    /// Report would-be changes without applying them.
    #[arg(long)]
    pub dry_run: bool,
    /// Promote advisory validation findings to errors.
    #[arg(long)]
    pub full_check: bool,
}

/// `cfagent validate <policy.json>`.
#[derive(Args)]
pub struct ValidateCommand {
    /// Path to a policy document in the JSON bridge format. This engine has no DSL parser of
    /// its own: a `.cf` source tree must already have been compiled to this form upstream.
    pub policy: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// `cfagent run <policy.json>`.
#[derive(Args)]
pub struct RunCommand {
    /// Path to a policy document in the JSON bridge format.
    pub policy: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// `cfagent list-modules`.
#[derive(Args)]
pub struct ListModulesCommand {
    #[command(flatten)]
    pub config: ConfigArgs,
}
