// SPDX-License-Identifier: Apache-2.0

//! The `cfagent` CLI front-end: argument parsing, policy loading through
//! the JSON bridge, and the `validate`/`run`/`list-modules` subcommand
//! bodies.

pub mod actuate;
pub mod cli;
pub mod error;
pub mod run;

pub use cli::Cli;
pub use error::CliError;
pub use run::run_command;
