//! `cfagent`: a declarative configuration-management promise evaluation
//! engine.

use cfagent_cli::Cli;
use cfagent_logger::QuietLogger;
use cfagent_logger::ConsoleLogger;
use clap::Parser;

fn main() {
    let cli = Cli::parse();

    let exit_code = if cli.quiet {
        let log = QuietLogger::new();
        cfagent_cli::run_command(&cli, &log)
    } else {
        let log = ConsoleLogger::new(cli.debug > 0);
        cfagent_cli::run_command(&cli, &log)
    };

    #[allow(clippy::exit)]
    std::process::exit(exit_code);
}
