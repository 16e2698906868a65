pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "quartermaster",
    about = "Quartermaster operator CLI",
    long_about = "Inspect the quartermaster bot's configuration, readiness, and record store.",
    after_help = "Examples:\n  quartermaster doctor --json\n  quartermaster config\n  quartermaster bank"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, token readiness, and data-dir writability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Show the persisted bank ledger summary")]
    Bank,
    #[command(about = "List the persisted event roster")]
    Events,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Bank => commands::bank::run(),
        Command::Events => commands::events::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
