// ============================================================================
// rafrelay-cli/src/main.rs
// ============================================================================
//
// MAIN ENTRY POINT: rafrelay Command-Line Interface
//
// This file parses the command line, installs the logging backend and
// dispatches to the subcommand implementations in the library half of the
// crate. It owns the process exit code:
//
// - 0: success
// - 1: fatal error (bad options, unusable tools, bad directories), or
//      `check` found an unusable tool
// - 2: the batch finished but some files failed
//
// AI-ASSISTANT-INFO: Entry point of the rafrelay CLI

// ---- External crate imports ----
use clap::Parser;
use log::error;

// ---- Standard library imports ----
use std::process;

// ---- Internal crate imports ----
use rafrelay_cli::cli::{Cli, Commands};
use rafrelay_cli::error::{CliResult, ExitStatus};
use rafrelay_cli::{logging, run_check, run_convert, terminal};

fn run(cli: Cli) -> CliResult<ExitStatus> {
    let log_dir = match &cli.command {
        Commands::Convert(args) => args.log_dir.clone(),
        Commands::Check(_) => None,
    };
    let log_path = logging::init(cli.verbose, log_dir.as_deref())?;

    let result = match cli.command {
        Commands::Convert(args) => run_convert(args, log_path.as_deref()),
        Commands::Check(args) => run_check(args),
    };
    // The console already gets the error from main; keep it in the run log too.
    if let (Err(e), Some(_)) = (&result, &log_path) {
        error!("{}", e);
    }
    result
}

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(status) => process::exit(status.code()),
        Err(e) => {
            terminal::print_error("Error", &e.to_string());
            process::exit(1);
        }
    }
}
