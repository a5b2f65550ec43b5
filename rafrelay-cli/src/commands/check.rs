//! Implementation of the 'check' subcommand.
//!
//! Resolves the three external tools the same way a conversion would, runs
//! each one's version query and reports the result.

use crate::cli::CheckArgs;
use crate::error::{CliResult, ExitStatus};
use crate::terminal;

use rafrelay_core::config::{DEFAULT_CHECK_TIMEOUT, application_dir};
use rafrelay_core::external::{StdProcessRunner, ToolTable};

use log::debug;
use std::time::Duration;

/// Checks every tool and prints one report line each.
///
/// Returns `ToolsUnusable` when any tool is not Ok.
pub fn run_check(args: CheckArgs) -> CliResult<ExitStatus> {
    let tools_dir = args.tools.tools_dir.clone().unwrap_or_else(application_dir);
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_CHECK_TIMEOUT);
    debug!("Checking tools under {}", tools_dir.display());

    let tools = ToolTable::resolve_all(&args.tools.tool_paths(), &tools_dir)
        .check_all(&StdProcessRunner, timeout);
    terminal::print_tool_table(&tools);

    if tools.all_ok() {
        Ok(ExitStatus::Success)
    } else {
        Ok(ExitStatus::ToolsUnusable)
    }
}
