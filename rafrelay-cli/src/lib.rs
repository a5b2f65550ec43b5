// rafrelay-cli/src/lib.rs
//
// Library portion of the rafrelay CLI application.
// Contains argument definitions, command logic and terminal rendering.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod terminal;

// Re-export items needed by the binary or integration tests
pub use cli::{CheckArgs, Cli, Commands, ConvertArgs, ToolArgs};
pub use commands::check::run_check;
pub use commands::convert::run_convert;
pub use error::{CliResult, ExitStatus, IoPathContext};
