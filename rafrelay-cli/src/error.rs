// ============================================================================
// rafrelay-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Error types and utilities for the CLI
//
// This module provides error handling utilities for the CLI that integrate
// with the rafrelay-core error types while adding CLI-specific error contexts.
//
// KEY COMPONENTS:
// - CliResult: Type alias for CLI operations
// - IoPathContext: names the action and path of a failed file operation
// - ExitStatus: process exit codes of a finished command
//
// AI-ASSISTANT-INFO: CLI error handling utilities

// ---- Internal crate imports ----
use rafrelay_core::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::fmt;
use std::io;
use std::path::Path;

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

// ============================================================================
// EXIT STATUS
// ============================================================================

/// Outcome of a command that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    /// `check` found at least one tool that is not usable.
    ToolsUnusable,
    /// The batch finished but some files failed.
    FilesFailed,
}

impl ExitStatus {
    /// Process exit code. Fatal errors exit with 1 from `main`.
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::ToolsUnusable => 1,
            ExitStatus::FilesFailed => 2,
        }
    }
}

// ============================================================================
// ERROR CONVERSION UTILITIES
// ============================================================================

/// Names the file system action and path behind an I/O error, e.g.
/// `Failed to create log directory '/var/log/rafrelay': permission denied`.
pub trait IoPathContext<T> {
    fn path_context(self, action: &str, path: &Path) -> CliResult<T>;
}

impl<T> IoPathContext<T> for io::Result<T> {
    fn path_context(self, action: &str, path: &Path) -> CliResult<T> {
        self.map_err(|e| {
            CoreError::OperationFailed(format!("{} '{}': {}", action, path.display(), e))
        })
    }
}

/// Error for a logger that could not be installed, e.g. because one already is.
pub fn logger_error(error: impl fmt::Display) -> CoreError {
    CoreError::OperationFailed(format!("Cannot install logger: {error}"))
}
