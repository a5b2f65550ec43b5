// ============================================================================
// rafrelay-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error Types for the Conversion Pipeline
//
// This module defines the error taxonomy of rafrelay-core. Run-level errors
// (configuration, directories) abort a batch before any file is touched.
// Per-file errors (plan, decode, encode, metadata) are caught at the item
// boundary and recorded in that item's result instead of propagating.
//
// AI-ASSISTANT-INFO: Error types and helpers for the rafrelay pipeline

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors produced by the conversion pipeline.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A tool required by the chosen options is not usable, or the options
    /// themselves are invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Source or output directory is missing, unreadable or cannot be created.
    #[error("Directory error: {0}")]
    Directory(String),

    /// Paths for a single file could not be planned.
    #[error("Plan error: {0}")]
    Plan(String),

    /// The RAW source could not be read or developed.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The intermediate could not be written or the encoder failed.
    #[error("Encode error: {0}")]
    Encode(String),

    /// The metadata tool failed.
    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Failed to start '{0}': {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Failed waiting for '{0}': {1}")]
    CommandWait(String, #[source] io::Error),

    #[error("'{0}' timed out after {1} seconds")]
    CommandTimeout(String, u64),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for rafrelay-core operations.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// True for errors that prevent a batch from starting at all.
    pub fn is_run_level(&self) -> bool {
        matches!(self, CoreError::Configuration(_) | CoreError::Directory(_))
    }
}

// ---- Constructor helpers ----

pub fn command_start_error(cmd_name: impl Into<String>, error: io::Error) -> CoreError {
    CoreError::CommandStart(cmd_name.into(), error)
}

pub fn command_wait_error(cmd_name: impl Into<String>, error: io::Error) -> CoreError {
    CoreError::CommandWait(cmd_name.into(), error)
}

pub fn command_timeout_error(cmd_name: impl Into<String>, timeout: Duration) -> CoreError {
    CoreError::CommandTimeout(cmd_name.into(), timeout.as_secs())
}
