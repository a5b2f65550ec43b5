//! Configuration structures and constants for the rafrelay-core library.
//!
//! This module provides the configuration value handed to the pipeline at run
//! start: directories, configured tool paths, conversion options and process
//! timeouts. There is no process-wide configuration state; the driver owns a
//! `CoreConfig` and passes it down.

mod builder;
mod options;

use std::path::{Path, PathBuf};
use std::time::Duration;

pub use builder::CoreConfigBuilder;
pub use options::{ConversionOptions, OutputFormat};

use crate::error::CoreResult;
use crate::external::ToolKind;

// Default constants

/// Default lossy quality (1-100).
pub const DEFAULT_QUALITY: u8 = 90;

/// Default resize factor. 1.0 keeps the native sensor resolution.
pub const DEFAULT_SCALE: f64 = 1.0;

/// Lossless encoding is off unless requested.
pub const DEFAULT_LOSSLESS: bool = false;

/// Metadata copy is off unless requested.
pub const DEFAULT_COPY_METADATA: bool = false;

/// Upper bound for a single encode or metadata process.
pub const DEFAULT_PROCESS_TIMEOUT: Duration = Duration::from_secs(600);

/// Upper bound for a tool liveness check.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Default input directory name, relative to the application directory.
pub const DEFAULT_INPUT_SUBDIR: &str = "input";

/// Default output directory name, relative to the application directory.
pub const DEFAULT_OUTPUT_SUBDIR: &str = "output";

/// User-configured executable paths. `None` falls back to the bundled default
/// location under the tools directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolPaths {
    pub cjxl: Option<PathBuf>,
    pub avifenc: Option<PathBuf>,
    pub exiftool: Option<PathBuf>,
}

impl ToolPaths {
    /// Configured path for `kind`, if any.
    pub fn get(&self, kind: ToolKind) -> Option<&Path> {
        match kind {
            ToolKind::Cjxl => self.cjxl.as_deref(),
            ToolKind::Avifenc => self.avifenc.as_deref(),
            ToolKind::Exiftool => self.exiftool.as_deref(),
        }
    }

    /// Replaces the configured path for `kind`.
    pub fn set(&mut self, kind: ToolKind, path: Option<PathBuf>) {
        let slot = match kind {
            ToolKind::Cjxl => &mut self.cjxl,
            ToolKind::Avifenc => &mut self.avifenc,
            ToolKind::Exiftool => &mut self.exiftool,
        };
        *slot = path;
    }
}

/// Main configuration structure for the rafrelay-core library.
///
/// Typically created by the consumer of the library (e.g. rafrelay-cli) via
/// [`CoreConfigBuilder`] and passed to the batch runner.
///
/// # Examples
///
/// ```rust,no_run
/// use rafrelay_core::config::{CoreConfigBuilder, OutputFormat};
/// use std::path::PathBuf;
///
/// let config = CoreConfigBuilder::new()
///     .input_dir(PathBuf::from("/photos/raw"))
///     .output_dir(PathBuf::from("/photos/jxl"))
///     .output_format(OutputFormat::Jxl)
///     .lossless(true)
///     .build();
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Directory containing the RAW files to convert
    pub input_dir: PathBuf,

    /// Directory where converted files are written
    pub output_dir: PathBuf,

    /// Optional directory for run log files
    pub log_dir: Option<PathBuf>,

    /// Optional base directory for scratch files (defaults to the system temp dir)
    pub temp_dir: Option<PathBuf>,

    /// Directory holding the bundled tool subdirectories (`cjxl/`, `libavif/`, `exiftool/`)
    pub tools_dir: PathBuf,

    /// Explicitly configured tool executables
    pub tool_paths: ToolPaths,

    /// Conversion options applied to every file
    pub options: ConversionOptions,

    /// Timeout for each encode or metadata process
    pub process_timeout: Duration,

    /// Timeout for each tool liveness check
    pub check_timeout: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_SUBDIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_SUBDIR),
            log_dir: None,
            temp_dir: None,
            tools_dir: PathBuf::from("."),
            tool_paths: ToolPaths::default(),
            options: ConversionOptions::default(),
            process_timeout: DEFAULT_PROCESS_TIMEOUT,
            check_timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }
}

impl CoreConfig {
    /// Creates a configuration with default options for the given directories.
    pub fn new(input_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            input_dir,
            output_dir,
            ..Default::default()
        }
    }

    /// Validates option invariants and timeouts.
    pub fn validate(&self) -> CoreResult<()> {
        self.options.validate()?;
        if self.process_timeout.is_zero() || self.check_timeout.is_zero() {
            return Err(crate::CoreError::Configuration(
                "Process timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Directory containing the running executable, used as the base for default
/// tool and input/output locations. Falls back to the current directory.
pub fn application_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}
