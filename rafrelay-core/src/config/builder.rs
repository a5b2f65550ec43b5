// ============================================================================
// rafrelay-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// This module implements the builder pattern for the CoreConfig structure,
// providing a fluent API for creating and configuring CoreConfig instances.
// Unset fields keep the defaults from `CoreConfig::default()`.
//
// AI-ASSISTANT-INFO: Builder pattern implementation for CoreConfig

// ---- Standard library imports ----
use std::path::PathBuf;
use std::time::Duration;

// ---- Internal crate imports ----
use super::{ConversionOptions, CoreConfig, OutputFormat, ToolPaths};
use crate::external::ToolKind;

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use rafrelay_core::config::{CoreConfigBuilder, OutputFormat};
/// use std::path::PathBuf;
///
/// let config = CoreConfigBuilder::new()
///     .input_dir(PathBuf::from("/photos/raw"))
///     .output_dir(PathBuf::from("/photos/avif"))
///     .output_format(OutputFormat::Avif)
///     .quality(75)
///     .scale(0.5)
///     .copy_metadata(true)
///     .build();
///
/// assert_eq!(config.options.quality, 75);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    /// Creates a new builder holding the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the directory containing the RAW files.
    pub fn input_dir(mut self, input_dir: PathBuf) -> Self {
        self.config.input_dir = input_dir;
        self
    }

    /// Sets the directory where converted files are written.
    pub fn output_dir(mut self, output_dir: PathBuf) -> Self {
        self.config.output_dir = output_dir;
        self
    }

    /// Sets the directory for run log files.
    pub fn log_dir(mut self, log_dir: PathBuf) -> Self {
        self.config.log_dir = Some(log_dir);
        self
    }

    /// Sets the base directory for scratch files.
    pub fn temp_dir(mut self, temp_dir: PathBuf) -> Self {
        self.config.temp_dir = Some(temp_dir);
        self
    }

    /// Sets the directory holding the bundled tool subdirectories.
    pub fn tools_dir(mut self, tools_dir: PathBuf) -> Self {
        self.config.tools_dir = tools_dir;
        self
    }

    /// Sets an explicit executable path for one tool.
    pub fn tool_path(mut self, kind: ToolKind, path: PathBuf) -> Self {
        self.config.tool_paths.set(kind, Some(path));
        self
    }

    /// Replaces all configured tool paths.
    pub fn tool_paths(mut self, paths: ToolPaths) -> Self {
        self.config.tool_paths = paths;
        self
    }

    /// Replaces the whole option set.
    pub fn options(mut self, options: ConversionOptions) -> Self {
        self.config.options = options;
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.options.output_format = format;
        self
    }

    pub fn lossless(mut self, lossless: bool) -> Self {
        self.config.options.lossless = lossless;
        self
    }

    /// Sets the lossy quality (1-100). Ignored in lossless mode.
    pub fn quality(mut self, quality: u8) -> Self {
        self.config.options.quality = quality;
        self
    }

    /// Sets the resize factor (1.0 keeps native resolution).
    pub fn scale(mut self, scale: f64) -> Self {
        self.config.options.scale = scale;
        self
    }

    pub fn copy_metadata(mut self, copy: bool) -> Self {
        self.config.options.copy_metadata = copy;
        self
    }

    /// Sets the timeout for each encode or metadata process.
    pub fn process_timeout(mut self, timeout: Duration) -> Self {
        self.config.process_timeout = timeout;
        self
    }

    /// Sets the timeout for each tool liveness check.
    pub fn check_timeout(mut self, timeout: Duration) -> Self {
        self.config.check_timeout = timeout;
        self
    }

    /// Builds the CoreConfig. Call [`CoreConfig::validate`] before use.
    pub fn build(self) -> CoreConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_builder_sets_fields() {
        let config = CoreConfigBuilder::new()
            .input_dir(PathBuf::from("raw"))
            .output_dir(PathBuf::from("out"))
            .tools_dir(PathBuf::from("/opt/rafrelay"))
            .tool_path(ToolKind::Cjxl, PathBuf::from("/usr/bin/cjxl"))
            .output_format(OutputFormat::Avif)
            .lossless(true)
            .quality(55)
            .scale(0.25)
            .copy_metadata(true)
            .process_timeout(Duration::from_secs(30))
            .build();

        assert_eq!(config.input_dir, PathBuf::from("raw"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.tools_dir, PathBuf::from("/opt/rafrelay"));
        assert_eq!(
            config.tool_paths.get(ToolKind::Cjxl),
            Some(Path::new("/usr/bin/cjxl"))
        );
        assert_eq!(config.options.output_format, OutputFormat::Avif);
        assert!(config.options.lossless);
        assert_eq!(config.options.quality, 55);
        assert_eq!(config.options.scale, 0.25);
        assert!(config.options.copy_metadata);
        assert_eq!(config.process_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_invalid_scale_caught_by_validate() {
        let config = CoreConfigBuilder::new().scale(0.0).build();
        assert!(config.validate().is_err());
    }
}
