// ============================================================================
// rafrelay-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Console and Run Log Backends for the `log` Facade
//
// The core library only logs through `log` macros. This module installs the
// backend for the process: `env_logger` on stderr for plain runs, or a `fern`
// dispatch writing both to stderr and to a timestamped run log file when a log
// directory is given.
//
// USAGE:
// - default: warnings and errors on the console (the terminal reporter shows
//   progress itself)
// - --verbose: debug output on the console
// - RUST_LOG=<filter>: overrides the console level, in env_logger syntax
//   (`info`, `rafrelay_core=debug`)
// - --log-dir: the run log file receives info (debug with --verbose)
//
// AI-ASSISTANT-INFO: Logging backend initialization and helper functions

// ---- External crate imports ----
use console::style;
use log::{Level, LevelFilter, Log, debug};

// ---- Standard library imports ----
use std::io::Write;
use std::path::{Path, PathBuf};

// ---- Internal crate imports ----
use crate::error::{CliResult, IoPathContext, logger_error};

/// Prefix of run log file names.
pub const RUN_LOG_PREFIX: &str = "rafrelay_run_";

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// # Example
/// ```
/// let log_filename = format!("rafrelay_run_{}.log", rafrelay_cli::logging::get_timestamp());
/// assert!(log_filename.ends_with(".log"));
/// ```
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Path of the run log file for a run starting now.
pub fn run_log_path(log_dir: &Path) -> PathBuf {
    log_dir.join(format!("{}{}.log", RUN_LOG_PREFIX, get_timestamp()))
}

/// Fixed-width level tag used in every log line.
fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN ",
        Level::Info => "INFO ",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

fn styled_level_tag(level: Level) -> String {
    let tag = level_tag(level);
    match level {
        Level::Error => style(tag).red().bold().to_string(),
        Level::Warn => style(tag).yellow().to_string(),
        Level::Info => style(tag).green().to_string(),
        Level::Debug => style(tag).blue().to_string(),
        Level::Trace => style(tag).magenta().to_string(),
    }
}

/// Console filtering: `RUST_LOG` in env_logger syntax (`warn`,
/// `rafrelay_core=debug`, ...) when set, otherwise warn or debug.
fn console_builder(rust_log: Option<&str>, verbose: bool) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    match rust_log.map(str::trim).filter(|spec| !spec.is_empty()) {
        Some(spec) => builder.parse_filters(spec),
        None => builder.filter_level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        }),
    };
    builder
}

/// Installs the global logger.
///
/// Returns the path of the run log file when `log_dir` is given. The log
/// directory is created if missing.
pub fn init(verbose: bool, log_dir: Option<&Path>) -> CliResult<Option<PathBuf>> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let mut builder = console_builder(rust_log.as_deref(), verbose);

    let Some(log_dir) = log_dir else {
        builder
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{} {} {}",
                    buf.timestamp(),
                    styled_level_tag(record.level()),
                    record.args()
                )
            })
            .try_init()
            .map_err(logger_error)?;
        debug!("Logger initialized with level: {}", log::max_level());
        return Ok(None);
    };

    std::fs::create_dir_all(log_dir).path_context("Failed to create log directory", log_dir)?;
    let log_path = run_log_path(log_dir);
    let log_file = fern::log_file(&log_path)
        .path_context("Failed to create log file", &log_path)?;

    let file = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Only the filter of the env_logger instance is used here.
    let console = builder.build();
    let console_max = console.filter();
    let console_dispatch = fern::Dispatch::new()
        .level(console_max)
        .filter(move |metadata| console.enabled(metadata))
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {} {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                styled_level_tag(record.level()),
                message
            ))
        })
        .chain(std::io::stderr());

    let file_dispatch = fern::Dispatch::new()
        .level(file)
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                level_tag(record.level()),
                record.target(),
                message
            ))
        })
        .chain(log_file);

    fern::Dispatch::new()
        .level(console_max.max(file))
        .chain(console_dispatch)
        .chain(file_dispatch)
        .apply()
        .map_err(logger_error)?;

    debug!("Logging to {}", log_path.display());
    Ok(Some(log_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_shape() {
        let stamp = get_timestamp();
        assert_eq!(stamp.len(), 15);
        assert_eq!(stamp.as_bytes()[8], b'_');
        assert!(stamp.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_run_log_path() {
        let path = run_log_path(Path::new("/var/log/rafrelay"));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(RUN_LOG_PREFIX));
        assert!(name.ends_with(".log"));
        assert_eq!(path.parent(), Some(Path::new("/var/log/rafrelay")));
    }

    fn console_filter(rust_log: Option<&str>, verbose: bool) -> env_logger::Logger {
        console_builder(rust_log, verbose).build()
    }

    #[test]
    fn test_console_filter_defaults() {
        assert_eq!(console_filter(None, false).filter(), LevelFilter::Warn);
        assert_eq!(console_filter(None, true).filter(), LevelFilter::Debug);
        assert_eq!(console_filter(Some("  "), false).filter(), LevelFilter::Warn);
        assert_eq!(console_filter(Some("info"), true).filter(), LevelFilter::Info);
    }

    #[test]
    fn test_console_filter_accepts_module_directives() {
        let filter = console_filter(Some("rafrelay_core=debug"), false);
        let core_debug = log::Metadata::builder()
            .level(Level::Debug)
            .target("rafrelay_core::processing::batch")
            .build();
        let other_debug = log::Metadata::builder()
            .level(Level::Debug)
            .target("rafrelay_cli::commands")
            .build();
        assert_eq!(filter.filter(), LevelFilter::Debug);
        assert!(filter.enabled(&core_debug));
        assert!(!filter.enabled(&other_debug));
    }

    #[test]
    fn test_level_tags_are_aligned() {
        for level in [Level::Error, Level::Warn, Level::Info, Level::Debug, Level::Trace] {
            assert_eq!(level_tag(level).len(), 5);
        }
    }
}
