// ============================================================================
// rafrelay-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Locating and Checking the Encoder and Metadata Executables
//
// This module encapsulates everything rafrelay knows about its three external
// programs: the JPEG XL encoder (cjxl), the AVIF encoder (avifenc) and the
// metadata copier (exiftool). It resolves where each executable lives, runs a
// harmless version invocation to check it, and records the outcome in a
// `ToolSpec`. Checks never abort anything; a failing tool is just a `ToolSpec`
// with an `Error` status and a message.
//
// KEY COMPONENTS:
// - ToolKind: the three supported tools and their conventions
// - ToolSpec / ToolStatus: resolution and check results for one tool
// - resolve_tool / check_tool: search order and liveness check
// - ToolTable: the three specs as one snapshot handed to a batch run
//
// SEARCH ORDER:
// 1. Explicit user-configured path, when it names an existing file
// 2. `<tools dir>/<default subdir>/<exe name>` (the bundled layout)
//
// AI-ASSISTANT-INFO: External tool resolution, liveness checks and tool snapshots

// ---- Internal crate imports ----
use crate::config::{CoreConfig, ToolPaths};
use crate::error::{CoreError, CoreResult};

// ---- External crate imports ----
use log::{debug, info, warn};
use serde::Serialize;

// ---- Standard library imports ----
use std::env::consts::EXE_SUFFIX;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// SUBMODULES
// ============================================================================

/// Process invocation and the `ProcessRunner` seam
pub mod process;

#[cfg(test)]
pub(crate) mod mocks;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use process::{Invocation, ProcessOutput, ProcessRunner, StdProcessRunner};

// ============================================================================
// TOOL KINDS
// ============================================================================

/// The external programs rafrelay drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Cjxl,
    Avifenc,
    Exiftool,
}

impl ToolKind {
    /// All tools, in display order.
    pub const ALL: [ToolKind; 3] = [ToolKind::Cjxl, ToolKind::Avifenc, ToolKind::Exiftool];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Cjxl => "cjxl",
            ToolKind::Avifenc => "avifenc",
            ToolKind::Exiftool => "exiftool",
        }
    }

    /// Subdirectory of the tools directory holding the bundled executable.
    pub fn default_subdir(self) -> &'static str {
        match self {
            ToolKind::Cjxl => "cjxl",
            ToolKind::Avifenc => "libavif",
            ToolKind::Exiftool => "exiftool",
        }
    }

    /// Executable file name with the platform suffix (`.exe` on Windows).
    pub fn executable_name(self) -> String {
        format!("{}{}", self.name(), EXE_SUFFIX)
    }

    /// Arguments of the harmless invocation used as a liveness check.
    pub fn version_args(self) -> &'static [&'static str] {
        match self {
            ToolKind::Cjxl | ToolKind::Avifenc => &["--version"],
            ToolKind::Exiftool => &["-ver"],
        }
    }

    /// Bundled location of this tool under `tools_dir`.
    pub fn default_path(self, tools_dir: &Path) -> PathBuf {
        tools_dir
            .join(self.default_subdir())
            .join(self.executable_name())
    }

    /// The encoders print useful details on stderr, exiftool only on stdout.
    fn reports_stderr(self) -> bool {
        !matches!(self, ToolKind::Exiftool)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// TOOL SPECS
// ============================================================================

/// Result of the last resolution or check of a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Unchecked,
    Ok,
    Error,
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolStatus::Unchecked => write!(f, "unchecked"),
            ToolStatus::Ok => write!(f, "ok"),
            ToolStatus::Error => write!(f, "error"),
        }
    }
}

/// Where a tool lives and whether it works.
///
/// Values are never mutated in place: [`check_tool`] returns a new spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolSpec {
    pub kind: ToolKind,
    pub configured_path: Option<PathBuf>,
    pub resolved_path: Option<PathBuf>,
    pub status: ToolStatus,
    /// Version text on success, a human-readable reason on failure.
    pub message: String,
}

impl ToolSpec {
    pub fn is_ok(&self) -> bool {
        self.status == ToolStatus::Ok
    }

    fn with_result(&self, status: ToolStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            ..self.clone()
        }
    }
}

/// Resolves the executable for `kind`.
///
/// A configured path wins when it names an existing file. Otherwise the
/// bundled default under `tools_dir` is probed. When neither exists the spec
/// comes back with no resolved path and an `Error` status.
pub fn resolve_tool(kind: ToolKind, configured: Option<&Path>, tools_dir: &Path) -> ToolSpec {
    let configured = configured.filter(|p| !p.as_os_str().is_empty());

    let mut spec = ToolSpec {
        kind,
        configured_path: configured.map(Path::to_path_buf),
        resolved_path: None,
        status: ToolStatus::Unchecked,
        message: String::new(),
    };

    if let Some(path) = configured {
        if path.is_file() {
            debug!("Using configured {} at {}", kind, path.display());
            spec.resolved_path = Some(path.to_path_buf());
            return spec;
        }
        warn!(
            "Configured {} path '{}' does not exist, trying bundled location",
            kind,
            path.display()
        );
    }

    let default = kind.default_path(tools_dir);
    if default.is_file() {
        debug!("Using bundled {} at {}", kind, default.display());
        spec.resolved_path = Some(default);
        return spec;
    }

    spec.status = ToolStatus::Error;
    spec.message = match configured {
        Some(path) => format!(
            "{} not found at '{}' or '{}'",
            kind,
            path.display(),
            default.display()
        ),
        None => format!("{} not found at '{}'", kind, default.display()),
    };
    spec
}

/// Runs the tool's version invocation and returns the updated spec.
///
/// Ok when the process starts and exits 0; the message then holds the trimmed
/// version output. Any failure yields an `Error` spec with a readable reason.
pub fn check_tool(runner: &dyn ProcessRunner, spec: &ToolSpec, timeout: Duration) -> ToolSpec {
    let Some(path) = spec.resolved_path.as_deref() else {
        let message = if spec.message.is_empty() {
            format!("{} not found", spec.kind)
        } else {
            spec.message.clone()
        };
        return spec.with_result(ToolStatus::Error, message);
    };

    let invocation = Invocation::new(path).args(spec.kind.version_args());
    let checked = match runner.run(&invocation, timeout) {
        Ok(output) if output.success() => {
            let mut message = output.stdout.trim().to_string();
            let stderr = output.stderr.trim();
            if spec.kind.reports_stderr() && !stderr.is_empty() {
                if !message.is_empty() {
                    message.push_str(" | ");
                }
                message.push_str(stderr);
            }
            spec.with_result(ToolStatus::Ok, message)
        }
        Ok(output) => {
            let stderr = output.stderr.trim();
            let detail = if stderr.is_empty() { "No stderr" } else { stderr };
            spec.with_result(
                ToolStatus::Error,
                format!("Error calling '{}': {}", invocation.command_line(), detail),
            )
        }
        Err(CoreError::CommandStart(_, e)) => {
            spec.with_result(ToolStatus::Error, start_failure_message(path, &e))
        }
        Err(e) => spec.with_result(ToolStatus::Error, e.to_string()),
    };

    match checked.status {
        ToolStatus::Ok => info!("{} OK: {}", checked.kind, checked.message),
        _ => warn!("{} check failed: {}", checked.kind, checked.message),
    }
    checked
}

fn start_failure_message(path: &Path, error: &io::Error) -> String {
    match error.kind() {
        io::ErrorKind::NotFound => format!("'{}' not found", path.display()),
        io::ErrorKind::PermissionDenied => format!("'{}' is not executable", path.display()),
        _ => format!("Failed to start '{}': {}", path.display(), error),
    }
}

// ============================================================================
// TOOL TABLE
// ============================================================================

/// Snapshot of all three tools, handed by value to a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolTable {
    pub cjxl: ToolSpec,
    pub avifenc: ToolSpec,
    pub exiftool: ToolSpec,
}

impl ToolTable {
    /// Resolves every tool from configured paths and the tools directory.
    pub fn resolve_all(paths: &ToolPaths, tools_dir: &Path) -> Self {
        Self {
            cjxl: resolve_tool(ToolKind::Cjxl, paths.get(ToolKind::Cjxl), tools_dir),
            avifenc: resolve_tool(ToolKind::Avifenc, paths.get(ToolKind::Avifenc), tools_dir),
            exiftool: resolve_tool(ToolKind::Exiftool, paths.get(ToolKind::Exiftool), tools_dir),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::resolve_all(&config.tool_paths, &config.tools_dir)
    }

    /// Checks every tool, returning a new table.
    pub fn check_all(&self, runner: &dyn ProcessRunner, timeout: Duration) -> Self {
        Self {
            cjxl: check_tool(runner, &self.cjxl, timeout),
            avifenc: check_tool(runner, &self.avifenc, timeout),
            exiftool: check_tool(runner, &self.exiftool, timeout),
        }
    }

    /// Checks only the listed tools that have not been checked yet.
    pub fn check_unchecked(
        &self,
        runner: &dyn ProcessRunner,
        kinds: &[ToolKind],
        timeout: Duration,
    ) -> Self {
        let mut table = self.clone();
        for &kind in kinds {
            let spec = table.get(kind);
            if spec.status == ToolStatus::Unchecked {
                let checked = check_tool(runner, spec, timeout);
                *table.get_mut(kind) = checked;
            }
        }
        table
    }

    pub fn get(&self, kind: ToolKind) -> &ToolSpec {
        match kind {
            ToolKind::Cjxl => &self.cjxl,
            ToolKind::Avifenc => &self.avifenc,
            ToolKind::Exiftool => &self.exiftool,
        }
    }

    fn get_mut(&mut self, kind: ToolKind) -> &mut ToolSpec {
        match kind {
            ToolKind::Cjxl => &mut self.cjxl,
            ToolKind::Avifenc => &mut self.avifenc,
            ToolKind::Exiftool => &mut self.exiftool,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolSpec> {
        [&self.cjxl, &self.avifenc, &self.exiftool].into_iter()
    }

    pub fn all_ok(&self) -> bool {
        self.iter().all(ToolSpec::is_ok)
    }

    /// Fails with a configuration error naming every listed tool that is not Ok.
    pub fn require(&self, kinds: &[ToolKind]) -> CoreResult<()> {
        let problems: Vec<String> = kinds
            .iter()
            .map(|&kind| self.get(kind))
            .filter(|spec| !spec.is_ok())
            .map(|spec| {
                if spec.message.is_empty() {
                    format!("{} is {}", spec.kind, spec.status)
                } else {
                    format!("{}: {}", spec.kind, spec.message)
                }
            })
            .collect();

        if problems.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Configuration(format!(
                "Required tools are not usable: {}",
                problems.join("; ")
            )))
        }
    }

    /// Resolved path of a tool that passed its check.
    pub fn path_of(&self, kind: ToolKind) -> Option<&Path> {
        let spec = self.get(kind);
        if spec.is_ok() {
            spec.resolved_path.as_deref()
        } else {
            None
        }
    }
}
