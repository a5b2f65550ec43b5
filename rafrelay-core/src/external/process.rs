// ============================================================================
// rafrelay-core/src/external/process.rs
// ============================================================================
//
// PROCESS EXECUTION: Running External Tools with Captured Output
//
// This module provides the process abstraction used for every external tool
// invocation (encoders, metadata tool, liveness checks). A process run yields a
// `ProcessOutput` holding the exit status and the captured stdout/stderr;
// classification as success or failure is made by exit status, the captured
// text is kept for diagnostics only.
//
// KEY COMPONENTS:
// - Invocation: program path, argument vector and extra environment
// - ProcessOutput: exit status plus captured output
// - ProcessRunner: trait seam for spawning processes (mockable in tests)
// - StdProcessRunner: std::process implementation with a bounded timeout
//
// AI-ASSISTANT-INFO: External process execution with timeout and output capture

use std::ffi::{OsStr, OsString};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::{CoreResult, command_start_error, command_timeout_error, command_wait_error};

/// Interval between exit polls while waiting on a child.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// `ETXTBSY`: the executable is still open for writing by another process.
#[cfg(target_os = "linux")]
const TEXT_FILE_BUSY: i32 = 26;

/// Number of spawn attempts when the executable is momentarily busy.
const SPAWN_ATTEMPTS: usize = 3;

/// A fully specified external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub envs: Vec<(OsString, OsString)>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    /// Short name used in log lines and error messages.
    pub fn display_name(&self) -> String {
        self.program
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// Arguments rendered as strings (lossy), mostly for assertions and logs.
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// The whole command line as one string, for diagnostics.
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// Exit status and captured output of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Formats the exit status and captured output for a failure message.
    pub fn diagnostic(&self, invocation: &Invocation) -> String {
        let code = self
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "terminated by signal".to_string());
        format!(
            "Command: {}\nReturn code: {}\nStdout: {}\nStderr: {}",
            invocation.command_line(),
            code,
            self.stdout.trim(),
            self.stderr.trim()
        )
    }
}

/// Something that can run an [`Invocation`] to completion.
///
/// The pipeline only ever talks to external tools through this trait, so
/// tests can substitute their own runner.
pub trait ProcessRunner: Send + Sync {
    /// Runs the invocation, waiting at most `timeout`.
    ///
    /// A non-zero exit is not an error here; it is reported through
    /// [`ProcessOutput::exit_code`]. Errors are reserved for failures to start,
    /// wait on, or bound the process.
    fn run(&self, invocation: &Invocation, timeout: Duration) -> CoreResult<ProcessOutput>;
}

/// `ProcessRunner` backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdProcessRunner;

impl ProcessRunner for StdProcessRunner {
    fn run(&self, invocation: &Invocation, timeout: Duration) -> CoreResult<ProcessOutput> {
        let name = invocation.display_name();
        debug!("Running: {}", invocation.command_line());

        let mut child = spawn_with_retry(invocation).map_err(|e| {
            warn!("Failed to start {}: {}", name, e);
            command_start_error(&name, e)
        })?;

        let stdout_handle = child.stdout.take().map(spawn_reader);
        let stderr_handle = child.stderr.take().map(spawn_reader);

        let status = match wait_with_timeout(&mut child, timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                // Drain the readers so their threads finish.
                join_reader(stdout_handle);
                join_reader(stderr_handle);
                warn!("{} timed out after {:?}", name, timeout);
                return Err(command_timeout_error(&name, timeout));
            }
            Err(e) => {
                let _ = child.kill();
                return Err(command_wait_error(&name, e));
            }
        };

        let output = ProcessOutput {
            exit_code: status.code(),
            stdout: join_reader(stdout_handle),
            stderr: join_reader(stderr_handle),
        };
        debug!("{} exited with {:?}", name, output.exit_code);
        Ok(output)
    }
}

fn spawn_with_retry(invocation: &Invocation) -> io::Result<Child> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &invocation.envs {
            cmd.env(key, value);
        }

        match cmd.spawn() {
            Ok(child) => return Ok(child),
            Err(e) if attempt < SPAWN_ATTEMPTS && is_text_file_busy(&e) => {
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(target_os = "linux")]
fn is_text_file_busy(error: &io::Error) -> bool {
    error.raw_os_error() == Some(TEXT_FILE_BUSY)
}

#[cfg(not(target_os = "linux"))]
fn is_text_file_busy(_error: &io::Error) -> bool {
    false
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
) -> io::Result<Option<std::process::ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_reader(handle: Option<thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}
