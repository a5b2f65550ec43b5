// rafrelay-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---

use super::process::{Invocation, ProcessOutput, ProcessRunner};
use crate::error::{CoreError, CoreResult, command_start_error};
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted reaction of the mock runner.
pub enum MockResponse {
    Output(ProcessOutput),
    StartError(io::ErrorKind),
    Timeout,
}

/// Scripted `ProcessRunner` that records every invocation.
///
/// Responses are consumed in order; when the queue is empty every call
/// succeeds with empty output. See [`MockProcessRunner::create_output_from_arg`]
/// for imitating an encoder that writes its output file.
#[derive(Clone, Default)]
pub struct MockProcessRunner {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    calls: Arc<Mutex<Vec<Invocation>>>,
    create_output_arg: Arc<Mutex<Option<(usize, bool)>>>,
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push_output(&self, exit_code: i32, stdout: &str, stderr: &str) {
        self.push(MockResponse::Output(ProcessOutput {
            exit_code: Some(exit_code),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }));
    }

    pub fn push_start_error(&self, kind: io::ErrorKind) {
        self.push(MockResponse::StartError(kind));
    }

    pub fn push_timeout(&self) {
        self.push(MockResponse::Timeout);
    }

    pub fn push(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// On every successful call, write a small file at the path found in
    /// argument `index` (the encoders take the output path second).
    pub fn create_output_from_arg(&self, index: usize) {
        *self.create_output_arg.lock().unwrap() = Some((index, false));
    }

    /// Like `create_output_from_arg`, but also for failing calls, leaving
    /// partial output behind.
    pub fn create_output_even_on_failure(&self, index: usize) {
        *self.create_output_arg.lock().unwrap() = Some((index, true));
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessRunner for MockProcessRunner {
    fn run(&self, invocation: &Invocation, timeout: Duration) -> CoreResult<ProcessOutput> {
        self.calls.lock().unwrap().push(invocation.clone());
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(MockResponse::Output(ProcessOutput {
                exit_code: Some(0),
                ..Default::default()
            }));

        match response {
            MockResponse::Output(output) => {
                if let Some((index, always)) = *self.create_output_arg.lock().unwrap() {
                    if output.success() || always {
                        if let Some(arg) = invocation.args.get(index) {
                            let path = PathBuf::from(arg);
                            if path.extension().is_some_and(|e| e == "jxl" || e == "avif") {
                                std::fs::write(&path, b"encoded")?;
                            }
                        }
                    }
                }
                Ok(output)
            }
            MockResponse::StartError(kind) => Err(command_start_error(
                invocation.display_name(),
                io::Error::new(kind, "mock start failure"),
            )),
            MockResponse::Timeout => Err(CoreError::CommandTimeout(
                invocation.display_name(),
                timeout.as_secs(),
            )),
        }
    }
}
