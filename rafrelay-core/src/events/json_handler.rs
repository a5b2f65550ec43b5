//! JSON progress handler for structured progress output
//!
//! This module provides a JSON-based event handler that writes one JSON object
//! per line for every batch event, for consumption by scripts and other tools.

use super::{Event, EventHandler};
use log::warn;
use serde::Serialize;
use serde_json::{Value, json};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Event handler that outputs progress events as structured JSON to stdout
pub struct JsonProgressHandler {
    output: Mutex<Box<dyn Write + Send>>,
}

impl JsonProgressHandler {
    /// Create a new JSON progress handler that writes to stdout
    pub fn new() -> Self {
        Self {
            output: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Create a new JSON progress handler with a custom writer
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            output: Mutex::new(writer),
        }
    }

    fn get_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    /// Converts a nested payload without the panic `json!` would raise on a
    /// serialization error.
    fn payload<T: Serialize>(value: &T) -> Value {
        serde_json::to_value(value).unwrap_or_else(|e| {
            warn!("Cannot serialize event payload: {}", e);
            Value::Null
        })
    }

    fn path(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    fn write_json(&self, value: Value) {
        if let Ok(mut output) = self.output.lock() {
            if let Ok(json_str) = serde_json::to_string(&value) {
                let _ = writeln!(output, "{}", json_str);
                let _ = output.flush();
            }
        }
    }
}

impl Default for JsonProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for JsonProgressHandler {
    fn handle(&self, event: &Event) {
        let timestamp = Self::get_timestamp();

        let value = match event {
            Event::BatchStarted {
                total_files,
                input_dir,
                output_dir,
                options,
            } => json!({
                "type": "batch_started",
                "total_files": total_files,
                "input_dir": Self::path(input_dir),
                "output_dir": Self::path(output_dir),
                "options": Self::payload(options),
                "timestamp": timestamp
            }),

            Event::FileStarted {
                index,
                total,
                source,
            } => json!({
                "type": "file_started",
                "index": index,
                "total": total,
                "source": Self::path(source),
                "timestamp": timestamp
            }),

            Event::FileFinished {
                result,
                completed,
                total,
            } => json!({
                "type": "file_finished",
                "completed": completed,
                "total": total,
                "percent": if *total == 0 { 100.0 } else { *completed as f64 * 100.0 / *total as f64 },
                "result": Self::payload(result),
                "timestamp": timestamp
            }),

            Event::Warning { source, message } => json!({
                "type": "warning",
                "source": source.as_deref().map(Self::path),
                "message": message,
                "timestamp": timestamp
            }),

            Event::BatchFinished { summary } => json!({
                "type": "batch_finished",
                "summary": Self::payload(summary),
                "timestamp": timestamp
            }),
        };

        self.write_json(value);
    }
}
