//! Progress events emitted by a batch run.
//!
//! The batch runner never prints. It reports through `Event`s handed to an
//! `EventDispatcher`, which fans them out to any number of `EventHandler`s:
//! a terminal renderer, the JSON line writer, or a channel feeding a driver
//! on another thread.

use std::path::PathBuf;
use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::config::ConversionOptions;
use crate::processing::{BatchSummary, ConversionResult};

pub mod json_handler;

pub use json_handler::JsonProgressHandler;

#[derive(Debug, Clone)]
pub enum Event {
    BatchStarted {
        total_files: usize,
        input_dir: PathBuf,
        output_dir: PathBuf,
        options: ConversionOptions,
    },

    FileStarted {
        /// 1-based position in the worklist
        index: usize,
        total: usize,
        source: PathBuf,
    },

    FileFinished {
        result: ConversionResult,
        completed: usize,
        total: usize,
    },

    Warning {
        source: Option<PathBuf>,
        message: String,
    },

    BatchFinished {
        summary: BatchSummary,
    },
}

pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &Event);
}

pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn emit(&self, event: Event) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Forwards every event into a channel. A closed receiver is ignored so a
/// driver that stops listening never stalls the worker.
pub struct ChannelEventHandler {
    sender: Sender<Event>,
}

impl ChannelEventHandler {
    pub fn new(sender: Sender<Event>) -> Self {
        Self { sender }
    }
}

impl EventHandler for ChannelEventHandler {
    fn handle(&self, event: &Event) {
        let _ = self.sender.send(event.clone());
    }
}
