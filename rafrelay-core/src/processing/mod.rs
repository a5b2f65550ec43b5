//! Conversion pipeline: planning, per-file execution and batch running.
//!
//! This module organizes the per-file stages into submodules and exposes the
//! entry points for starting a batch, either on the calling thread
//! ([`run_batch`]) or on a worker thread ([`spawn_batch`]).

/// Batch orchestration, cancellation and the worker thread
pub mod batch;

/// RAW decoding seam and the rawloader-based decoder
pub mod decode;

/// Per-file stage execution and outcome classification
pub mod executor;

/// Output paths and external command lines for one source file
pub mod planner;

/// Per-file results and the batch summary
pub mod result;

pub use batch::{BatchHandle, BatchRequest, CancellationToken, run_batch, spawn_batch};
pub use decode::{RawDecoder, RawloaderDecoder};
pub use executor::ConversionExecutor;
pub use planner::{WorkItem, encoder_invocation, metadata_invocation, plan, resize_target};
pub use result::{BatchState, BatchSummary, ConversionOutcome, ConversionResult, ConversionStage};
