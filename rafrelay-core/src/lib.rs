//! Core library for batch converting camera RAW files to JPEG XL or AVIF.
//!
//! The heavy lifting is delegated to external programs (`cjxl`, `avifenc`,
//! `exiftool`). This crate locates and checks those programs, enumerates the
//! RAW files of a directory, plans and runs each conversion with per-file
//! failure isolation, and reports progress as a stream of events.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use rafrelay_core::config::{CoreConfigBuilder, OutputFormat};
//! use rafrelay_core::events::EventDispatcher;
//! use rafrelay_core::external::{StdProcessRunner, ToolTable};
//! use rafrelay_core::processing::{BatchRequest, CancellationToken, RawloaderDecoder, run_batch};
//! use std::path::PathBuf;
//!
//! let config = CoreConfigBuilder::new()
//!     .input_dir(PathBuf::from("/photos/raw"))
//!     .output_dir(PathBuf::from("/photos/jxl"))
//!     .output_format(OutputFormat::Jxl)
//!     .lossless(true)
//!     .build();
//! config.validate().unwrap();
//!
//! let runner = StdProcessRunner;
//! let tools = ToolTable::from_config(&config).check_all(&runner, config.check_timeout);
//!
//! let summary = run_batch(
//!     &BatchRequest::from_config(&config),
//!     &tools,
//!     &RawloaderDecoder,
//!     &runner,
//!     &EventDispatcher::new(),
//!     &CancellationToken::new(),
//! )
//! .unwrap();
//! println!("{} converted, {} failed", summary.converted, summary.failed);
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod events;
pub mod external;
pub mod processing;
pub mod temp_files;
pub mod utils;

// Re-exports for public API
pub use config::{ConversionOptions, CoreConfig, CoreConfigBuilder, OutputFormat};
pub use discovery::find_raw_files;
pub use error::{CoreError, CoreResult};
pub use events::{Event, EventDispatcher, EventHandler};
pub use external::{ToolKind, ToolSpec, ToolStatus, ToolTable};
pub use processing::{
    BatchHandle, BatchRequest, BatchState, BatchSummary, CancellationToken, ConversionOutcome,
    ConversionResult, ConversionStage, run_batch, spawn_batch,
};
pub use utils::{format_bytes, format_duration};
