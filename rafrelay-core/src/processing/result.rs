//! Per-file results and the batch summary.
//!
//! A `ConversionResult` is produced exactly once for every source file a batch
//! attempts and never changes afterwards. The `BatchSummary` collects them in
//! worklist order together with the outcome counts.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Serialize, Serializer};

use super::planner::WorkItem;
use crate::utils::serialize_path_lossy;

/// Reason recorded when an existing output short-circuits an item.
pub const SKIP_REASON_EXISTS: &str = "output already exists";

/// Stage of the per-file pipeline at which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStage {
    Plan,
    Decode,
    Encode,
    Metadata,
}

impl fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConversionStage::Plan => "plan",
            ConversionStage::Decode => "decode",
            ConversionStage::Encode => "encode",
            ConversionStage::Metadata => "metadata",
        };
        f.write_str(name)
    }
}

/// How one file ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ConversionOutcome {
    Converted,
    Skipped { reason: String },
    Failed { stage: ConversionStage, message: String },
}

impl ConversionOutcome {
    pub fn is_converted(&self) -> bool {
        matches!(self, ConversionOutcome::Converted)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ConversionOutcome::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ConversionOutcome::Failed { .. })
    }
}

impl fmt::Display for ConversionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionOutcome::Converted => write!(f, "converted"),
            ConversionOutcome::Skipped { reason } => write!(f, "skipped ({reason})"),
            ConversionOutcome::Failed { stage, message } => {
                write!(f, "failed at {stage}: {message}")
            }
        }
    }
}

/// Result of processing one source file.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    #[serde(serialize_with = "serialize_path_lossy")]
    pub source_path: PathBuf,

    /// Planned paths; absent only when planning itself failed.
    pub work_item: Option<WorkItem>,

    pub outcome: ConversionOutcome,

    /// Non-fatal diagnostics, e.g. a failed metadata copy.
    pub warnings: Vec<String>,

    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,

    /// Size of the written output, for converted items.
    pub output_size: Option<u64>,
}

impl ConversionResult {
    pub fn new(work_item: WorkItem, outcome: ConversionOutcome) -> Self {
        Self {
            source_path: work_item.source_path.clone(),
            work_item: Some(work_item),
            outcome,
            warnings: Vec::new(),
            elapsed: Duration::ZERO,
            output_size: None,
        }
    }

    /// Result for a source whose paths could not be planned.
    pub fn plan_failure(source_path: &Path, message: impl Into<String>) -> Self {
        Self {
            source_path: source_path.to_path_buf(),
            work_item: None,
            outcome: ConversionOutcome::Failed {
                stage: ConversionStage::Plan,
                message: message.into(),
            },
            warnings: Vec::new(),
            elapsed: Duration::ZERO,
            output_size: None,
        }
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.work_item.as_ref().map(|item| item.output_path.as_path())
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Terminal state of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchState {
    Completed,
    Cancelled,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchState::Completed => write!(f, "completed"),
            BatchState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Aggregate outcome of one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub state: BatchState,

    /// Number of source files enumerated for the run.
    pub total_files: usize,

    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,

    /// Results carrying at least one warning, whatever their outcome.
    pub with_warnings: usize,

    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,

    /// One entry per attempted file, in worklist order.
    pub results: Vec<ConversionResult>,
}

impl BatchSummary {
    pub fn new(
        results: Vec<ConversionResult>,
        state: BatchState,
        total_files: usize,
        elapsed: Duration,
    ) -> Self {
        let count = |pred: fn(&ConversionResult) -> bool| results.iter().filter(|r| pred(r)).count();
        Self {
            state,
            total_files,
            converted: count(|r| r.outcome.is_converted()),
            skipped: count(|r| r.outcome.is_skipped()),
            failed: count(|r| r.outcome.is_failed()),
            with_warnings: count(ConversionResult::has_warnings),
            elapsed,
            results,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Number of results recorded, which is below `total_files` after a cancel.
    pub fn processed(&self) -> usize {
        self.results.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ConversionResult> {
        self.results.iter().filter(|r| r.outcome.is_failed())
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}
