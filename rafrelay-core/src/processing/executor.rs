// ============================================================================
// rafrelay-core/src/processing/executor.rs
// ============================================================================
//
// CONVERSION EXECUTION: Running the Stages for One Work Item
//
// The executor takes one planned WorkItem through its stages and turns whatever
// happens into a ConversionResult. Errors never escape `execute`: they are
// recorded as a Failed outcome (decode/encode) or as a warning (metadata).
//
// STAGES:
// 0. Skip check: a non-empty output already on disk ends the item as Skipped.
//    A zero-length output is a leftover from an interrupted run; it is removed
//    and the item is converted again.
// 1. Decode: RawDecoder -> RGB buffer, resampled when scale != 1.0.
// 2. Encode: buffer -> intermediate PNG -> encoder process. The intermediate is
//    always removed afterwards, and a failed encode removes partial output.
// 3. Metadata (optional): exiftool copies tags onto the output. Failures only
//    add a warning. If exiftool cannot even be started, metadata copy is
//    switched off for the rest of the run.
//
// AI-ASSISTANT-INFO: Per-file conversion state machine with outcome classification

use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use image::ImageFormat;
use log::{debug, info, warn};

use super::decode::{self, RawDecoder};
use super::planner::{self, ResizeDecision, WorkItem};
use super::result::{ConversionOutcome, ConversionResult, ConversionStage, SKIP_REASON_EXISTS};
use crate::config::ConversionOptions;
use crate::error::CoreError;
use crate::external::{Invocation, ProcessRunner, ToolKind, ToolTable};
use crate::utils::display_name;

/// Runs planned work items one at a time.
pub struct ConversionExecutor<'a> {
    decoder: &'a dyn RawDecoder,
    runner: &'a dyn ProcessRunner,
    tools: ToolTable,
    process_timeout: Duration,
    metadata_available: bool,
}

/// Removes the intermediate PNG when the encode stage ends, whatever the path.
struct IntermediateGuard<'p>(&'p Path);

impl Drop for IntermediateGuard<'_> {
    fn drop(&mut self) {
        match fs::remove_file(self.0) {
            Ok(()) => debug!("Removed intermediate {}", self.0.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove intermediate {}: {}", self.0.display(), e),
        }
    }
}

/// Reason an item stopped before finishing.
struct StageFailure {
    stage: ConversionStage,
    message: String,
}

impl StageFailure {
    fn new(stage: ConversionStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

impl<'a> ConversionExecutor<'a> {
    /// Creates an executor over a tool snapshot. Paths are taken only from
    /// tools whose status is Ok.
    pub fn new(
        decoder: &'a dyn RawDecoder,
        runner: &'a dyn ProcessRunner,
        tools: ToolTable,
        process_timeout: Duration,
    ) -> Self {
        Self {
            decoder,
            runner,
            tools,
            process_timeout,
            metadata_available: true,
        }
    }

    /// False once the metadata tool failed to start during this run.
    pub fn metadata_available(&self) -> bool {
        self.metadata_available
    }

    /// Runs all stages for `item` and classifies the outcome.
    pub fn execute(&mut self, item: WorkItem, options: &ConversionOptions) -> ConversionResult {
        let start = Instant::now();
        let name = display_name(&item.source_path);
        let mut warnings = Vec::new();

        let outcome = match self.check_existing(&item.output_path, &mut warnings) {
            Some(outcome) => outcome,
            None => match self.convert(&item, options, &mut warnings) {
                Ok(()) => ConversionOutcome::Converted,
                Err(failure) => ConversionOutcome::Failed {
                    stage: failure.stage,
                    message: failure.message,
                },
            },
        };

        let output_size = match outcome {
            ConversionOutcome::Converted => fs::metadata(&item.output_path).ok().map(|m| m.len()),
            _ => None,
        };

        match &outcome {
            ConversionOutcome::Converted => info!("{}: converted", name),
            ConversionOutcome::Skipped { reason } => info!("{}: skipped ({})", name, reason),
            ConversionOutcome::Failed { stage, message } => {
                warn!("{}: {} failed: {}", name, stage, message)
            }
        }

        let mut result = ConversionResult::new(item, outcome);
        result.warnings = warnings;
        result.output_size = output_size;
        result.elapsed = start.elapsed();
        result
    }

    /// Applies the skip policy. Returns an outcome when the item must not run.
    fn check_existing(
        &self,
        output: &Path,
        warnings: &mut Vec<String>,
    ) -> Option<ConversionOutcome> {
        let metadata = fs::metadata(output).ok()?;
        if !metadata.is_file() {
            return Some(ConversionOutcome::Failed {
                stage: ConversionStage::Plan,
                message: format!("'{}' exists and is not a file", output.display()),
            });
        }
        if metadata.len() > 0 {
            return Some(ConversionOutcome::Skipped {
                reason: SKIP_REASON_EXISTS.to_string(),
            });
        }

        match fs::remove_file(output) {
            Ok(()) => {
                let note = format!(
                    "Removed empty output '{}' left by an earlier run",
                    output.display()
                );
                warn!("{}", note);
                warnings.push(note);
                None
            }
            Err(e) => Some(ConversionOutcome::Failed {
                stage: ConversionStage::Plan,
                message: format!("Cannot remove empty output '{}': {}", output.display(), e),
            }),
        }
    }

    fn convert(
        &mut self,
        item: &WorkItem,
        options: &ConversionOptions,
        warnings: &mut Vec<String>,
    ) -> Result<(), StageFailure> {
        let image = self.decode(item, options, warnings)?;
        self.encode(item, options, image)?;
        if options.copy_metadata {
            if let Some(warning) = self.copy_metadata(item) {
                warn!("{}: {}", display_name(&item.source_path), warning);
                warnings.push(warning);
            }
        }
        Ok(())
    }

    fn decode(
        &self,
        item: &WorkItem,
        options: &ConversionOptions,
        warnings: &mut Vec<String>,
    ) -> Result<image::RgbImage, StageFailure> {
        let image = self
            .decoder
            .decode(&item.source_path)
            .map_err(|e| StageFailure::new(ConversionStage::Decode, stage_message(e)))?;

        let (width, height) = image.dimensions();
        match planner::resize_target(width, height, options.scale) {
            ResizeDecision::Keep => Ok(image),
            ResizeDecision::Resize {
                width: new_width,
                height: new_height,
            } => {
                debug!(
                    "Resizing {}x{} -> {}x{}",
                    width, height, new_width, new_height
                );
                Ok(decode::resize(&image, new_width, new_height))
            }
            ResizeDecision::TooSmall {
                width: new_width,
                height: new_height,
            } => {
                let note = format!(
                    "Scale {} gives {}x{} for a {}x{} image; keeping native size",
                    options.scale, new_width, new_height, width, height
                );
                warn!("{}", note);
                warnings.push(note);
                Ok(image)
            }
            ResizeDecision::TooLarge {
                width: new_width,
                height: new_height,
            } => Err(StageFailure::new(
                ConversionStage::Decode,
                format!(
                    "Scale {} gives {}x{} for a {}x{} image, more than {} pixels",
                    options.scale,
                    new_width,
                    new_height,
                    width,
                    height,
                    planner::MAX_OUTPUT_PIXELS
                ),
            )),
        }
    }

    fn encode(
        &self,
        item: &WorkItem,
        options: &ConversionOptions,
        image: image::RgbImage,
    ) -> Result<(), StageFailure> {
        let kind = options.output_format.encoder();
        let tool = self.tools.path_of(kind).ok_or_else(|| {
            StageFailure::new(ConversionStage::Encode, format!("{kind} is not available"))
        })?;

        let _guard = IntermediateGuard(&item.intermediate_path);
        image
            .save_with_format(&item.intermediate_path, ImageFormat::Png)
            .map_err(|e| {
                StageFailure::new(
                    ConversionStage::Encode,
                    format!(
                        "Cannot write intermediate '{}': {}",
                        item.intermediate_path.display(),
                        e
                    ),
                )
            })?;
        drop(image);

        let invocation = planner::encoder_invocation(tool, item, options);
        let failure = match self.runner.run(&invocation, self.process_timeout) {
            Err(e) => Some(stage_message(e)),
            Ok(output) => {
                log_lines(&invocation, "stderr", &output.stderr);
                if !output.success() {
                    Some(output.diagnostic(&invocation))
                } else if !has_content(&item.output_path) {
                    Some(format!(
                        "Encoder exited successfully but produced no output\n{}",
                        output.diagnostic(&invocation)
                    ))
                } else {
                    None
                }
            }
        };

        match failure {
            None => Ok(()),
            Some(message) => {
                remove_partial_output(&item.output_path);
                Err(StageFailure::new(ConversionStage::Encode, message))
            }
        }
    }

    /// Returns a warning when the copy did not happen.
    fn copy_metadata(&mut self, item: &WorkItem) -> Option<String> {
        if !self.metadata_available {
            return Some("Metadata not copied: exiftool could not be started earlier in this run".to_string());
        }
        let Some(tool) = self.tools.path_of(ToolKind::Exiftool) else {
            return Some("Metadata not copied: exiftool is not available".to_string());
        };

        let invocation = planner::metadata_invocation(tool, item);
        match self.runner.run(&invocation, self.process_timeout) {
            Ok(output) if output.success() => {
                log_lines(&invocation, "stdout", &output.stdout);
                None
            }
            Ok(output) => Some(format!(
                "Metadata copy failed\n{}",
                output.diagnostic(&invocation)
            )),
            Err(e @ CoreError::CommandStart(..)) => {
                self.metadata_available = false;
                warn!("Disabling metadata copy for the rest of this run: {}", e);
                Some(format!("Metadata not copied: {e}"))
            }
            Err(e) => Some(format!("Metadata copy failed: {e}")),
        }
    }
}

/// Message of a per-file error without the variant prefix for our own stages.
fn stage_message(error: CoreError) -> String {
    match error {
        CoreError::Decode(msg) | CoreError::Encode(msg) | CoreError::Metadata(msg) => msg,
        other => other.to_string(),
    }
}

fn has_content(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file() && m.len() > 0).unwrap_or(false)
}

fn remove_partial_output(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed partial output {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove partial output {}: {}", path.display(), e),
    }
}

fn log_lines(invocation: &Invocation, stream: &str, text: &str) {
    let name = invocation.display_name();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        debug!("[{} {}] {}", name, stream, line);
    }
}
