// ============================================================================
// rafrelay-core/src/processing/batch.rs
// ============================================================================
//
// BATCH RUNNING: Driving the Pipeline Across a Directory of RAW Files
//
// The batch runner validates the run, enumerates the worklist and then takes
// each file through the planner and the executor, one at a time. A failing
// file never stops the batch; only run-level problems (bad options, unusable
// tools, bad directories) abort it, and they do so before any file is touched.
//
// KEY COMPONENTS:
// - BatchRequest: directories, options and timeouts of one run
// - CancellationToken: cooperative stop flag checked between files
// - run_batch: the sequential run on the calling thread
// - spawn_batch / BatchHandle: the same run on a dedicated worker thread,
//   reporting through a crossbeam channel
//
// AI-ASSISTANT-INFO: Batch orchestration, cancellation and the worker thread

// ---- Standard library imports ----
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

// ---- External crate imports ----
use crossbeam_channel::Receiver;
use log::{info, warn};

// ---- Internal crate imports ----
use super::decode::RawDecoder;
use super::executor::ConversionExecutor;
use super::planner;
use super::result::{BatchState, BatchSummary, ConversionResult};
use crate::config::{ConversionOptions, CoreConfig};
use crate::discovery::find_raw_files;
use crate::error::{CoreError, CoreResult};
use crate::events::{ChannelEventHandler, Event, EventDispatcher};
use crate::external::{ProcessRunner, ToolTable};
use crate::temp_files::create_scratch_dir;
use crate::utils::{display_name, format_duration};

/// Everything a batch run needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Base for the scratch directory; system temp when absent.
    pub temp_dir: Option<PathBuf>,
    pub options: ConversionOptions,
    pub process_timeout: Duration,
    pub check_timeout: Duration,
}

impl BatchRequest {
    pub fn from_config(config: &CoreConfig) -> Self {
        Self {
            input_dir: config.input_dir.clone(),
            output_dir: config.output_dir.clone(),
            temp_dir: config.temp_dir.clone(),
            options: config.options,
            process_timeout: config.process_timeout,
            check_timeout: config.check_timeout,
        }
    }
}

/// Cooperative cancellation flag shared between a driver and a batch run.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop. The file in progress still finishes.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs a whole batch on the calling thread.
///
/// # Errors
///
/// * `CoreError::Configuration` - invalid options, or a tool required by the
///   options is not Ok after checking
/// * `CoreError::Directory` - input directory unreadable, output or scratch
///   directory cannot be created
///
/// Per-file failures are never returned here; they are part of the summary.
pub fn run_batch(
    request: &BatchRequest,
    tools: &ToolTable,
    decoder: &dyn RawDecoder,
    runner: &dyn ProcessRunner,
    events: &EventDispatcher,
    cancel: &CancellationToken,
) -> CoreResult<BatchSummary> {
    let start = Instant::now();

    // ========================================================================
    // STEP 1: VALIDATE OPTIONS AND TOOLS
    // ========================================================================

    let options = request.options;
    options.validate()?;
    if request.process_timeout.is_zero() {
        return Err(CoreError::Configuration(
            "Process timeout must be greater than zero".to_string(),
        ));
    }

    let required = options.required_tools();
    let tools = tools.check_unchecked(runner, &required, request.check_timeout);
    tools.require(&required)?;

    // ========================================================================
    // STEP 2: ENUMERATE INPUTS AND PREPARE DIRECTORIES
    // ========================================================================

    let files = find_raw_files(&request.input_dir)?;
    info!(
        "Found {} RAW file(s) in {}",
        files.len(),
        request.input_dir.display()
    );

    std::fs::create_dir_all(&request.output_dir).map_err(|e| {
        CoreError::Directory(format!(
            "Cannot create output directory '{}': {}",
            request.output_dir.display(),
            e
        ))
    })?;

    let scratch = create_scratch_dir(request.temp_dir.as_deref())?;

    events.emit(Event::BatchStarted {
        total_files: files.len(),
        input_dir: request.input_dir.clone(),
        output_dir: request.output_dir.clone(),
        options,
    });

    // ========================================================================
    // STEP 3: PROCESS EACH FILE
    // ========================================================================

    let total = files.len();
    let mut executor = ConversionExecutor::new(decoder, runner, tools, request.process_timeout);
    let mut results: Vec<ConversionResult> = Vec::with_capacity(total);
    let mut state = BatchState::Completed;

    for (index, source) in files.iter().enumerate() {
        if cancel.is_cancelled() {
            info!("Batch cancelled after {} of {} file(s)", index, total);
            state = BatchState::Cancelled;
            break;
        }

        info!("[{}/{}] {}", index + 1, total, display_name(source));
        events.emit(Event::FileStarted {
            index: index + 1,
            total,
            source: source.clone(),
        });

        let result = match planner::plan(source, &options, &request.output_dir, scratch.path()) {
            Ok(item) => executor.execute(item, &options),
            Err(e) => {
                warn!("Cannot plan {}: {}", source.display(), e);
                ConversionResult::plan_failure(source, e.to_string())
            }
        };

        for message in &result.warnings {
            events.emit(Event::Warning {
                source: Some(source.clone()),
                message: message.clone(),
            });
        }

        events.emit(Event::FileFinished {
            result: result.clone(),
            completed: index + 1,
            total,
        });
        results.push(result);
    }

    // ========================================================================
    // STEP 4: SUMMARIZE
    // ========================================================================

    let summary = BatchSummary::new(results, state, total, start.elapsed());
    info!(
        "Batch {}: {} converted, {} skipped, {} failed, {} with warnings in {}",
        summary.state,
        summary.converted,
        summary.skipped,
        summary.failed,
        summary.with_warnings,
        format_duration(summary.elapsed)
    );

    events.emit(Event::BatchFinished {
        summary: summary.clone(),
    });
    Ok(summary)
}

/// A batch running on its own worker thread.
pub struct BatchHandle {
    events: Receiver<Event>,
    cancel: CancellationToken,
    worker: JoinHandle<CoreResult<BatchSummary>>,
}

impl BatchHandle {
    /// Events emitted by the worker, in order. The channel closes when the
    /// worker finishes.
    pub fn events(&self) -> &Receiver<Event> {
        &self.events
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Waits for the worker and returns its summary or run-level error.
    pub fn join(self) -> CoreResult<BatchSummary> {
        self.worker
            .join()
            .map_err(|_| CoreError::OperationFailed("Batch worker panicked".to_string()))?
    }
}

/// Starts [`run_batch`] on a dedicated worker thread.
///
/// The tool table is moved into the worker, so later changes on the driver's
/// side do not affect the run.
pub fn spawn_batch(
    request: BatchRequest,
    tools: ToolTable,
    decoder: Arc<dyn RawDecoder>,
    runner: Arc<dyn ProcessRunner>,
) -> CoreResult<BatchHandle> {
    let (sender, receiver) = crossbeam_channel::unbounded();
    let cancel = CancellationToken::new();
    let worker_cancel = cancel.clone();

    let worker = thread::Builder::new()
        .name("rafrelay-batch".to_string())
        .spawn(move || {
            let mut dispatcher = EventDispatcher::new();
            dispatcher.add_handler(Arc::new(ChannelEventHandler::new(sender)));
            run_batch(
                &request,
                &tools,
                decoder.as_ref(),
                runner.as_ref(),
                &dispatcher,
                &worker_cancel,
            )
        })?;

    Ok(BatchHandle {
        events: receiver,
        cancel,
        worker,
    })
}
