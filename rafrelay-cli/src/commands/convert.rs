//! Implementation of the 'convert' subcommand.
//!
//! This module turns the parsed arguments into a `CoreConfig`, checks the
//! tools the run needs, starts the batch on its worker thread and renders the
//! events it sends back.

use crate::cli::ConvertArgs;
use crate::error::{CliResult, ExitStatus};
use crate::terminal::{self, TerminalReporter};

use rafrelay_core::config::{
    CoreConfig, CoreConfigBuilder, DEFAULT_INPUT_SUBDIR, DEFAULT_OUTPUT_SUBDIR, application_dir,
};
use rafrelay_core::events::{EventHandler, JsonProgressHandler};
use rafrelay_core::external::{StdProcessRunner, ToolTable};
use rafrelay_core::processing::{BatchRequest, RawloaderDecoder, spawn_batch};

use log::{debug, info};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Creates and validates the CoreConfig for a conversion run.
///
/// Directories left unset default to `input/` and `output/` next to the
/// executable, and the bundled tools are looked up in the executable's
/// directory.
pub fn create_core_config(args: &ConvertArgs) -> CliResult<CoreConfig> {
    let app_dir = application_dir();

    let mut builder = CoreConfigBuilder::new()
        .input_dir(
            args.input_dir
                .clone()
                .unwrap_or_else(|| app_dir.join(DEFAULT_INPUT_SUBDIR)),
        )
        .output_dir(
            args.output_dir
                .clone()
                .unwrap_or_else(|| app_dir.join(DEFAULT_OUTPUT_SUBDIR)),
        )
        .tools_dir(args.tools.tools_dir.clone().unwrap_or(app_dir))
        .tool_paths(args.tools.tool_paths())
        .output_format(args.format)
        .lossless(args.lossless)
        .quality(args.quality)
        .scale(args.scale)
        .copy_metadata(args.copy_metadata);

    if let Some(temp_dir) = &args.temp_dir {
        builder = builder.temp_dir(temp_dir.clone());
    }
    if let Some(log_dir) = &args.log_dir {
        builder = builder.log_dir(log_dir.clone());
    }
    if let Some(seconds) = args.timeout {
        builder = builder.process_timeout(Duration::from_secs(seconds));
    }

    let config = builder.build();
    config.validate()?;
    Ok(config)
}

/// Runs a conversion batch and reports its progress and summary.
///
/// Returns `FilesFailed` when the batch finished with failed files. Run-level
/// problems (unusable tools, bad directories) are returned as errors.
pub fn run_convert(args: ConvertArgs, log_path: Option<&Path>) -> CliResult<ExitStatus> {
    let config = create_core_config(&args)?;
    debug!("Configuration: {:?}", config);
    info!(
        "Converting {} -> {} as {}",
        config.input_dir.display(),
        config.output_dir.display(),
        config.options.output_format
    );

    let runner = Arc::new(StdProcessRunner);
    let required = config.options.required_tools();
    let tools = ToolTable::from_config(&config).check_unchecked(
        runner.as_ref(),
        &required,
        config.check_timeout,
    );
    if !args.json {
        terminal::print_tool_table(&tools);
    }

    let handler: Arc<dyn EventHandler> = if args.json {
        Arc::new(JsonProgressHandler::new())
    } else {
        Arc::new(TerminalReporter::new())
    };

    let handle = spawn_batch(
        BatchRequest::from_config(&config),
        tools,
        Arc::new(RawloaderDecoder),
        runner,
    )?;
    for event in handle.events().iter() {
        handler.handle(&event);
    }
    let summary = handle.join()?;

    if !args.json {
        terminal::print_summary(&summary);
        if let Some(path) = log_path {
            terminal::print_status("Log file", &path.display().to_string(), false);
        }
    }

    if summary.has_failures() {
        Ok(ExitStatus::FilesFailed)
    } else {
        Ok(ExitStatus::Success)
    }
}
