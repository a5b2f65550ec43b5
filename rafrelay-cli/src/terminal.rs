// ============================================================================
// rafrelay-cli/src/terminal.rs
// ============================================================================
//
// TERMINAL OUTPUT: UI Components and Styling
//
// This module renders batch events for a human: section headers, aligned
// status lines, a progress bar while files are converted, one line per
// finished file and a final summary.
//
// KEY COMPONENTS:
// - styling: Constants for symbols and formatting
// - print_section / print_status / print_error: building blocks
// - TerminalReporter: EventHandler driving an indicatif progress bar
// - print_tool_table / print_summary: reports shared by both subcommands
//
// AI-ASSISTANT-INFO: Terminal UI components and styling for the CLI

// ---- External crate imports ----
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

// ---- Standard library imports ----
use std::sync::Mutex;

// ---- Internal crate imports ----
use rafrelay_core::events::{Event, EventHandler};
use rafrelay_core::external::{ToolSpec, ToolStatus, ToolTable};
use rafrelay_core::processing::{BatchSummary, ConversionOutcome, ConversionResult};
use rafrelay_core::utils::display_name;
use rafrelay_core::{ConversionOptions, format_bytes, format_duration};

// ============================================================================
// STYLING CONSTANTS
// ============================================================================

/// Styling constants for terminal output
pub mod styling {
    pub const SUCCESS_SYMBOL: &str = "✓";
    pub const SKIP_SYMBOL: &str = "»";
    pub const WARNING_SYMBOL: &str = "!";
    pub const ERROR_SYMBOL: &str = "✗";

    pub const SECTION_PREFIX: &str = "===== ";
    pub const SECTION_SUFFIX: &str = " =====";

    pub const STATUS_INDENT: &str = "  ";
    pub const DETAIL_INDENT: &str = "    ";
    pub const LABEL_WIDTH: usize = 14;

    pub const PROGRESS_TEMPLATE: &str =
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";
    pub const PROGRESS_CHARS: &str = "#>.";
}

// ============================================================================
// TERMINAL COMPONENTS
// ============================================================================

/// Formats a section header for major workflow phases.
pub fn format_section(title: &str) -> String {
    format!(
        "{}{}{}",
        styling::SECTION_PREFIX,
        style(title.to_uppercase()).cyan().bold(),
        styling::SECTION_SUFFIX
    )
}

/// Formats an aligned `Label: value` line. Important values are bold.
pub fn format_status(label: &str, value: &str, important: bool) -> String {
    let label = format!("{label}:");
    let value = if important {
        style(value).bold().to_string()
    } else {
        value.to_string()
    };
    format!(
        "{}{:<width$} {}",
        styling::STATUS_INDENT,
        label,
        value,
        width = styling::LABEL_WIDTH
    )
}

pub fn print_section(title: &str) {
    println!();
    println!("{}", format_section(title));
    println!();
}

pub fn print_status(label: &str, value: &str, important: bool) {
    println!("{}", format_status(label, value, important));
}

/// Prints a fatal error to stderr.
pub fn print_error(title: &str, message: &str) {
    eprintln!(
        "{} {}: {}",
        style(styling::ERROR_SYMBOL).red().bold(),
        style(title).red().bold(),
        message
    );
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or_default()
}

/// First line of `message`, followed by the remaining lines indented below
/// it. Process failures carry the command, return code, stdout and stderr.
pub fn format_detail(message: &str) -> String {
    let mut lines = message.lines();
    let mut text = lines.next().unwrap_or_default().trim_end().to_string();
    for line in lines {
        text.push('\n');
        text.push_str(styling::DETAIL_INDENT);
        text.push_str(line.trim_end());
    }
    text
}

fn status_label(status: ToolStatus) -> String {
    match status {
        ToolStatus::Ok => style("OK").green().bold().to_string(),
        ToolStatus::Error => style("ERROR").red().bold().to_string(),
        ToolStatus::Unchecked => style("UNCHECKED").yellow().to_string(),
    }
}

/// One report line per tool: status, path and version or error text.
pub fn format_tool(spec: &ToolSpec) -> String {
    let path = spec
        .resolved_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut line = format_status(
        spec.kind.name(),
        &format!("{} {}", status_label(spec.status), path),
        false,
    );
    if !spec.message.is_empty() {
        line.push_str(&format!(
            "\n{}{:<width$} {}",
            styling::STATUS_INDENT,
            "",
            first_line(&spec.message),
            width = styling::LABEL_WIDTH
        ));
    }
    line
}

pub fn print_tool_table(tools: &ToolTable) {
    print_section("Tools");
    for spec in tools.iter() {
        println!("{}", format_tool(spec));
    }
}

fn describe_options(options: &ConversionOptions) -> Vec<(&'static str, String)> {
    let mode = if options.lossless {
        "lossless".to_string()
    } else {
        format!("lossy, quality {}", options.quality)
    };
    vec![
        ("Format", options.output_format.to_string()),
        ("Mode", mode),
        ("Scale", format!("{}", options.scale)),
        (
            "Metadata",
            if options.copy_metadata { "copy" } else { "skip" }.to_string(),
        ),
    ]
}

/// One line describing a finished file.
pub fn format_result(result: &ConversionResult) -> String {
    let name = display_name(&result.source_path);
    match &result.outcome {
        ConversionOutcome::Converted => {
            let output = result
                .output_path()
                .map(display_name)
                .unwrap_or_default();
            let size = result.output_size.map(format_bytes).unwrap_or_default();
            format!(
                "{} {} -> {} ({}, {})",
                style(styling::SUCCESS_SYMBOL).green().bold(),
                name,
                output,
                size,
                format_duration(result.elapsed)
            )
        }
        ConversionOutcome::Skipped { reason } => format!(
            "{} {} skipped: {}",
            style(styling::SKIP_SYMBOL).cyan(),
            name,
            reason
        ),
        ConversionOutcome::Failed { stage, message } => format!(
            "{} {} failed at {}: {}",
            style(styling::ERROR_SYMBOL).red().bold(),
            name,
            stage,
            format_detail(message)
        ),
    }
}

/// Prints the end-of-run summary.
pub fn print_summary(summary: &BatchSummary) {
    print_section("Summary");
    print_status("State", &summary.state.to_string(), true);
    print_status("Files", &summary.total_files.to_string(), false);
    print_status("Converted", &summary.converted.to_string(), true);
    print_status("Skipped", &summary.skipped.to_string(), false);
    print_status("Failed", &summary.failed.to_string(), summary.failed > 0);
    print_status("Warnings", &summary.with_warnings.to_string(), false);
    print_status("Total time", &format_duration(summary.elapsed), true);

    if summary.has_failures() {
        println!();
        for result in summary.failures() {
            println!("{}", format_result(result));
        }
    }
}

// ============================================================================
// EVENT RENDERING
// ============================================================================

/// Renders batch events with a progress bar and per-file lines.
pub struct TerminalReporter {
    progress: Mutex<Option<ProgressBar>>,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self {
            progress: Mutex::new(None),
        }
    }

    /// Prints above the progress bar, or plainly when there is none.
    fn print_line(&self, line: &str) {
        match self.progress.lock().ok().and_then(|guard| guard.clone()) {
            Some(bar) => bar.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }

    fn start_progress(&self, total: usize) {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template(styling::PROGRESS_TEMPLATE) {
            bar.set_style(style.progress_chars(styling::PROGRESS_CHARS));
        }
        if let Ok(mut guard) = self.progress.lock() {
            *guard = Some(bar);
        }
    }

    fn finish_progress(&self) {
        if let Ok(mut guard) = self.progress.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for TerminalReporter {
    fn handle(&self, event: &Event) {
        match event {
            Event::BatchStarted {
                total_files,
                input_dir,
                output_dir,
                options,
            } => {
                print_section("Conversion");
                print_status("Input", &input_dir.display().to_string(), false);
                print_status("Output", &output_dir.display().to_string(), false);
                for (label, value) in describe_options(options) {
                    print_status(label, &value, false);
                }
                print_status("Files", &total_files.to_string(), true);
                println!();
                if *total_files > 0 {
                    self.start_progress(*total_files);
                }
            }

            Event::FileStarted { source, .. } => {
                if let Ok(guard) = self.progress.lock() {
                    if let Some(bar) = guard.as_ref() {
                        bar.set_message(display_name(source));
                    }
                }
            }

            Event::Warning { source, message } => {
                let prefix = source
                    .as_deref()
                    .map(|s| format!("{}: ", display_name(s)))
                    .unwrap_or_default();
                self.print_line(&format!(
                    "{} {}{}",
                    style(styling::WARNING_SYMBOL).yellow().bold(),
                    prefix,
                    format_detail(message)
                ));
            }

            Event::FileFinished { result, .. } => {
                self.print_line(&format_result(result));
                if let Ok(guard) = self.progress.lock() {
                    if let Some(bar) = guard.as_ref() {
                        bar.inc(1);
                    }
                }
            }

            Event::BatchFinished { .. } => self.finish_progress(),
        }
    }
}
