// rafrelay-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use rafrelay_core::config::{OutputFormat, ToolPaths};
use rafrelay_core::external::ToolKind;
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "rafrelay: batch RAW to JPEG XL / AVIF converter",
    long_about = "Converts a directory of Fujifilm RAW (.raf) files to JPEG XL or AVIF \
                  using cjxl, avifenc and exiftool."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging (RUST_LOG still takes precedence for the console)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Converts every RAW file of the input directory
    Convert(ConvertArgs),

    /// Locates the external tools and reports whether each one runs
    Check(CheckArgs),
}

/// Tool location flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ToolArgs {
    /// Path to the cjxl executable
    #[arg(long, value_name = "PATH", env = "RAFRELAY_CJXL")]
    pub cjxl: Option<PathBuf>,

    /// Path to the avifenc executable
    #[arg(long, value_name = "PATH", env = "RAFRELAY_AVIFENC")]
    pub avifenc: Option<PathBuf>,

    /// Path to the exiftool executable
    #[arg(long, value_name = "PATH", env = "RAFRELAY_EXIFTOOL")]
    pub exiftool: Option<PathBuf>,

    /// Directory holding the bundled cjxl/, libavif/ and exiftool/ folders
    /// (defaults to the directory of this executable)
    #[arg(long, value_name = "DIR", env = "RAFRELAY_TOOLS_DIR")]
    pub tools_dir: Option<PathBuf>,
}

impl ToolArgs {
    pub fn tool_paths(&self) -> ToolPaths {
        let mut paths = ToolPaths::default();
        paths.set(ToolKind::Cjxl, self.cjxl.clone());
        paths.set(ToolKind::Avifenc, self.avifenc.clone());
        paths.set(ToolKind::Exiftool, self.exiftool.clone());
        paths
    }
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Directory containing the .raf files (defaults to <exe dir>/input)
    #[arg(short = 'i', long = "input", value_name = "INPUT_DIR")]
    pub input_dir: Option<PathBuf>,

    /// Directory where converted files will be saved (defaults to <exe dir>/output)
    #[arg(short = 'o', long = "output", value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_name = "FORMAT", default_value_t = OutputFormat::Jxl)]
    pub format: OutputFormat,

    /// Lossless encoding; --quality is ignored
    #[arg(long)]
    pub lossless: bool,

    /// Lossy quality (1-100)
    #[arg(
        short,
        long,
        value_name = "QUALITY",
        default_value_t = rafrelay_core::config::DEFAULT_QUALITY,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub quality: u8,

    /// Resize factor applied before encoding (1.0 keeps native resolution)
    #[arg(short, long, value_name = "FACTOR", default_value_t = rafrelay_core::config::DEFAULT_SCALE)]
    pub scale: f64,

    /// Copy camera and GPS tags from the RAW file with exiftool
    #[arg(long)]
    pub copy_metadata: bool,

    #[command(flatten)]
    pub tools: ToolArgs,

    /// Base directory for intermediate files (defaults to the system temp dir)
    #[arg(long, value_name = "DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Timeout in seconds for each encoder or exiftool process
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Print one JSON object per progress event instead of the progress bar
    #[arg(long)]
    pub json: bool,

    /// Optional: Directory for the run log file
    #[arg(short, long, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub tools: ToolArgs,

    /// Timeout in seconds for each version query
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}
