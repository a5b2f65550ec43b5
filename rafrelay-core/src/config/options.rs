//! User-selected conversion options.
//!
//! `ConversionOptions` is the option set the planner and executor consume for
//! every file in a batch. It is plain data owned by the driver and copied into
//! each run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{DEFAULT_COPY_METADATA, DEFAULT_LOSSLESS, DEFAULT_QUALITY, DEFAULT_SCALE};
use crate::error::{CoreError, CoreResult};
use crate::external::ToolKind;

/// Target image format of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jxl,
    Avif,
}

impl OutputFormat {
    /// File extension of the output, without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jxl => "jxl",
            OutputFormat::Avif => "avif",
        }
    }

    /// External encoder that produces this format.
    pub fn encoder(self) -> ToolKind {
        match self {
            OutputFormat::Jxl => ToolKind::Cjxl,
            OutputFormat::Avif => ToolKind::Avifenc,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Jxl => write!(f, "JXL"),
            OutputFormat::Avif => write!(f, "AVIF"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jxl" | "jpegxl" | "jpeg-xl" => Ok(OutputFormat::Jxl),
            "avif" => Ok(OutputFormat::Avif),
            other => Err(CoreError::Configuration(format!(
                "Unsupported output format '{other}' (expected jxl or avif)"
            ))),
        }
    }
}

/// Option set applied to every file of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionOptions {
    pub output_format: OutputFormat,

    /// Maximum-fidelity encoding. When set, `quality` has no effect.
    pub lossless: bool,

    /// Lossy quality, 1-100.
    pub quality: u8,

    /// Resize factor applied after decoding. 1.0 disables resizing.
    pub scale: f64,

    /// Copy camera and GPS tags from the RAW source onto the output.
    pub copy_metadata: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Jxl,
            lossless: DEFAULT_LOSSLESS,
            quality: DEFAULT_QUALITY,
            scale: DEFAULT_SCALE,
            copy_metadata: DEFAULT_COPY_METADATA,
        }
    }
}

impl ConversionOptions {
    /// Checks the option invariants.
    pub fn validate(&self) -> CoreResult<()> {
        if !(1..=100).contains(&self.quality) {
            return Err(CoreError::Configuration(format!(
                "Quality must be between 1 and 100, got {}",
                self.quality
            )));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(CoreError::Configuration(format!(
                "Scale must be a positive number, got {}",
                self.scale
            )));
        }
        Ok(())
    }

    /// True when decoded images must be resampled before encoding.
    pub fn needs_resize(&self) -> bool {
        self.scale != 1.0
    }

    /// Quality value actually handed to the encoder, `None` in lossless mode.
    pub fn effective_quality(&self) -> Option<u8> {
        if self.lossless { None } else { Some(self.quality) }
    }

    /// Tools that must be usable before a batch with these options may start.
    pub fn required_tools(&self) -> Vec<ToolKind> {
        let mut tools = vec![self.output_format.encoder()];
        if self.copy_metadata {
            tools.push(ToolKind::Exiftool);
        }
        tools
    }
}
