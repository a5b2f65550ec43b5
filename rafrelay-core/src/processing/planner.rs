// ============================================================================
// rafrelay-core/src/processing/planner.rs
// ============================================================================
//
// CONVERSION PLANNING: Paths and Command Lines for One Source File
//
// Given a source RAW file and the active options, the planner decides where the
// output and the intermediate PNG go, and builds the exact argument vectors of
// the encoder and metadata processes. Planning is pure apart from the output
// directory check and the existence probe of the output file.
//
// KEY COMPONENTS:
// - WorkItem: planned paths for one source file
// - plan: source + options -> WorkItem
// - encoder_invocation / metadata_invocation: external command lines
// - resize_target: output dimensions for a scale factor
//
// AI-ASSISTANT-INFO: Per-file planning of paths and external tool arguments

use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;

use crate::config::{ConversionOptions, OutputFormat};
use crate::error::{CoreError, CoreResult};
use crate::external::Invocation;
use crate::utils::{sanitize_file_stem, serialize_path_lossy};

/// Suffix appended to the sanitized stem for the intermediate PNG.
pub const INTERMEDIATE_SUFFIX: &str = "_temp.png";

/// Tags copied from the RAW source onto the output, in command-line order.
pub const METADATA_TAGS: &[&str] = &[
    "Make",
    "Model",
    "Artist",
    "Copyright",
    "DateTimeOriginal",
    "CreateDate",
    "ModifyDate",
    "ISO",
    "ExposureTime",
    "FNumber",
    "FocalLength",
    "LensModel",
    "LensMake",
    "WhiteBalance",
    "GPSLatitude",
    "GPSLongitude",
    "GPSAltitude",
    "GPSLatitudeRef",
    "GPSLongitudeRef",
    "GPSAltitudeRef",
    "GPSTimeStamp",
    "GPSDateStamp",
    "Title",
    "Description",
    "Keywords",
    "Subject",
    "Creator",
    "Rights",
];

/// Environment the metadata tool runs with.
pub const METADATA_ENV: (&str, &str) = ("LANG", "C.UTF-8");

/// avifenc flags emitted for every AVIF encode.
const AVIF_FIXED_ARGS: [&str; 4] = ["--depth", "10", "--yuv", "444"];

/// avifenc quality used in lossless mode.
const AVIF_LOSSLESS_QUALITY: &str = "100";

/// Largest resampled image accepted, in pixels (16384 x 16384).
pub const MAX_OUTPUT_PIXELS: u64 = 1 << 28;

/// Planned paths for one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkItem {
    #[serde(serialize_with = "serialize_path_lossy")]
    pub source_path: PathBuf,
    #[serde(serialize_with = "serialize_path_lossy")]
    pub output_path: PathBuf,
    #[serde(serialize_with = "serialize_path_lossy")]
    pub intermediate_path: PathBuf,

    /// Output was already present at planning time. The executor re-checks.
    pub output_existed: bool,
}

/// Plans the output and intermediate paths for `source`.
///
/// # Errors
///
/// `CoreError::Plan` when the source has no usable file stem or the output
/// directory cannot be created.
pub fn plan(
    source: &Path,
    options: &ConversionOptions,
    output_dir: &Path,
    scratch_dir: &Path,
) -> CoreResult<WorkItem> {
    let stem = source
        .file_stem()
        .map(|s| sanitize_file_stem(&s.to_string_lossy()))
        .unwrap_or_default();
    if stem.is_empty() {
        return Err(CoreError::Plan(format!(
            "'{}' has no usable file name",
            source.display()
        )));
    }

    prepare_output_dir(output_dir)?;

    let output_path = output_dir.join(format!("{}.{}", stem, options.output_format.extension()));
    let intermediate_path = scratch_dir.join(format!("{stem}{INTERMEDIATE_SUFFIX}"));
    let output_existed = output_path.exists();

    debug!(
        "Planned {} -> {} (existing: {})",
        source.display(),
        output_path.display(),
        output_existed
    );

    Ok(WorkItem {
        source_path: source.to_path_buf(),
        output_path,
        intermediate_path,
        output_existed,
    })
}

/// Ensures `output_dir` exists as a directory.
pub fn prepare_output_dir(output_dir: &Path) -> CoreResult<()> {
    if output_dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(output_dir).map_err(|e| {
        CoreError::Plan(format!(
            "Cannot create output directory '{}': {}",
            output_dir.display(),
            e
        ))
    })
}

/// Builds the encoder command for `item`.
///
/// cjxl: `<png> <out> (-d 0 | -q N)`.
/// avifenc: `<png> <out> -q (100 | N) --depth 10 --yuv 444`.
pub fn encoder_invocation(tool: &Path, item: &WorkItem, options: &ConversionOptions) -> Invocation {
    let invocation = Invocation::new(tool)
        .arg(&item.intermediate_path)
        .arg(&item.output_path);

    match options.output_format {
        OutputFormat::Jxl => match options.effective_quality() {
            None => invocation.args(["-d", "0"]),
            Some(quality) => invocation.arg("-q").arg(quality.to_string()),
        },
        OutputFormat::Avif => {
            let quality = options
                .effective_quality()
                .map(|q| q.to_string())
                .unwrap_or_else(|| AVIF_LOSSLESS_QUALITY.to_string());
            invocation.arg("-q").arg(quality).args(AVIF_FIXED_ARGS)
        }
    }
}

/// Builds the exiftool command copying [`METADATA_TAGS`] from the source onto
/// the output in place.
pub fn metadata_invocation(tool: &Path, item: &WorkItem) -> Invocation {
    Invocation::new(tool)
        .arg("-tagsFromFile")
        .arg(&item.source_path)
        .args(METADATA_TAGS.iter().map(|tag| format!("-{tag}")))
        .args(["-m", "-overwrite_original"])
        .arg(&item.output_path)
        .env(METADATA_ENV.0, METADATA_ENV.1)
}

/// What to do with decoded pixels before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeDecision {
    /// Scale is 1.0, no resampling.
    Keep,
    Resize { width: u32, height: u32 },
    /// The scaled size rounds down to zero; native size is kept.
    TooSmall { width: u32, height: u32 },
    /// The scaled size exceeds [`MAX_OUTPUT_PIXELS`]; the file fails.
    TooLarge { width: u64, height: u64 },
}

/// Output dimensions for `scale`, truncating towards zero.
pub fn resize_target(width: u32, height: u32, scale: f64) -> ResizeDecision {
    if scale == 1.0 {
        return ResizeDecision::Keep;
    }
    // Saturating casts; anything near u64::MAX is rejected below.
    let new_width = (f64::from(width) * scale).floor() as u64;
    let new_height = (f64::from(height) * scale).floor() as u64;
    if new_width.saturating_mul(new_height) > MAX_OUTPUT_PIXELS {
        return ResizeDecision::TooLarge {
            width: new_width,
            height: new_height,
        };
    }
    let new_width = u32::try_from(new_width).unwrap_or(u32::MAX);
    let new_height = u32::try_from(new_height).unwrap_or(u32::MAX);
    if new_width == 0 || new_height == 0 {
        ResizeDecision::TooSmall {
            width: new_width,
            height: new_height,
        }
    } else {
        ResizeDecision::Resize {
            width: new_width,
            height: new_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn item() -> WorkItem {
        WorkItem {
            source_path: PathBuf::from("/in/a.RAF"),
            output_path: PathBuf::from("/out/a.avif"),
            intermediate_path: PathBuf::from("/tmp/s/a_temp.png"),
            output_existed: false,
        }
    }

    #[test]
    fn test_plan_paths() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let options = ConversionOptions::default();

        let planned = plan(Path::new("/in/My Shot+1.RAF"), &options, &out, Path::new("/s")).unwrap();
        assert_eq!(planned.output_path, out.join("My Shot_1.jxl"));
        assert_eq!(planned.intermediate_path, PathBuf::from("/s/My Shot_1_temp.png"));
        assert!(!planned.output_existed);
        assert!(out.is_dir());
    }

    #[test]
    fn test_plan_marks_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.jxl"), b"x").unwrap();
        let planned = plan(
            Path::new("/in/a.raf"),
            &ConversionOptions::default(),
            dir.path(),
            dir.path(),
        )
        .unwrap();
        assert!(planned.output_existed);
    }

    #[test]
    fn test_plan_rejects_unusable_name() {
        let dir = tempfile::tempdir().unwrap();
        let err = plan(
            Path::new("/in/   .raf"),
            &ConversionOptions::default(),
            dir.path(),
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Plan(_)));
    }

    #[test]
    fn test_plan_fails_when_output_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("out");
        std::fs::write(&blocker, b"file").unwrap();
        let err = plan(
            Path::new("/in/a.raf"),
            &ConversionOptions::default(),
            &blocker.join("nested"),
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Plan(_)));
    }

    #[test]
    fn test_jxl_arguments() {
        let mut options = ConversionOptions::default();
        options.quality = 80;
        let inv = encoder_invocation(Path::new("/t/cjxl"), &item(), &options);
        assert_eq!(
            inv.arg_strings(),
            vec!["/tmp/s/a_temp.png", "/out/a.avif", "-q", "80"]
        );

        options.lossless = true;
        let inv = encoder_invocation(Path::new("/t/cjxl"), &item(), &options);
        assert_eq!(
            inv.arg_strings(),
            vec!["/tmp/s/a_temp.png", "/out/a.avif", "-d", "0"]
        );
    }

    #[test]
    fn test_avif_arguments() {
        let mut options = ConversionOptions {
            output_format: OutputFormat::Avif,
            quality: 60,
            ..Default::default()
        };
        let inv = encoder_invocation(Path::new("/t/avifenc"), &item(), &options);
        assert_eq!(
            inv.arg_strings()[2..],
            ["-q", "60", "--depth", "10", "--yuv", "444"]
        );

        options.lossless = true;
        let inv = encoder_invocation(Path::new("/t/avifenc"), &item(), &options);
        assert_eq!(
            inv.arg_strings()[2..],
            ["-q", "100", "--depth", "10", "--yuv", "444"]
        );
    }

    #[test]
    fn test_lossless_ignores_quality() {
        let a = ConversionOptions {
            lossless: true,
            quality: 10,
            ..Default::default()
        };
        let b = ConversionOptions { quality: 95, ..a };
        assert_eq!(
            encoder_invocation(Path::new("cjxl"), &item(), &a),
            encoder_invocation(Path::new("cjxl"), &item(), &b)
        );
    }

    #[test]
    fn test_metadata_arguments() {
        let inv = metadata_invocation(Path::new("/t/exiftool"), &item());
        let args = inv.arg_strings();
        assert_eq!(args[0], "-tagsFromFile");
        assert_eq!(args[1], "/in/a.RAF");
        assert_eq!(args[2], "-Make");
        assert_eq!(args[args.len() - 3..], ["-m", "-overwrite_original", "/out/a.avif"]);
        assert_eq!(args.len(), 2 + METADATA_TAGS.len() + 3);
        assert!(args.contains(&"-GPSDateStamp".to_string()));
        assert_eq!(
            inv.envs,
            vec![(OsString::from("LANG"), OsString::from("C.UTF-8"))]
        );
    }

    #[test]
    fn test_resize_target() {
        assert_eq!(resize_target(6000, 4000, 1.0), ResizeDecision::Keep);
        assert_eq!(
            resize_target(6001, 4001, 0.5),
            ResizeDecision::Resize {
                width: 3000,
                height: 2000
            }
        );
        assert_eq!(
            resize_target(100, 50, 2.0),
            ResizeDecision::Resize {
                width: 200,
                height: 100
            }
        );
        assert_eq!(
            resize_target(6000, 4000, 1e9),
            ResizeDecision::TooLarge {
                width: 6_000_000_000_000,
                height: 4_000_000_000_000
            }
        );
        assert!(matches!(
            resize_target(8, 6, 0.1),
            ResizeDecision::TooSmall { .. }
        ));
    }
}
