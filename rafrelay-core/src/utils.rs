//! Utility functions for formatting and file name handling.
//!
//! General-purpose helpers used throughout rafrelay-core and by the CLI when
//! rendering results.

use serde::Serializer;
use std::path::Path;
use std::time::Duration;

/// Formats a duration as HH:MM:SS, or as seconds with one decimal below a minute.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    if total < 60 {
        return format!("{:.1}s", duration.as_secs_f64());
    }
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats bytes with appropriate binary units (B, KiB, MiB, GiB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let bytes_f64 = bytes as f64;
    if bytes_f64 >= GIB {
        format!("{:.2} GiB", bytes_f64 / GIB)
    } else if bytes_f64 >= MIB {
        format!("{:.2} MiB", bytes_f64 / MIB)
    } else if bytes_f64 >= KIB {
        format!("{:.2} KiB", bytes_f64 / KIB)
    } else {
        format!("{bytes} B")
    }
}

/// Makes a file stem safe for use as an output name.
///
/// Alphanumerics, space, `_` and `-` are kept, every other character becomes
/// `_`, and trailing whitespace is dropped.
#[must_use]
pub fn sanitize_file_stem(stem: &str) -> String {
    let replaced: String = stem
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    replaced.trim_end().to_string()
}

/// File name of `path` for display, falling back to the whole path.
#[must_use]
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Serializes a path as a string, replacing invalid UTF-8 with U+FFFD.
///
/// Used with `#[serde(serialize_with = ...)]` so that a file name that is not
/// valid UTF-8 never makes an event or result unserializable.
pub fn serialize_path_lossy<P, S>(path: P, serializer: S) -> Result<S::Ok, S::Error>
where
    P: AsRef<Path>,
    S: Serializer,
{
    serializer.serialize_str(&path.as_ref().to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(0)), "0.0s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(60)), "00:01:00");
        assert_eq!(format_duration(Duration::from_secs(3661)), "01:01:01");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.50 KiB");
        assert_eq!(format_bytes(1024 * 1024 * 2), "2.00 MiB");
        assert_eq!(format_bytes(1024 * 1024 * 1024), "1.00 GiB");
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("DSCF0001"), "DSCF0001");
        assert_eq!(sanitize_file_stem("holiday shot-1_a"), "holiday shot-1_a");
        assert_eq!(sanitize_file_stem("a.b+c"), "a_b_c");
        assert_eq!(sanitize_file_stem("trailing  "), "trailing");
        assert_eq!(sanitize_file_stem("Åsa"), "Åsa");
        assert_eq!(sanitize_file_stem("x/y:z"), "x_y_z");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/a/b/DSCF1.RAF")), "DSCF1.RAF");
    }
}
