// rafrelay-core/tests/common/mod.rs
//
// Shared fixtures for the integration tests: fake external tools written as
// small shell scripts, and a RAW decoder stub.

#![allow(dead_code)]

use rafrelay_core::error::{CoreError, CoreResult};
use rafrelay_core::processing::RawDecoder;
use std::fs;
use std::path::{Path, PathBuf};

/// Width and height of every image produced by [`StubDecoder`].
pub const STUB_WIDTH: u32 = 8;
pub const STUB_HEIGHT: u32 = 6;

/// Decodes any file to a small gradient, except files whose content is
/// `corrupt`, which fail like an unreadable RAW.
pub struct StubDecoder;

impl RawDecoder for StubDecoder {
    fn decode(&self, path: &Path) -> CoreResult<image::RgbImage> {
        if fs::read(path)? == b"corrupt" {
            return Err(CoreError::Decode(format!(
                "Cannot read RAW file '{}': unsupported file",
                path.display()
            )));
        }
        Ok(image::RgbImage::from_fn(STUB_WIDTH, STUB_HEIGHT, |x, y| {
            image::Rgb([(x * 30) as u8, (y * 40) as u8, 128])
        }))
    }
}

/// Creates `dir/<name>` holding `content` for each name.
pub fn write_sources(dir: &Path, names: &[&str], content: &[u8]) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    for name in names {
        fs::write(dir.join(name), content)?;
    }
    Ok(())
}

#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) -> std::io::Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format!("#!/bin/sh\n{body}"))?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(path.to_path_buf())
}

/// Fake encoder: answers `--version`, otherwise logs its arguments to
/// `calls.log` next to itself and copies the PNG to the output path.
#[cfg(unix)]
pub fn fake_encoder(path: &Path, version: &str) -> std::io::Result<PathBuf> {
    write_script(
        path,
        &format!(
            r#"if [ "$1" = "--version" ]; then echo "{version}"; exit 0; fi
echo "$@" >> "$(dirname "$0")/calls.log"
cp "$1" "$2"
"#
        ),
    )
}

/// Fake encoder that exits with an error after leaving a partial output.
#[cfg(unix)]
pub fn failing_encoder(path: &Path) -> std::io::Result<PathBuf> {
    write_script(
        path,
        r#"if [ "$1" = "--version" ]; then echo "fake 1.0"; exit 0; fi
printf 'half' > "$2"
echo "Encoding failed: out of cheese" >&2
exit 1
"#,
    )
}

/// Fake encoder that hangs on conversions.
#[cfg(unix)]
pub fn hanging_encoder(path: &Path) -> std::io::Result<PathBuf> {
    write_script(
        path,
        r#"if [ "$1" = "--version" ]; then echo "fake 1.0"; exit 0; fi
exec sleep 30
"#,
    )
}

/// Fake exiftool: answers `-ver`, logs copy calls, succeeds or fails.
#[cfg(unix)]
pub fn fake_exiftool(path: &Path, succeed: bool) -> std::io::Result<PathBuf> {
    let action = if succeed {
        "echo \"    1 image files updated\""
    } else {
        "echo \"Error: File format error - $2\" >&2; exit 1"
    };
    write_script(
        path,
        &format!(
            r#"if [ "$1" = "-ver" ]; then echo "13.10"; exit 0; fi
echo "$@" >> "$(dirname "$0")/calls.log"
{action}
"#
        ),
    )
}

/// Lines of the `calls.log` written by a fake tool in `dir`.
pub fn read_calls(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("calls.log"))
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}
