//! Scratch directory management.
//!
//! Each batch run gets its own scratch directory for intermediate PNG files.
//! It is a `tempfile::TempDir`, so it is removed when the run drops it, even
//! on error paths.

use crate::error::{CoreError, CoreResult};
use log::debug;
use std::path::Path;
use tempfile::{Builder as TempFileBuilder, TempDir};

/// Prefix of every scratch directory created by a run.
pub const SCRATCH_PREFIX: &str = "rafrelay_";

/// Creates the scratch directory for one run. Auto-cleaned when dropped.
///
/// Uses `base` when given (created if missing), the system temp directory
/// otherwise.
pub fn create_scratch_dir(base: Option<&Path>) -> CoreResult<TempDir> {
    let mut builder = TempFileBuilder::new();
    builder.prefix(SCRATCH_PREFIX);

    let dir = match base {
        Some(base) => {
            std::fs::create_dir_all(base).map_err(|e| scratch_error(base, e))?;
            builder.tempdir_in(base).map_err(|e| scratch_error(base, e))?
        }
        None => builder
            .tempdir()
            .map_err(|e| scratch_error(&std::env::temp_dir(), e))?,
    };

    debug!("Scratch directory: {}", dir.path().display());
    Ok(dir)
}

fn scratch_error(base: &Path, error: std::io::Error) -> CoreError {
    CoreError::Directory(format!(
        "Cannot create scratch directory in '{}': {}",
        base.display(),
        error
    ))
}
