//! File discovery module for finding RAW files to convert.
//!
//! Only the top level of the provided directory is searched. Files are matched
//! on the `.raf` extension (case-insensitive) and returned in a stable order so
//! that repeated runs walk the same worklist.

use crate::error::{CoreError, CoreResult};

use log::debug;
use std::path::{Path, PathBuf};

/// Extension of the RAW files rafrelay converts (Fujifilm RAF).
pub const RAW_EXTENSION: &str = "raf";

/// True if `path` has the RAW extension, ignoring case. Does not touch the disk.
#[must_use]
pub fn has_raw_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(RAW_EXTENSION))
}

/// Finds RAW files in the specified directory.
///
/// Returns regular files at the top level of `input_dir` whose extension is
/// `raf` (any case), sorted by file name. An empty result is valid.
///
/// # Errors
///
/// * `CoreError::Directory` - If the directory is missing or cannot be read
///
/// # Examples
///
/// ```rust,no_run
/// use rafrelay_core::find_raw_files;
/// use std::path::Path;
///
/// let files = find_raw_files(Path::new("/photos/raw")).unwrap();
/// for file in files {
///     println!("  {}", file.display());
/// }
/// ```
pub fn find_raw_files(input_dir: &Path) -> CoreResult<Vec<PathBuf>> {
    if !input_dir.is_dir() {
        return Err(CoreError::Directory(format!(
            "Input directory '{}' does not exist or is not a directory",
            input_dir.display()
        )));
    }

    let read_dir = std::fs::read_dir(input_dir).map_err(|e| {
        CoreError::Directory(format!(
            "Cannot read input directory '{}': {}",
            input_dir.display(),
            e
        ))
    })?;

    let mut files: Vec<PathBuf> = read_dir
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            (path.is_file() && has_raw_extension(&path)).then_some(path)
        })
        .collect();

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!(
        "Found {} RAW file(s) in {}",
        files.len(),
        input_dir.display()
    );
    Ok(files)
}
