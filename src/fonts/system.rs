//! Listing of font files installed on the machine

use std::path::{Path, PathBuf};

use glob::glob;

use crate::error::{Error, Result};

/// Every file below `dir`, relative to it and sorted
///
/// Entries that cannot be read are skipped.
pub fn list_font_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::FileNotFound(dir.to_path_buf()));
    }

    let pattern = dir.join("**").join("*");
    let pattern = pattern
        .to_str()
        .ok_or_else(|| Error::General(format!("non UTF-8 path: {}", dir.display())))?;

    let mut files: Vec<PathBuf> = glob(pattern)?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .filter_map(|path| path.strip_prefix(dir).ok().map(Path::to_path_buf))
        .collect();

    files.sort();
    Ok(files)
}
