//! File utility functions for listing and filtering files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Image file extensions the sample photographs come in.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Returns paths to all files in a directory matching the given extensions,
/// sorted by path. Extensions are matched case-insensitively.
pub fn files_with_extensions(dir: &Path, extensions: &[&str]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if extensions.contains(&ext.as_str()) {
            files.push(path);
        }
    }
    files.sort();

    Ok(files)
}

/// Returns paths to all JPEG and PNG files in the given directory.
pub fn image_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    files_with_extensions(dir, IMAGE_EXTENSIONS)
}
