// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Input discovery — a file argument processes that single file, a directory
// is scanned (non-recursively) for supported image containers.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use revive_core::error::Result;

/// Extensions the decoder understands, matched case-insensitively.
const SUPPORTED_EXTENSIONS: &[&str] = &["tif", "tiff", "png", "jpg", "jpeg"];

/// Collect the files to process for the given input path.
///
/// A regular file is returned as-is. A directory is scanned one level deep
/// for supported extensions and the result is sorted by path, so batch
/// order is deterministic across runs and platforms.
#[instrument(skip_all, fields(input = %input.as_ref().display()))]
pub fn discover(input: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let input = input.as_ref();
    let info = std::fs::metadata(input)?;
    if info.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(input)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_supported_extension(path))
        .collect();
    files.sort();

    info!(count = files.len(), "Input files discovered");
    Ok(files)
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let lower = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&lower.as_str())
        })
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn directory_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.tiff");
        touch(dir.path(), "a.PNG");
        touch(dir.path(), "c.jpg");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "raw.arw");
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        touch(&dir.path().join("nested"), "d.png");

        let files = discover(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.PNG", "b.tiff", "c.jpg"]);
    }

    #[test]
    fn single_file_is_returned_directly() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "one.tif");
        let path = dir.path().join("one.tif");

        let files = discover(&path).unwrap();
        assert_eq!(files, vec![path]);
    }

    #[test]
    fn missing_input_is_an_io_error() {
        let err = discover("/nonexistent/input/dir").unwrap_err();
        assert!(matches!(err, revive_core::ReviveError::Io(_)));
    }
}
