//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::core::library::is_library_dir;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Library directories at most `max_depth` levels below `root`, sorted.
///
/// Unreadable entries are skipped. The search does not descend into a
/// library once found.
pub fn find_library_dirs(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        if is_library_dir(entry.path()) {
            found.push(entry.path().to_path_buf());
            walker.skip_current_dir();
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::library::MANIFEST_FILE;
    use tempfile::TempDir;

    #[test]
    fn test_write_string_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out-build").join("manifest.properties");

        write_string(&path, "package=sdl\n").unwrap();
        assert_eq!(read_to_string(&path).unwrap(), "package=sdl\n");
    }

    #[test]
    fn test_find_library_dirs() {
        let tmp = TempDir::new().unwrap();
        for dir in ["repo/posix", "repo/sdl", "repo/sdl/nested", "repo/notes"] {
            fs::create_dir_all(tmp.path().join(dir)).unwrap();
        }
        fs::write(tmp.path().join("repo/posix").join(MANIFEST_FILE), "").unwrap();
        fs::write(tmp.path().join("repo/sdl").join(MANIFEST_FILE), "").unwrap();
        fs::write(tmp.path().join("repo/sdl/nested").join(MANIFEST_FILE), "").unwrap();

        let found = find_library_dirs(&tmp.path().join("repo"), 2);
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["posix", "sdl"]);
    }
}
