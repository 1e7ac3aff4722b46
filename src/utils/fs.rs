//! Filesystem helpers for staging a site.

use anyhow::{Context, Result};
use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Files never copied into a deployment.
const IGNORED_FILES: &[&str] = &[".DS_Store", ".git"];

fn is_ignored(name: &OsStr) -> bool {
    name.to_str().is_some_and(|name| IGNORED_FILES.contains(&name))
}

/// Collect all files below `dir`, skipping ignored names and `.git` trees.
pub fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored(e.file_name()))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Copy one file, creating parent directories as needed.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::copy(src, dst)
        .with_context(|| format!("Failed to copy {} to {}", src.display(), dst.display()))?;
    Ok(())
}

/// Copy the contents of `src` into `dst`, preserving relative paths.
///
/// Returns the relative paths of the copied files.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<Vec<PathBuf>> {
    let mut copied = Vec::new();
    for file in collect_all_files(src) {
        let relative = file.strip_prefix(src)?.to_path_buf();
        copy_file(&file, &dst.join(&relative))?;
        copied.push(relative);
    }
    Ok(copied)
}

/// Remove everything in `dir` except the entries named in `keep`.
pub fn clear_dir_except(dir: &Path, keep: &[&str]) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    for entry in entries {
        let entry = entry?;
        if entry.file_name().to_str().is_some_and(|name| keep.contains(&name)) {
            continue;
        }

        let path = entry.path();
        let removed = if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.with_context(|| format!("Failed to remove {}", path.display()))?;
    }

    Ok(())
}
