//! Source file discovery
//!
//! Walks a repository root, skipping ignored directories, and keeps the files
//! some registered adapter can parse. Results are sorted by file id so every
//! later phase sees the same order.

use crate::adapter::AdapterRegistry;
use crate::ignore::IgnoreFilter;
use crate::scope_path::normalize_file_id;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A discovered source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute (or root-joined) path on disk
    pub path: PathBuf,
    /// Repository-relative file id
    pub file_id: String,
}

pub fn discover_files(root: &Path, registry: &AdapterRegistry, excludes: &[String]) -> Vec<SourceFile> {
    let filter = IgnoreFilter::new(root, excludes);

    let mut files: Vec<SourceFile> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !filter.is_ignored(entry.path(), entry.file_type().is_dir())
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && registry.can_handle(entry.path()))
        .map(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            SourceFile {
                file_id: normalize_file_id(relative),
                path: entry.path().to_path_buf(),
            }
        })
        .collect();

    files.sort_by(|a, b| a.file_id.cmp(&b.file_id));
    tracing::debug!("Discovered {} source files under {}", files.len(), root.display());
    files
}

/// Immediate child directories of `root`, one per repository in batch mode.
pub fn discover_repositories(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut repos: Vec<PathBuf> = std::fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| !name.starts_with('.'))
                .unwrap_or(false)
        })
        .collect();
    repos.sort();
    Ok(repos)
}
