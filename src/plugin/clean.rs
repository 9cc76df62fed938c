//! Stale-output cleanup.

use serde::Serialize;
use std::fs;
use std::path::{Component, Path};
use tracing::info;
use walkdir::WalkDir;

use super::PluginError;

/// Result of clearing output directories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    /// Files removed
    pub files: usize,
    /// Directories removed (the cleaned roots themselves are kept)
    pub dirs: usize,
    /// Bytes reclaimed
    pub bytes: u64,
}

/// Remove everything inside each of `paths`, resolved against `root`.
///
/// Missing directories are skipped. Paths must stay inside the root.
pub fn clean_paths(root: &Path, paths: &[String]) -> Result<CleanReport, PluginError> {
    let mut report = CleanReport::default();

    for relative in paths {
        let rel = Path::new(relative);
        let escapes = rel.is_absolute()
            || rel
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
        // "." and "./" name the root itself
        let names_root = !rel.components().any(|c| matches!(c, Component::Normal(_)));
        if escapes || names_root || relative.trim().is_empty() {
            return Err(PluginError::OutsideRoot(relative.clone()));
        }

        let target = root.join(rel);
        if !target.is_dir() {
            continue;
        }

        // Children before parents so directories are empty when removed
        for entry in WalkDir::new(&target).min_depth(1).contents_first(true) {
            let entry = entry.map_err(|e| PluginError::IoError(e.to_string()))?;
            let path = entry.path();

            if entry.file_type().is_dir() {
                fs::remove_dir(path).map_err(|e| PluginError::IoError(e.to_string()))?;
                report.dirs += 1;
            } else {
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                fs::remove_file(path).map_err(|e| PluginError::IoError(e.to_string()))?;
                report.files += 1;
                report.bytes += size;
            }
        }

        info!(
            path = %target.display(),
            files = report.files,
            dirs = report.dirs,
            "cleaned output directory"
        );
    }

    Ok(report)
}
