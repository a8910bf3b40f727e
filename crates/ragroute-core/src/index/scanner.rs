//! File discovery for ingestion

use crate::error::{RagRouteError, Result};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Extensions read as plain text
pub const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// Directories skipped while walking
const EXCLUDE_DIRS: &[&str] = &["node_modules", ".git", "target", "__pycache__", ".venv"];

/// Expand a path into the text files it names
///
/// A file is returned as is (its format is checked when it is read). A
/// directory is walked recursively for text files, skipping hidden entries.
pub fn collect_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(RagRouteError::Document(format!(
            "path not found: {}",
            path.display()
        )));
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(path)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !should_skip(e));

    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && is_text_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Whether the extension is one of [`TEXT_EXTENSIONS`]
pub fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| TEXT_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn should_skip(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return true;
    }
    entry.file_type().is_dir() && EXCLUDE_DIRS.iter().any(|d| name == *d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_walks_text_files_only() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "# A").unwrap();
        fs::write(dir.path().join("b.txt"), "B").unwrap();
        fs::write(dir.path().join("c.pdf"), "%PDF").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("d.MD"), "D").unwrap();
        fs::create_dir(dir.path().join(".hidden")).unwrap();
        fs::write(dir.path().join(".hidden").join("e.md"), "E").unwrap();

        let files = collect_files(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.md", "b.txt", "d.MD"]);
    }

    #[test]
    fn test_single_file_and_missing_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("report.pdf");
        fs::write(&file, "%PDF").unwrap();

        assert_eq!(collect_files(&file).unwrap(), vec![file]);
        assert!(collect_files(&dir.path().join("missing")).is_err());
    }
}
