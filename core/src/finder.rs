use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// True for regular files ending in `.txt` or `.text`, ignoring case.
pub fn is_text_file(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let lower = path.to_string_lossy().to_lowercase();
    lower.ends_with(".txt") || lower.ends_with(".text")
}

/// Collect every text file under `root`, following symlinks.
///
/// `root` may itself be a file, in which case it is returned only if it passes
/// [`is_text_file`]. Entries are visited in file-name order so repeated runs
/// see the same sequence.
pub fn find_text_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking {}", root.display()))?;
        let p = entry.path();
        if is_text_file(p) {
            files.push(p.to_path_buf());
        }
    }
    Ok(files)
}
