use std::path::{Path, PathBuf};
use anyhow::Result;
use log::{debug, info, warn};
use walkdir::WalkDir;

/// Collect media files under `root` for a recursive run.
///
/// Symlinks are not followed. Unreadable entries are logged and skipped.
/// Results are sorted so batch order is stable between runs.
pub fn collect_media_files(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }

    info!("Scanning directory: {}", root.display());

    let mut files = Vec::new();
    let mut entry_count = 0;

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Error reading directory entry: {}", e);
                continue;
            }
        };
        entry_count += 1;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if is_media_file(path, extensions) {
            debug!("Found media file: {}", path.display());
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    info!(
        "Finished scanning {}: {} entries, {} media files",
        root.display(),
        entry_count,
        files.len()
    );

    Ok(files)
}

/// Extension check, case-insensitive
pub fn is_media_file(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
