//! Marker lookup beneath a sysfs controller path.

use std::path::{Path, PathBuf};

use crate::sysfs::SysfsReader;

/// Default depth bound for [`find_path`]. Controller subtrees in sysfs are a
/// handful of levels deep; this only guards against pathological trees.
pub const MAX_SCAN_DEPTH: usize = 32;

/// Find the directory holding the first entry whose name starts with `marker`.
///
/// Entries are taken one at a time in listing order. A subdirectory is
/// searched as soon as it is reached, before its later siblings, so the
/// result is the one a recursive walk would report. Symlinks are never
/// followed. Directories that cannot be listed are skipped.
pub fn find_path(
    fs: &impl SysfsReader,
    start: &Path,
    marker: &str,
    max_depth: usize,
) -> Option<PathBuf> {
    // One frame per open directory: its remaining entries and its depth.
    let mut stack: Vec<(std::vec::IntoIter<PathBuf>, usize)> = Vec::new();
    if let Some(entries) = scan(fs, start) {
        stack.push((entries.into_iter(), 0));
    }

    while let Some((entries, depth)) = stack.last_mut() {
        let depth = *depth;
        let Some(entry) = entries.next() else {
            stack.pop();
            continue;
        };

        if has_prefix(&entry, marker) {
            return entry.parent().map(Path::to_path_buf);
        }

        if !matches!(fs.is_dir(&entry), Ok(true)) {
            continue;
        }
        if depth >= max_depth {
            log::debug!("not descending into {} (depth limit)", entry.display());
            continue;
        }
        if let Some(children) = scan(fs, &entry) {
            stack.push((children.into_iter(), depth + 1));
        }
    }

    None
}

fn scan(fs: &impl SysfsReader, dir: &Path) -> Option<Vec<PathBuf>> {
    fs.scan_dir(dir)
        .map_err(|e| log::info!("failed to scan {}: {e}", dir.display()))
        .ok()
}

fn has_prefix(entry: &Path, marker: &str) -> bool {
    entry
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(marker))
}
