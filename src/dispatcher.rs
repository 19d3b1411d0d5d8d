// Directory scanning and file classification
use std::path::Path;

use crate::types::{DocsweepError, FileKind, FileRecord, Result};

/// Classify a path by its extension.
pub fn classify(path: &Path) -> FileKind {
    FileKind::from_path(path)
}

/// List the immediate entries of `dir` and keep the supported files.
///
/// Unsupported entries and subdirectories are skipped silently. Only failing
/// to read the directory itself fails the scan; a supported entry whose
/// metadata cannot be read (a dangling symlink, say) is still dispatched so
/// its error ends up in that file's result.
pub fn scan_directory(dir: &Path) -> Result<Vec<FileRecord>> {
    let read_err = |source| DocsweepError::InputDirectory {
        path: dir.to_path_buf(),
        source,
    };

    let mut records = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = dir.join(entry.file_name());

        let kind = classify(&path);
        if !kind.is_supported() {
            tracing::debug!(path = %path.display(), "skipping unsupported entry");
            continue;
        }

        // fs::metadata follows symlinks
        match std::fs::metadata(&path) {
            Ok(metadata) if !metadata.is_file() => {
                tracing::debug!(path = %path.display(), "skipping non-file entry");
                continue;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot stat entry, dispatching anyway");
            }
        }

        records.push(FileRecord { path, kind });
    }

    records.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(records)
}
