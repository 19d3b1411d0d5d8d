// Aggregate JSON output
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::types::{DocsweepError, ExtractionResult, Result};

/// Create the output directory if it does not exist yet.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| DocsweepError::OutputDirectory {
        path: dir.to_path_buf(),
        source,
    })
}

/// Serialize the whole batch as one JSON array and atomically replace
/// `dir/file_name` with it.
pub fn write_results(dir: &Path, file_name: &str, results: &[ExtractionResult]) -> Result<PathBuf> {
    ensure_output_dir(dir)?;
    let target = dir.join(file_name);

    let mut payload = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut payload, PrettyFormatter::with_indent(b"    "));
    results.serialize(&mut serializer)?;
    payload.push(b'\n');

    let persist_err = |source| DocsweepError::Persist {
        path: target.clone(),
        source,
    };

    // Same directory as the target so the final rename stays on one filesystem.
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(persist_err)?;
    tmp.write_all(&payload).map_err(persist_err)?;
    tmp.as_file().sync_all().map_err(persist_err)?;
    tmp.persist(&target).map_err(|e| persist_err(e.error))?;

    Ok(target)
}

/// Load a previously written artifact.
pub fn read_results(path: &Path) -> Result<Vec<ExtractionResult>> {
    let raw = std::fs::read(path).map_err(|source| DocsweepError::Persist {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&raw)?)
}
