// Observability sink for batch progress
use crate::batch::BatchSummary;
use crate::types::{ExtractionResult, FileRecord};

/// Receives per-file and per-batch events from the engine.
///
/// Called concurrently from worker tasks, so implementations must be
/// thread-safe. Hooks must not fail.
pub trait ExtractionObserver: Send + Sync {
    fn file_started(&self, _record: &FileRecord) {}

    fn file_succeeded(&self, record: &FileRecord, result: &ExtractionResult);

    fn file_failed(&self, record: &FileRecord, error: &str);

    fn batch_finished(&self, _summary: &BatchSummary) {}
}

/// Default observer: forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ExtractionObserver for TracingObserver {
    fn file_started(&self, record: &FileRecord) {
        tracing::debug!(file = %record.path.display(), kind = %record.kind, "extracting");
    }

    fn file_succeeded(&self, record: &FileRecord, result: &ExtractionResult) {
        tracing::info!(
            file = %record.path.display(),
            kind = %record.kind,
            text_blocks = result.text.as_ref().map_or(0, Vec::len),
            tables = result.tables.as_ref().map_or(0, Vec::len),
            images = result.images.as_ref().map_or(0, Vec::len),
            "processed successfully"
        );
    }

    fn file_failed(&self, record: &FileRecord, error: &str) {
        tracing::error!(file = %record.path.display(), kind = %record.kind, error, "processing failed");
    }

    fn batch_finished(&self, summary: &BatchSummary) {
        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            output = %summary.output_path.display(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "batch complete"
        );
    }
}

/// Observer that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl ExtractionObserver for NullObserver {
    fn file_succeeded(&self, _record: &FileRecord, _result: &ExtractionResult) {}

    fn file_failed(&self, _record: &FileRecord, _error: &str) {}
}
