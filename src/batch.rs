// End-to-end batch: scan, extract, aggregate
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::BatchConfig;
use crate::dispatcher;
use crate::engine::BatchEngine;
use crate::extraction::ExtractorRegistry;
use crate::images::ImageSink;
use crate::observer::ExtractionObserver;
use crate::sink;
use crate::types::{ExtractionResult, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub output_path: PathBuf,
    pub elapsed: Duration,
}

impl BatchSummary {
    fn from_results(results: &[ExtractionResult], output_path: PathBuf, elapsed: Duration) -> Self {
        let failed = results.iter().filter(|r| r.is_error()).count();
        Self {
            total: results.len(),
            succeeded: results.len() - failed,
            failed,
            output_path,
            elapsed,
        }
    }
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub results: Vec<ExtractionResult>,
    pub summary: BatchSummary,
}

/// Run one batch with the standard extractors.
pub async fn run_batch(config: &BatchConfig, observer: Arc<dyn ExtractionObserver>) -> Result<BatchOutcome> {
    run_batch_with(config, ExtractorRegistry::standard(), observer).await
}

/// Run one batch with a caller-supplied registry.
///
/// Only a missing/unreadable input directory or a failed output write makes
/// this return `Err`; per-file problems are reported inside the results.
pub async fn run_batch_with(
    config: &BatchConfig,
    registry: ExtractorRegistry,
    observer: Arc<dyn ExtractionObserver>,
) -> Result<BatchOutcome> {
    config.validate()?;
    let started = Instant::now();

    let records = dispatcher::scan_directory(&config.input_dir)?;

    // Extractors write images here, so it must exist before dispatch.
    sink::ensure_output_dir(&config.output_dir)?;
    tracing::info!(
        input = %config.input_dir.display(),
        files = records.len(),
        max_in_flight = config.max_in_flight,
        "starting batch"
    );

    let engine = BatchEngine::new(
        registry,
        ImageSink::new(&config.output_dir),
        Arc::clone(&observer),
        config.max_in_flight,
    )
    .with_timeout(config.file_timeout);

    let results = engine.run(records).await;
    let output_path = sink::write_results(&config.output_dir, &config.output_file, &results)?;

    let summary = BatchSummary::from_results(&results, output_path, started.elapsed());
    observer.batch_finished(&summary);

    Ok(BatchOutcome { results, summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NullObserver;
    use crate::types::{DocsweepError, FileRecord};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl RecordingObserver {
        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<String> {
            let mut events = self.events.lock().unwrap().clone();
            events.sort();
            events
        }
    }

    impl ExtractionObserver for RecordingObserver {
        fn file_started(&self, record: &FileRecord) {
            self.push(format!("started {}", record.path.file_name().unwrap().to_string_lossy()));
        }

        fn file_succeeded(&self, record: &FileRecord, _result: &ExtractionResult) {
            self.push(format!("ok {}", record.path.file_name().unwrap().to_string_lossy()));
        }

        fn file_failed(&self, record: &FileRecord, _error: &str) {
            self.push(format!("failed {}", record.path.file_name().unwrap().to_string_lossy()));
        }

        fn batch_finished(&self, summary: &BatchSummary) {
            self.push(format!("finished {}/{}", summary.succeeded, summary.total));
        }
    }

    fn config_for(input: &std::path::Path, output: &std::path::Path) -> BatchConfig {
        BatchConfig {
            input_dir: input.to_path_buf(),
            output_dir: output.to_path_buf(),
            max_in_flight: 2,
            log_file: None,
            ..BatchConfig::default()
        }
    }

    #[tokio::test]
    async fn test_missing_input_dir_aborts_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir.path().join("missing"), &dir.path().join("out"));

        let err = run_batch(&config, Arc::new(NullObserver)).await.unwrap_err();
        assert!(matches!(err, DocsweepError::InputDirectory { .. }));
        assert!(!config.output_dir.exists());
    }

    #[tokio::test]
    async fn test_summary_counts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir(&input).unwrap();
        std::fs::write(input.join("good.csv"), "a,b\n1,2\n").unwrap();
        std::fs::write(input.join("empty.csv"), "").unwrap();
        std::fs::write(input.join("skip.txt"), "ignored").unwrap();

        let config = config_for(&input, &dir.path().join("out"));
        let outcome = run_batch(&config, Arc::new(NullObserver)).await.unwrap();

        assert_eq!(outcome.summary.total, 2);
        assert_eq!(outcome.summary.succeeded, 1);
        assert_eq!(outcome.summary.failed, 1);
        assert_eq!(outcome.summary.output_path, config.output_path());
    }

    #[tokio::test]
    async fn test_observer_sees_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir(&input).unwrap();
        std::fs::write(input.join("good.csv"), "a\n1\n").unwrap();
        std::fs::write(input.join("empty.csv"), "").unwrap();

        let observer = Arc::new(RecordingObserver::default());
        let config = config_for(&input, &dir.path().join("out"));
        run_batch(&config, observer.clone()).await.unwrap();

        assert_eq!(
            observer.events(),
            vec![
                "failed empty.csv",
                "finished 1/2",
                "ok good.csv",
                "started empty.csv",
                "started good.csv",
            ]
        );
    }
}
