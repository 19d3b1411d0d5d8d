// Concurrent extraction engine
//
// Fans out one task per file, bounded by a semaphore, and joins them all
// before returning. A failing, panicking or timed-out extraction only
// affects its own result.
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

use crate::extraction::ExtractorRegistry;
use crate::images::ImageSink;
use crate::observer::ExtractionObserver;
use crate::types::{ExtractionResult, FileRecord};

pub struct BatchEngine {
    registry: Arc<ExtractorRegistry>,
    images: Arc<ImageSink>,
    observer: Arc<dyn ExtractionObserver>,
    max_in_flight: usize,
    file_timeout: Option<Duration>,
}

impl BatchEngine {
    pub fn new(
        registry: ExtractorRegistry,
        images: ImageSink,
        observer: Arc<dyn ExtractionObserver>,
        max_in_flight: usize,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            images: Arc::new(images),
            observer,
            max_in_flight: max_in_flight.clamp(1, Semaphore::MAX_PERMITS.min(u32::MAX as usize)),
            file_timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.file_timeout = timeout;
        self
    }

    /// Extract every record and return one result per record, in input order.
    pub async fn run(&self, records: Vec<FileRecord>) -> Vec<ExtractionResult> {
        if records.is_empty() {
            return Vec::new();
        }

        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut tasks = JoinSet::new();

        for (index, record) in records.iter().cloned().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let registry = Arc::clone(&self.registry);
            let images = Arc::clone(&self.images);
            let observer = Arc::clone(&self.observer);
            let timeout = self.file_timeout;

            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(permit) => {
                        observer.file_started(&record);
                        extract_one(&record, registry, images, timeout, permit).await
                    }
                    Err(_) => ExtractionResult::failure(record.file_id(), "worker pool shut down"),
                };

                match &result.error {
                    Some(error) => observer.file_failed(&record, error),
                    None => observer.file_succeeded(&record, &result),
                }
                (index, result)
            });
        }

        let mut slots: Vec<Option<ExtractionResult>> = vec![None; records.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => tracing::error!(error = %e, "extraction task aborted"),
            }
        }

        // Timed-out extractions still hold their permits; wait them out so
        // nothing writes into the output directory after we return.
        if semaphore.acquire_many(self.max_in_flight as u32).await.is_err() {
            tracing::warn!("semaphore closed before timed-out extractions finished");
        }

        // An aborted task leaves its slot empty; it still owes a result.
        slots
            .into_iter()
            .zip(records)
            .map(|(slot, record)| {
                slot.unwrap_or_else(|| {
                    let result = ExtractionResult::failure(record.file_id(), "extraction task aborted");
                    self.observer.file_failed(&record, "extraction task aborted");
                    result
                })
            })
            .collect()
    }
}

async fn extract_one(
    record: &FileRecord,
    registry: Arc<ExtractorRegistry>,
    images: Arc<ImageSink>,
    timeout: Option<Duration>,
    permit: OwnedSemaphorePermit,
) -> ExtractionResult {
    let file = record.file_id();
    let Some(extractor) = registry.get(record.kind) else {
        return ExtractionResult::failure(file, format!("no extractor for {} files", record.kind));
    };

    // The permit travels with the blocking work, so a timeout does not free
    // the slot until the extraction has really stopped.
    let path = record.path.clone();
    let work = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        extractor.extract(&path, &images)
    });

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, work).await {
            Ok(joined) => joined,
            Err(_) => {
                return ExtractionResult::failure(
                    file,
                    format!("extraction timed out after {}s", limit.as_secs_f64()),
                )
            }
        },
        None => work.await,
    };

    match joined {
        Ok(Ok(extraction)) => ExtractionResult::success(file, extraction),
        Ok(Err(e)) => ExtractionResult::failure(file, format!("{e:#}")),
        Err(e) if e.is_panic() => ExtractionResult::failure(file, panic_message(e.into_panic())),
        Err(e) => ExtractionResult::failure(file, format!("extraction cancelled: {e}")),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("extractor panicked: {detail}")
}
