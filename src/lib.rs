// docsweep - batch text/table/image extraction for PDF, DOCX and CSV files
pub mod batch;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod extraction;
pub mod images;
pub mod logging;
pub mod observer;
pub mod sink;
pub mod types;

pub use batch::{run_batch, run_batch_with, BatchOutcome, BatchSummary};
pub use config::BatchConfig;
pub use engine::BatchEngine;
pub use extraction::{Extractor, ExtractorRegistry};
pub use images::ImageSink;
pub use observer::{ExtractionObserver, NullObserver, TracingObserver};
pub use types::{
    DocsweepError, Extraction, ExtractionResult, FileKind, FileRecord, ImageRef, Locator, Result,
    TextBlock,
};
