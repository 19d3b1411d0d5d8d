// Format-specific content extractors
pub mod csv;
pub mod docx;
pub mod lopdf_helper;
pub mod pdf;

use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::images::ImageSink;
use crate::types::{Extraction, FileKind};

pub use self::csv::CsvExtractor;
pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;

/// Converts one document into text, tables and images.
///
/// Implementations report every failure through the returned `Result`; the
/// engine turns errors (and panics) into error-tagged results.
pub trait Extractor: Send + Sync {
    fn kind(&self) -> FileKind;

    fn extract(&self, path: &Path, images: &ImageSink) -> Result<Extraction>;
}

/// Lookup table from file kind to extractor.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: HashMap<FileKind, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// PDF, DOCX and CSV extractors.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PdfExtractor::new()));
        registry.register(Arc::new(DocxExtractor::new()));
        registry.register(Arc::new(CsvExtractor::new()));
        registry
    }

    /// Replaces any extractor already registered for the same kind.
    pub fn register(&mut self, extractor: Arc<dyn Extractor>) {
        self.extractors.insert(extractor.kind(), extractor);
    }

    pub fn get(&self, kind: FileKind) -> Option<Arc<dyn Extractor>> {
        self.extractors.get(&kind).cloned()
    }
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<String> = self.extractors.keys().map(|k| k.to_string()).collect();
        kinds.sort();
        f.debug_struct("ExtractorRegistry").field("kinds", &kinds).finish()
    }
}
