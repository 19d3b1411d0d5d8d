// Core types for docsweep
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

/// Document classification derived from a file name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileKind {
    Pdf,
    Docx,
    Csv,
    Unsupported,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("pdf") => FileKind::Pdf,
            Some("docx") => FileKind::Docx,
            Some("csv") => FileKind::Csv,
            _ => FileKind::Unsupported,
        }
    }

    pub fn is_supported(self) -> bool {
        !matches!(self, FileKind::Unsupported)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileKind::Pdf => "PDF",
            FileKind::Docx => "DOCX",
            FileKind::Csv => "CSV",
            FileKind::Unsupported => "UNSUPPORTED",
        };
        f.write_str(name)
    }
}

/// One classified input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub kind: FileKind,
}

impl FileRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = FileKind::from_path(&path);
        Self { path, kind }
    }

    /// The `file` correlation key written into results.
    pub fn file_id(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// Where a piece of content came from: a 1-based PDF page or a 0/1-based
/// position within a flat document sequence.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locator {
    Page(u32),
    Index(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(flatten)]
    pub locator: Locator,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    #[serde(flatten)]
    pub locator: Locator,
    pub image_path: String,
}

/// Successful payload produced by an extractor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub text: Option<Vec<TextBlock>>,
    pub tables: Option<Vec<Value>>,
    pub images: Option<Vec<ImageRef>>,
}

/// Per-file output record. Either a success payload or an error, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<TextBlock>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResult {
    pub fn success(file: impl Into<String>, extraction: Extraction) -> Self {
        Self {
            file: file.into(),
            text: extraction.text,
            tables: extraction.tables,
            images: extraction.images,
            error: None,
        }
    }

    pub fn failure(file: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            text: None,
            tables: None,
            images: None,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

// Batch-level errors. Per-file failures never surface here.
#[derive(Debug, thiserror::Error)]
pub enum DocsweepError {
    #[error("cannot read input directory {path}: {source}")]
    InputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot prepare output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DocsweepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(FileKind::from_path(Path::new("a.pdf")), FileKind::Pdf);
        assert_eq!(FileKind::from_path(Path::new("dir/B.DOCX")), FileKind::Docx);
        assert_eq!(FileKind::from_path(Path::new("c.Csv")), FileKind::Csv);
        assert_eq!(FileKind::from_path(Path::new("d.txt")), FileKind::Unsupported);
        assert_eq!(FileKind::from_path(Path::new("README")), FileKind::Unsupported);
        assert_eq!(FileKind::from_path(Path::new(".pdf")), FileKind::Unsupported);
    }

    #[test]
    fn test_failure_has_no_payload() {
        let result = ExtractionResult::failure("x.pdf", "boom");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({"file": "x.pdf", "error": "boom"}));
    }

    #[test]
    fn test_locator_flattens() {
        let block = TextBlock {
            locator: Locator::Page(3),
            text: "hello".to_string(),
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json, serde_json::json!({"page": 3, "text": "hello"}));

        let image = ImageRef {
            locator: Locator::Index(1),
            image_path: "out/a.docx_img1.png".to_string(),
        };
        let json = serde_json::to_value(&image).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"index": 1, "image_path": "out/a.docx_img1.png"})
        );
        let back: ImageRef = serde_json::from_value(json).unwrap();
        assert_eq!(back, image);
    }
}
