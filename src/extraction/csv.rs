// CSV extraction - one JSON record per data row, keyed by header
use anyhow::{bail, Context, Result};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::path::Path;

use super::Extractor;
use crate::images::ImageSink;
use crate::types::{Extraction, FileKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExtractor;

impl CsvExtractor {
    pub const fn new() -> Self {
        Self
    }
}

impl Extractor for CsvExtractor {
    fn kind(&self) -> FileKind {
        FileKind::Csv
    }

    fn extract(&self, path: &Path, _images: &ImageSink) -> Result<Extraction> {
        let reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("failed to open {}", path.display()))?;

        let records = read_records(reader)?;
        Ok(Extraction {
            text: None,
            tables: Some(records),
            images: None,
        })
    }
}

fn read_records<R: std::io::Read>(mut reader: ::csv::Reader<R>) -> Result<Vec<Value>> {
    let headers = unique_headers(reader.headers().context("failed to read CSV header")?);
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        bail!("no columns to parse from file");
    }

    let mut records = Vec::new();
    for (row, record) in reader.records().enumerate() {
        // +2: 1-based and the header line
        let record = record.with_context(|| format!("malformed CSV row {}", row + 2))?;
        let mut object = Map::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            let value = record.get(i).map_or(Value::Null, infer_value);
            object.insert(header.clone(), value);
        }
        records.push(Value::Object(object));
    }
    Ok(records)
}

// Repeated names become `name.1`, `name.2`, ...
fn unique_headers(raw: &::csv::StringRecord) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.iter()
        .map(|name| {
            let name = name.trim().to_string();
            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name
            } else {
                format!("{name}.{count}")
            };
            *count += 1;
            unique
        })
        .collect()
}

/// Parse a cell the way a dataframe loader would: numbers and booleans are
/// typed, blanks become null, everything else stays a string.
pub fn infer_value(raw: &str) -> Value {
    let cell = raw.trim();
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = cell.parse::<f64>() {
        // NaN and infinities have no JSON form
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
        return Value::Null;
    }
    if cell.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if cell.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(raw.to_string())
}
