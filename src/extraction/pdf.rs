// PDF extraction - text, simple tables and images via lopdf
use anyhow::{Context, Result};
use lopdf::{Dictionary, Document, Object, Stream};
use regex::Regex;
use serde_json::json;
use std::path::Path;
use std::sync::OnceLock;

use super::lopdf_helper::{self, filters, get_name, get_number, resolve, resolve_dict, resolve_stream};
use super::Extractor;
use crate::images::{ImageData, ImageSink, RawColor};
use crate::types::{Extraction, FileKind, ImageRef, Locator, TextBlock};

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub const fn new() -> Self {
        Self
    }
}

impl Extractor for PdfExtractor {
    fn kind(&self) -> FileKind {
        FileKind::Pdf
    }

    fn extract(&self, path: &Path, images: &ImageSink) -> Result<Extraction> {
        let document = lopdf_helper::load_pdf(path)?;

        let mut text_data = Vec::new();
        let mut table_data = Vec::new();
        let mut image_data = Vec::new();

        for (page_num, page_id) in document.get_pages() {
            match document.extract_text(&[page_num]) {
                Ok(text) if !text.trim().is_empty() => {
                    for table in detect_tables(&text) {
                        table_data.push(json!({ "page": page_num, "table": table }));
                    }
                    text_data.push(TextBlock {
                        locator: Locator::Page(page_num),
                        text,
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(file = %path.display(), page = page_num, error = %e, "no text extracted from page");
                }
            }

            let page = document
                .get_object(page_id)
                .and_then(Object::as_dict)
                .with_context(|| format!("page {page_num} is not a dictionary"))?;

            for (i, stream) in page_images(&document, page).into_iter().enumerate() {
                let index = i as u32 + 1;
                let name = ImageSink::pdf_image_name(path, page_num, index);
                let payload = image_payload(&document, stream);
                let image_path = images.persist(&name, payload.as_data())?;
                image_data.push(ImageRef {
                    locator: Locator::Page(page_num),
                    image_path,
                });
            }
        }

        Ok(Extraction {
            text: Some(text_data),
            tables: Some(table_data),
            images: Some(image_data),
        })
    }
}

// Image XObjects listed in the page resources, in dictionary order.
fn page_images<'a>(document: &'a Document, page: &'a Dictionary) -> Vec<&'a Stream> {
    let Some(resources) = lopdf_helper::page_resources(document, page) else {
        return Vec::new();
    };
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|x| resolve_dict(document, x))
    else {
        return Vec::new();
    };

    xobjects
        .iter()
        .filter_map(|(_name, obj)| resolve_stream(document, obj))
        .filter(|stream| get_name(document, &stream.dict, b"Subtype") == Some(b"Image".as_slice()))
        .collect()
}

enum Payload<'a> {
    Encoded(std::borrow::Cow<'a, [u8]>),
    Raw {
        bytes: std::borrow::Cow<'a, [u8]>,
        width: u32,
        height: u32,
        color: RawColor,
    },
    Opaque(std::borrow::Cow<'a, [u8]>),
}

impl Payload<'_> {
    fn as_data(&self) -> ImageData<'_> {
        match self {
            Payload::Encoded(bytes) => ImageData::Encoded(bytes.as_ref()),
            Payload::Raw {
                bytes,
                width,
                height,
                color,
            } => ImageData::Raw {
                bytes: bytes.as_ref(),
                width: *width,
                height: *height,
                color: *color,
            },
            Payload::Opaque(bytes) => ImageData::Opaque(bytes.as_ref()),
        }
    }
}

fn image_payload<'a>(document: &'a Document, stream: &'a Stream) -> Payload<'a> {
    use std::borrow::Cow;

    let dict = &stream.dict;
    let chain = filters(document, dict);
    let names: Vec<&[u8]> = chain.iter().map(Vec::as_slice).collect();

    let samples: Cow<'a, [u8]> = match names.as_slice() {
        [] => Cow::Borrowed(&stream.content),
        [b"DCTDecode"] => return Payload::Encoded(Cow::Borrowed(&stream.content)),
        [b"FlateDecode"] => match stream.decompressed_content() {
            Ok(bytes) => Cow::Owned(bytes),
            Err(e) => {
                tracing::debug!(error = %e, "cannot inflate image stream");
                return Payload::Opaque(Cow::Borrowed(&stream.content));
            }
        },
        _ => return Payload::Opaque(Cow::Borrowed(&stream.content)),
    };

    let width = get_number(document, dict, b"Width").and_then(|w| u32::try_from(w).ok());
    let height = get_number(document, dict, b"Height").and_then(|h| u32::try_from(h).ok());
    let bits = get_number(document, dict, b"BitsPerComponent");

    match (width, height, bits, color_space(document, dict)) {
        (Some(width), Some(height), Some(8), Some(color)) => Payload::Raw {
            bytes: samples,
            width,
            height,
            color,
        },
        _ => Payload::Opaque(samples),
    }
}

fn color_space(document: &Document, dict: &Dictionary) -> Option<RawColor> {
    let obj = resolve(document, dict.get(b"ColorSpace").ok()?)?;
    match obj {
        Object::Name(name) => match name.as_slice() {
            b"DeviceRGB" | b"CalRGB" => Some(RawColor::Rgb),
            b"DeviceGray" | b"CalGray" => Some(RawColor::Gray),
            _ => None,
        },
        // [/ICCBased <stream>]: channel count lives in the profile's /N
        Object::Array(items) => match items.as_slice() {
            [Object::Name(kind), profile] if kind.as_slice() == b"ICCBased" => {
                let profile = resolve_stream(document, profile)?;
                match get_number(document, &profile.dict, b"N")? {
                    3 => Some(RawColor::Rgb),
                    1 => Some(RawColor::Gray),
                    _ => None,
                }
            }
            _ => None,
        },
        _ => None,
    }
}

fn cell_splitter() -> &'static Regex {
    static SPLITTER: OnceLock<Regex> = OnceLock::new();
    SPLITTER.get_or_init(|| Regex::new(r"\t+| {2,}").expect("valid cell splitter regex"))
}

/// Find column-aligned blocks in page text.
///
/// A table is two or more consecutive lines that each split into the same
/// number (at least two) of cells on tabs or runs of spaces.
pub fn detect_tables(text: &str) -> Vec<Vec<Vec<String>>> {
    let mut tables = Vec::new();
    let mut current: Vec<Vec<String>> = Vec::new();

    let mut flush = |current: &mut Vec<Vec<String>>| {
        if current.len() >= 2 {
            tables.push(std::mem::take(current));
        } else {
            current.clear();
        }
    };

    for line in text.lines() {
        let cells: Vec<String> = cell_splitter()
            .split(line.trim())
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();

        if cells.len() < 2 {
            flush(&mut current);
            continue;
        }

        if let Some(first) = current.first() {
            if first.len() != cells.len() {
                flush(&mut current);
            }
        }
        current.push(cells);
    }
    flush(&mut current);

    tables
}
