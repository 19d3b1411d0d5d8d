// DOCX extraction - paragraphs, tables and embedded media
//
// A .docx file is a ZIP package. Body content lives in word/document.xml and
// embedded media is reached through word/_rels/document.xml.rels.
use anyhow::{anyhow, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::json;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use zip::ZipArchive;

use super::Extractor;
use crate::images::{ImageData, ImageSink};
use crate::types::{Extraction, FileKind, ImageRef, Locator, TextBlock};

const DOCUMENT_PART: &str = "word/document.xml";
const DOCUMENT_RELS: &str = "word/_rels/document.xml.rels";
const IMAGE_REL_SUFFIX: &str = "/image";

#[derive(Debug, Clone, Copy, Default)]
pub struct DocxExtractor;

impl DocxExtractor {
    pub const fn new() -> Self {
        Self
    }
}

impl Extractor for DocxExtractor {
    fn kind(&self) -> FileKind {
        FileKind::Docx
    }

    fn extract(&self, path: &Path, images: &ImageSink) -> Result<Extraction> {
        let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let mut archive = ZipArchive::new(file).context("not a DOCX package (invalid ZIP)")?;

        let document_xml = read_part(&mut archive, DOCUMENT_PART)?
            .ok_or_else(|| anyhow!("missing {DOCUMENT_PART}"))?;
        let body = parse_body(&document_xml)?;

        let text_data = body
            .paragraphs
            .into_iter()
            .enumerate()
            .map(|(i, text)| TextBlock {
                locator: Locator::Index(i as u32),
                text,
            })
            .collect();

        let table_data = body
            .tables
            .into_iter()
            .enumerate()
            .map(|(i, table)| json!({ "index": i, "table": table }))
            .collect();

        let mut image_data = Vec::new();
        let rels = match read_part(&mut archive, DOCUMENT_RELS)? {
            Some(xml) => parse_image_targets(&xml)?,
            None => Vec::new(),
        };
        for (i, target) in rels.iter().enumerate() {
            let part = media_part_name(target);
            let Some(bytes) = read_part_bytes(&mut archive, &part)? else {
                tracing::warn!(file = %path.display(), part = %part, "image relationship points at a missing part");
                continue;
            };
            let index = image_data.len() as u32 + 1;
            let name = ImageSink::docx_image_name(path, index);
            let image_path = images.persist(&name, ImageData::Encoded(&bytes))?;
            tracing::debug!(file = %path.display(), rel = i, image_path = %image_path, "saved embedded image");
            image_data.push(ImageRef {
                locator: Locator::Index(index),
                image_path,
            });
        }

        Ok(Extraction {
            text: Some(text_data),
            tables: Some(table_data),
            images: Some(image_data),
        })
    }
}

fn read_part_bytes<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<Vec<u8>>> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("cannot open part {name}")),
    };
    let mut bytes = Vec::new();
    entry
        .read_to_end(&mut bytes)
        .with_context(|| format!("cannot read part {name}"))?;
    Ok(Some(bytes))
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    match read_part_bytes(archive, name)? {
        Some(bytes) => {
            let text = String::from_utf8(bytes).with_context(|| format!("part {name} is not UTF-8"))?;
            Ok(Some(text))
        }
        None => Ok(None),
    }
}

// Relationship targets are relative to word/ unless they start with '/'.
fn media_part_name(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => {
            let mut parts: Vec<&str> = vec!["word"];
            for segment in target.split('/') {
                match segment {
                    "" | "." => {}
                    ".." => {
                        parts.pop();
                    }
                    s => parts.push(s),
                }
            }
            parts.join("/")
        }
    }
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Targets of internal image relationships, in file order.
fn parse_image_targets(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut targets = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"Relationship" => {
                let is_image = attr(&e, b"Type").is_some_and(|t| t.ends_with(IMAGE_REL_SUFFIX));
                let external = attr(&e, b"TargetMode").is_some_and(|m| m == "External");
                if let (true, false, Some(target)) = (is_image, external, attr(&e, b"Target")) {
                    targets.push(target);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow!("error parsing relationships: {e}")),
            _ => {}
        }
        buf.clear();
    }
    Ok(targets)
}

#[derive(Debug, Default, PartialEq)]
struct Body {
    paragraphs: Vec<String>,
    tables: Vec<Vec<Vec<String>>>,
}

#[derive(Default)]
struct BodyWalker {
    body: Body,
    paragraph: String,
    in_run: bool,
    in_text: bool,
    table_depth: usize,
    table: Vec<Vec<String>>,
    row: Vec<String>,
    cell: Vec<String>,
}

impl BodyWalker {
    fn start(&mut self, name: &[u8]) {
        match name {
            b"w:p" => self.paragraph.clear(),
            b"w:r" => self.in_run = true,
            b"w:t" if self.in_run => self.in_text = true,
            b"w:tbl" => {
                self.table_depth += 1;
                if self.table_depth == 1 {
                    self.table.clear();
                }
            }
            b"w:tr" if self.table_depth == 1 => self.row.clear(),
            b"w:tc" if self.table_depth == 1 => self.cell.clear(),
            _ => {}
        }
    }

    fn empty(&mut self, name: &[u8]) {
        match name {
            // w:tab also appears in paragraph tab stops; only run tabs count
            b"w:tab" if self.in_run => self.paragraph.push('\t'),
            b"w:br" | b"w:cr" if self.in_run => self.paragraph.push('\n'),
            // <w:p/> is an empty paragraph
            b"w:p" => {
                self.paragraph.clear();
                self.end(b"w:p");
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_text {
            self.paragraph.push_str(text);
        }
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"w:t" => self.in_text = false,
            b"w:r" => self.in_run = false,
            b"w:p" => {
                let paragraph = std::mem::take(&mut self.paragraph);
                if self.table_depth == 0 {
                    self.body.paragraphs.push(paragraph);
                } else {
                    // nested table paragraphs flow into the outer cell
                    self.cell.push(paragraph);
                }
            }
            b"w:tc" if self.table_depth == 1 => {
                let cell = std::mem::take(&mut self.cell).join("\n");
                self.row.push(cell);
            }
            b"w:tr" if self.table_depth == 1 => {
                let row = std::mem::take(&mut self.row);
                self.table.push(row);
            }
            b"w:tbl" => {
                if self.table_depth == 1 {
                    let table = std::mem::take(&mut self.table);
                    self.body.tables.push(table);
                }
                self.table_depth = self.table_depth.saturating_sub(1);
            }
            _ => {}
        }
    }
}

fn parse_body(xml: &str) -> Result<Body> {
    let mut reader = Reader::from_str(xml);
    // xml:space="preserve" runs carry meaningful whitespace
    reader.trim_text(false);

    let mut walker = BodyWalker::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => walker.start(e.name().as_ref()),
            Ok(Event::Empty(e)) => walker.empty(e.name().as_ref()),
            Ok(Event::Text(e)) => {
                let text = e.unescape().context("bad text in document.xml")?;
                walker.text(&text);
            }
            Ok(Event::End(e)) => walker.end(e.name().as_ref()),
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow!("error parsing document.xml: {e}")),
            _ => {}
        }
        buf.clear();
    }
    Ok(walker.body)
}
