// lopdf helper - Pure Rust PDF object plumbing
use anyhow::{Context, Result};
use lopdf::{Dictionary, Document, Object, Stream};
use std::path::Path;

/// Load a PDF document using lopdf
pub fn load_pdf(path: &Path) -> Result<Document> {
    Document::load(path).with_context(|| format!("failed to load PDF {}", path.display()))
}

/// Follow a reference to the object it points at. Non-references pass through.
pub fn resolve<'a>(document: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

pub fn resolve_dict<'a>(document: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(document, obj)? {
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

pub fn resolve_stream<'a>(document: &'a Document, obj: &'a Object) -> Option<&'a Stream> {
    match resolve(document, obj)? {
        Object::Stream(stream) => Some(stream),
        _ => None,
    }
}

pub fn get_number(document: &Document, dict: &Dictionary, key: &[u8]) -> Option<i64> {
    match resolve(document, dict.get(key).ok()?)? {
        Object::Integer(i) => Some(*i),
        Object::Real(f) => Some(*f as i64),
        _ => None,
    }
}

pub fn get_name<'a>(document: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    match resolve(document, dict.get(key).ok()?)? {
        Object::Name(name) => Some(name.as_slice()),
        _ => None,
    }
}

/// Stream filter names in application order.
pub fn filters(document: &Document, dict: &Dictionary) -> Vec<Vec<u8>> {
    let Some(obj) = dict.get(b"Filter").ok().and_then(|o| resolve(document, o)) else {
        return Vec::new();
    };
    match obj {
        Object::Name(name) => vec![name.clone()],
        Object::Array(items) => items
            .iter()
            .filter_map(|item| match resolve(document, item)? {
                Object::Name(name) => Some(name.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Resources for a page, walking up the `Parent` chain for inherited entries.
pub fn page_resources<'a>(document: &'a Document, page: &'a Dictionary) -> Option<&'a Dictionary> {
    let mut current = page;
    // Page trees are shallow; the bound only guards against cycles.
    for _ in 0..32 {
        if let Some(resources) = current
            .get(b"Resources")
            .ok()
            .and_then(|r| resolve_dict(document, r))
        {
            return Some(resources);
        }
        current = current
            .get(b"Parent")
            .ok()
            .and_then(|p| resolve_dict(document, p))?;
    }
    None
}
