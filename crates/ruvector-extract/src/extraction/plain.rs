//! Plain text and markdown extraction

use std::path::Path;

use super::{Extraction, Extractor};
use crate::error::{Error, Result};
use crate::text::decode_bytes;
use crate::types::{Element, FileMetadata, Source, TextMetadata};

/// Reads text files directly; every paragraph becomes a Text element on page 1
#[derive(Debug, Clone, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Split decoded text into Text elements, one per blank-line separated paragraph
    pub fn elements_from_text(text: &str, file: &FileMetadata) -> Vec<Element> {
        paragraphs(text)
            .into_iter()
            .filter_map(|paragraph| {
                Element::text(paragraph, Source::Native, 1, file.clone(), TextMetadata::default())
            })
            .collect()
    }
}

impl Extractor for PlainTextExtractor {
    fn name(&self) -> &'static str {
        "plain_text"
    }

    fn extract(&self, path: &Path) -> Result<Extraction> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        let text = decode_bytes(&bytes);
        let file = FileMetadata::from_path(path);

        let elements = Self::elements_from_text(&text, &file);
        tracing::info!(
            "[{}] Extracted {} paragraphs",
            file.file_name.as_deref().unwrap_or("document"),
            elements.len()
        );

        let mut extraction = Extraction::new(elements);
        extraction.report.pages_total = 1;
        extraction.report.pages_native = 1;
        Ok(extraction)
    }
}

fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        out.push(current.join("\n"));
    }

    out
}
