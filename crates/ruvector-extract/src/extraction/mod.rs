//! Element extraction: page classification, native and scanned recovery,
//! per-format extractors and grouping

pub mod classifier;
pub mod grouping;
pub mod native;
pub mod office;
pub mod output;
pub mod pdf;
pub mod plain;
pub mod registry;
pub mod scanned;

use serde::Serialize;
use std::path::Path;

use crate::backend::OcrEngine;
use crate::error::{Error, Result};
use crate::types::{Element, FileMetadata};

pub use classifier::{classify_page, PageClass};
pub use grouping::{chunk_elements, group_elements};
pub use office::OfficeExtractor;
pub use output::save_elements;
pub use pdf::PdfExtractor;
pub use plain::PlainTextExtractor;
pub use registry::{DocumentExtractor, ExtractorRegistry};

/// Extracts elements from one document format
pub trait Extractor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Extract every element of the document at `path`
    fn extract(&self, path: &Path) -> Result<Extraction>;
}

/// Elements of one document plus what happened while producing them
#[derive(Debug, Default)]
pub struct Extraction {
    pub elements: Vec<Element>,
    pub report: ExtractionReport,
}

impl Extraction {
    pub fn new(elements: Vec<Element>) -> Self {
        let report = ExtractionReport {
            elements: elements.len(),
            ..Default::default()
        };
        Self { elements, report }
    }
}

/// Step of page recovery, attached to failures and log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    OpenPage,
    Words,
    Tables,
    Images,
    ImageOcr,
    Render,
    PageOcr,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenPage => "open_page",
            Self::Words => "words",
            Self::Tables => "tables",
            Self::Images => "images",
            Self::ImageOcr => "image_ocr",
            Self::Render => "render",
            Self::PageOcr => "page_ocr",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of recovery (one step, one image, one page's OCR) that failed
#[derive(Debug, thiserror::Error)]
#[error("page {page} {stage}: {source}")]
pub struct RecoveryError {
    pub page: u32,
    pub stage: Stage,
    #[source]
    pub source: Error,
}

impl RecoveryError {
    pub fn new(page: u32, stage: Stage, source: Error) -> Self {
        Self { page, stage, source }
    }
}

/// Result of one recovery unit
pub type UnitResult = std::result::Result<Vec<Element>, RecoveryError>;

/// Elements and failures collected for one page
#[derive(Debug)]
pub struct PageOutcome {
    pub page: u32,
    pub elements: Vec<Element>,
    pub failures: Vec<RecoveryError>,
}

impl PageOutcome {
    pub fn new(page: u32) -> Self {
        Self {
            page,
            elements: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Fold one unit into the page: keep its elements or record its failure
    pub fn absorb(&mut self, unit: UnitResult) {
        match unit {
            Ok(elements) => self.elements.extend(elements),
            Err(failure) => {
                tracing::warn!(
                    page = failure.page,
                    stage = failure.stage.as_str(),
                    error = %failure.source,
                    "Recovery step failed, continuing"
                );
                self.failures.push(failure);
            }
        }
    }
}

impl Extend<UnitResult> for PageOutcome {
    fn extend<T: IntoIterator<Item = UnitResult>>(&mut self, iter: T) {
        for unit in iter {
            self.absorb(unit);
        }
    }
}

/// Per-document counters; the hook for metrics
#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub pages_total: u32,
    pub pages_native: u32,
    pub pages_scanned: u32,
    /// Scanned pages whose OCR produced no text
    pub pages_empty_ocr: Vec<u32>,
    pub elements: usize,
    pub failures: Vec<RecoveryError>,
}

impl ExtractionReport {
    pub fn record(&mut self, failure: RecoveryError) {
        self.failures.push(failure);
    }

    /// Whether any unit of the document failed
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Shared inputs of the per-page recovery steps
pub struct RecoveryContext<'a> {
    pub ocr: &'a dyn OcrEngine,
    pub language: &'a str,
    pub render_scale: f32,
    pub file: &'a FileMetadata,
}
