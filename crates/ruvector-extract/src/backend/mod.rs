//! Capability interfaces consumed by the extraction core
//!
//! The core never talks to a PDF library or OCR engine directly. It goes
//! through these traits so each backend can be swapped independently:
//!
//! - [`PdfBackend`] opens documents, [`PdfDocument`] hands out one page at a time
//! - [`PdfPage`] exposes words, tables, embedded images and rasterization
//! - [`OcrEngine`] turns a bitmap into text

pub mod poppler;
pub mod table_finder;
pub mod tesseract;
pub mod tools;

use image::DynamicImage;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{BBox, FileMetadata};

pub use poppler::PopplerBackend;
pub use tesseract::TesseractOcr;
pub use tools::{ToolRunner, Tooling};

/// A positioned word on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl Word {
    pub fn new(text: impl Into<String>, x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self {
            text: text.into(),
            x0,
            top,
            x1,
            bottom,
        }
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(self.x0, self.top, self.x1, self.bottom)
    }
}

/// A detected table; `None` cells are empty
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableGrid {
    pub rows: Vec<Vec<Option<String>>>,
    pub bbox: Option<BBox>,
}

impl TableGrid {
    pub fn new(rows: Vec<Vec<Option<String>>>) -> Self {
        Self { rows, bbox: None }
    }

    pub fn with_bbox(mut self, bbox: BBox) -> Self {
        self.bbox = Some(bbox);
        self
    }
}

/// Raw image object placed on a page
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    /// Encoding of `data` as stored in the document (png, jpg, ...)
    pub format: String,
    pub data: Vec<u8>,
}

impl EmbeddedImage {
    pub fn decode(&self) -> Result<DynamicImage> {
        Ok(image::load_from_memory(&self.data)?)
    }
}

/// Opens PDF documents
pub trait PdfBackend: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>>;
}

/// An open PDF document; dropping it releases the handle
pub trait PdfDocument {
    fn page_count(&self) -> u32;

    /// Author and creation date from the document info, when present
    fn metadata(&self) -> FileMetadata {
        FileMetadata::default()
    }

    /// Borrow page `number` (1-based). Only one page is held at a time.
    fn page(&mut self, number: u32) -> Result<Box<dyn PdfPage + '_>>;

    /// Plain text of every page, in page order
    fn page_texts(&mut self) -> Result<Vec<String>> {
        let count = self.page_count();
        let mut texts = Vec::with_capacity(count as usize);
        for number in 1..=count {
            texts.push(self.page(number)?.text()?);
        }
        Ok(texts)
    }
}

/// One page of an open document
pub trait PdfPage {
    fn number(&self) -> u32;

    fn words(&self) -> Result<Vec<Word>>;

    /// Machine-readable text of the page
    fn text(&self) -> Result<String> {
        let words = self.words()?;
        Ok(words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" "))
    }

    fn tables(&self) -> Result<Vec<TableGrid>>;

    fn images(&self) -> Result<Vec<EmbeddedImage>>;

    /// Rasterize the page; `scale` 1.0 is 72 DPI
    fn render(&self, scale: f32) -> Result<DynamicImage>;
}

/// Optical character recognition
pub trait OcrEngine {
    /// Recognize text in `image`. An empty string is a valid answer.
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String>;
}

/// OCR engine shareable across threads
pub type SharedOcr = Arc<dyn OcrEngine + Send + Sync>;

/// Serializes access to an engine that is not reentrant
pub struct ExclusiveOcr<E> {
    inner: Mutex<E>,
}

impl<E: OcrEngine> ExclusiveOcr<E> {
    pub fn new(engine: E) -> Self {
        Self {
            inner: Mutex::new(engine),
        }
    }
}

impl<E: OcrEngine + Send> OcrEngine for ExclusiveOcr<E> {
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String> {
        self.inner.lock().recognize(image, language)
    }
}
