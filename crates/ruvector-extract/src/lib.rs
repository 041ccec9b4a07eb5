//! ruvector-extract: document element extraction with per-page OCR fallback
//!
//! PDFs are processed page by page: pages with enough machine-readable text
//! yield text lines, tables and OCR'd embedded images, while scanned pages
//! are rasterized and OCR'd whole. Office documents are converted to PDF
//! first; plain text and markdown are read directly. A second,
//! structure-aware pipeline turns documents into heading-aware chunks that
//! carry the page numbers they came from.
//!
//! PDF parsing, OCR and format conversion sit behind traits in [`backend`]
//! and [`convert`], with implementations driving poppler-utils, tesseract,
//! pandoc and LibreOffice.

pub mod backend;
pub mod config;
pub mod convert;
pub mod error;
pub mod extraction;
pub mod structured;
pub mod text;
pub mod types;

pub use config::ExtractConfig;
pub use error::{Error, Result};
pub use extraction::{DocumentExtractor, Extraction, ExtractionReport, Extractor, ExtractorRegistry};
pub use structured::{StructuredExtraction, StructuredPipeline};
pub use types::{
    element::{Element, ElementKind, ElementType, FileMetadata, Source},
    file::FileType,
    structure::{ChunkType, StructuralChunk},
};
