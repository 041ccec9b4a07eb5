//! Extension-to-extractor registry and the document-level facade

use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::grouping::group_elements;
use super::office::OfficeExtractor;
use super::pdf::PdfExtractor;
use super::plain::PlainTextExtractor;
use super::{Extraction, Extractor};
use crate::backend::{PdfBackend, PopplerBackend, SharedOcr, TesseractOcr};
use crate::config::{ExtractConfig, GroupingConfig};
use crate::convert::{LibreOfficeConverter, PdfConverter};
use crate::error::{Error, Result};
use crate::types::{Element, FileType};

/// Maps lowercase file extensions to extractors
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: HashMap<String, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry covering every supported format with the given capabilities
    pub fn with_backends(
        backend: Arc<dyn PdfBackend>,
        ocr: SharedOcr,
        converter: Arc<dyn PdfConverter>,
        config: &ExtractConfig,
    ) -> Self {
        let pdf = Arc::new(PdfExtractor::new(backend, ocr, config));
        let office: Arc<dyn Extractor> = Arc::new(OfficeExtractor::new(converter, pdf.clone()));
        let plain: Arc<dyn Extractor> = Arc::new(PlainTextExtractor::new());

        let mut registry = Self::new();
        registry.register_type(FileType::Pdf, pdf);
        for file_type in [FileType::Docx, FileType::Doc, FileType::Odt] {
            registry.register_type(file_type, office.clone());
        }
        for file_type in [FileType::Txt, FileType::Markdown] {
            registry.register_type(file_type, plain.clone());
        }
        registry
    }

    /// Register `extractor` for one extension, replacing any previous one
    pub fn register(&mut self, extension: &str, extractor: Arc<dyn Extractor>) {
        self.extractors
            .insert(extension.trim_start_matches('.').to_lowercase(), extractor);
    }

    /// Register `extractor` for every extension of `file_type`
    pub fn register_type(&mut self, file_type: FileType, extractor: Arc<dyn Extractor>) {
        for ext in file_type.extensions() {
            self.register(ext, extractor.clone());
        }
    }

    /// Extractor for `path`'s extension
    pub fn get(&self, path: &Path) -> Option<Arc<dyn Extractor>> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.extractors.get(&ext).cloned()
    }

    /// Registered extensions, sorted
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.extractors.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }
}

/// Entry point: any supported document in, elements out
#[derive(Clone)]
pub struct DocumentExtractor {
    registry: ExtractorRegistry,
    grouping: GroupingConfig,
}

impl DocumentExtractor {
    /// Extractor wired to poppler-utils, tesseract and LibreOffice
    pub fn new(config: &ExtractConfig) -> Self {
        let backend: Arc<dyn PdfBackend> = Arc::new(PopplerBackend::new(config.tools.clone()));
        let ocr: SharedOcr = Arc::new(TesseractOcr::new(&config.tools, &config.ocr));
        let converter: Arc<dyn PdfConverter> = Arc::new(LibreOfficeConverter::new(&config.tools));

        Self::with_registry(
            ExtractorRegistry::with_backends(backend, ocr, converter, config),
            config.grouping.clone(),
        )
    }

    pub fn with_registry(registry: ExtractorRegistry, grouping: GroupingConfig) -> Self {
        Self { registry, grouping }
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Extract one document, surfacing every failure
    pub fn try_extract(&self, path: &Path) -> Result<Extraction> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let file_type = FileType::from_path(path);
        let extractor = match self.registry.get(path) {
            Some(extractor) if file_type.is_supported() => extractor,
            _ => {
                let ext = path
                    .extension()
                    .map(|e| e.to_string_lossy().to_string())
                    .unwrap_or_default();
                return Err(Error::UnsupportedFileType(ext));
            }
        };

        tracing::debug!(document = %path.display(), extractor = extractor.name(), "Extracting");
        let mut extraction = extractor.extract(path)?;

        if self.grouping.enabled {
            extraction.elements =
                group_elements(&extraction.elements, self.grouping.index_label.as_deref());
            extraction.report.elements = extraction.elements.len();
        }

        Ok(extraction)
    }

    /// Extract one document. Never fails: unsupported formats and broken
    /// documents are logged and yield no elements.
    pub fn extract(&self, path: &Path) -> Vec<Element> {
        match self.try_extract(path) {
            Ok(extraction) => extraction.elements,
            Err(e) if e.is_unsupported() => {
                tracing::warn!(
                    "[{}] Skipping: {}. Supported: {}",
                    path.display(),
                    e,
                    self.registry.extensions().join(", ")
                );
                Vec::new()
            }
            Err(e) => {
                tracing::error!("[{}] Extraction failed: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    /// Extract many documents in parallel; one document's failure never
    /// affects another. Results are in input order.
    pub fn extract_batch(&self, paths: &[PathBuf]) -> Vec<(PathBuf, Vec<Element>)> {
        paths
            .par_iter()
            .map(|path| (path.clone(), self.extract(path)))
            .collect()
    }
}
