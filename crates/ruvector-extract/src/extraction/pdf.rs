//! Page-by-page PDF extraction

use std::path::Path;
use std::sync::Arc;

use super::classifier::{classify_page, PageClass};
use super::native::recover_native;
use super::scanned::recover_scanned;
use super::{Extraction, ExtractionReport, Extractor, RecoveryContext, RecoveryError, Stage};
use crate::backend::{PdfBackend, SharedOcr};
use crate::config::ExtractConfig;
use crate::error::Result;
use crate::types::FileMetadata;

/// Extracts elements from PDFs, classifying each page as native or scanned
pub struct PdfExtractor {
    backend: Arc<dyn PdfBackend>,
    ocr: SharedOcr,
    text_threshold: usize,
    language: String,
    render_scale: f32,
}

impl PdfExtractor {
    pub fn new(backend: Arc<dyn PdfBackend>, ocr: SharedOcr, config: &ExtractConfig) -> Self {
        Self {
            backend,
            ocr,
            text_threshold: config.classifier.text_threshold,
            language: config.ocr.language.clone(),
            render_scale: config.ocr.render_scale,
        }
    }

    /// Extract `path`, attributing elements to `file`. The PDF's own info
    /// dictionary only fills fields `file` leaves empty.
    pub fn extract_with_metadata(&self, path: &Path, file: FileMetadata) -> Result<Extraction> {
        self.run(path, file, false)
    }

    /// Opening the document is all-or-nothing. After that every page is
    /// independent: a failing page is recorded in the report and the pages
    /// before and after it are kept.
    fn run(&self, path: &Path, file: FileMetadata, prefer_document_info: bool) -> Result<Extraction> {
        let span = tracing::info_span!("document", document = %path.display());
        let _enter = span.enter();

        let mut doc = self.backend.open(path)?;
        let file = if prefer_document_info {
            doc.metadata().merged_with(file)
        } else {
            file.merged_with(doc.metadata())
        };
        let page_count = doc.page_count();

        let ctx = RecoveryContext {
            ocr: self.ocr.as_ref(),
            language: &self.language,
            render_scale: self.render_scale,
            file: &file,
        };

        let mut report = ExtractionReport {
            pages_total: page_count,
            ..Default::default()
        };
        let mut elements = Vec::new();

        for number in 1..=page_count {
            let span = tracing::debug_span!("page", page = number);
            let _enter = span.enter();

            let page = match doc.page(number) {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(page = number, stage = Stage::OpenPage.as_str(), error = %e, "Skipping page");
                    report.record(RecoveryError::new(number, Stage::OpenPage, e));
                    continue;
                }
            };

            // Unreadable text falls through to OCR
            let text = match page.text() {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(page = number, stage = Stage::Words.as_str(), error = %e, "No text layer, trying OCR");
                    report.record(RecoveryError::new(number, Stage::Words, e));
                    String::new()
                }
            };

            match classify_page(&text, self.text_threshold) {
                PageClass::Native => {
                    report.pages_native += 1;
                    let outcome = recover_native(page.as_ref(), &ctx);
                    elements.extend(outcome.elements);
                    report.failures.extend(outcome.failures);
                }
                PageClass::Scanned => {
                    report.pages_scanned += 1;
                    match recover_scanned(page.as_ref(), &ctx) {
                        Ok(Some(element)) => elements.push(element),
                        Ok(None) => {
                            tracing::warn!(page = number, "OCR found no text on scanned page");
                            report.pages_empty_ocr.push(number);
                        }
                        Err(failure) => {
                            tracing::warn!(
                                page = number,
                                stage = failure.stage.as_str(),
                                error = %failure.source,
                                "Scanned page recovery failed"
                            );
                            report.record(failure);
                        }
                    }
                }
            }
        }

        report.elements = elements.len();
        tracing::info!(
            "[{}] Extracted {} elements from {} pages ({} native, {} scanned, {} failures)",
            file.file_name.as_deref().unwrap_or("document"),
            report.elements,
            report.pages_total,
            report.pages_native,
            report.pages_scanned,
            report.failures.len()
        );

        Ok(Extraction { elements, report })
    }
}

impl Extractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn extract(&self, path: &Path) -> Result<Extraction> {
        self.run(path, FileMetadata::from_path(path), true)
    }
}
