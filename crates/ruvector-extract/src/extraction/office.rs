//! Office documents (DOCX, DOC, ODT) via conversion to PDF

use std::path::Path;
use std::sync::Arc;

use super::pdf::PdfExtractor;
use super::{Extraction, Extractor};
use crate::convert::PdfConverter;
use crate::error::{Error, Result};
use crate::types::FileMetadata;

/// Converts the document to a temporary PDF, then extracts that PDF page by
/// page. Elements keep the metadata of the original file.
pub struct OfficeExtractor {
    converter: Arc<dyn PdfConverter>,
    pdf: Arc<PdfExtractor>,
}

impl OfficeExtractor {
    pub fn new(converter: Arc<dyn PdfConverter>, pdf: Arc<PdfExtractor>) -> Self {
        Self { converter, pdf }
    }
}

impl Extractor for OfficeExtractor {
    fn name(&self) -> &'static str {
        "office"
    }

    fn extract(&self, path: &Path) -> Result<Extraction> {
        if !path.is_file() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let dir = tempfile::Builder::new().prefix("ruvector-office-").tempdir()?;
        let pdf_path = self.converter.convert(path, dir.path())?;

        self.pdf
            .extract_with_metadata(&pdf_path, FileMetadata::from_path(path))
    }
}
