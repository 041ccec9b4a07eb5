//! Structure-aware extraction pipeline
//!
//! document -> markdown -> blocks -> outline, and markdown -> PDF -> page
//! texts -> page map; the chunker joins both halves.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::chunker::StructuralChunker;
use super::markdown::CommonMarkParser;
use super::outline::build_structure;
use super::page_mapper::{PageMap, PageMapper};
use super::pandoc::PandocAstParser;
use super::MarkupParser;
use crate::backend::{PdfBackend, PopplerBackend};
use crate::config::{ExtractConfig, MarkupParserKind};
use crate::convert::{MarkdownConverter, MarkdownExporter, MarkdownRenderer, PdfConverter};
use crate::error::Result;
use crate::types::{DocumentStructure, FileType, StructuralChunk};

/// Chunks plus the intermediate artifacts that were produced.
///
/// A failed stage leaves `chunks` empty and keeps the paths of the
/// artifacts written before it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredExtraction {
    pub chunks: Vec<StructuralChunk>,
    pub markdown_path: Option<PathBuf>,
    pub pdf_path: Option<PathBuf>,
}

impl StructuredExtraction {
    fn aborted(markdown_path: Option<PathBuf>) -> Self {
        Self {
            markdown_path,
            ..Self::default()
        }
    }
}

/// Orchestrates conversion, parsing, rendering, page mapping and chunking
pub struct StructuredPipeline {
    markdown: Arc<dyn MarkdownConverter>,
    parser: Arc<dyn MarkupParser>,
    renderer: Arc<dyn PdfConverter>,
    pdf: Arc<dyn PdfBackend>,
    chunker: StructuralChunker,
    cache_dir: PathBuf,
}

impl StructuredPipeline {
    /// Pipeline wired to pandoc, xelatex and poppler-utils
    pub fn new(config: &ExtractConfig) -> Self {
        let pdf: Arc<dyn PdfBackend> = Arc::new(PopplerBackend::new(config.tools.clone()));
        let parser: Arc<dyn MarkupParser> = match config.structured.parser {
            MarkupParserKind::Pandoc => Arc::new(PandocAstParser::new(&config.tools)),
            MarkupParserKind::Commonmark => Arc::new(CommonMarkParser::new()),
        };

        Self {
            markdown: Arc::new(MarkdownExporter::new(&config.tools, pdf.clone())),
            parser,
            renderer: Arc::new(MarkdownRenderer::new(&config.tools)),
            pdf,
            chunker: StructuralChunker::new(&config.chunking),
            cache_dir: config.structured.cache_dir.clone(),
        }
    }

    pub fn with_components(
        markdown: Arc<dyn MarkdownConverter>,
        parser: Arc<dyn MarkupParser>,
        renderer: Arc<dyn PdfConverter>,
        pdf: Arc<dyn PdfBackend>,
        chunker: StructuralChunker,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            markdown,
            parser,
            renderer,
            pdf,
            chunker,
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Run the pipeline on one document. Never fails: a failing stage is
    /// logged and the partial artifact paths are returned.
    pub fn extract(&self, path: &Path) -> StructuredExtraction {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let _span = tracing::info_span!("structured", document = %name).entered();

        if !path.exists() {
            tracing::error!("[{}] File not found", path.display());
            return StructuredExtraction::default();
        }
        if !FileType::from_path(path).is_supported() {
            tracing::warn!("[{}] Skipping: unsupported file type", name);
            return StructuredExtraction::default();
        }

        tracing::info!("[{}] Converting to markdown", name);
        let markdown_path = match self.markdown.convert(path, &self.cache_dir) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("[{}] Markdown conversion failed: {}", name, e);
                return StructuredExtraction::default();
            }
        };

        let structure = match self.parser.parse(&markdown_path) {
            Ok(blocks) => build_structure(&blocks),
            Err(e) => {
                tracing::error!("[{}] {} parsing failed: {}", name, self.parser.name(), e);
                return StructuredExtraction::aborted(Some(markdown_path));
            }
        };
        tracing::debug!(
            blocks = structure.blocks.len(),
            headings = structure.headings.len(),
            sections = structure.sections.len(),
            "Extracted structure"
        );

        tracing::info!("[{}] Rendering markdown to PDF", name);
        let pdf_path = match self.renderer.convert(&markdown_path, &self.cache_dir) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("[{}] PDF rendering failed: {}", name, e);
                return StructuredExtraction::aborted(Some(markdown_path));
            }
        };

        let pages = self.map_pages(&structure, &pdf_path);
        let chunks = self.chunker.chunk(&structure, &pages);
        tracing::info!("[{}] Generated {} structural chunks", name, chunks.len());

        StructuredExtraction {
            chunks,
            markdown_path: Some(markdown_path),
            pdf_path: Some(pdf_path),
        }
    }

    /// Page map against the rendered PDF; every block lands on page 1 when
    /// the PDF cannot be read
    fn map_pages(&self, structure: &DocumentStructure, pdf_path: &Path) -> PageMap {
        match self.page_texts(pdf_path) {
            Ok(texts) => PageMapper::new(&texts).map_structure(structure),
            Err(e) => {
                tracing::warn!("[{}] Page text unavailable, assuming page 1: {}", pdf_path.display(), e);
                PageMap::uniform(structure)
            }
        }
    }

    fn page_texts(&self, pdf_path: &Path) -> Result<Vec<String>> {
        let mut doc = self.pdf.open(pdf_path)?;
        doc.page_texts()
    }
}
