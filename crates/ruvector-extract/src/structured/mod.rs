//! Structure-aware extraction
//!
//! A document is converted to markdown, the markdown is parsed into
//! headings and blocks, and the same markdown is rendered to PDF. The
//! rendered pages are then matched back against the blocks so every
//! structural chunk knows which pages it came from.

pub mod chunker;
pub mod markdown;
pub mod outline;
pub mod page_mapper;
pub mod pandoc;
pub mod pipeline;

use std::path::Path;

use crate::error::Result;
use crate::types::MarkupBlock;

pub use chunker::StructuralChunker;
pub use markdown::CommonMarkParser;
pub use outline::build_structure;
pub use page_mapper::{PageMap, PageMapper};
pub use pandoc::PandocAstParser;
pub use pipeline::{StructuredExtraction, StructuredPipeline};

/// Parses a markdown file into top-level blocks, in document order
pub trait MarkupParser: Send + Sync {
    fn name(&self) -> &'static str;

    fn parse(&self, markdown: &Path) -> Result<Vec<MarkupBlock>>;
}
