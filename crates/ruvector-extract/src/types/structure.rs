//! Document structure types: markup blocks, sections and structural chunks

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A block of the intermediate markup, in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkupBlock {
    Heading { level: u8, text: String },
    Paragraph { text: String },
    Code { language: Option<String>, text: String },
    List { ordered: bool, items: Vec<String> },
    Table { content: String },
}

/// Kind of a content block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Paragraph,
    Code,
    List,
    Table,
}

/// Type of a structural chunk, taken from its last block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    Text,
    Code,
    List,
    Table,
}

impl From<BlockKind> for ChunkType {
    fn from(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Paragraph => ChunkType::Text,
            BlockKind::Code => ChunkType::Code,
            BlockKind::List => ChunkType::List,
            BlockKind::Table => ChunkType::Table,
        }
    }
}

/// A non-heading block with its position in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralBlock {
    /// Position among all markup blocks, headings included
    pub index: usize,
    pub kind: BlockKind,
    pub content: String,
    pub language: Option<String>,
}

/// A heading with the titles of its enclosing headings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub index: usize,
    pub level: u8,
    pub text: String,
    /// Ancestor titles from outermost to innermost, ending with this heading
    pub hierarchy: Vec<String>,
}

/// Content between one heading and the next.
///
/// The leading section holding blocks before the first heading has no
/// heading and no level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: Option<String>,
    pub level: Option<u8>,
    pub hierarchy: Vec<String>,
    /// Markup index of the heading, or of the first block for the leading section
    pub start_index: usize,
    pub blocks: Vec<StructuralBlock>,
}

impl Section {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Parsed outline of a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStructure {
    pub blocks: Vec<StructuralBlock>,
    pub headings: Vec<Heading>,
    pub sections: Vec<Section>,
}

impl DocumentStructure {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.headings.is_empty()
    }
}

/// A size-bounded chunk that never crosses a section boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralChunk {
    pub content: String,
    /// Sorted, de-duplicated 1-based pages the chunk's blocks fall on
    pub page_numbers: Vec<u32>,
    pub section: Option<String>,
    pub section_level: Option<u8>,
    pub chunk_type: ChunkType,
    pub header_hierarchy: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl StructuralChunk {
    /// Number of blocks recorded for the chunk, when present
    pub fn total_blocks(&self) -> Option<u64> {
        self.metadata.get("total_blocks").and_then(|v| v.as_u64())
    }
}
