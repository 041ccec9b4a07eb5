//! Size-bounded chunking of document sections
//!
//! Chunks never cross a section boundary. When the next block would push
//! a chunk over the size limit, the chunk is closed and the following one
//! is seeded with the tail of the closed chunk's last block.

use std::collections::{BTreeSet, HashMap};

use super::page_mapper::PageMap;
use crate::config::ChunkingConfig;
use crate::text::tail_chars;
use crate::types::{ChunkType, DocumentStructure, Section, StructuralChunk};

/// Blank line between the pieces of a chunk
const PIECE_SEPARATOR: &str = "\n\n";

/// Splits sections into structural chunks
#[derive(Debug, Clone)]
pub struct StructuralChunker {
    max_chars: usize,
    overlap: usize,
    preserve_hierarchy: bool,
}

impl Default for StructuralChunker {
    fn default() -> Self {
        Self::new(&ChunkingConfig::default())
    }
}

/// A chunk being accumulated
struct OpenChunk {
    pieces: Vec<String>,
    pages: BTreeSet<u32>,
    chars: usize,
    chunk_type: ChunkType,
    /// Whether `pieces` holds more than the overlap seed
    has_block: bool,
}

impl OpenChunk {
    fn empty() -> Self {
        Self {
            pieces: Vec::new(),
            pages: BTreeSet::new(),
            chars: 0,
            chunk_type: ChunkType::Text,
            has_block: false,
        }
    }

    fn seeded(seed: &str, page: u32, chunk_type: ChunkType) -> Self {
        let mut chunk = Self::empty();
        if !seed.is_empty() {
            chunk.pieces.push(seed.to_string());
            chunk.pages.insert(page);
            chunk.chars = seed.chars().count();
        }
        chunk.chunk_type = chunk_type;
        chunk
    }

    fn push(&mut self, content: &str, chars: usize, page: u32, chunk_type: ChunkType) {
        self.pieces.push(content.to_string());
        self.pages.insert(page);
        self.chars += chars;
        self.chunk_type = chunk_type;
        self.has_block = true;
    }
}

impl StructuralChunker {
    pub fn new(config: &ChunkingConfig) -> Self {
        Self {
            max_chars: config.chunk_max_char,
            overlap: config.chunk_overlap,
            preserve_hierarchy: config.preserve_hierarchy,
        }
    }

    pub fn with_limits(max_chars: usize, overlap: usize) -> Self {
        Self {
            max_chars,
            overlap,
            preserve_hierarchy: true,
        }
    }

    pub fn preserve_hierarchy(mut self, preserve: bool) -> Self {
        self.preserve_hierarchy = preserve;
        self
    }

    /// Chunk every section in document order
    pub fn chunk(&self, structure: &DocumentStructure, pages: &PageMap) -> Vec<StructuralChunk> {
        let chunks: Vec<StructuralChunk> = structure
            .sections
            .iter()
            .flat_map(|section| self.chunk_section(section, pages))
            .collect();
        tracing::debug!(
            sections = structure.sections.len(),
            chunks = chunks.len(),
            "Chunked document"
        );
        chunks
    }

    /// Chunk one section's blocks
    pub fn chunk_section(&self, section: &Section, pages: &PageMap) -> Vec<StructuralChunk> {
        let mut chunks = Vec::new();
        let mut open = OpenChunk::empty();
        // content and page of the last block added to `open`
        let mut last: Option<(&str, u32)> = None;

        for block in &section.blocks {
            if block.content.is_empty() {
                continue;
            }
            let page = pages.page_of(block.index);
            let chars = block.content.chars().count();

            if open.has_block && open.chars + chars > self.max_chars {
                let seed = match last {
                    Some((content, seed_page)) if self.overlap > 0 => {
                        OpenChunk::seeded(tail_chars(content, self.overlap), seed_page, open.chunk_type)
                    }
                    _ => OpenChunk::empty(),
                };
                let closed = std::mem::replace(&mut open, seed);
                chunks.push(self.finish(closed, section));
            }

            open.push(&block.content, chars, page, block.kind.into());
            last = Some((block.content.as_str(), page));
        }

        if open.has_block {
            chunks.push(self.finish(open, section));
        }
        chunks
    }

    fn finish(&self, chunk: OpenChunk, section: &Section) -> StructuralChunk {
        let header_hierarchy = if self.preserve_hierarchy {
            section.hierarchy.clone()
        } else {
            section.heading.iter().cloned().collect()
        };

        let mut metadata = HashMap::new();
        metadata.insert("total_blocks".to_string(), serde_json::json!(chunk.pieces.len()));

        StructuralChunk {
            content: chunk.pieces.join(PIECE_SEPARATOR),
            page_numbers: chunk.pages.into_iter().collect(),
            section: section.heading.clone(),
            section_level: section.level,
            chunk_type: chunk.chunk_type,
            header_hierarchy,
            metadata,
        }
    }
}
