//! Core types for document extraction

pub mod element;
pub mod file;
pub mod structure;

pub use element::{
    BBox, ChunkMetadata, Element, ElementKind, ElementType, FileMetadata, ImageMetadata, Source,
    TableMetadata, TextMetadata,
};
pub use file::FileType;
pub use structure::{
    BlockKind, ChunkType, DocumentStructure, Heading, MarkupBlock, Section, StructuralBlock,
    StructuralChunk,
};
