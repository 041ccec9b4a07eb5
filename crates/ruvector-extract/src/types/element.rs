//! Extracted content elements with provenance tracking

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::file::FileType;
use crate::text::normalize_content;

/// Axis-aligned bounding box in page coordinates (points, origin top-left)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BBox {
    /// Create a bounding box
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Union of a sequence of boxes, `None` when empty
    pub fn union_all<'a>(boxes: impl IntoIterator<Item = &'a BBox>) -> Option<BBox> {
        boxes.into_iter().fold(None, |acc: Option<BBox>, b| match acc {
            Some(a) => Some(a.union(b)),
            None => Some(*b),
        })
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

/// How the content was obtained
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Read directly from the document's internal representation
    Native,
    /// Recovered with optical character recognition
    Ocr,
    /// Produced or transformed by a language model
    Llm,
    /// Concatenated from several other elements
    Aggregated,
}

/// Origin file information (all optional)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub file_name: Option<String>,
    pub file_format: Option<String>,
    pub file_date: Option<String>,
    pub file_author: Option<String>,
}

impl FileMetadata {
    /// Name, format and modification date from the filesystem
    pub fn from_path(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string());
        let file_format = match FileType::from_path(path) {
            FileType::Unknown => path
                .extension()
                .map(|ext| ext.to_string_lossy().to_lowercase()),
            known => Some(known.extension().to_string()),
        };
        let file_date = std::fs::metadata(path)
            .and_then(|meta| meta.modified())
            .ok()
            .map(|modified| chrono::DateTime::<chrono::Utc>::from(modified).to_rfc3339());

        Self {
            file_name,
            file_format,
            file_date,
            file_author: None,
        }
    }

    /// Fill missing fields from another source, keeping fields already set
    pub fn merged_with(mut self, other: FileMetadata) -> Self {
        self.file_name = self.file_name.or(other.file_name);
        self.file_format = self.file_format.or(other.file_format);
        self.file_author = self.file_author.or(other.file_author);
        self.file_date = self.file_date.or(other.file_date);
        self
    }
}

/// Metadata for native text elements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextMetadata {
    pub bbox: Option<BBox>,
    pub ocr_lang: Option<String>,
    pub ocr_dpi: Option<u32>,
}

/// Metadata for table elements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub columns: Vec<String>,
    pub bbox: Option<BBox>,
}

/// Metadata for text recognized in images
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub ocr_lang: Option<String>,
    pub image_format: Option<String>,
    pub image_dims: Option<(u32, u32)>,
}

/// Metadata for aggregated chunks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub ocr_lang: Option<String>,
}

/// Element type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Text,
    Table,
    Image,
    Chunk,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Table => "table",
            Self::Image => "image",
            Self::Chunk => "chunk",
        }
    }
}

/// Type-specific part of an element; the variant is the element's `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "metadata", rename_all = "lowercase")]
pub enum ElementKind {
    Text(TextMetadata),
    Table(TableMetadata),
    Image(ImageMetadata),
    Chunk(ChunkMetadata),
}

impl ElementKind {
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Text(_) => ElementType::Text,
            Self::Table(_) => ElementType::Table,
            Self::Image(_) => ElementType::Image,
            Self::Chunk(_) => ElementType::Chunk,
        }
    }

    /// OCR language recorded in the metadata, if any
    pub fn ocr_lang(&self) -> Option<&str> {
        match self {
            Self::Text(meta) => meta.ocr_lang.as_deref(),
            Self::Image(meta) => meta.ocr_lang.as_deref(),
            Self::Chunk(meta) => meta.ocr_lang.as_deref(),
            Self::Table(_) => None,
        }
    }
}

/// One typed, provenance-tagged unit of extracted content.
///
/// Elements are immutable: content is normalized once at construction and
/// candidates whose content is blank are never built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ElementRecord")]
pub struct Element {
    content: String,
    source: Source,
    index: u32,
    file: FileMetadata,
    #[serde(flatten)]
    kind: ElementKind,
}

impl Element {
    /// Build an element, normalizing its content. Returns `None` for blank content.
    pub fn new(
        content: impl AsRef<str>,
        source: Source,
        index: u32,
        file: FileMetadata,
        kind: ElementKind,
    ) -> Option<Self> {
        Self::assemble(normalize_content(content.as_ref()), source, index, file, kind)
    }

    /// Build from content that is already normalized
    pub(crate) fn assemble(
        content: String,
        source: Source,
        index: u32,
        file: FileMetadata,
        kind: ElementKind,
    ) -> Option<Self> {
        if content.trim().is_empty() {
            return None;
        }
        Some(Self {
            content,
            source,
            index,
            file,
            kind,
        })
    }

    /// Text element
    pub fn text(
        content: impl AsRef<str>,
        source: Source,
        index: u32,
        file: FileMetadata,
        metadata: TextMetadata,
    ) -> Option<Self> {
        Self::new(content, source, index, file, ElementKind::Text(metadata))
    }

    /// Table element
    pub fn table(
        content: impl AsRef<str>,
        source: Source,
        index: u32,
        file: FileMetadata,
        metadata: TableMetadata,
    ) -> Option<Self> {
        Self::new(content, source, index, file, ElementKind::Table(metadata))
    }

    /// Image element; image text always comes from OCR
    pub fn image(
        content: impl AsRef<str>,
        index: u32,
        file: FileMetadata,
        metadata: ImageMetadata,
    ) -> Option<Self> {
        Self::new(content, Source::Ocr, index, file, ElementKind::Image(metadata))
    }

    /// Chunk element; chunks are always aggregated
    pub fn chunk(
        content: impl AsRef<str>,
        index: u32,
        file: FileMetadata,
        metadata: ChunkMetadata,
    ) -> Option<Self> {
        Self::new(content, Source::Aggregated, index, file, ElementKind::Chunk(metadata))
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn file(&self) -> &FileMetadata {
        &self.file
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }
}

/// Unvalidated wire shape of an element
#[derive(Deserialize)]
struct ElementRecord {
    content: String,
    source: Source,
    index: u32,
    #[serde(default)]
    file: FileMetadata,
    #[serde(flatten)]
    kind: ElementKind,
}

impl TryFrom<ElementRecord> for Element {
    type Error = String;

    fn try_from(record: ElementRecord) -> std::result::Result<Self, Self::Error> {
        Element::new(record.content, record.source, record.index, record.file, record.kind)
            .ok_or_else(|| "element content must not be empty".to_string())
    }
}
