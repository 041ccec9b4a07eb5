//! Source file types and format detection

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Old Microsoft Word document (.doc) - requires LibreOffice
    Doc,
    /// OpenDocument Text
    Odt,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "doc" => Self::Doc,
            "odt" => Self::Odt,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a path's extension
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Formats that go through the document-to-PDF converter before extraction
    pub fn requires_pdf_conversion(&self) -> bool {
        matches!(self, Self::Docx | Self::Doc | Self::Odt)
    }

    /// Formats read directly as text
    pub fn is_plain_text(&self) -> bool {
        matches!(self, Self::Txt | Self::Markdown)
    }

    /// Canonical extension, used as the `file_format` metadata value
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Doc => "doc",
            Self::Odt => "odt",
            Self::Txt => "txt",
            Self::Markdown => "md",
            Self::Unknown => "",
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word Document (.docx)",
            Self::Doc => "Word Document (.doc)",
            Self::Odt => "OpenDocument Text",
            Self::Txt => "Text File",
            Self::Markdown => "Markdown",
            Self::Unknown => "Unknown",
        }
    }

    /// Extensions accepted for this type
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Pdf => &["pdf"],
            Self::Docx => &["docx"],
            Self::Doc => &["doc"],
            Self::Odt => &["odt"],
            Self::Txt => &["txt", "text"],
            Self::Markdown => &["md", "markdown"],
            Self::Unknown => &[],
        }
    }

    /// All supported types
    pub fn supported() -> [FileType; 6] {
        [
            Self::Pdf,
            Self::Docx,
            Self::Doc,
            Self::Odt,
            Self::Txt,
            Self::Markdown,
        ]
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
