//! Error types for document extraction

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, Error>;

/// Extraction errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source file does not exist or cannot be opened
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Unsupported file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// External tool is not installed
    #[error("External tool not available: {tool}")]
    ToolUnavailable { tool: String },

    /// External tool ran but failed
    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    /// External tool exceeded its time budget
    #[error("{tool} timed out after {secs}s")]
    ToolTimeout { tool: String, secs: u64 },

    /// PDF structure error
    #[error("PDF error: {0}")]
    Pdf(String),

    /// OCR engine error
    #[error("OCR error: {0}")]
    Ocr(String),

    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a tool failure error
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a PDF error
    pub fn pdf(message: impl Into<String>) -> Self {
        Self::Pdf(message.into())
    }

    /// Create an OCR error
    pub fn ocr(message: impl Into<String>) -> Self {
        Self::Ocr(message.into())
    }

    /// Whether this error only means "nothing to extract" rather than a failure
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedFileType(_))
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Pdf(err.to_string())
    }
}
