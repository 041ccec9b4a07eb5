//! Configuration for document extraction

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main extraction configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Native/scanned page decision
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// OCR engine settings
    #[serde(default)]
    pub ocr: OcrConfig,
    /// Structural chunking
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Element grouping
    #[serde(default)]
    pub grouping: GroupingConfig,
    /// External tool names and limits
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Structure-aware pipeline
    #[serde(default)]
    pub structured: StructuredConfig,
    /// Persisted output
    #[serde(default)]
    pub output: OutputConfig,
}

impl ExtractConfig {
    /// Load configuration from a TOML file and validate it
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_toml(&raw)
    }

    /// Parse configuration from TOML text and validate it
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no extraction run could honor
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_max_char == 0 {
            return Err(Error::Config("chunking.chunk_max_char must be greater than 0".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_max_char {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_max_char ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_max_char
            )));
        }
        if !self.ocr.render_scale.is_finite() || self.ocr.render_scale <= 0.0 {
            return Err(Error::Config(format!(
                "ocr.render_scale must be a positive number, got {}",
                self.ocr.render_scale
            )));
        }
        if self.ocr.language.trim().is_empty() {
            return Err(Error::Config("ocr.language must not be empty".to_string()));
        }
        if self.tools.timeout_secs == 0 {
            return Err(Error::Config("tools.timeout_secs must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// Page classification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Minimum stripped text length for a page to count as native (default: 20)
    #[serde(default = "default_text_threshold")]
    pub text_threshold: usize,
}

fn default_text_threshold() -> usize { 20 }

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            text_threshold: default_text_threshold(),
        }
    }
}

/// OCR configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Tesseract language code (default: "eng")
    #[serde(default = "default_language")]
    pub language: String,
    /// Rasterization scale for scanned pages, 1.0 = 72 DPI (default: 4.0 = 288 DPI)
    #[serde(default = "default_render_scale")]
    pub render_scale: f32,
    /// Tesseract page segmentation mode (default: 3, fully automatic)
    #[serde(default = "default_psm")]
    pub page_segmentation_mode: u8,
}

fn default_language() -> String { "eng".to_string() }
fn default_render_scale() -> f32 { 4.0 }
fn default_psm() -> u8 { 3 }

impl OcrConfig {
    /// Rendering resolution implied by `render_scale`
    pub fn dpi(&self) -> u32 {
        (72.0 * self.render_scale).round() as u32
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            render_scale: default_render_scale(),
            page_segmentation_mode: default_psm(),
        }
    }
}

/// Structural chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk before the overlap seed (default: 1000)
    #[serde(default = "default_chunk_max_char")]
    pub chunk_max_char: usize,
    /// Characters carried over from the previous chunk's last block (default: 100)
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Keep the full heading path on each chunk (default: true)
    #[serde(default = "default_preserve_hierarchy")]
    pub preserve_hierarchy: bool,
}

fn default_chunk_max_char() -> usize { 1000 }
fn default_chunk_overlap() -> usize { 100 }
fn default_preserve_hierarchy() -> bool { true }

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_max_char: default_chunk_max_char(),
            chunk_overlap: default_chunk_overlap(),
            preserve_hierarchy: default_preserve_hierarchy(),
        }
    }
}

/// Element grouping configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Merge same-index elements after extraction (default: false)
    #[serde(default)]
    pub enabled: bool,
    /// Label prefixed to each group, e.g. "PAGE"
    #[serde(default)]
    pub index_label: Option<String>,
}

/// External tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_pdftotext")]
    pub pdftotext: String,
    #[serde(default = "default_pdftoppm")]
    pub pdftoppm: String,
    #[serde(default = "default_pdfimages")]
    pub pdfimages: String,
    #[serde(default = "default_tesseract")]
    pub tesseract: String,
    #[serde(default = "default_pandoc")]
    pub pandoc: String,
    /// LibreOffice binary (default: "soffice")
    #[serde(default = "default_soffice")]
    pub soffice: String,
    /// Per-invocation timeout in seconds (default: 120)
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

fn default_pdftotext() -> String { "pdftotext".to_string() }
fn default_pdftoppm() -> String { "pdftoppm".to_string() }
fn default_pdfimages() -> String { "pdfimages".to_string() }
fn default_tesseract() -> String { "tesseract".to_string() }
fn default_pandoc() -> String { "pandoc".to_string() }
fn default_soffice() -> String { "soffice".to_string() }
fn default_tool_timeout() -> u64 { 120 }

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            pdftotext: default_pdftotext(),
            pdftoppm: default_pdftoppm(),
            pdfimages: default_pdfimages(),
            tesseract: default_tesseract(),
            pandoc: default_pandoc(),
            soffice: default_soffice(),
            timeout_secs: default_tool_timeout(),
        }
    }
}

/// Structure-aware pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredConfig {
    /// Where intermediate markdown and PDF artifacts are written
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// How the intermediate markdown is parsed
    #[serde(default)]
    pub parser: MarkupParserKind,
}

/// Markdown parser used by the structure-aware pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupParserKind {
    /// `pandoc -t json`
    #[default]
    Pandoc,
    /// In-process pulldown-cmark
    Commonmark,
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("ruvector-extract")
}

impl Default for StructuredConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            parser: MarkupParserKind::default(),
        }
    }
}

/// Persisted element format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Raw content only
    #[default]
    Text,
    /// Content plus metadata as JSON
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(Error::Config(format!("Unknown output format: {}", other))),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}
