//! External format conversion: office documents to PDF, anything to
//! markdown, markdown to PDF
//!
//! Conversions are all-or-nothing: they either produce the output file or
//! fail, never a partial document.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backend::{PdfBackend, ToolRunner};
use crate::config::ToolsConfig;
use crate::error::{Error, Result};
use crate::extraction::native::lines_from_words;
use crate::types::FileType;

/// Converts a document into a PDF inside `out_dir`
pub trait PdfConverter: Send + Sync {
    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf>;
}

/// Converts a document into markdown inside `out_dir`
pub trait MarkdownConverter: Send + Sync {
    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf>;
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string())
}

fn ensure_output(tool: &str, path: PathBuf) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(Error::tool(
            tool,
            format!("expected output {} was not created", path.display()),
        ))
    }
}

/// Office documents to PDF with headless LibreOffice
#[derive(Debug, Clone)]
pub struct LibreOfficeConverter {
    binary: String,
    runner: ToolRunner,
}

impl LibreOfficeConverter {
    pub fn new(tools: &ToolsConfig) -> Self {
        Self {
            binary: tools.soffice.clone(),
            runner: ToolRunner::from_config(tools),
        }
    }
}

impl PdfConverter for LibreOfficeConverter {
    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(out_dir)?;
        let args: Vec<OsString> = vec![
            "--headless".into(),
            "--convert-to".into(),
            "pdf".into(),
            "--outdir".into(),
            out_dir.as_os_str().to_os_string(),
            input.as_os_str().to_os_string(),
        ];
        self.runner.run(&self.binary, args)?;

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());
        let output = ensure_output(&self.binary, out_dir.join(format!("{}.pdf", stem)))?;

        tracing::info!("[{}] Converted to PDF with LibreOffice", file_name(input));
        Ok(output)
    }
}

/// Markdown to PDF through pandoc and xelatex
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    binary: String,
    runner: ToolRunner,
}

impl MarkdownRenderer {
    pub fn new(tools: &ToolsConfig) -> Self {
        Self {
            binary: tools.pandoc.clone(),
            runner: ToolRunner::from_config(tools),
        }
    }
}

impl PdfConverter for MarkdownRenderer {
    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(out_dir)?;
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());
        let output = out_dir.join(format!("{}.pdf", stem));

        let mut args: Vec<OsString> = vec![
            input.as_os_str().to_os_string(),
            "-o".into(),
            output.as_os_str().to_os_string(),
        ];
        args.extend(
            [
                "--pdf-engine=xelatex",
                "-V",
                "geometry:margin=1in",
                "-V",
                "fontsize=11pt",
                "-V",
                "linestretch=1.2",
                "--highlight-style=tango",
                "--number-sections",
            ]
            .into_iter()
            .map(OsString::from),
        );
        self.runner.run(&self.binary, args)?;

        let output = ensure_output(&self.binary, output)?;
        tracing::info!("[{}] Rendered markdown to PDF", file_name(input));
        Ok(output)
    }
}

/// Any supported format to markdown.
///
/// Text and markdown are copied, PDFs are rebuilt from their page text,
/// and office formats go through pandoc.
pub struct MarkdownExporter {
    pandoc: String,
    runner: ToolRunner,
    pdf: Arc<dyn PdfBackend>,
}

impl MarkdownExporter {
    pub fn new(tools: &ToolsConfig, pdf: Arc<dyn PdfBackend>) -> Self {
        Self {
            pandoc: tools.pandoc.clone(),
            runner: ToolRunner::from_config(tools),
            pdf,
        }
    }

    fn export_pdf(&self, input: &Path, output: &Path) -> Result<()> {
        let mut doc = self.pdf.open(input)?;
        let mut pages = Vec::with_capacity(doc.page_count() as usize);
        for number in 1..=doc.page_count() {
            let words = doc.page(number)?.words()?;
            pages.push(
                lines_from_words(&words)
                    .into_iter()
                    .map(|(line, _)| line)
                    .collect::<Vec<_>>(),
            );
        }

        std::fs::write(output, pdf_pages_to_markdown(&file_name(input), &pages))?;
        tracing::info!("[{}] Rebuilt markdown from {} PDF pages", file_name(input), pages.len());
        Ok(())
    }

    fn export_with_pandoc(&self, input: &Path, output: &Path, file_type: FileType) -> Result<()> {
        let media = output
            .parent()
            .map(|dir| dir.join("media"))
            .unwrap_or_else(|| PathBuf::from("media"));

        let mut args: Vec<OsString> = vec![
            input.as_os_str().to_os_string(),
            "-o".into(),
            output.as_os_str().to_os_string(),
            "--wrap=none".into(),
            "--extract-media".into(),
            media.into_os_string(),
        ];
        if file_type.requires_pdf_conversion() {
            args.push("--standalone".into());
            args.push("--preserve-tabs".into());
        }
        self.runner.run(&self.pandoc, args)?;
        ensure_output(&self.pandoc, output.to_path_buf())?;

        tracing::info!("[{}] Converted to markdown with pandoc", file_name(input));
        Ok(())
    }
}

impl MarkdownConverter for MarkdownExporter {
    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(out_dir)?;
        let output = out_dir.join(format!("{}.md", file_name(input)));
        let file_type = FileType::from_path(input);

        match file_type {
            FileType::Markdown | FileType::Txt => {
                std::fs::copy(input, &output)?;
                tracing::info!("[{}] Using text as markdown", file_name(input));
            }
            FileType::Pdf => self.export_pdf(input, &output)?,
            FileType::Docx | FileType::Doc | FileType::Odt => {
                self.export_with_pandoc(input, &output, file_type)?
            }
            FileType::Unknown => {
                return Err(Error::UnsupportedFileType(file_name(input)));
            }
        }

        Ok(output)
    }
}

/// Markdown for a PDF without structure: one `##` section per non-empty
/// page, short all-caps lines promoted to `###` headings
pub fn pdf_pages_to_markdown(title: &str, pages: &[Vec<String>]) -> String {
    let mut md = format!("# {}\n\n", title);

    for (i, lines) in pages.iter().enumerate() {
        let lines: Vec<&str> = lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();
        if lines.is_empty() {
            continue;
        }

        md.push_str(&format!("## Page {}\n\n", i + 1));
        for line in lines {
            if looks_like_heading(line) {
                md.push_str(&format!("### {}\n\n", line));
            } else {
                md.push_str(line);
                md.push_str("\n\n");
            }
        }
    }

    md
}

fn looks_like_heading(line: &str) -> bool {
    let has_upper = line.chars().any(char::is_uppercase);
    let has_lower = line.chars().any(char::is_lowercase);
    line.chars().count() < 60 && has_upper && !has_lower && !line.ends_with('.')
}
