//! In-memory backends for integration tests

#![allow(dead_code)]

use image::{DynamicImage, ImageFormat};
use std::collections::HashSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ruvector_extract::backend::{
    EmbeddedImage, OcrEngine, PdfBackend, PdfDocument, PdfPage, SharedOcr, TableGrid, Word,
};
use ruvector_extract::convert::{MarkdownConverter, PdfConverter};
use ruvector_extract::error::{Error, Result};
use ruvector_extract::types::FileMetadata;

/// Contents of one fake page
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub words: Vec<Word>,
    pub tables: Vec<TableGrid>,
    pub images: Vec<EmbeddedImage>,
    pub fail_tables: bool,
    pub fail_render: bool,
}

impl FakePage {
    pub fn blank() -> Self {
        Self::default()
    }

    /// Words laid out as `lines` lines of `per_line` ten-character words
    pub fn with_text(lines: usize, per_line: usize) -> Self {
        let mut words = Vec::new();
        for line in 0..lines {
            for col in 0..per_line {
                let n = line * per_line + col;
                let x0 = col as f64 * 70.0;
                let top = 100.0 + line as f64 * 14.0;
                words.push(Word::new(format!("word{:06}", n), x0, top, x0 + 60.0, top + 10.0));
            }
        }
        Self {
            words,
            ..Self::default()
        }
    }

    pub fn with_lines(lines: &[&str]) -> Self {
        let words = lines
            .iter()
            .enumerate()
            .flat_map(|(i, line)| {
                let top = 50.0 + i as f64 * 15.0;
                line.split_whitespace()
                    .enumerate()
                    .map(move |(j, w)| {
                        let x0 = j as f64 * 80.0;
                        Word::new(w, x0, top, x0 + 70.0, top + 10.0)
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        Self {
            words,
            ..Self::default()
        }
    }

    pub fn table(mut self, rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|cell| Some(cell.to_string())).collect())
            .collect();
        self.tables.push(TableGrid::new(rows));
        self
    }

    pub fn image(mut self, image: EmbeddedImage) -> Self {
        self.images.push(image);
        self
    }

    fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A PNG-encoded image of the given size
pub fn png(width: u32, height: u32) -> EmbeddedImage {
    let mut data = Vec::new();
    DynamicImage::new_rgb8(width, height)
        .write_to(&mut Cursor::new(&mut data), ImageFormat::Png)
        .unwrap();
    EmbeddedImage {
        format: "png".to_string(),
        data,
    }
}

/// Bytes that no image decoder accepts
pub fn corrupt_image() -> EmbeddedImage {
    EmbeddedImage {
        format: "jpg".to_string(),
        data: vec![0, 1, 2, 3],
    }
}

/// Serves the same pages for every path it opens
#[derive(Clone, Default)]
pub struct FakeBackend {
    pub pages: Vec<FakePage>,
    /// Pages whose handle cannot be opened
    pub broken_pages: HashSet<u32>,
    pub metadata: FileMetadata,
    pub unreadable: bool,
}

impl FakeBackend {
    pub fn new(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn arc(self) -> Arc<dyn PdfBackend> {
        Arc::new(self)
    }
}

impl PdfBackend for FakeBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>> {
        if self.unreadable {
            return Err(Error::pdf(format!("cannot open {}", path.display())));
        }
        Ok(Box::new(FakeDocument {
            backend: self.clone(),
        }))
    }
}

struct FakeDocument {
    backend: FakeBackend,
}

impl PdfDocument for FakeDocument {
    fn page_count(&self) -> u32 {
        self.backend.pages.len() as u32
    }

    fn metadata(&self) -> FileMetadata {
        self.backend.metadata.clone()
    }

    fn page(&mut self, number: u32) -> Result<Box<dyn PdfPage + '_>> {
        if self.backend.broken_pages.contains(&number) {
            return Err(Error::pdf(format!("page {} is damaged", number)));
        }
        let page = self
            .backend
            .pages
            .get(number as usize - 1)
            .ok_or_else(|| Error::pdf(format!("no page {}", number)))?;
        Ok(Box::new(FakePageHandle { number, page }))
    }
}

struct FakePageHandle<'a> {
    number: u32,
    page: &'a FakePage,
}

impl PdfPage for FakePageHandle<'_> {
    fn number(&self) -> u32 {
        self.number
    }

    fn words(&self) -> Result<Vec<Word>> {
        Ok(self.page.words.clone())
    }

    fn text(&self) -> Result<String> {
        Ok(self.page.text())
    }

    fn tables(&self) -> Result<Vec<TableGrid>> {
        if self.page.fail_tables {
            return Err(Error::pdf("table detection crashed"));
        }
        Ok(self.page.tables.clone())
    }

    fn images(&self) -> Result<Vec<EmbeddedImage>> {
        Ok(self.page.images.clone())
    }

    fn render(&self, scale: f32) -> Result<DynamicImage> {
        if self.page.fail_render {
            return Err(Error::tool("pdftoppm", "render failed"));
        }
        let side = (100.0 * scale) as u32;
        Ok(DynamicImage::new_rgb8(side, side))
    }
}

/// Returns the same text for every bitmap
pub struct FixedOcr(pub String);

impl FixedOcr {
    pub fn shared(text: &str) -> SharedOcr {
        Arc::new(Self(text.to_string()))
    }
}

impl OcrEngine for FixedOcr {
    fn recognize(&self, _image: &DynamicImage, _language: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// "Converts" by writing a placeholder file with the expected name
pub struct PlaceholderConverter {
    pub extension: &'static str,
    pub fail: bool,
}

impl PlaceholderConverter {
    fn write(&self, input: &Path, out_dir: &Path, name: String) -> Result<PathBuf> {
        if self.fail {
            return Err(Error::tool("converter", format!("cannot convert {}", input.display())));
        }
        std::fs::create_dir_all(out_dir)?;
        let output = out_dir.join(name);
        std::fs::write(&output, b"placeholder")?;
        Ok(output)
    }
}

impl PdfConverter for PlaceholderConverter {
    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf> {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        self.write(input, out_dir, format!("{}.{}", stem, self.extension))
    }
}

/// Writes a partial PDF and then fails, remembering every output directory
#[derive(Default)]
pub struct HalfWrittenConverter {
    pub out_dirs: parking_lot::Mutex<Vec<PathBuf>>,
}

impl PdfConverter for HalfWrittenConverter {
    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf> {
        self.out_dirs.lock().push(out_dir.to_path_buf());
        std::fs::create_dir_all(out_dir)?;
        std::fs::write(out_dir.join("partial.pdf"), b"%PDF-1.7 truncated")?;
        Err(Error::tool("soffice", format!("cannot convert {}", input.display())))
    }
}

/// Copies the input verbatim as `{file name}.md`
pub struct CopyToMarkdown {
    pub fail: bool,
}

impl MarkdownConverter for CopyToMarkdown {
    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf> {
        if self.fail {
            return Err(Error::tool("pandoc", "conversion failed"));
        }
        std::fs::create_dir_all(out_dir)?;
        let name = input.file_name().unwrap_or_default().to_string_lossy();
        let output = out_dir.join(format!("{}.md", name));
        std::fs::copy(input, &output)?;
        Ok(output)
    }
}

/// Write `content` to `dir/name` and return the path
pub fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
