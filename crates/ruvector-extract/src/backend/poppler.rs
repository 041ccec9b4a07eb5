//! PDF backend built on poppler-utils and lopdf
//!
//! - `lopdf` reads the page count and the document info dictionary
//! - `pdftotext -bbox` gives word boxes for one page at a time
//! - `pdfimages -png -j` exports the image objects placed on a page
//! - `pdftoppm` rasterizes a page for OCR

use image::DynamicImage;
use lopdf::Object;
use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use super::table_finder::TableFinder;
use super::tools::ToolRunner;
use super::{EmbeddedImage, PdfBackend, PdfDocument, PdfPage, TableGrid, Word};
use crate::config::ToolsConfig;
use crate::error::{Error, Result};
use crate::text::decode_bytes;
use crate::types::FileMetadata;

/// Poppler-based [`PdfBackend`]
#[derive(Debug, Clone)]
pub struct PopplerBackend {
    tools: ToolsConfig,
    runner: ToolRunner,
    table_finder: TableFinder,
}

impl PopplerBackend {
    pub fn new(tools: ToolsConfig) -> Self {
        let runner = ToolRunner::from_config(&tools);
        Self {
            tools,
            runner,
            table_finder: TableFinder::default(),
        }
    }
}

impl Default for PopplerBackend {
    fn default() -> Self {
        Self::new(ToolsConfig::default())
    }
}

impl PdfBackend for PopplerBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let doc = lopdf::Document::load(path)?;
        let page_count = doc.get_pages().len() as u32;
        let metadata = info_metadata(&doc);

        tracing::debug!(document = %path.display(), page_count, "Opened PDF");

        Ok(Box::new(PopplerDocument {
            path: path.to_path_buf(),
            page_count,
            metadata,
            backend: self.clone(),
        }))
    }
}

struct PopplerDocument {
    path: PathBuf,
    page_count: u32,
    metadata: FileMetadata,
    backend: PopplerBackend,
}

impl PdfDocument for PopplerDocument {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn metadata(&self) -> FileMetadata {
        self.metadata.clone()
    }

    fn page(&mut self, number: u32) -> Result<Box<dyn PdfPage + '_>> {
        if number == 0 || number > self.page_count {
            return Err(Error::pdf(format!(
                "page {} out of range (document has {} pages)",
                number, self.page_count
            )));
        }
        Ok(Box::new(PopplerPage {
            doc: &*self,
            number,
            words: OnceCell::new(),
        }))
    }
}

struct PopplerPage<'a> {
    doc: &'a PopplerDocument,
    number: u32,
    words: OnceCell<Vec<Word>>,
}

impl PopplerPage<'_> {
    fn range_args(&self) -> [String; 4] {
        let n = self.number.to_string();
        ["-f".to_string(), n.clone(), "-l".to_string(), n]
    }

    fn tools(&self) -> &ToolsConfig {
        &self.doc.backend.tools
    }

    fn runner(&self) -> &ToolRunner {
        &self.doc.backend.runner
    }
}

impl PdfPage for PopplerPage<'_> {
    fn number(&self) -> u32 {
        self.number
    }

    fn words(&self) -> Result<Vec<Word>> {
        if let Some(words) = self.words.get() {
            return Ok(words.clone());
        }

        let mut args: Vec<std::ffi::OsString> =
            self.range_args().into_iter().map(Into::into).collect();
        args.push("-bbox".into());
        args.push(self.doc.path.as_os_str().to_os_string());
        args.push("-".into());

        let xhtml = self.runner().run_text(&self.tools().pdftotext, args)?;
        let words = parse_bbox_words(&xhtml)?;
        let _ = self.words.set(words.clone());
        Ok(words)
    }

    fn tables(&self) -> Result<Vec<TableGrid>> {
        let words = self.words()?;
        Ok(self.doc.backend.table_finder.find(&words))
    }

    fn images(&self) -> Result<Vec<EmbeddedImage>> {
        let dir = tempfile::Builder::new().prefix("ruvector-images-").tempdir()?;

        let mut args: Vec<std::ffi::OsString> =
            self.range_args().into_iter().map(Into::into).collect();
        args.push("-png".into());
        args.push("-j".into());
        args.push(self.doc.path.as_os_str().to_os_string());
        args.push(dir.path().join("img").into_os_string());
        self.runner().run(&self.tools().pdfimages, args)?;

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir.path())?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                let keep = is_decodable(path);
                if !keep {
                    tracing::debug!(page = self.number, image = %path.display(), "Skipping undecodable image");
                }
                keep
            })
            .collect();
        paths.sort();

        let mut images = Vec::with_capacity(paths.len());
        for path in paths {
            let format = path
                .extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .unwrap_or_else(|| "unknown".to_string());
            let data = std::fs::read(&path)?;
            images.push(EmbeddedImage { format, data });
        }
        Ok(images)
    }

    fn render(&self, scale: f32) -> Result<DynamicImage> {
        let dir = tempfile::Builder::new().prefix("ruvector-render-").tempdir()?;
        let prefix = dir.path().join("page");
        let dpi = (72.0 * scale).round().max(1.0) as u32;

        let mut args: Vec<std::ffi::OsString> =
            self.range_args().into_iter().map(Into::into).collect();
        args.push("-r".into());
        args.push(dpi.to_string().into());
        args.push("-png".into());
        args.push("-singlefile".into());
        args.push(self.doc.path.as_os_str().to_os_string());
        args.push(prefix.clone().into_os_string());
        self.runner().run(&self.tools().pdftoppm, args)?;

        Ok(image::open(prefix.with_extension("png"))?)
    }
}

/// Whether the `image` crate can open an exported image, judged by extension
fn is_decodable(path: &Path) -> bool {
    path.extension()
        .and_then(image::ImageFormat::from_extension)
        .is_some()
}

/// Parse the XHTML that `pdftotext -bbox` writes
pub fn parse_bbox_words(xhtml: &str) -> Result<Vec<Word>> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xhtml);
    reader.config_mut().trim_text(true);

    let mut words = Vec::new();
    let mut current: Option<Word> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"word" => {
                let mut word = Word::new("", 0.0, 0.0, 0.0, 0.0);
                for attr in e.attributes().flatten() {
                    let value: f64 = attr
                        .unescape_value()
                        .ok()
                        .and_then(|v| v.trim().parse().ok())
                        .unwrap_or(0.0);
                    match attr.key.as_ref() {
                        b"xMin" => word.x0 = value,
                        b"yMin" => word.top = value,
                        b"xMax" => word.x1 = value,
                        b"yMax" => word.bottom = value,
                        _ => {}
                    }
                }
                current = Some(word);
            }
            Ok(Event::Text(e)) => {
                if let Some(word) = current.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|err| Error::pdf(format!("bad pdftotext output: {}", err)))?;
                    word.text.push_str(&text);
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"word" => {
                if let Some(word) = current.take() {
                    if !word.text.trim().is_empty() {
                        words.push(word);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::pdf(format!("bad pdftotext output: {}", e))),
            _ => {}
        }
    }

    Ok(words)
}

/// Author and creation date from the document info dictionary
fn info_metadata(doc: &lopdf::Document) -> FileMetadata {
    let info = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).ok(),
        Ok(Object::Dictionary(dict)) => Some(dict),
        _ => None,
    };
    let Some(info) = info else {
        return FileMetadata::default();
    };

    let text = |key: &[u8]| match info.get(key) {
        Ok(Object::String(bytes, _)) => {
            let value = decode_bytes(bytes).trim().to_string();
            (!value.is_empty()).then_some(value)
        }
        _ => None,
    };

    FileMetadata {
        file_author: text(b"Author"),
        file_date: text(b"CreationDate").and_then(|raw| parse_pdf_date(&raw)),
        ..Default::default()
    }
}

/// Convert a PDF date (`D:YYYYMMDDHHmmSS...`) to ISO 8601
pub fn parse_pdf_date(raw: &str) -> Option<String> {
    let digits: String = raw
        .trim()
        .trim_start_matches("D:")
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    if digits.len() >= 14 {
        chrono::NaiveDateTime::parse_from_str(&digits[..14], "%Y%m%d%H%M%S")
            .ok()
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
    } else if digits.len() >= 8 {
        chrono::NaiveDate::parse_from_str(&digits[..8], "%Y%m%d")
            .ok()
            .map(|d| d.format("%Y-%m-%d").to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BBOX_XHTML: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
<title></title>
</head>
<body>
<doc>
  <page width="612.000000" height="792.000000">
    <word xMin="72.000000" yMin="71.500000" xMax="101.330000" yMax="83.500000">Fish</word>
    <word xMin="104.330000" yMin="71.500000" xMax="121.000000" yMax="83.500000">&amp;</word>
    <word xMin="124.000000" yMin="71.500000" xMax="150.000000" yMax="83.500000">Chips</word>
  </page>
</doc>
</body>
</html>"#;

    #[test]
    fn test_parse_bbox_words() {
        let words = parse_bbox_words(BBOX_XHTML).unwrap();
        assert_eq!(words.len(), 3);
        assert_eq!(words[1].text, "&");
        assert_eq!(words[0].x0, 72.0);
        assert_eq!(words[2].bottom, 83.5);
    }

    #[test]
    fn test_parse_pdf_date() {
        assert_eq!(
            parse_pdf_date("D:20230115103000+01'00'").as_deref(),
            Some("2023-01-15T10:30:00")
        );
        assert_eq!(parse_pdf_date("D:20230115").as_deref(), Some("2023-01-15"));
        assert_eq!(parse_pdf_date("yesterday"), None);
    }

    #[test]
    fn test_only_decodable_exports_are_kept() {
        assert!(is_decodable(Path::new("/tmp/img-000.png")));
        assert!(is_decodable(Path::new("/tmp/img-001.jpg")));
        assert!(!is_decodable(Path::new("/tmp/img-002.jb2e")));
        assert!(!is_decodable(Path::new("/tmp/img-003.ccitt")));
        assert!(!is_decodable(Path::new("/tmp/img-004.params")));
        assert!(!is_decodable(Path::new("/tmp/img-005")));
    }

    #[test]
    fn test_open_missing_file() {
        let backend = PopplerBackend::default();
        let err = backend
            .open(Path::new("/definitely/not/here.pdf"))
            .err()
            .unwrap();
        assert!(matches!(err, Error::FileNotFound(_)));
    }
}
