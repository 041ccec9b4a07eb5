//! OCR through the `tesseract` command line tool

use image::DynamicImage;
use std::ffi::OsStr;

use super::tools::ToolRunner;
use super::OcrEngine;
use crate::config::{OcrConfig, ToolsConfig};
use crate::error::{Error, Result};

/// [`OcrEngine`] that shells out to tesseract.
///
/// Each call writes the bitmap to its own temporary file, so concurrent
/// calls do not share state.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: String,
    /// Page segmentation mode: 3 is fully automatic, 6 a single block, 7 a single line
    page_seg_mode: u8,
    runner: ToolRunner,
}

impl TesseractOcr {
    pub fn new(tools: &ToolsConfig, ocr: &OcrConfig) -> Self {
        Self {
            binary: tools.tesseract.clone(),
            page_seg_mode: ocr.page_segmentation_mode,
            runner: ToolRunner::from_config(tools),
        }
    }

    pub fn with_page_seg_mode(mut self, mode: u8) -> Self {
        self.page_seg_mode = mode;
        self
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new(&ToolsConfig::default(), &OcrConfig::default())
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String> {
        let dir = tempfile::Builder::new().prefix("ruvector-ocr-").tempdir()?;
        let input = dir.path().join("input.png");
        image.save(&input)?;

        let psm = self.page_seg_mode.to_string();
        let text = self
            .runner
            .run_text(
                &self.binary,
                [
                    input.as_os_str(),
                    OsStr::new("stdout"),
                    OsStr::new("-l"),
                    OsStr::new(language),
                    OsStr::new("--psm"),
                    OsStr::new(&psm),
                ],
            )
            .map_err(|e| match e {
                Error::ToolFailed { message, .. } => Error::ocr(message),
                other => other,
            })?;

        Ok(clean_ocr_text(&text))
    }
}

/// Trim trailing spaces on each line and collapse runs of blank lines
fn clean_ocr_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        blank_run = 0;
    }

    out
}
