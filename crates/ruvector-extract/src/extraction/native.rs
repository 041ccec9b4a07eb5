//! Recovery of text lines, tables and image text from native pages

use std::collections::BTreeMap;

use super::{PageOutcome, RecoveryContext, RecoveryError, Stage, UnitResult};
use crate::backend::{EmbeddedImage, PdfPage, TableGrid, Word};
use crate::types::{BBox, Element, FileMetadata, ImageMetadata, Source, TableMetadata, TextMetadata};

/// Run every native recovery step on `page`. Steps fail independently.
pub fn recover_native(page: &dyn PdfPage, ctx: &RecoveryContext<'_>) -> PageOutcome {
    let number = page.number();
    let mut outcome = PageOutcome::new(number);

    outcome.absorb(recover_text(page, ctx.file));
    outcome.absorb(recover_tables(page, ctx.file));
    outcome.extend(recover_images(page, ctx));

    tracing::debug!(
        page = number,
        elements = outcome.elements.len(),
        failures = outcome.failures.len(),
        "Native page recovered"
    );
    outcome
}

/// One Text element per reconstructed line
pub fn recover_text(page: &dyn PdfPage, file: &FileMetadata) -> UnitResult {
    let number = page.number();
    let words = page
        .words()
        .map_err(|e| RecoveryError::new(number, Stage::Words, e))?;

    Ok(lines_from_words(&words)
        .into_iter()
        .filter_map(|(text, bbox)| {
            Element::text(
                text,
                Source::Native,
                number,
                file.clone(),
                TextMetadata {
                    bbox: Some(bbox),
                    ..Default::default()
                },
            )
        })
        .collect())
}

/// One Table element per detected table with a header and at least one data row
pub fn recover_tables(page: &dyn PdfPage, file: &FileMetadata) -> UnitResult {
    let number = page.number();
    let tables = page
        .tables()
        .map_err(|e| RecoveryError::new(number, Stage::Tables, e))?;

    Ok(tables
        .iter()
        .filter_map(|grid| table_element(grid, number, file))
        .collect())
}

/// OCR every image placed on the page; each image is its own unit
pub fn recover_images(page: &dyn PdfPage, ctx: &RecoveryContext<'_>) -> Vec<UnitResult> {
    let number = page.number();
    let images = match page.images() {
        Ok(images) => images,
        Err(e) => return vec![Err(RecoveryError::new(number, Stage::Images, e))],
    };

    images
        .iter()
        .map(|image| {
            image_element(image, number, ctx)
                .map(|element| element.into_iter().collect::<Vec<_>>())
                .map_err(|e| RecoveryError::new(number, Stage::ImageOcr, e))
        })
        .collect()
}

fn image_element(
    image: &EmbeddedImage,
    page: u32,
    ctx: &RecoveryContext<'_>,
) -> crate::error::Result<Option<Element>> {
    let bitmap = image.decode()?;
    let text = ctx.ocr.recognize(&bitmap, ctx.language)?;

    Ok(Element::image(
        text,
        page,
        ctx.file.clone(),
        ImageMetadata {
            ocr_lang: Some(ctx.language.to_string()),
            image_format: Some(image.format.clone()),
            image_dims: Some((bitmap.width(), bitmap.height())),
        },
    ))
}

/// Group words into lines by rounded `top`, left to right within a line
pub fn lines_from_words(words: &[Word]) -> Vec<(String, BBox)> {
    let mut buckets: BTreeMap<i64, Vec<&Word>> = BTreeMap::new();
    for word in words {
        buckets.entry(word.top.round() as i64).or_default().push(word);
    }

    buckets
        .into_values()
        .filter_map(|mut line| {
            line.sort_by(|a, b| a.x0.total_cmp(&b.x0));
            let text = line
                .iter()
                .map(|w| w.text.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if text.is_empty() {
                return None;
            }
            let boxes: Vec<BBox> = line.iter().map(|w| w.bbox()).collect();
            BBox::union_all(&boxes).map(|bbox| (text, bbox))
        })
        .collect()
}

/// Render a table as ` | `-delimited rows; `None` below two rows
pub fn table_element(grid: &TableGrid, page: u32, file: &FileMetadata) -> Option<Element> {
    if grid.rows.len() < 2 {
        return None;
    }

    let cell = |c: &Option<String>| c.as_deref().map(str::trim).unwrap_or("").to_string();
    let columns: Vec<String> = grid.rows[0].iter().map(cell).collect();
    let content = grid
        .rows
        .iter()
        .map(|row| row.iter().map(cell).collect::<Vec<_>>().join(" | "))
        .collect::<Vec<_>>()
        .join("\n");

    Element::table(
        content,
        Source::Native,
        page,
        file.clone(),
        TableMetadata {
            columns,
            bbox: grid.bbox,
        },
    )
}
