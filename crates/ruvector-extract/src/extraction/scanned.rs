//! Whole-page OCR for scanned pages

use super::{RecoveryContext, RecoveryError, Stage};
use crate::backend::PdfPage;
use crate::types::{Element, ImageMetadata};

/// `image_format` recorded on elements recovered from a full-page scan
pub const FULL_PAGE_SCAN: &str = "full_page_scan";

/// Rasterize `page` and OCR it.
///
/// `Ok(None)` means OCR found no text: the page contributes nothing and
/// the caller is expected to report it.
pub fn recover_scanned(
    page: &dyn PdfPage,
    ctx: &RecoveryContext<'_>,
) -> Result<Option<Element>, RecoveryError> {
    let number = page.number();

    let bitmap = page
        .render(ctx.render_scale)
        .map_err(|e| RecoveryError::new(number, Stage::Render, e))?;

    let text = ctx
        .ocr
        .recognize(&bitmap, ctx.language)
        .map_err(|e| RecoveryError::new(number, Stage::PageOcr, e))?;

    Ok(Element::image(
        text,
        number,
        ctx.file.clone(),
        ImageMetadata {
            ocr_lang: Some(ctx.language.to_string()),
            image_format: Some(FULL_PAGE_SCAN.to_string()),
            image_dims: Some((bitmap.width(), bitmap.height())),
        },
    ))
}
