mod common;

use common::{
    corrupt_image, png, write_file, FakeBackend, FakePage, FixedOcr, HalfWrittenConverter,
    PlaceholderConverter,
};
use std::sync::Arc;

use ruvector_extract::config::{ExtractConfig, GroupingConfig, OutputFormat};
use ruvector_extract::extraction::output::{load_elements, save_elements};
use ruvector_extract::extraction::scanned::FULL_PAGE_SCAN;
use ruvector_extract::extraction::{
    DocumentExtractor, Extractor, ExtractorRegistry, PdfExtractor, Stage,
};
use ruvector_extract::types::{ElementKind, ElementType, FileMetadata, Source};

fn extractor(backend: FakeBackend, ocr_text: &str, grouping: GroupingConfig) -> DocumentExtractor {
    let config = ExtractConfig::default();
    let registry = ExtractorRegistry::with_backends(
        backend.arc(),
        FixedOcr::shared(ocr_text),
        Arc::new(PlaceholderConverter { extension: "pdf", fail: false }),
        &config,
    );
    DocumentExtractor::with_registry(registry, grouping)
}

fn count(elements: &[ruvector_extract::Element], ty: ElementType, index: u32) -> usize {
    elements
        .iter()
        .filter(|e| e.element_type() == ty && e.index() == index)
        .count()
}

#[test]
fn test_native_page_and_scanned_page() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "report.pdf", b"%PDF-1.7");

    // page 1: 50 ten-character words plus a 2x3 table; page 2: nothing
    let backend = FakeBackend::new(vec![
        FakePage::with_text(10, 5).table(&[&["name", "qty", "price"], &["bolt", "4", "0.10"]]),
        FakePage::blank(),
    ]);
    let extraction = extractor(backend, "recognized scan", GroupingConfig::default())
        .try_extract(&path)
        .unwrap();
    let elements = &extraction.elements;

    assert!(count(elements, ElementType::Text, 1) >= 1);
    assert_eq!(count(elements, ElementType::Table, 1), 1);
    assert_eq!(count(elements, ElementType::Image, 2), 1);
    assert_eq!(elements.len(), 10 + 1 + 1);

    let table = elements
        .iter()
        .find(|e| e.element_type() == ElementType::Table)
        .unwrap();
    match table.kind() {
        ElementKind::Table(meta) => assert_eq!(meta.columns, vec!["name", "qty", "price"]),
        other => panic!("unexpected kind {:?}", other),
    }
    assert_eq!(table.content(), "name | qty | price\nbolt | 4 | 0.10");

    let image = elements
        .iter()
        .find(|e| e.element_type() == ElementType::Image)
        .unwrap();
    assert_eq!(image.source(), Source::Ocr);
    assert_eq!(image.content(), "recognized scan");
    match image.kind() {
        ElementKind::Image(meta) => {
            assert_eq!(meta.image_format.as_deref(), Some(FULL_PAGE_SCAN));
            assert_eq!(meta.image_dims, Some((400, 400)));
            assert_eq!(meta.ocr_lang.as_deref(), Some("eng"));
        }
        other => panic!("unexpected kind {:?}", other),
    }

    let report = &extraction.report;
    assert_eq!(report.pages_total, 2);
    assert_eq!(report.pages_native, 1);
    assert_eq!(report.pages_scanned, 1);
    assert!(report.is_clean());
    assert!(elements.iter().all(|e| e.file().file_name.as_deref() == Some("report.pdf")));
}

#[test]
fn test_first_text_line_keeps_word_order_and_box() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "lines.pdf", b"%PDF-1.7");
    let backend = FakeBackend::new(vec![FakePage::with_lines(&[
        "Quarterly results exceeded expectations",
        "Revenue grew in every region",
    ])]);

    let elements = extractor(backend, "", GroupingConfig::default()).extract(&path);
    let texts: Vec<&str> = elements.iter().map(|e| e.content()).collect();
    assert_eq!(
        texts,
        vec!["Quarterly results exceeded expectations", "Revenue grew in every region"]
    );
    match elements[0].kind() {
        ElementKind::Text(meta) => {
            let bbox = meta.bbox.unwrap();
            assert_eq!(bbox.x0, 0.0);
            assert_eq!(bbox.x1, 310.0);
        }
        other => panic!("unexpected kind {:?}", other),
    }
}

#[test]
fn test_failures_stay_inside_their_unit() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "damaged.pdf", b"%PDF-1.7");

    let mut tables_fail = FakePage::with_lines(&["third page still has plenty of readable text"])
        .image(corrupt_image())
        .image(png(8, 6));
    tables_fail.fail_tables = true;

    let mut render_fails = FakePage::blank();
    render_fails.fail_render = true;

    let mut backend = FakeBackend::new(vec![
        FakePage::with_lines(&["first page has plenty of readable text"]),
        FakePage::with_lines(&["unreachable"]),
        tables_fail,
        render_fails,
    ]);
    backend.broken_pages.insert(2);

    let extraction = extractor(backend, "logo text", GroupingConfig::default())
        .try_extract(&path)
        .unwrap();

    let pages: Vec<u32> = extraction.elements.iter().map(|e| e.index()).collect();
    assert_eq!(pages, vec![1, 3, 3]);
    assert_eq!(count(&extraction.elements, ElementType::Image, 3), 1);

    let stages: Vec<(u32, Stage)> = extraction
        .report
        .failures
        .iter()
        .map(|f| (f.page, f.stage))
        .collect();
    assert_eq!(
        stages,
        vec![
            (2, Stage::OpenPage),
            (3, Stage::Tables),
            (3, Stage::ImageOcr),
            (4, Stage::Render),
        ]
    );
}

#[test]
fn test_empty_ocr_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "scan.pdf", b"%PDF-1.7");
    let backend = FakeBackend::new(vec![FakePage::blank(), FakePage::with_lines(&["short"])]);

    let extraction = extractor(backend, "   ", GroupingConfig::default())
        .try_extract(&path)
        .unwrap();
    assert!(extraction.elements.is_empty());
    // "short" is below the threshold, so both pages were OCR'd
    assert_eq!(extraction.report.pages_scanned, 2);
    assert_eq!(extraction.report.pages_empty_ocr, vec![1, 2]);
}

#[test]
fn test_unopenable_pdf_yields_empty_list() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "broken.pdf", b"not a pdf");
    let mut backend = FakeBackend::new(vec![]);
    backend.unreadable = true;

    let extractor = extractor(backend, "", GroupingConfig::default());
    assert!(extractor.try_extract(&path).is_err());
    assert!(extractor.extract(&path).is_empty());
}

#[test]
fn test_office_documents_keep_original_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "memo.docx", b"PK");
    let mut backend = FakeBackend::new(vec![FakePage::with_lines(&[
        "Memo body with enough characters to be native",
    ])]);
    backend.metadata = FileMetadata {
        file_author: Some("Records Office".into()),
        file_date: Some("2001-01-01".into()),
        ..FileMetadata::default()
    };

    let elements = extractor(backend, "", GroupingConfig::default()).extract(&path);
    assert_eq!(elements.len(), 1);
    let file = elements[0].file();
    assert_eq!(file.file_name.as_deref(), Some("memo.docx"));
    assert_eq!(file.file_format.as_deref(), Some("docx"));
    assert_eq!(file.file_author.as_deref(), Some("Records Office"));
    assert_ne!(file.file_date.as_deref(), Some("2001-01-01"));
}

#[test]
fn test_failed_office_conversion_leaves_nothing_behind() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "memo.docx", b"PK");
    let backend = FakeBackend::new(vec![FakePage::with_lines(&[
        "Memo body with enough characters to be native",
    ])]);

    let converter = Arc::new(HalfWrittenConverter::default());
    let config = ExtractConfig::default();
    let registry = ExtractorRegistry::with_backends(
        backend.arc(),
        FixedOcr::shared("ocr text"),
        converter.clone(),
        &config,
    );
    let extractor = DocumentExtractor::with_registry(registry, GroupingConfig::default());

    let err = extractor.try_extract(&path).unwrap_err();
    assert!(err.to_string().contains("soffice"));
    assert!(extractor.extract(&path).is_empty());

    let out_dirs = converter.out_dirs.lock();
    assert_eq!(out_dirs.len(), 2);
    assert!(out_dirs.iter().all(|d| !d.exists()));
}

#[test]
fn test_pdf_info_wins_for_native_pdfs() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "paper.pdf", b"%PDF-1.7");
    let mut backend = FakeBackend::new(vec![FakePage::with_lines(&[
        "Abstract of a paper with enough text",
    ])]);
    backend.metadata = FileMetadata {
        file_date: Some("1999-12-31T23:59:59".into()),
        ..FileMetadata::default()
    };

    let pdf = PdfExtractor::new(backend.arc(), FixedOcr::shared(""), &ExtractConfig::default());
    let extraction = pdf.extract(&path).unwrap();
    assert_eq!(
        extraction.elements[0].file().file_date.as_deref(),
        Some("1999-12-31T23:59:59")
    );
}

#[test]
fn test_grouped_pages_are_labeled_and_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "grouped.pdf", b"%PDF-1.7");
    let backend = FakeBackend::new(vec![
        FakePage::with_lines(&["alpha line on the first page", "beta line on the first page"]),
        FakePage::blank(),
    ]);

    let grouping = GroupingConfig {
        enabled: true,
        index_label: Some("PAGE".into()),
    };
    let elements = extractor(backend, "scanned words", grouping).extract(&path);

    assert_eq!(elements.len(), 2);
    assert_eq!(
        elements[0].content(),
        "PAGE 1:\n\nalpha line on the first pagebeta line on the first page"
    );
    assert_eq!(elements[0].source(), Source::Aggregated);
    assert_eq!(elements[1].content(), "PAGE 2:\n\nscanned words");
    assert_eq!(elements[1].index(), 2);
}

#[test]
fn test_plain_text_and_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "notes.md", "\u{FEFF}# Notes\n\nFirst para.\n\nSecond para.\n".as_bytes());
    let extractor = extractor(FakeBackend::default(), "", GroupingConfig::default());

    let elements = extractor.extract(&path);
    let contents: Vec<&str> = elements.iter().map(|e| e.content()).collect();
    assert_eq!(contents, vec!["# Notes", "First para.", "Second para."]);
    assert!(elements.iter().all(|e| e.index() == 1 && e.source() == Source::Native));

    let out = dir.path().join("out");
    let written = save_elements(&out, &elements, OutputFormat::Json).unwrap();
    assert_eq!(written.len(), 3);
    assert!(out.join("1.json").is_file());
    assert!(out.join("1_2.json").is_file());
    assert_eq!(load_elements(&out).unwrap(), elements);
}

#[test]
fn test_unsupported_extension_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "deck.pptx", b"PK");
    let extractor = extractor(FakeBackend::default(), "", GroupingConfig::default());

    assert!(extractor.try_extract(&path).unwrap_err().is_unsupported());
    assert!(extractor.extract(&path).is_empty());
}
