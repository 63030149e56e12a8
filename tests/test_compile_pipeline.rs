//! End-to-end tests for the compile pipeline:
//! - every cross-reference offset points at its object's marker
//! - assigned IDs are contiguous with no gaps
//! - document structure (persistent page, marker, bookmarks, images,
//!   annotations) survives into the output
//! - output is deterministic given a fixed creation date

use chrono::TimeZone;
use pdfsmith::elements::{AnnotationElement, Element, ImageElement, TextElement};
use pdfsmith::{
    Align, Color, Document, EncodeMode, ImageRef, PageMarker, PageSize, RowStyle, Table, VAlign,
};

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

/// Parse the classic xref table: (declared /Size, offsets for IDs 1..N).
fn parse_xref(bytes: &[u8]) -> (usize, Vec<usize>) {
    let sx = rfind(bytes, b"startxref").expect("startxref present");
    let after = &bytes[sx + b"startxref\n".len()..];
    let line_end = find(after, b"\n").expect("offset line");
    let xref_start: usize = std::str::from_utf8(&after[..line_end])
        .unwrap()
        .trim()
        .parse()
        .unwrap();

    let table = &bytes[xref_start..];
    assert!(table.starts_with(b"xref\n"), "startxref points at the table");
    let rest = &table[5..];
    let line_end = find(rest, b"\n").unwrap();
    let decl: Vec<usize> = std::str::from_utf8(&rest[..line_end])
        .unwrap()
        .split(' ')
        .map(|s| s.parse().unwrap())
        .collect();
    assert_eq!(decl[0], 0, "table starts at the free head");
    let size = decl[1];

    let entries = &rest[line_end + 1..];
    let mut offsets = Vec::new();
    for i in 1..size {
        let entry = &entries[i * 20..i * 20 + 20];
        offsets.push(std::str::from_utf8(&entry[..10]).unwrap().parse().unwrap());
    }
    (size, offsets)
}

fn text(x: f32, y: f32, s: &str) -> Element {
    Element::Text(TextElement::new(x, y, s, 12.0))
}

/// A document exercising every object kind, with a pinned timestamp.
fn rich_document() -> Document {
    let mut doc = Document::new();
    doc.info_mut().title = Some("Quarterly Report".to_string());
    doc.info_mut().author = Some("Accounts".to_string());
    doc.info_mut().creation_date = Some(chrono::Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
    doc.set_outline_visible(true);
    doc.set_page_marker(Some(PageMarker::new("Page {page} of {pages}", 500.0, 820.0, 9.0)));

    doc.persistent_page_mut().add_element(text(72.0, 30.0, "HEADER"));
    doc.fonts_mut().get_or_create("Helvetica").unwrap();

    // Page 1: body text, a paragraph, a table, an annotation
    let (lines, rest) = doc
        .layout_paragraph(
            "the quick brown fox jumps over the lazy dog",
            10.0,
            "Courier",
            120.0,
            0,
            12.0,
            Align::Left,
        )
        .unwrap();
    assert!(rest.is_empty());

    let mut table = Table::new();
    table.add_column(120.0, Align::Left, VAlign::Top);
    table.add_column(60.0, Align::Right, VAlign::Top);
    table.set_row_styles(
        RowStyle {
            fill: Some(Color::new(0.95, 0.95, 0.95)),
            text_color: None,
        },
        RowStyle::default(),
    );
    {
        let font = doc.fonts_mut().get_or_create("Helvetica").unwrap();
        let header = table.header_mut();
        header.column_mut(0).unwrap().add_text("Item", font, 10.0);
        header.column_mut(1).unwrap().add_text("Total", font, 10.0);
    }
    for (item, total) in [("Widgets", "120"), ("Gadgets", "46")] {
        table.add_row();
        let row_index = table.row_count() - 1;
        let font = doc.fonts_mut().get_or_create("Helvetica").unwrap();
        let row = table.row_mut(row_index).unwrap();
        row.column_mut(0).unwrap().add_text(item, font, 10.0);
        row.column_mut(1).unwrap().add_text(total, font, 10.0);
    }

    {
        let page = doc.add_page_sized(PageSize::A4);
        page.add_element(text(72.0, 72.0, "BODY"));
        page.add_element(Element::Paragraph(pdfsmith::elements::ParagraphElement::new(
            72.0, 100.0, 120.0, lines,
        )));
        page.add_table(&mut table, 72.0, 220.0);
        page.add_element(Element::Annotation(AnnotationElement::uri(
            72.0,
            72.0,
            60.0,
            12.0,
            "https://example.com",
        )));
    }

    // Page 2: an image with a soft mask, an internal link back
    let image =
        ImageRef::encode_rgb_blocking(4, 4, vec![200u8; 48], EncodeMode::LosslessRgb, 6).unwrap();
    let mask = ImageRef::encode_alpha_blocking(4, 4, vec![128u8; 16], 6).unwrap();
    image.attach_mask(mask);
    {
        let page = doc.add_page_sized(PageSize::A4);
        page.add_element(Element::Image(ImageElement::new(
            100.0, 100.0, 80.0, 80.0, image,
        )));
        page.add_element(Element::Annotation(AnnotationElement::goto_page(
            72.0, 200.0, 60.0, 12.0, 0,
        )));
    }

    // Bookmarks: two chapters, the first with two sections
    let ch1 = doc.outline_mut().add_root("Chapter 1", 0);
    doc.outline_mut().add_child(ch1, "Section 1.1", 0).unwrap();
    let s12 = doc.outline_mut().add_child(ch1, "Section 1.2", 0).unwrap();
    doc.outline_mut().set_target_y(s12, 300.0).unwrap();
    doc.outline_mut().add_root("Chapter 2", 1);

    doc
}

#[test]
fn test_minimal_document_compiles_to_six_objects() {
    let mut doc = Document::new();
    doc.add_page()
        .add_element(text(72.0, 72.0, "Hello, world!"));
    let bytes = doc.compile_to_vec().unwrap();

    let (size, offsets) = parse_xref(&bytes);
    // header, info, outline root, page tree, page, one element
    assert_eq!(size, 7);
    assert_eq!(offsets.len(), 6);
    let out = String::from_utf8_lossy(&bytes);
    assert!(out.contains("6 0 obj"));
    assert!(!out.contains("7 0 obj"));
}

#[test]
fn test_offsets_point_at_object_markers() {
    let mut doc = rich_document();
    let bytes = doc.compile_to_vec().unwrap();

    let (size, offsets) = parse_xref(&bytes);
    assert_eq!(offsets.len(), size - 1);
    for (i, &offset) in offsets.iter().enumerate() {
        let id = i + 1;
        let marker = format!("{} 0 obj", id);
        assert!(
            bytes[offset..].starts_with(marker.as_bytes()),
            "object {} offset {} does not begin its fragment",
            id,
            offset
        );
    }
}

#[test]
fn test_offsets_are_strictly_increasing() {
    let mut doc = rich_document();
    let bytes = doc.compile_to_vec().unwrap();
    let (_, offsets) = parse_xref(&bytes);
    for pair in offsets.windows(2) {
        assert!(pair[0] < pair[1], "forward-only writing implies ascending offsets");
    }
}

#[test]
fn test_output_is_deterministic() {
    let a = rich_document().compile_to_vec().unwrap();
    let b = rich_document().compile_to_vec().unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_trailer_declares_root_info_and_size() {
    let mut doc = rich_document();
    let bytes = doc.compile_to_vec().unwrap();
    let (size, _) = parse_xref(&bytes);
    let out = String::from_utf8_lossy(&bytes);
    assert!(out.contains(&format!("/Size {}", size)));
    assert!(out.contains("/Root 1 0 R"));
    assert!(out.contains("/Info 2 0 R"));
    assert!(out.ends_with("%%EOF"));
    assert!(bytes.starts_with(b"%PDF-1.4\n"));
}

#[test]
fn test_persistent_header_and_marker_on_every_page() {
    let mut doc = rich_document();
    let bytes = doc.compile_to_vec().unwrap();
    let out = String::from_utf8_lossy(&bytes);

    let headers = out.matches("(HEADER) Tj").count();
    assert_eq!(headers, 2, "persistent element is copied onto both pages");
    assert!(out.contains("(Page 1 of 2) Tj"));
    assert!(out.contains("(Page 2 of 2) Tj"));
    // persistent content precedes the page's own on page 1
    assert!(find(bytes.as_ref(), b"(HEADER").unwrap() < find(bytes.as_ref(), b"(BODY").unwrap());
}

#[test]
fn test_metadata_and_page_mode() {
    let mut doc = rich_document();
    let bytes = doc.compile_to_vec().unwrap();
    let out = String::from_utf8_lossy(&bytes);
    assert!(out.contains("/Title (Quarterly Report)"));
    assert!(out.contains("/Author (Accounts)"));
    assert!(out.contains("/CreationDate (D:20240102030405Z)"));
    assert!(out.contains("/PageMode /UseOutlines"));
}

#[test]
fn test_bookmark_tree_links() {
    let mut doc = rich_document();
    let bytes = doc.compile_to_vec().unwrap();
    let out = String::from_utf8_lossy(&bytes);

    // DFS numbering: Ch1=4, S1.1=5, S1.2=6, Ch2=7
    assert!(out.contains("/Title (Chapter 1)"));
    assert!(out.contains("/First 4 0 R"));
    assert!(out.contains("/Last 7 0 R"));
    assert!(out.contains("/Parent 3 0 R"));
    assert!(out.contains("/First 5 0 R"));
    assert!(out.contains("/Next 7 0 R"));
    // a bookmark with a vertical target uses an XYZ destination
    assert!(out.contains("/XYZ"));
}

#[test]
fn test_fonts_in_output() {
    let mut doc = rich_document();
    let bytes = doc.compile_to_vec().unwrap();
    let out = String::from_utf8_lossy(&bytes);
    assert!(out.contains("/BaseFont /Helvetica"));
    assert!(out.contains("/BaseFont /Courier"));
    assert!(out.contains("/Encoding /WinAnsiEncoding"));
    // resource names use font numbers, not object ids
    assert!(out.contains("/F1 "));
    assert!(out.contains("/F2 "));
}

#[test]
fn test_image_with_soft_mask_in_output() {
    let mut doc = rich_document();
    let bytes = doc.compile_to_vec().unwrap();
    let out = String::from_utf8_lossy(&bytes);
    assert!(out.contains("/Subtype /Image"));
    assert!(out.contains("/SMask"));
    assert!(out.contains("/ColorSpace /DeviceGray"));
    assert!(out.contains("/ColorSpace /DeviceRGB"));
    assert!(out.contains("/Filter /FlateDecode"));
    assert!(out.contains("/Im0 "));
}

#[test]
fn test_annotations_listed_separately() {
    let mut doc = rich_document();
    let bytes = doc.compile_to_vec().unwrap();
    let out = String::from_utf8_lossy(&bytes);
    assert!(out.contains("/Annots ["));
    assert!(out.contains("/Subtype /Link"));
    assert!(out.contains("/URI (https://example.com)"));
    // the internal link resolves to a page object reference
    assert!(out.contains("/Fit]"));
}

#[test]
fn test_cropped_table_continuation_compiles() {
    let mut doc = Document::new();
    let mut table = Table::new();
    table.set_header_visible(false);
    table.add_column(100.0, Align::Left, VAlign::Top);
    for i in 0..10 {
        table.add_row().set_height(30.0);
        let font = doc.fonts_mut().get_or_create("Helvetica").unwrap();
        table
            .row_mut(i)
            .unwrap()
            .column_mut(0)
            .unwrap()
            .add_text(format!("row {}", i), font, 10.0);
    }
    let mut continuation = table.crop(100.0).unwrap();
    assert_eq!(table.row_count() + continuation.row_count(), 10);

    doc.add_page().add_table(&mut table, 50.0, 50.0);
    doc.add_page().add_table(&mut continuation, 50.0, 50.0);
    let bytes = doc.compile_to_vec().unwrap();
    let out = String::from_utf8_lossy(&bytes);
    assert!(out.contains("(row 0) Tj"));
    assert!(out.contains("(row 9) Tj"));
}

#[test]
fn test_save_writes_complete_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pdf");
    let mut doc = Document::new();
    doc.add_page().add_element(text(72.0, 72.0, "saved"));
    doc.save(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    assert!(bytes.ends_with(b"%%EOF"));
}
