//! Document compilation: numbering pass, forward-only serialization,
//! cross-reference table and trailer.
//!
//! Compilation runs in two phases. The numbering pass walks the whole
//! aggregate in one deterministic order and assigns every referenceable
//! object a sequential ID; element lists are finalized (page marker
//! appended, persistent elements prepended) and images discovered
//! before any ID in the affected step is handed out, because each
//! step's starting ID depends on exact counts from the previous ones.
//! The serializer then writes every object exactly once, in ID order,
//! recording the byte offset of each so the cross-reference table and
//! trailer can be emitted at the end without ever seeking backwards.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, trace};

use super::serializer::{serialize, serialize_indirect};
use crate::document::Document;
use crate::elements::{image_key, Element, Fragment, RenderContext};
use crate::error::{Error, Result};
use crate::fonts::{EmbeddedFontData, Font};
use crate::images::{EncodeMode, ImageRef};
use crate::object::Object;
use crate::outline::Outline;

const CATALOG_ID: u32 = 1;
const INFO_ID: u32 = 2;
const OUTLINE_ROOT_ID: u32 = 3;

/// Write adapter that tracks the total bytes written so far.
struct CountingWriter<'a, W: Write> {
    inner: &'a mut W,
    written: usize,
}

impl<'a, W: Write> CountingWriter<'a, W> {
    fn new(inner: &'a mut W) -> Self {
        Self { inner, written: 0 }
    }
}

impl<W: Write> Write for CountingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Cross-reference bookkeeping: every object's byte offset in ID order,
/// plus the offset at which the xref section itself starts.
struct Trailer {
    last_id: u32,
    offsets: Vec<(u32, usize)>,
}

impl Trailer {
    fn new(last_id: u32) -> Self {
        Self {
            last_id,
            offsets: Vec::with_capacity(last_id as usize),
        }
    }

    fn record(&mut self, id: u32, offset: usize) {
        debug_assert_eq!(id as usize, self.offsets.len() + 1, "IDs must be contiguous");
        self.offsets.push((id, offset));
    }

    /// Write the xref table, trailer dictionary and startxref pointer.
    fn finish<W: Write>(&self, w: &mut CountingWriter<'_, W>) -> Result<()> {
        let xref_start = w.written;
        debug!(
            "writing xref for {} objects at offset {}",
            self.last_id, xref_start
        );

        writeln!(w, "xref")?;
        writeln!(w, "0 {}", self.last_id + 1)?;
        // Entry 0 is the conventional free-list head
        writeln!(w, "0000000000 65535 f ")?;
        for (_, offset) in &self.offsets {
            writeln!(w, "{:010} 00000 n ", offset)?;
        }

        let dict = Object::dict(vec![
            ("Size", Object::Integer(self.last_id as i64 + 1)),
            ("Root", Object::reference(CATALOG_ID)),
            ("Info", Object::reference(INFO_ID)),
        ]);
        writeln!(w, "trailer")?;
        w.write_all(&serialize(&dict))?;
        writeln!(w)?;
        writeln!(w, "startxref")?;
        writeln!(w, "{}", xref_start)?;
        write!(w, "%%EOF")?;
        Ok(())
    }
}

/// A bookmark with its links resolved to plain object IDs.
struct NumberedBookmark {
    id: u32,
    title: String,
    page: usize,
    y: Option<f32>,
    parent: u32,
    prev: u32,
    next: u32,
    first: u32,
    last: u32,
    descendants: usize,
}

/// Everything the serializer needs, produced by the numbering pass.
struct Plan {
    finalized: Vec<Vec<Element>>,
    bookmarks: Vec<NumberedBookmark>,
    font_ids: Vec<u32>,
    page_tree_id: u32,
    page_ids: Vec<u32>,
    element_ids: Vec<Vec<u32>>,
    images: Vec<(u32, Arc<ImageRef>)>,
    image_ids: HashMap<usize, u32>,
    image_names: HashMap<usize, String>,
    last_id: u32,
}

/// Assign `index`'s subtree IDs depth-first: the node takes the next
/// free ID before its children, then first/last and the children's
/// sibling links are backfilled once the subtree is numbered.
fn number_bookmark(
    outline: &Outline,
    index: usize,
    parent_id: u32,
    next_id: &mut u32,
    out: &mut Vec<NumberedBookmark>,
) {
    let node = outline.node(index);
    let id = *next_id;
    *next_id += 1;
    let slot = out.len();
    out.push(NumberedBookmark {
        id,
        title: node.title.clone(),
        page: node.page,
        y: node.y,
        parent: parent_id,
        prev: 0,
        next: 0,
        first: 0,
        last: 0,
        descendants: outline.subtree_size(index) - 1,
    });

    let mut child_slots = Vec::with_capacity(node.children.len());
    for &child in &node.children {
        child_slots.push(out.len());
        number_bookmark(outline, child, id, next_id, out);
    }

    if let (Some(&first), Some(&last)) = (child_slots.first(), child_slots.last()) {
        out[slot].first = out[first].id;
        out[slot].last = out[last].id;
    }
    for pair in child_slots.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let id_b = out[b].id;
        out[a].next = id_b;
        out[b].prev = out[a].id;
    }
}

fn build_plan(doc: &mut Document) -> Plan {
    // Finalize every page's element list before any counting: append
    // the page marker, then splice the persistent elements in front
    let page_count = doc.pages.len();
    let mut finalized: Vec<Vec<Element>> = Vec::with_capacity(page_count);
    for (i, page) in doc.pages.iter().enumerate() {
        let mut list =
            Vec::with_capacity(doc.persistent.elements().len() + page.elements().len() + 1);
        list.extend(doc.persistent.elements().iter().cloned());
        list.extend(page.elements().iter().cloned());
        if let Some(marker) = &doc.page_marker {
            list.push(marker.to_element(i + 1, page_count));
        }
        finalized.push(list);
    }

    // Embedded fonts must see every placed text run before their
    // subset data serializes, which happens ahead of the pages
    for list in &finalized {
        for element in list {
            match element {
                Element::Text(t) => doc.fonts.record_usage_by_number(t.font_number, &t.text),
                Element::Paragraph(p) => {
                    for line in &p.lines {
                        doc.fonts.record_usage_by_number(line.font_number, &line.text);
                    }
                },
                _ => {},
            }
        }
    }

    let mut next_id = OUTLINE_ROOT_ID + 1;

    // Bookmarks: depth-first, parent before subtree, roots linked as
    // siblings of each other under the outline root
    let mut bookmarks = Vec::with_capacity(doc.outline.len());
    let mut root_slots = Vec::with_capacity(doc.outline.roots().len());
    for &root in doc.outline.roots() {
        root_slots.push(bookmarks.len());
        number_bookmark(&doc.outline, root, OUTLINE_ROOT_ID, &mut next_id, &mut bookmarks);
    }
    for pair in root_slots.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let id_b = bookmarks[b].id;
        bookmarks[a].next = id_b;
        bookmarks[b].prev = bookmarks[a].id;
    }

    // Fonts in registration order: one ID for a predefined font, five
    // consecutive for an embedded one
    let mut font_ids = Vec::with_capacity(doc.fonts.len());
    for font in doc.fonts.iter() {
        font_ids.push(next_id);
        next_id += font.object_count();
    }

    let page_tree_id = next_id;
    next_id += 1;

    let mut page_ids = Vec::with_capacity(page_count);
    let mut element_ids = Vec::with_capacity(page_count);
    for list in &finalized {
        page_ids.push(next_id);
        next_id += 1;
        let ids: Vec<u32> = list
            .iter()
            .map(|_| {
                let id = next_id;
                next_id += 1;
                id
            })
            .collect();
        element_ids.push(ids);
    }

    // Images in first-encountered order; an image's mask is numbered
    // immediately before the image that owns it
    let mut images: Vec<(u32, Arc<ImageRef>)> = Vec::new();
    let mut image_ids: HashMap<usize, u32> = HashMap::new();
    for list in &finalized {
        for element in list {
            if let Some(image) = element.image() {
                let key = image_key(image);
                if image_ids.contains_key(&key) {
                    continue;
                }
                if let Some(mask) = image.mask() {
                    let mask_key = image_key(mask);
                    if !image_ids.contains_key(&mask_key) {
                        image_ids.insert(mask_key, next_id);
                        images.push((next_id, Arc::clone(mask)));
                        next_id += 1;
                    }
                }
                image_ids.insert(key, next_id);
                images.push((next_id, Arc::clone(image)));
                next_id += 1;
            }
        }
    }
    let image_names: HashMap<usize, String> = images
        .iter()
        .enumerate()
        .map(|(i, (_, image))| (image_key(image), format!("Im{}", i)))
        .collect();

    let last_id = next_id - 1;
    debug!(
        "numbered {} objects: {} bookmarks, {} fonts, {} pages, {} elements, {} images",
        last_id,
        bookmarks.len(),
        doc.fonts.len(),
        page_count,
        element_ids.iter().map(Vec::len).sum::<usize>(),
        images.len()
    );

    Plan {
        finalized,
        bookmarks,
        font_ids,
        page_tree_id,
        page_ids,
        element_ids,
        images,
        image_ids,
        image_names,
        last_id,
    }
}

fn write_object<W: Write>(
    w: &mut CountingWriter<'_, W>,
    trailer: &mut Trailer,
    id: u32,
    obj: &Object,
) -> Result<()> {
    trailer.record(id, w.written);
    trace!("object {} at offset {}", id, w.written);
    w.write_all(&serialize_indirect(id, obj))?;
    Ok(())
}

fn flate_compress(data: &[u8]) -> Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn info_object(doc: &Document) -> Object {
    let info = &doc.info;
    let mut entries = Vec::new();
    if let Some(title) = &info.title {
        entries.push(("Title", Object::string(title)));
    }
    if let Some(author) = &info.author {
        entries.push(("Author", Object::string(author)));
    }
    if let Some(subject) = &info.subject {
        entries.push(("Subject", Object::string(subject)));
    }
    if let Some(keywords) = &info.keywords {
        entries.push(("Keywords", Object::string(keywords)));
    }
    if let Some(creator) = &info.creator {
        entries.push(("Creator", Object::string(creator)));
    }
    entries.push((
        "Producer",
        Object::string(concat!(
            env!("CARGO_PKG_NAME"),
            " ",
            env!("CARGO_PKG_VERSION")
        )),
    ));
    let date = info.creation_date.unwrap_or_else(Utc::now);
    entries.push((
        "CreationDate",
        Object::string(&format!("D:{}Z", date.format("%Y%m%d%H%M%S"))),
    ));
    Object::dict(entries)
}

fn bookmark_object(doc: &Document, plan: &Plan, nb: &NumberedBookmark) -> Result<Object> {
    let page_id = plan.page_ids.get(nb.page).copied().ok_or(Error::BadIndex {
        kind: "page",
        index: nb.page,
        len: plan.page_ids.len(),
    })?;
    let dest = match nb.y {
        Some(y) => {
            let top = doc.pages[nb.page].height() - y;
            Object::Array(vec![
                Object::reference(page_id),
                Object::name("XYZ"),
                Object::Null,
                Object::Real(top as f64),
                Object::Null,
            ])
        },
        None => Object::Array(vec![Object::reference(page_id), Object::name("Fit")]),
    };

    let mut entries = vec![
        ("Title", Object::string(&nb.title)),
        ("Parent", Object::reference(nb.parent)),
        ("Dest", dest),
    ];
    if nb.first != 0 {
        entries.push(("First", Object::reference(nb.first)));
        entries.push(("Last", Object::reference(nb.last)));
    }
    if nb.prev != 0 {
        entries.push(("Prev", Object::reference(nb.prev)));
    }
    if nb.next != 0 {
        entries.push(("Next", Object::reference(nb.next)));
    }
    if nb.descendants > 0 {
        entries.push(("Count", Object::Integer(nb.descendants as i64)));
    }
    Ok(Object::dict(entries))
}

fn write_standard_font<W: Write>(
    w: &mut CountingWriter<'_, W>,
    trailer: &mut Trailer,
    id: u32,
    font: &Font,
) -> Result<()> {
    let obj = Object::dict(vec![
        ("Type", Object::name("Font")),
        ("Subtype", Object::name("Type1")),
        ("BaseFont", Object::name(font.name())),
        ("Encoding", Object::name("WinAnsiEncoding")),
    ]);
    write_object(w, trailer, id, &obj)
}

/// Write an embedded font's five objects: font dictionary, descriptor,
/// descendant CIDFont, ToUnicode map, font program.
fn write_embedded_font<W: Write>(
    w: &mut CountingWriter<'_, W>,
    trailer: &mut Trailer,
    first_id: u32,
    font: &Font,
    data: &EmbeddedFontData,
) -> Result<()> {
    let base = format!("{}+{}", data.subset_tag(), font.name());
    let (dict_id, desc_id, cid_id, unicode_id, file_id) =
        (first_id, first_id + 1, first_id + 2, first_id + 3, first_id + 4);

    let font_dict = Object::dict(vec![
        ("Type", Object::name("Font")),
        ("Subtype", Object::name("Type0")),
        ("BaseFont", Object::name(&base)),
        ("Encoding", Object::name("Identity-H")),
        (
            "DescendantFonts",
            Object::Array(vec![Object::reference(cid_id)]),
        ),
        ("ToUnicode", Object::reference(unicode_id)),
    ]);
    write_object(w, trailer, dict_id, &font_dict)?;

    let (llx, lly, urx, ury) = data.bbox;
    let descriptor = Object::dict(vec![
        ("Type", Object::name("FontDescriptor")),
        ("FontName", Object::name(&base)),
        ("Flags", Object::Integer(4)),
        (
            "FontBBox",
            Object::Array(vec![
                Object::Integer(llx as i64),
                Object::Integer(lly as i64),
                Object::Integer(urx as i64),
                Object::Integer(ury as i64),
            ]),
        ),
        ("ItalicAngle", Object::Integer(0)),
        ("Ascent", Object::Integer(data.ascender as i64)),
        ("Descent", Object::Integer(data.descender as i64)),
        ("CapHeight", Object::Integer(data.cap_height as i64)),
        ("StemV", Object::Integer(80)),
        ("FontFile2", Object::reference(file_id)),
    ]);
    write_object(w, trailer, desc_id, &descriptor)?;

    let mut w_array = Vec::new();
    for (start, widths) in data.width_runs() {
        w_array.push(Object::Integer(start as i64));
        w_array.push(Object::Array(
            widths.into_iter().map(|v| Object::Integer(v as i64)).collect(),
        ));
    }
    let descendant = Object::dict(vec![
        ("Type", Object::name("Font")),
        ("Subtype", Object::name("CIDFontType2")),
        ("BaseFont", Object::name(&base)),
        (
            "CIDSystemInfo",
            Object::dict(vec![
                ("Registry", Object::string("Adobe")),
                ("Ordering", Object::string("Identity")),
                ("Supplement", Object::Integer(0)),
            ]),
        ),
        ("FontDescriptor", Object::reference(desc_id)),
        ("DW", Object::Integer(500)),
        ("W", Object::Array(w_array)),
        ("CIDToGIDMap", Object::name("Identity")),
    ]);
    write_object(w, trailer, cid_id, &descendant)?;

    let cmap = flate_compress(data.to_unicode_cmap().as_bytes())?;
    let mut cmap_dict = HashMap::new();
    cmap_dict.insert("Filter".to_string(), Object::name("FlateDecode"));
    write_object(
        w,
        trailer,
        unicode_id,
        &Object::Stream {
            dict: cmap_dict,
            data: bytes::Bytes::from(cmap),
        },
    )?;

    let raw_len = data.program().len();
    let program = flate_compress(data.program())?;
    let mut file_dict = HashMap::new();
    file_dict.insert("Filter".to_string(), Object::name("FlateDecode"));
    file_dict.insert("Length1".to_string(), Object::Integer(raw_len as i64));
    write_object(
        w,
        trailer,
        file_id,
        &Object::Stream {
            dict: file_dict,
            data: bytes::Bytes::from(program),
        },
    )?;
    Ok(())
}

fn image_object(plan: &Plan, image: &Arc<ImageRef>) -> Result<Object> {
    // The single synchronization point with the encode task: the
    // payload must be finished by the time its object is written
    let payload = image.payload()?;

    let mut dict = HashMap::new();
    dict.insert("Type".to_string(), Object::name("XObject"));
    dict.insert("Subtype".to_string(), Object::name("Image"));
    dict.insert("Width".to_string(), Object::Integer(image.width() as i64));
    dict.insert("Height".to_string(), Object::Integer(image.height() as i64));
    dict.insert("BitsPerComponent".to_string(), Object::Integer(8));
    let (color_space, filter) = match image.mode() {
        EncodeMode::Lossy => ("DeviceRGB", "DCTDecode"),
        EncodeMode::LosslessRgb => ("DeviceRGB", "FlateDecode"),
        EncodeMode::LosslessAlpha => ("DeviceGray", "FlateDecode"),
    };
    dict.insert("ColorSpace".to_string(), Object::name(color_space));
    dict.insert("Filter".to_string(), Object::name(filter));
    if let Some(mask) = image.mask() {
        let mask_id = plan.image_ids[&image_key(mask)];
        dict.insert("SMask".to_string(), Object::reference(mask_id));
    }
    Ok(Object::Stream {
        dict,
        data: payload.clone(),
    })
}

/// Compile `doc` into `sink`.
pub(crate) fn compile<W: Write>(doc: &mut Document, sink: &mut W) -> Result<()> {
    let plan = build_plan(doc);
    let doc: &Document = doc;
    let mut w = CountingWriter::new(sink);
    let mut trailer = Trailer::new(plan.last_id);

    w.write_all(b"%PDF-1.4\n")?;
    // Binary marker so transports treat the file as binary
    w.write_all(b"%\xE2\xE3\xCF\xD3\n")?;

    // Catalog
    let mut catalog = vec![
        ("Type", Object::name("Catalog")),
        ("Pages", Object::reference(plan.page_tree_id)),
        ("Outlines", Object::reference(OUTLINE_ROOT_ID)),
    ];
    if doc.outline_visible {
        catalog.push(("PageMode", Object::name("UseOutlines")));
    }
    write_object(&mut w, &mut trailer, CATALOG_ID, &Object::dict(catalog))?;

    // Info
    write_object(&mut w, &mut trailer, INFO_ID, &info_object(doc))?;

    // Outline root
    let mut root_entries = vec![
        ("Type", Object::name("Outlines")),
        ("Count", Object::Integer(plan.bookmarks.len() as i64)),
    ];
    if !plan.bookmarks.is_empty() {
        let first = plan.bookmarks[0].id;
        let last = plan
            .bookmarks
            .iter()
            .filter(|b| b.parent == OUTLINE_ROOT_ID)
            .map(|b| b.id)
            .last()
            .expect("non-empty outline has a root");
        root_entries.push(("First", Object::reference(first)));
        root_entries.push(("Last", Object::reference(last)));
    }
    write_object(
        &mut w,
        &mut trailer,
        OUTLINE_ROOT_ID,
        &Object::dict(root_entries),
    )?;

    // Bookmark nodes in ID order
    for nb in &plan.bookmarks {
        let obj = bookmark_object(doc, &plan, nb)?;
        write_object(&mut w, &mut trailer, nb.id, &obj)?;
    }

    // Fonts in registration order
    for (font, &first_id) in doc.fonts.iter().zip(&plan.font_ids) {
        match font.embedded() {
            None => write_standard_font(&mut w, &mut trailer, first_id, font)?,
            Some(data) => write_embedded_font(&mut w, &mut trailer, first_id, font, data)?,
        }
    }

    // Page tree
    let kids: Vec<Object> = plan.page_ids.iter().map(|&id| Object::reference(id)).collect();
    let page_tree = Object::dict(vec![
        ("Type", Object::name("Pages")),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(plan.page_ids.len() as i64)),
    ]);
    write_object(&mut w, &mut trailer, plan.page_tree_id, &page_tree)?;

    // Shared resource dictionaries: every page sees all fonts and all
    // images under stable names
    let font_resources: HashMap<String, Object> = doc
        .fonts
        .iter()
        .zip(&plan.font_ids)
        .map(|(font, &id)| (format!("F{}", font.number()), Object::reference(id)))
        .collect();
    let xobject_resources: HashMap<String, Object> = plan
        .images
        .iter()
        .map(|(id, image)| {
            (
                plan.image_names[&image_key(image)].clone(),
                Object::reference(*id),
            )
        })
        .collect();

    // Pages, each followed by its elements
    for (pi, list) in plan.finalized.iter().enumerate() {
        let page = &doc.pages[pi];
        let ids = &plan.element_ids[pi];

        let mut content_ids = Vec::new();
        let mut annot_ids = Vec::new();
        for (element, &id) in list.iter().zip(ids) {
            if element.is_annotation() {
                annot_ids.push(id);
            } else {
                content_ids.push(id);
            }
        }

        let mut resources = vec![("Font", Object::Dictionary(font_resources.clone()))];
        if !xobject_resources.is_empty() {
            resources.push(("XObject", Object::Dictionary(xobject_resources.clone())));
        }
        let mut page_entries = vec![
            ("Type", Object::name("Page")),
            ("Parent", Object::reference(plan.page_tree_id)),
            (
                "MediaBox",
                Object::rect(0.0, 0.0, page.width() as f64, page.height() as f64),
            ),
            ("Resources", Object::dict(resources)),
        ];
        if !content_ids.is_empty() {
            page_entries.push((
                "Contents",
                Object::Array(content_ids.iter().map(|&id| Object::reference(id)).collect()),
            ));
        }
        if !annot_ids.is_empty() {
            page_entries.push((
                "Annots",
                Object::Array(annot_ids.iter().map(|&id| Object::reference(id)).collect()),
            ));
        }
        write_object(&mut w, &mut trailer, plan.page_ids[pi], &Object::dict(page_entries))?;

        let ctx = RenderContext {
            page_height: page.height(),
            fonts: &doc.fonts,
            image_names: &plan.image_names,
            page_ids: &plan.page_ids,
        };
        for (element, &id) in list.iter().zip(ids) {
            let obj = match element.render(&ctx)? {
                Fragment::Content(bytes) => Object::Stream {
                    dict: HashMap::new(),
                    data: bytes::Bytes::from(bytes),
                },
                Fragment::Annotation(obj) => obj,
            };
            write_object(&mut w, &mut trailer, id, &obj)?;
        }
    }

    // Images (masks precede their owners by construction)
    for (id, image) in &plan.images {
        let obj = image_object(&plan, image)?;
        write_object(&mut w, &mut trailer, *id, &obj)?;
    }

    trailer.finish(&mut w)?;
    Ok(())
}
