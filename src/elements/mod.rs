//! Drawable element variants.
//!
//! The element set is closed: a page holds a list of these and nothing
//! else, and each variant knows how to render its own content fragment.
//! All variants except [`AnnotationElement`] render into a page content
//! stream; annotations render into annotation dictionary objects and
//! are collected into the page's annotation list instead.

mod image;
mod shapes;
mod text;

pub use image::{AnnotationAction, AnnotationElement, ImageElement};
pub use shapes::{CircleElement, LineElement, RectElement};
pub use text::{ParagraphElement, TextElement};

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::fonts::FontRegistry;
use crate::geometry::Rect;
use crate::images::ImageRef;
use crate::object::Object;
use crate::writer::content::ContentBuilder;

/// Any drawable element.
#[derive(Debug, Clone)]
pub enum Element {
    /// Single text run
    Text(TextElement),
    /// Laid-out paragraph block
    Paragraph(ParagraphElement),
    /// Rectangle
    Rectangle(RectElement),
    /// Circle
    Circle(CircleElement),
    /// Straight line
    Line(LineElement),
    /// Placed image
    Image(ImageElement),
    /// Link annotation (kept out of the content stream)
    Annotation(AnnotationElement),
}

/// Everything a fragment render needs to resolve references.
pub(crate) struct RenderContext<'a> {
    /// Height of the page being rendered (for top-left → bottom-left
    /// coordinate conversion)
    pub page_height: f32,
    /// Font registry, for embedded-font text encoding
    pub fonts: &'a FontRegistry,
    /// XObject resource name per image (keyed by [`image_key`])
    pub image_names: &'a HashMap<usize, String>,
    /// Page object IDs in page order, for internal link targets
    pub page_ids: &'a [u32],
}

/// A rendered fragment: either content-stream bytes or a complete
/// annotation dictionary.
#[derive(Debug)]
pub(crate) enum Fragment {
    /// Bytes for a content stream object
    Content(Vec<u8>),
    /// Dictionary for an annotation object
    Annotation(Object),
}

/// Document-wide identity of a shared image.
pub(crate) fn image_key(image: &Arc<ImageRef>) -> usize {
    Arc::as_ptr(image) as usize
}

impl Element {
    /// Whether this element belongs in the annotation list instead of
    /// the content stream list.
    pub fn is_annotation(&self) -> bool {
        matches!(self, Element::Annotation(_))
    }

    /// Intrinsic bounding box in top-left user space.
    pub fn bounds(&self) -> Rect {
        match self {
            Element::Text(e) => e.bounds(),
            Element::Paragraph(e) => e.bounds(),
            Element::Rectangle(e) => e.bounds(),
            Element::Circle(e) => e.bounds(),
            Element::Line(e) => e.bounds(),
            Element::Image(e) => e.bounds(),
            Element::Annotation(e) => e.bounds(),
        }
    }

    /// The image this element places, if any.
    pub(crate) fn image(&self) -> Option<&Arc<ImageRef>> {
        match self {
            Element::Image(e) => Some(&e.image),
            _ => None,
        }
    }

    /// Render this element's fragment.
    pub(crate) fn render(&self, ctx: &RenderContext<'_>) -> Result<Fragment> {
        match self {
            Element::Text(e) => Ok(Fragment::Content(render_text(e, ctx))),
            Element::Paragraph(e) => Ok(Fragment::Content(render_paragraph(e, ctx))),
            Element::Rectangle(e) => Ok(Fragment::Content(render_rect(e, ctx))),
            Element::Circle(e) => Ok(Fragment::Content(render_circle(e, ctx))),
            Element::Line(e) => Ok(Fragment::Content(render_line(e, ctx))),
            Element::Image(e) => render_image(e, ctx).map(Fragment::Content),
            Element::Annotation(e) => render_annotation(e, ctx).map(Fragment::Annotation),
        }
    }
}

fn show_text(b: &mut ContentBuilder, ctx: &RenderContext<'_>, font_number: u32, text: &str) {
    match ctx.fonts.by_number(font_number).and_then(|f| f.embedded()) {
        Some(embedded) => {
            b.show_text_hex(&embedded.encode_hex(text));
        },
        None => {
            b.show_text_literal(text);
        },
    }
}

fn render_text(e: &TextElement, ctx: &RenderContext<'_>) -> Vec<u8> {
    let mut b = ContentBuilder::new();
    b.begin_text();
    if let Some(color) = e.color {
        b.set_fill_color(color);
    }
    b.set_font(e.font_number, e.size);
    // Baseline sits one em below the element's top edge
    b.text_position(e.x, ctx.page_height - e.y - e.size);
    show_text(&mut b, ctx, e.font_number, &e.text);
    b.end_text();
    b.finish()
}

fn render_paragraph(e: &ParagraphElement, ctx: &RenderContext<'_>) -> Vec<u8> {
    let mut b = ContentBuilder::new();
    let mut cursor = e.y;
    for line in &e.lines {
        cursor += line.top_margin;
        if line.text.is_empty() {
            continue;
        }
        b.begin_text();
        if let Some(color) = e.color {
            b.set_fill_color(color);
        }
        b.set_font(line.font_number, line.font_size);
        b.text_position(e.x + line.left_margin, ctx.page_height - cursor);
        show_text(&mut b, ctx, line.font_number, &line.text);
        b.end_text();
    }
    b.finish()
}

/// Emit the paint operator matching the element's stroke/fill colors.
fn paint_shape(b: &mut ContentBuilder, stroke: Option<crate::geometry::Color>, fill: Option<crate::geometry::Color>) {
    match (stroke, fill) {
        (Some(_), Some(_)) => {
            b.fill_stroke();
        },
        (Some(_), None) => {
            b.stroke();
        },
        (None, Some(_)) => {
            b.fill();
        },
        (None, None) => {},
    }
}

fn render_rect(e: &RectElement, ctx: &RenderContext<'_>) -> Vec<u8> {
    let mut b = ContentBuilder::new();
    if e.stroke.is_none() && e.fill.is_none() {
        return b.finish();
    }
    b.save_state();
    if let Some(stroke) = e.stroke {
        b.set_stroke_color(stroke);
        b.set_line_width(e.line_width);
    }
    if let Some(fill) = e.fill {
        b.set_fill_color(fill);
    }
    b.rect(e.x, ctx.page_height - e.y - e.height, e.width, e.height);
    paint_shape(&mut b, e.stroke, e.fill);
    b.restore_state();
    b.finish()
}

fn render_circle(e: &CircleElement, ctx: &RenderContext<'_>) -> Vec<u8> {
    let mut b = ContentBuilder::new();
    if e.stroke.is_none() && e.fill.is_none() {
        return b.finish();
    }
    b.save_state();
    if let Some(stroke) = e.stroke {
        b.set_stroke_color(stroke);
        b.set_line_width(e.line_width);
    }
    if let Some(fill) = e.fill {
        b.set_fill_color(fill);
    }

    // Approximate the circle with four cubic Bézier quadrants
    let k = e.radius * 0.552_284_8;
    let (cx, cy) = (e.cx, ctx.page_height - e.cy);
    let r = e.radius;
    b.move_to(cx + r, cy);
    b.curve_to(cx + r, cy + k, cx + k, cy + r, cx, cy + r);
    b.curve_to(cx - k, cy + r, cx - r, cy + k, cx - r, cy);
    b.curve_to(cx - r, cy - k, cx - k, cy - r, cx, cy - r);
    b.curve_to(cx + k, cy - r, cx + r, cy - k, cx + r, cy);
    b.close_path();
    paint_shape(&mut b, e.stroke, e.fill);
    b.restore_state();
    b.finish()
}

fn render_line(e: &LineElement, ctx: &RenderContext<'_>) -> Vec<u8> {
    let mut b = ContentBuilder::new();
    b.save_state();
    b.set_stroke_color(e.color);
    b.set_line_width(e.line_width);
    if let Some((on, off)) = e.dash {
        b.set_dash(on, off);
    }
    b.move_to(e.x1, ctx.page_height - e.y1);
    b.line_to(e.x2, ctx.page_height - e.y2);
    b.stroke();
    b.restore_state();
    b.finish()
}

fn render_image(e: &ImageElement, ctx: &RenderContext<'_>) -> Result<Vec<u8>> {
    let name = ctx
        .image_names
        .get(&image_key(&e.image))
        .ok_or_else(|| Error::ImageEncode("image was not numbered".to_string()))?;
    let mut b = ContentBuilder::new();
    b.save_state();
    // Unit image space scaled to the placed size, origin at bottom-left
    b.transform(
        e.width,
        0.0,
        0.0,
        e.height,
        e.x,
        ctx.page_height - e.y - e.height,
    );
    b.paint_xobject(name);
    b.restore_state();
    Ok(b.finish())
}

fn render_annotation(e: &AnnotationElement, ctx: &RenderContext<'_>) -> Result<Object> {
    let rect = Object::rect(
        e.x as f64,
        (ctx.page_height - e.y - e.height) as f64,
        (e.x + e.width) as f64,
        (ctx.page_height - e.y) as f64,
    );
    let action = match &e.action {
        AnnotationAction::Uri(uri) => (
            "A",
            Object::dict(vec![
                ("Type", Object::name("Action")),
                ("S", Object::name("URI")),
                ("URI", Object::string(uri)),
            ]),
        ),
        AnnotationAction::GoToPage(page) => {
            let page_id = ctx.page_ids.get(*page).copied().ok_or(Error::BadIndex {
                kind: "page",
                index: *page,
                len: ctx.page_ids.len(),
            })?;
            (
                "Dest",
                Object::Array(vec![Object::reference(page_id), Object::name("Fit")]),
            )
        },
    };
    Ok(Object::dict(vec![
        ("Type", Object::name("Annot")),
        ("Subtype", Object::name("Link")),
        ("Rect", rect),
        (
            "Border",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(0),
            ]),
        ),
        action,
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(
        fonts: &'a FontRegistry,
        names: &'a HashMap<usize, String>,
        page_ids: &'a [u32],
    ) -> RenderContext<'a> {
        RenderContext {
            page_height: 800.0,
            fonts,
            image_names: names,
            page_ids,
        }
    }

    #[test]
    fn test_text_fragment_flips_y() {
        let fonts = FontRegistry::new();
        let names = HashMap::new();
        let e = TextElement::new(72.0, 100.0, "Hello", 12.0);
        let frag = Element::Text(e).render(&ctx(&fonts, &names, &[])).unwrap();
        let bytes = match frag {
            Fragment::Content(b) => b,
            _ => panic!("expected content"),
        };
        let s = String::from_utf8(bytes).unwrap();
        // 800 - 100 - 12 = 688
        assert!(s.contains("72 688 Td"));
        assert!(s.contains("(Hello) Tj"));
    }

    #[test]
    fn test_annotation_is_segregated() {
        let e = Element::Annotation(AnnotationElement::uri(0.0, 0.0, 10.0, 10.0, "https://x"));
        assert!(e.is_annotation());
        let fonts = FontRegistry::new();
        let names = HashMap::new();
        match e.render(&ctx(&fonts, &names, &[])).unwrap() {
            Fragment::Annotation(Object::Dictionary(d)) => {
                assert!(d.contains_key("A"));
            },
            _ => panic!("expected annotation dictionary"),
        }
    }

    #[test]
    fn test_goto_annotation_out_of_range() {
        let e = Element::Annotation(AnnotationElement::goto_page(0.0, 0.0, 10.0, 10.0, 4));
        let fonts = FontRegistry::new();
        let names = HashMap::new();
        let err = e.render(&ctx(&fonts, &names, &[5, 6])).unwrap_err();
        assert!(matches!(err, Error::BadIndex { kind: "page", .. }));
    }

    #[test]
    fn test_rect_with_no_colors_renders_nothing() {
        let e = RectElement::new(0.0, 0.0, 10.0, 10.0)
            .with_stroke(None)
            .with_fill(None);
        let fonts = FontRegistry::new();
        let names = HashMap::new();
        match Element::Rectangle(e).render(&ctx(&fonts, &names, &[])).unwrap() {
            Fragment::Content(bytes) => assert!(bytes.is_empty()),
            _ => panic!("expected content"),
        }
    }

    #[test]
    fn test_line_dash_pattern_present() {
        let e = LineElement::new(0.0, 0.0, 10.0, 0.0).with_dash(4.0, 2.0);
        let fonts = FontRegistry::new();
        let names = HashMap::new();
        match Element::Line(e).render(&ctx(&fonts, &names, &[])).unwrap() {
            Fragment::Content(bytes) => {
                assert!(String::from_utf8(bytes).unwrap().contains("[4 2] 0 d"));
            },
            _ => panic!("expected content"),
        }
    }
}
