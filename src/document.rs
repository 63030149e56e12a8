//! The document root aggregate.
//!
//! A [`Document`] owns its pages, persistent page, font registry,
//! bookmark outline and metadata, and is compiled as a unit. Layout and
//! numbering run to completion before serialization starts; the only
//! asynchronous work is image payload encoding, which must have
//! finished by the time the compiler reaches each image.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::elements::Element;
use crate::error::{Error, Result};
use crate::fonts::FontRegistry;
use crate::geometry::Color;
use crate::layout::{layout_paragraph, Align, ParagraphLine};
use crate::outline::Outline;
use crate::page::{Page, PageSize};
use crate::writer::compile;

/// Info dictionary metadata.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    /// Document title
    pub title: Option<String>,
    /// Author
    pub author: Option<String>,
    /// Subject
    pub subject: Option<String>,
    /// Keywords
    pub keywords: Option<String>,
    /// Creator application
    pub creator: Option<String>,
    /// Creation timestamp; `None` stamps the compile time
    pub creation_date: Option<DateTime<Utc>>,
}

/// Template for a per-page marker text element.
///
/// `{page}` and `{pages}` in the template expand to the 1-based page
/// number and the total page count. The expanded element is appended to
/// each page's element list at compile time, before the persistent
/// page's elements are prepended.
#[derive(Debug, Clone)]
pub struct PageMarker {
    /// Template text with `{page}`/`{pages}` placeholders
    pub template: String,
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Font number for the marker text
    pub font_number: u32,
    /// Font size in points
    pub size: f32,
    /// Text color
    pub color: Option<Color>,
}

impl PageMarker {
    /// Create a marker template in font number 1.
    pub fn new(template: impl Into<String>, x: f32, y: f32, size: f32) -> Self {
        Self {
            template: template.into(),
            x,
            y,
            font_number: 1,
            size,
            color: None,
        }
    }

    pub(crate) fn to_element(&self, page: usize, pages: usize) -> Element {
        let text = self
            .template
            .replace("{page}", &page.to_string())
            .replace("{pages}", &pages.to_string());
        let mut element = crate::elements::TextElement::new(self.x, self.y, text, self.size)
            .with_font(self.font_number);
        if let Some(color) = self.color {
            element = element.with_color(color);
        }
        Element::Text(element)
    }
}

/// A document being built.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub(crate) pages: Vec<Page>,
    pub(crate) persistent: Page,
    pub(crate) fonts: FontRegistry,
    pub(crate) outline: Outline,
    pub(crate) info: DocumentInfo,
    pub(crate) outline_visible: bool,
    pub(crate) page_marker: Option<PageMarker>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a default-size (A4) page.
    pub fn add_page(&mut self) -> &mut Page {
        self.add_page_sized(PageSize::default())
    }

    /// Append a page with a named preset size.
    pub fn add_page_sized(&mut self, size: PageSize) -> &mut Page {
        self.pages.push(Page::new(size));
        self.pages.last_mut().expect("pushed above")
    }

    /// Append a page with explicit dimensions in points.
    pub fn add_custom_page(&mut self, width: f32, height: f32) -> &mut Page {
        self.add_page_sized(PageSize::Custom(width, height))
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page by index.
    pub fn page(&self, index: usize) -> Result<&Page> {
        self.pages.get(index).ok_or(Error::BadIndex {
            kind: "page",
            index,
            len: self.pages.len(),
        })
    }

    /// Page by index, mutable.
    pub fn page_mut(&mut self, index: usize) -> Result<&mut Page> {
        let len = self.pages.len();
        self.pages.get_mut(index).ok_or(Error::BadIndex {
            kind: "page",
            index,
            len,
        })
    }

    /// The persistent page. Its elements are copied to the front of
    /// every page's element list at compile time.
    pub fn persistent_page_mut(&mut self) -> &mut Page {
        &mut self.persistent
    }

    /// The font registry.
    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    /// The font registry, mutable.
    pub fn fonts_mut(&mut self) -> &mut FontRegistry {
        &mut self.fonts
    }

    /// The bookmark outline.
    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    /// The bookmark outline, mutable.
    pub fn outline_mut(&mut self) -> &mut Outline {
        &mut self.outline
    }

    /// Document metadata, mutable.
    pub fn info_mut(&mut self) -> &mut DocumentInfo {
        &mut self.info
    }

    /// Open the bookmark panel when the document is viewed.
    pub fn set_outline_visible(&mut self, visible: bool) {
        self.outline_visible = visible;
    }

    /// Set or clear the per-page marker template.
    pub fn set_page_marker(&mut self, marker: Option<PageMarker>) {
        self.page_marker = marker;
    }

    /// Wrap `text` into paragraph lines using a registered font.
    ///
    /// Convenience over [`layout_paragraph`] that resolves the font by
    /// name through the registry (creating predefined fonts on first
    /// use). Returns the lines and the unconsumed remainder when
    /// `max_lines` (0 = unbounded) cuts the layout short.
    #[allow(clippy::too_many_arguments)]
    pub fn layout_paragraph(
        &mut self,
        text: &str,
        size: f32,
        font_name: &str,
        width: f32,
        max_lines: usize,
        line_height: f32,
        align: Align,
    ) -> Result<(Vec<ParagraphLine>, String)> {
        let font = self.fonts.get_or_create(font_name)?;
        Ok(layout_paragraph(
            text,
            size,
            font,
            width,
            max_lines,
            line_height,
            align,
        ))
    }

    /// Compile the document into `sink`.
    ///
    /// Numbering assigns every referenceable object a sequential ID,
    /// then a single forward pass writes each object exactly once while
    /// recording byte offsets for the cross-reference table. On failure
    /// the sink may hold partial output, which the caller should
    /// discard.
    pub fn compile<W: Write>(&mut self, sink: &mut W) -> Result<()> {
        compile(self, sink)
    }

    /// Compile the document into a byte vector.
    pub fn compile_to_vec(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.compile(&mut out)?;
        Ok(out)
    }

    /// Compile the document and write it to a file.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.compile_to_vec()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
