//! Pages and page sizes.

use crate::elements::Element;
use crate::layout::Table;

/// Page dimensions, in points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PageSize {
    /// 595 × 842 (ISO A4)
    #[default]
    A4,
    /// 612 × 792 (US Letter)
    Letter,
    /// 612 × 1008 (US Legal)
    Legal,
    /// Explicit width × height
    Custom(f32, f32),
}

impl PageSize {
    /// Width and height in points.
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.0, 842.0),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom(w, h) => (*w, *h),
        }
    }
}

/// A page: fixed dimensions plus an ordered element list.
///
/// Content and annotation elements interleave in insertion order; the
/// compiler separates them when the page serializes. The document's
/// persistent page uses this same type: its elements are copied onto
/// every page at compile time and it never serializes on its own.
#[derive(Debug, Clone)]
pub struct Page {
    width: f32,
    height: f32,
    elements: Vec<Element>,
}

impl Default for Page {
    fn default() -> Self {
        Page::new(PageSize::default())
    }
}

impl Page {
    /// Create a page of the given size. Dimensions are fixed for the
    /// page's lifetime.
    pub fn new(size: PageSize) -> Self {
        let (width, height) = size.dimensions();
        Self {
            width,
            height,
            elements: Vec::new(),
        }
    }

    /// Page width in points.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Page height in points.
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Append an element.
    pub fn add_element(&mut self, element: Element) -> &mut Self {
        self.elements.push(element);
        self
    }

    /// Lay out a table at `(x, y)` and append its elements.
    pub fn add_table(&mut self, table: &mut Table, x: f32, y: f32) -> &mut Self {
        for element in table.layout_elements(x, y) {
            self.elements.push(element);
        }
        self
    }

    /// Elements in insertion order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::TextElement;

    #[test]
    fn test_page_size_presets() {
        assert_eq!(PageSize::A4.dimensions(), (595.0, 842.0));
        assert_eq!(PageSize::Letter.dimensions(), (612.0, 792.0));
        assert_eq!(PageSize::Custom(100.0, 200.0).dimensions(), (100.0, 200.0));
    }

    #[test]
    fn test_elements_keep_insertion_order() {
        let mut page = Page::new(PageSize::A4);
        page.add_element(Element::Text(TextElement::new(0.0, 0.0, "a", 10.0)));
        page.add_element(Element::Text(TextElement::new(0.0, 20.0, "b", 10.0)));
        assert_eq!(page.elements().len(), 2);
        match &page.elements()[0] {
            Element::Text(t) => assert_eq!(t.text, "a"),
            _ => panic!("expected text"),
        }
    }
}
