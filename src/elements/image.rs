//! Image placement and link annotation elements.

use std::sync::Arc;

use crate::geometry::Rect;
use crate::images::ImageRef;

/// Places an image (and its soft mask, if attached) on the page.
#[derive(Debug, Clone)]
pub struct ImageElement {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Placed width in points
    pub width: f32,
    /// Placed height in points
    pub height: f32,
    /// The image payload to paint
    pub image: Arc<ImageRef>,
}

impl ImageElement {
    /// Place `image` at the given position and size.
    pub fn new(x: f32, y: f32, width: f32, height: f32, image: Arc<ImageRef>) -> Self {
        Self {
            x,
            y,
            width,
            height,
            image,
        }
    }

    pub(crate) fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// What a link annotation does when activated.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationAction {
    /// Open an external URI
    Uri(String),
    /// Jump to a page of this document (0-based index)
    GoToPage(usize),
}

/// A clickable link region.
///
/// Unlike the other variants this never contributes to the page's
/// content streams; it becomes an entry in the page's annotation list.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationElement {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width of the active region
    pub width: f32,
    /// Height of the active region
    pub height: f32,
    /// Activation behavior
    pub action: AnnotationAction,
}

impl AnnotationElement {
    /// Create a link to an external URI.
    pub fn uri(x: f32, y: f32, width: f32, height: f32, uri: impl Into<String>) -> Self {
        Self {
            x,
            y,
            width,
            height,
            action: AnnotationAction::Uri(uri.into()),
        }
    }

    /// Create an internal link to a page (0-based index).
    pub fn goto_page(x: f32, y: f32, width: f32, height: f32, page: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            action: AnnotationAction::GoToPage(page),
        }
    }

    pub(crate) fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}
