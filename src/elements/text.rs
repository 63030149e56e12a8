//! Text and paragraph elements.

use crate::geometry::{Color, Rect};
use crate::layout::ParagraphLine;

/// A single run of text at a fixed position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextElement {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Text to show
    pub text: String,
    /// Font number (`/F{n}` in the page resources)
    pub font_number: u32,
    /// Font size in points
    pub size: f32,
    /// Text color; `None` uses the current (black) fill
    pub color: Option<Color>,
}

impl TextElement {
    /// Create a text run in font number 1.
    pub fn new(x: f32, y: f32, text: impl Into<String>, size: f32) -> Self {
        Self {
            x,
            y,
            text: text.into(),
            font_number: 1,
            size,
            color: None,
        }
    }

    /// Use a specific font number.
    pub fn with_font(mut self, font_number: u32) -> Self {
        self.font_number = font_number;
        self
    }

    /// Set the text color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub(crate) fn bounds(&self) -> Rect {
        // Width is not measurable without the font; height is the size
        Rect::new(self.x, self.y, 0.0, self.size)
    }
}

/// A block of laid-out paragraph lines.
///
/// The lines come from the paragraph layout engine; this element only
/// positions and paints them.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphElement {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Paragraph width the lines were wrapped to
    pub width: f32,
    /// Laid-out lines in top-to-bottom order
    pub lines: Vec<ParagraphLine>,
    /// Text color; `None` uses the current (black) fill
    pub color: Option<Color>,
}

impl ParagraphElement {
    /// Create a paragraph element from laid-out lines.
    pub fn new(x: f32, y: f32, width: f32, lines: Vec<ParagraphLine>) -> Self {
        Self {
            x,
            y,
            width,
            lines,
            color: None,
        }
    }

    /// Set the text color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Total height: the sum of the line advances.
    pub fn height(&self) -> f32 {
        self.lines.iter().map(|l| l.top_margin).sum()
    }

    pub(crate) fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height())
    }
}
