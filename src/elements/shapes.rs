//! Geometric elements: rectangle, circle, straight line.

use crate::geometry::{Color, Rect};

/// A stroked and/or filled rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct RectElement {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
    /// Stroke color; `None` skips the stroke
    pub stroke: Option<Color>,
    /// Fill color; `None` skips the fill
    pub fill: Option<Color>,
    /// Stroke line width in points
    pub line_width: f32,
}

impl RectElement {
    /// Create a stroked rectangle.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            stroke: Some(Color::BLACK),
            fill: None,
            line_width: 1.0,
        }
    }

    /// Set the fill color.
    pub fn with_fill(mut self, fill: Option<Color>) -> Self {
        self.fill = fill;
        self
    }

    /// Set the stroke color.
    pub fn with_stroke(mut self, stroke: Option<Color>) -> Self {
        self.stroke = stroke;
        self
    }

    /// Set the stroke width.
    pub fn with_line_width(mut self, line_width: f32) -> Self {
        self.line_width = line_width;
        self
    }

    pub(crate) fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// A stroked and/or filled circle.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleElement {
    /// Center x
    pub cx: f32,
    /// Center y (from the top of the page)
    pub cy: f32,
    /// Radius
    pub radius: f32,
    /// Stroke color; `None` skips the stroke
    pub stroke: Option<Color>,
    /// Fill color; `None` skips the fill
    pub fill: Option<Color>,
    /// Stroke line width in points
    pub line_width: f32,
}

impl CircleElement {
    /// Create a stroked circle.
    pub fn new(cx: f32, cy: f32, radius: f32) -> Self {
        Self {
            cx,
            cy,
            radius,
            stroke: Some(Color::BLACK),
            fill: None,
            line_width: 1.0,
        }
    }

    /// Set the fill color.
    pub fn with_fill(mut self, fill: Option<Color>) -> Self {
        self.fill = fill;
        self
    }

    /// Set the stroke color.
    pub fn with_stroke(mut self, stroke: Option<Color>) -> Self {
        self.stroke = stroke;
        self
    }

    pub(crate) fn bounds(&self) -> Rect {
        Rect::new(
            self.cx - self.radius,
            self.cy - self.radius,
            self.radius * 2.0,
            self.radius * 2.0,
        )
    }
}

/// A straight line segment.
#[derive(Debug, Clone, PartialEq)]
pub struct LineElement {
    /// Start x
    pub x1: f32,
    /// Start y
    pub y1: f32,
    /// End x
    pub x2: f32,
    /// End y
    pub y2: f32,
    /// Stroke color
    pub color: Color,
    /// Stroke line width in points
    pub line_width: f32,
    /// Dash pattern as (on, off) lengths; `None` draws solid
    pub dash: Option<(f32, f32)>,
}

impl LineElement {
    /// Create a solid black line.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            color: Color::BLACK,
            line_width: 1.0,
            dash: None,
        }
    }

    /// Set the stroke color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Set a dash pattern.
    pub fn with_dash(mut self, on: f32, off: f32) -> Self {
        self.dash = Some((on, off));
        self
    }

    pub(crate) fn bounds(&self) -> Rect {
        let x = self.x1.min(self.x2);
        let y = self.y1.min(self.y2);
        Rect::new(x, y, (self.x2 - self.x1).abs(), (self.y2 - self.y1).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_bounds() {
        let c = CircleElement::new(50.0, 40.0, 10.0);
        let b = c.bounds();
        assert_eq!((b.x, b.y, b.width, b.height), (40.0, 30.0, 20.0, 20.0));
    }

    #[test]
    fn test_line_bounds_normalized() {
        let l = LineElement::new(30.0, 10.0, 10.0, 40.0);
        let b = l.bounds();
        assert_eq!((b.x, b.y, b.width, b.height), (10.0, 10.0, 20.0, 30.0));
    }
}
