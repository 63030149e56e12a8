//! Content-stream operator builder.
//!
//! Builds the graphics/text operator sequences that make up an
//! element's content fragment. Numbers are formatted with trailing
//! zeros trimmed so identical inputs always produce identical bytes.

use crate::geometry::Color;
use std::fmt::Write;

/// Fluent builder for one content fragment.
#[derive(Debug, Default)]
pub(crate) struct ContentBuilder {
    buf: String,
}

fn fmt_num(value: f32) -> String {
    let value = value as f64;
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        let formatted = format!("{:.5}", value);
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

impl ContentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn op(&mut self, text: &str) -> &mut Self {
        self.buf.push_str(text);
        self.buf.push('\n');
        self
    }

    pub fn save_state(&mut self) -> &mut Self {
        self.op("q")
    }

    pub fn restore_state(&mut self) -> &mut Self {
        self.op("Q")
    }

    pub fn set_fill_color(&mut self, color: Color) -> &mut Self {
        let line = format!(
            "{} {} {} rg",
            fmt_num(color.r),
            fmt_num(color.g),
            fmt_num(color.b)
        );
        self.op(&line)
    }

    pub fn set_stroke_color(&mut self, color: Color) -> &mut Self {
        let line = format!(
            "{} {} {} RG",
            fmt_num(color.r),
            fmt_num(color.g),
            fmt_num(color.b)
        );
        self.op(&line)
    }

    pub fn set_line_width(&mut self, width: f32) -> &mut Self {
        let line = format!("{} w", fmt_num(width));
        self.op(&line)
    }

    pub fn set_dash(&mut self, on: f32, off: f32) -> &mut Self {
        let line = format!("[{} {}] 0 d", fmt_num(on), fmt_num(off));
        self.op(&line)
    }

    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        let line = format!("{} {} m", fmt_num(x), fmt_num(y));
        self.op(&line)
    }

    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        let line = format!("{} {} l", fmt_num(x), fmt_num(y));
        self.op(&line)
    }

    pub fn curve_to(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        x3: f32,
        y3: f32,
    ) -> &mut Self {
        let line = format!(
            "{} {} {} {} {} {} c",
            fmt_num(x1),
            fmt_num(y1),
            fmt_num(x2),
            fmt_num(y2),
            fmt_num(x3),
            fmt_num(y3)
        );
        self.op(&line)
    }

    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> &mut Self {
        let line = format!(
            "{} {} {} {} re",
            fmt_num(x),
            fmt_num(y),
            fmt_num(width),
            fmt_num(height)
        );
        self.op(&line)
    }

    pub fn stroke(&mut self) -> &mut Self {
        self.op("S")
    }

    pub fn fill(&mut self) -> &mut Self {
        self.op("f")
    }

    pub fn fill_stroke(&mut self) -> &mut Self {
        self.op("B")
    }

    pub fn close_path(&mut self) -> &mut Self {
        self.op("h")
    }

    pub fn begin_text(&mut self) -> &mut Self {
        self.op("BT")
    }

    pub fn end_text(&mut self) -> &mut Self {
        self.op("ET")
    }

    pub fn set_font(&mut self, font_number: u32, size: f32) -> &mut Self {
        let line = format!("/F{} {} Tf", font_number, fmt_num(size));
        self.op(&line)
    }

    pub fn text_position(&mut self, x: f32, y: f32) -> &mut Self {
        let line = format!("{} {} Td", fmt_num(x), fmt_num(y));
        self.op(&line)
    }

    /// Show text as a literal string with delimiter escaping.
    /// Non-ASCII characters render as `?`; text needing more coverage
    /// belongs in an embedded font, which takes the hex path instead.
    pub fn show_text_literal(&mut self, text: &str) -> &mut Self {
        self.buf.push('(');
        for ch in text.chars() {
            match ch {
                '(' => self.buf.push_str("\\("),
                ')' => self.buf.push_str("\\)"),
                '\\' => self.buf.push_str("\\\\"),
                c if c.is_ascii() && !c.is_ascii_control() => self.buf.push(c),
                _ => self.buf.push('?'),
            }
        }
        self.buf.push_str(") Tj\n");
        self
    }

    /// Show pre-encoded hex text (Identity-H glyph ids).
    pub fn show_text_hex(&mut self, hex: &str) -> &mut Self {
        let _ = write!(self.buf, "{} Tj\n", hex);
        self
    }

    /// Transform by `[a b c d e f] cm`.
    pub fn transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> &mut Self {
        let line = format!(
            "{} {} {} {} {} {} cm",
            fmt_num(a),
            fmt_num(b),
            fmt_num(c),
            fmt_num(d),
            fmt_num(e),
            fmt_num(f)
        );
        self.op(&line)
    }

    pub fn paint_xobject(&mut self, name: &str) -> &mut Self {
        let line = format!("/{} Do", name);
        self.op(&line)
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_formatting() {
        assert_eq!(fmt_num(12.0), "12");
        assert_eq!(fmt_num(0.5), "0.5");
        assert_eq!(fmt_num(0.1), "0.1");
    }

    #[test]
    fn test_rect_stroke_sequence() {
        let mut b = ContentBuilder::new();
        b.rect(10.0, 20.0, 100.0, 50.0).stroke();
        assert_eq!(
            String::from_utf8(b.finish()).unwrap(),
            "10 20 100 50 re\nS\n"
        );
    }

    #[test]
    fn test_text_sequence() {
        let mut b = ContentBuilder::new();
        b.begin_text()
            .set_font(1, 12.0)
            .text_position(72.0, 720.0)
            .show_text_literal("Hi (all)")
            .end_text();
        let s = String::from_utf8(b.finish()).unwrap();
        assert!(s.contains("BT\n/F1 12 Tf\n72 720 Td\n(Hi \\(all\\)) Tj\nET\n"));
    }

    #[test]
    fn test_non_latin_chars_degrade() {
        let mut b = ContentBuilder::new();
        b.show_text_literal("日");
        assert!(String::from_utf8(b.finish()).unwrap().contains("(?) Tj"));
    }

    #[test]
    fn test_dash_pattern() {
        let mut b = ContentBuilder::new();
        b.set_dash(3.0, 2.0);
        assert_eq!(String::from_utf8(b.finish()).unwrap(), "[3 2] 0 d\n");
    }
}
