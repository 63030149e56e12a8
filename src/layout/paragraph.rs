//! Greedy word-wrap for paragraph text.
//!
//! The engine splits input on explicit line breaks, packs words into
//! lines while they fit the paragraph width, and optionally stops after
//! a line budget, returning the unconsumed remainder so the caller can
//! continue the paragraph elsewhere (typically on the next page).

use crate::fonts::Font;

/// Horizontal alignment for wrapped lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    /// Flush left
    #[default]
    Left,
    /// Centered
    Center,
    /// Flush right
    Right,
}

/// One laid-out line of a paragraph.
///
/// Produced only by [`layout_paragraph`]; the margins already encode
/// the alignment, so rendering just offsets by them.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphLine {
    /// Line text (may be empty for blank source lines)
    pub text: String,
    /// Vertical advance from the previous line
    pub top_margin: f32,
    /// Horizontal offset from the paragraph's left edge
    pub left_margin: f32,
    /// Font number of the font the line was measured with
    pub font_number: u32,
    /// Font size the line was measured at
    pub font_size: f32,
}

/// Lay out `text` into lines of at most `width` points.
///
/// Returns the laid-out lines and the remainder: text that was not
/// consumed because the `max_lines` budget (0 = unbounded) ran out.
/// A word that alone exceeds `width` is hard-cropped to fit and placed
/// on its own line. Every placed line is reported to the font so
/// embedded fonts accumulate their used-character set.
pub fn layout_paragraph(
    text: &str,
    size: f32,
    font: &mut Font,
    width: f32,
    max_lines: usize,
    line_height: f32,
    align: Align,
) -> (Vec<ParagraphLine>, String) {
    let mut out: Vec<ParagraphLine> = Vec::new();
    let sources: Vec<&str> = text.split('\n').collect();
    let font_number = font.number();

    let flush = |font: &mut Font, out: &mut Vec<ParagraphLine>, line_text: String| {
        font.record_usage(&line_text);
        let line_width = font.measure(&line_text, size);
        let left_margin = match align {
            Align::Left => 0.0,
            Align::Right => width - line_width,
            Align::Center => ((width - line_width) / 2.0).round(),
        };
        out.push(ParagraphLine {
            text: line_text,
            top_margin: line_height,
            left_margin,
            font_number,
            font_size: size,
        });
    };

    for (si, source) in sources.iter().enumerate() {
        if max_lines > 0 && out.len() >= max_lines {
            return (out, sources[si..].join("\n"));
        }

        // A blank source line keeps its vertical space
        if source.is_empty() {
            flush(font, &mut out, String::new());
            continue;
        }

        let words: Vec<&str> = source.split(' ').collect();
        let mut acc = String::new();
        let mut acc_width = 0.0f32;
        let mut wi = 0;

        while wi < words.len() {
            if max_lines > 0 && out.len() >= max_lines {
                let mut remainder = words[wi..].join(" ");
                for rest in &sources[si + 1..] {
                    remainder.push('\n');
                    remainder.push_str(rest);
                }
                return (out, remainder);
            }

            let word = words[wi];
            let spaced_width = font.measure(word, size) + font.measure(" ", size);

            if acc_width + spaced_width <= width {
                if !acc.is_empty() {
                    acc.push(' ');
                }
                acc.push_str(word);
                acc_width += spaced_width;
                wi += 1;
            } else if acc.is_empty() {
                // Nothing accumulated: the word must go out on its own,
                // cropped only if it alone exceeds the width
                let line = if font.measure(word, size) <= width {
                    word.to_string()
                } else {
                    font.crop_to_width(word, size, width)
                };
                flush(font, &mut out, line);
                wi += 1;
            } else {
                flush(font, &mut out, std::mem::take(&mut acc));
                acc_width = 0.0;
            }
        }

        if !acc.is_empty() {
            flush(font, &mut out, acc);
        }
    }

    (out, String::new())
}
