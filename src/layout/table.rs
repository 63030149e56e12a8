//! Table layout: header-driven columns, resolved row heights, and
//! height-bounded cropping.
//!
//! Content is added freely; nothing is positioned until
//! [`Table::resolve_heights`] runs (implicitly, from
//! [`Table::layout_elements`] and [`Table::crop`]). A row's height is
//! the maximum of its explicit height and its tallest column's content
//! plus padding on both sides, and never shrinks once resolved.
//! Vertical cell alignment needs the final row height, which is only
//! known after every column has its content.

use std::sync::Arc;

use super::paragraph::{Align, ParagraphLine};
use crate::elements::{Element, ImageElement, ParagraphElement, RectElement, TextElement};
use crate::error::{Error, Result};
use crate::fonts::Font;
use crate::geometry::Color;
use crate::images::ImageRef;

/// Vertical alignment of cell content within a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VAlign {
    /// Align to the top of the row
    #[default]
    Top,
    /// Center vertically
    Middle,
    /// Align to the bottom of the row
    Bottom,
}

/// Visual style applied to a row's cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowStyle {
    /// Cell background fill; `None` leaves cells unfilled
    pub fill: Option<Color>,
    /// Text color for cell content; `None` uses black
    pub text_color: Option<Color>,
}

#[derive(Debug, Clone, Copy)]
struct ColumnSpec {
    width: f32,
    halign: Align,
    valign: VAlign,
}

#[derive(Debug, Clone)]
enum CellContent {
    Text {
        text: String,
        font_number: u32,
        size: f32,
        width: f32,
    },
    Paragraph {
        lines: Vec<ParagraphLine>,
        width: f32,
        height: f32,
    },
    Image {
        image: Arc<ImageRef>,
        width: f32,
        height: f32,
    },
}

impl CellContent {
    fn width(&self) -> f32 {
        match self {
            CellContent::Text { width, .. } => *width,
            CellContent::Paragraph { width, .. } => *width,
            CellContent::Image { width, .. } => *width,
        }
    }

    fn height(&self) -> f32 {
        match self {
            CellContent::Text { size, .. } => *size,
            CellContent::Paragraph { height, .. } => *height,
            CellContent::Image { height, .. } => *height,
        }
    }
}

/// One cell of a row.
///
/// Columns are only ever created by mirroring the table's column
/// specification, so every row has the same column count and widths.
#[derive(Debug, Clone)]
pub struct Column {
    spec: ColumnSpec,
    content: Vec<CellContent>,
    /// Accumulated content height
    cursor: f32,
}

impl Column {
    fn new(spec: ColumnSpec) -> Self {
        Self {
            spec,
            content: Vec::new(),
            cursor: 0.0,
        }
    }

    /// Column width in points.
    pub fn width(&self) -> f32 {
        self.spec.width
    }

    /// Accumulated content height in points.
    pub fn content_height(&self) -> f32 {
        self.cursor
    }

    /// Append a text run. The font measures the run and, for embedded
    /// fonts, records the characters for subsetting.
    pub fn add_text(&mut self, text: impl Into<String>, font: &mut Font, size: f32) {
        let text = text.into();
        font.record_usage(&text);
        let width = font.measure(&text, size);
        self.cursor += size;
        self.content.push(CellContent::Text {
            text,
            font_number: font.number(),
            size,
            width,
        });
    }

    /// Append pre-wrapped paragraph lines occupying `width` points.
    pub fn add_paragraph(&mut self, lines: Vec<ParagraphLine>, width: f32) {
        let height: f32 = lines.iter().map(|l| l.top_margin).sum();
        self.cursor += height;
        self.content.push(CellContent::Paragraph {
            lines,
            width,
            height,
        });
    }

    /// Append an image placed at `width` × `height` points.
    pub fn add_image(&mut self, image: Arc<ImageRef>, width: f32, height: f32) {
        self.cursor += height;
        self.content.push(CellContent::Image {
            image,
            width,
            height,
        });
    }
}

/// One table row.
#[derive(Debug, Clone, Default)]
pub struct Row {
    columns: Vec<Column>,
    explicit_height: f32,
    resolved_height: f32,
}

impl Row {
    /// Request a minimum height for this row.
    pub fn set_height(&mut self, height: f32) {
        self.explicit_height = height;
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column by index.
    pub fn column(&self, index: usize) -> Result<&Column> {
        self.columns.get(index).ok_or(Error::BadIndex {
            kind: "column",
            index,
            len: self.columns.len(),
        })
    }

    /// Column by index, mutable.
    pub fn column_mut(&mut self, index: usize) -> Result<&mut Column> {
        let len = self.columns.len();
        self.columns.get_mut(index).ok_or(Error::BadIndex {
            kind: "column",
            index,
            len,
        })
    }

    /// Resolved height; meaningful after height resolution.
    pub fn height(&self) -> f32 {
        self.resolved_height
    }

    fn resolve(&mut self, padding: f32) {
        let tallest = self
            .columns
            .iter()
            .map(|c| c.cursor)
            .fold(0.0f32, f32::max);
        // Height only grows, even across repeated resolutions
        self.resolved_height = self
            .resolved_height
            .max(self.explicit_height)
            .max(tallest + 2.0 * padding);
    }
}

/// A table: a header row, body rows, and shared cell styling.
#[derive(Debug, Clone)]
pub struct Table {
    specs: Vec<ColumnSpec>,
    header: Row,
    header_visible: bool,
    rows: Vec<Row>,
    border_width: f32,
    border_color: Color,
    padding: f32,
    header_style: RowStyle,
    style_a: RowStyle,
    style_b: RowStyle,
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl Table {
    /// Create an empty table with a visible header and hairline borders.
    pub fn new() -> Self {
        Self {
            specs: Vec::new(),
            header: Row::default(),
            header_visible: true,
            rows: Vec::new(),
            border_width: 0.5,
            border_color: Color::BLACK,
            padding: 2.0,
            header_style: RowStyle::default(),
            style_a: RowStyle::default(),
            style_b: RowStyle::default(),
        }
    }

    /// Set cell border width and color. A width of 0 disables borders.
    pub fn set_border(&mut self, width: f32, color: Color) {
        self.border_width = width;
        self.border_color = color;
    }

    /// Set uniform cell padding.
    pub fn set_padding(&mut self, padding: f32) {
        self.padding = padding;
    }

    /// Set the alternating body row styles (even rows get `a`, odd `b`).
    pub fn set_row_styles(&mut self, a: RowStyle, b: RowStyle) {
        self.style_a = a;
        self.style_b = b;
    }

    /// Set the header row style.
    pub fn set_header_style(&mut self, style: RowStyle) {
        self.header_style = style;
    }

    /// Show or hide the header row.
    pub fn set_header_visible(&mut self, visible: bool) {
        self.header_visible = visible;
    }

    /// Add a column. The column is mirrored into the header and every
    /// existing row; rows added later receive it automatically.
    pub fn add_column(&mut self, width: f32, halign: Align, valign: VAlign) {
        let spec = ColumnSpec {
            width,
            halign,
            valign,
        };
        self.specs.push(spec);
        self.header.columns.push(Column::new(spec));
        for row in &mut self.rows {
            row.columns.push(Column::new(spec));
        }
    }

    /// Append a body row mirroring the current columns.
    pub fn add_row(&mut self) -> &mut Row {
        let row = Row {
            columns: self.specs.iter().map(|s| Column::new(*s)).collect(),
            explicit_height: 0.0,
            resolved_height: 0.0,
        };
        self.rows.push(row);
        self.rows.last_mut().expect("pushed above")
    }

    /// The header row.
    pub fn header_mut(&mut self) -> &mut Row {
        &mut self.header
    }

    /// Number of body rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Body row by index.
    pub fn row(&self, index: usize) -> Result<&Row> {
        self.rows.get(index).ok_or(Error::BadIndex {
            kind: "row",
            index,
            len: self.rows.len(),
        })
    }

    /// Body row by index, mutable.
    pub fn row_mut(&mut self, index: usize) -> Result<&mut Row> {
        let len = self.rows.len();
        self.rows.get_mut(index).ok_or(Error::BadIndex {
            kind: "row",
            index,
            len,
        })
    }

    /// Total width of all columns.
    pub fn width(&self) -> f32 {
        self.specs.iter().map(|s| s.width).sum()
    }

    /// Resolve every row's height from its content. Runs implicitly
    /// before positions or crops are computed.
    pub fn resolve_heights(&mut self) {
        self.header.resolve(self.padding);
        for row in &mut self.rows {
            row.resolve(self.padding);
        }
    }

    /// Total height including the header if visible.
    pub fn total_height(&mut self) -> f32 {
        self.resolve_heights();
        let header = if self.header_visible {
            self.header.resolved_height
        } else {
            0.0
        };
        header + self.rows.iter().map(|r| r.resolved_height).sum::<f32>()
    }

    /// Split off the rows that do not fit into `max_height`.
    ///
    /// Returns the continuation table: same settings, a copy of the
    /// header, and every row from the first one that would overflow
    /// onward. Row count is conserved across the two tables. A single
    /// row taller than `max_height` cannot be split and is an error.
    pub fn crop(&mut self, max_height: f32) -> Result<Table> {
        self.resolve_heights();
        for (i, row) in self.rows.iter().enumerate() {
            if row.resolved_height > max_height {
                return Err(Error::RowTooTall {
                    row: i,
                    height: row.resolved_height,
                    max_height,
                });
            }
        }

        let mut used = if self.header_visible {
            self.header.resolved_height
        } else {
            0.0
        };
        let mut split = self.rows.len();
        for (i, row) in self.rows.iter().enumerate() {
            if used + row.resolved_height > max_height {
                split = i;
                break;
            }
            used += row.resolved_height;
        }

        let tail = self.rows.split_off(split);
        Ok(Table {
            specs: self.specs.clone(),
            header: self.header.clone(),
            header_visible: self.header_visible,
            rows: tail,
            border_width: self.border_width,
            border_color: self.border_color,
            padding: self.padding,
            header_style: self.header_style,
            style_a: self.style_a,
            style_b: self.style_b,
        })
    }

    /// Resolve absolute positions and produce the drawable elements,
    /// with the table's top-left corner at `(x, y)`.
    pub fn layout_elements(&mut self, x: f32, y: f32) -> Vec<Element> {
        self.resolve_heights();
        let mut out = Vec::new();
        let mut cursor_y = y;

        if self.header_visible {
            let style = self.header_style;
            self.emit_row(&self.header, style, x, cursor_y, &mut out);
            cursor_y += self.header.resolved_height;
        }
        for (i, row) in self.rows.iter().enumerate() {
            let style = if i % 2 == 0 { self.style_a } else { self.style_b };
            self.emit_row(row, style, x, cursor_y, &mut out);
            cursor_y += row.resolved_height;
        }
        out
    }

    fn emit_row(
        &self,
        row: &Row,
        style: RowStyle,
        x: f32,
        y: f32,
        out: &mut Vec<Element>,
    ) {
        let row_height = row.resolved_height;
        let mut cell_x = x;
        for column in &row.columns {
            // Cell background and border
            let stroke = if self.border_width > 0.0 {
                Some(self.border_color)
            } else {
                None
            };
            if stroke.is_some() || style.fill.is_some() {
                out.push(Element::Rectangle(
                    RectElement::new(cell_x, y, column.spec.width, row_height)
                        .with_stroke(stroke)
                        .with_fill(style.fill)
                        .with_line_width(self.border_width),
                ));
            }

            // Vertical start of the content block
            let block_height = column.cursor;
            let mut item_y = y + match column.spec.valign {
                VAlign::Top => self.padding,
                VAlign::Middle => (row_height - block_height) / 2.0,
                VAlign::Bottom => row_height - self.padding - block_height,
            };

            for item in &column.content {
                let item_x = cell_x
                    + match column.spec.halign {
                        Align::Left => self.padding,
                        Align::Center => (column.spec.width - item.width()) / 2.0,
                        Align::Right => column.spec.width - self.padding - item.width(),
                    };
                match item {
                    CellContent::Text {
                        text,
                        font_number,
                        size,
                        ..
                    } => {
                        let mut text_el = TextElement::new(item_x, item_y, text.clone(), *size)
                            .with_font(*font_number);
                        if let Some(color) = style.text_color {
                            text_el = text_el.with_color(color);
                        }
                        out.push(Element::Text(text_el));
                    },
                    CellContent::Paragraph { lines, width, .. } => {
                        let mut para = ParagraphElement::new(item_x, item_y, *width, lines.clone());
                        if let Some(color) = style.text_color {
                            para = para.with_color(color);
                        }
                        out.push(Element::Paragraph(para));
                    },
                    CellContent::Image {
                        image,
                        width,
                        height,
                    } => {
                        out.push(Element::Image(ImageElement::new(
                            item_x,
                            item_y,
                            *width,
                            *height,
                            Arc::clone(image),
                        )));
                    },
                }
                item_y += item.height();
            }

            cell_x += column.spec.width;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontRegistry;

    fn two_column_table() -> Table {
        let mut table = Table::new();
        table.add_column(100.0, Align::Left, VAlign::Top);
        table.add_column(80.0, Align::Right, VAlign::Top);
        table
    }

    #[test]
    fn test_column_add_fans_out_to_rows() {
        let mut table = Table::new();
        table.add_column(50.0, Align::Left, VAlign::Top);
        table.add_row();
        table.add_row();
        // A later column reaches rows that already exist
        table.add_column(60.0, Align::Left, VAlign::Top);
        assert_eq!(table.row(0).unwrap().column_count(), 2);
        assert_eq!(table.row(1).unwrap().column_count(), 2);
        assert_eq!(table.header_mut().column_count(), 2);
    }

    #[test]
    fn test_row_height_from_tallest_column() {
        let mut registry = FontRegistry::new();
        let mut table = two_column_table();
        table.set_padding(3.0);
        table.add_row();
        {
            let font = registry.get_or_create("Courier").unwrap();
            let row = table.row_mut(0).unwrap();
            row.column_mut(0).unwrap().add_text("a", font, 10.0);
            row.column_mut(1).unwrap().add_text("b", font, 10.0);
            row.column_mut(1).unwrap().add_text("c", font, 10.0);
        }
        table.resolve_heights();
        // tallest column is 20pt of content + 2*3 padding
        assert_eq!(table.row(0).unwrap().height(), 26.0);
    }

    #[test]
    fn test_explicit_height_wins_when_larger() {
        let mut table = two_column_table();
        table.add_row().set_height(40.0);
        table.resolve_heights();
        assert_eq!(table.row(0).unwrap().height(), 40.0);
    }

    #[test]
    fn test_height_never_shrinks() {
        let mut table = two_column_table();
        table.add_row().set_height(40.0);
        table.resolve_heights();
        table.row_mut(0).unwrap().set_height(10.0);
        table.resolve_heights();
        assert_eq!(table.row(0).unwrap().height(), 40.0);
    }

    #[test]
    fn test_bad_index_errors() {
        let mut table = two_column_table();
        table.add_row();
        assert!(matches!(
            table.row(3),
            Err(Error::BadIndex { kind: "row", .. })
        ));
        assert!(matches!(
            table.row_mut(0).unwrap().column_mut(9),
            Err(Error::BadIndex { kind: "column", .. })
        ));
    }

    #[test]
    fn test_crop_conserves_rows() {
        let mut table = two_column_table();
        table.set_header_visible(false);
        for _ in 0..5 {
            table.add_row().set_height(20.0);
        }
        let continuation = table.crop(50.0).unwrap();
        assert_eq!(table.row_count() + continuation.row_count(), 5);
        assert_eq!(table.row_count(), 2);
        assert_eq!(continuation.row_count(), 3);
    }

    #[test]
    fn test_crop_counts_header_height() {
        let mut table = two_column_table();
        table.header_mut().set_height(30.0);
        for _ in 0..3 {
            table.add_row().set_height(20.0);
        }
        // 30 header + 20 = 50; second row would exceed 60
        let continuation = table.crop(60.0).unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(continuation.row_count(), 2);
        // continuation keeps a header copy
        assert_eq!(continuation.header.resolved_height, 30.0);
    }

    #[test]
    fn test_crop_rejects_unsplittable_row() {
        let mut table = two_column_table();
        table.add_row().set_height(100.0);
        let err = table.crop(50.0).unwrap_err();
        assert!(matches!(err, Error::RowTooTall { row: 0, .. }));
    }

    #[test]
    fn test_crop_with_everything_fitting_returns_empty_continuation() {
        let mut table = two_column_table();
        table.set_header_visible(false);
        table.add_row().set_height(10.0);
        let continuation = table.crop(100.0).unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(continuation.row_count(), 0);
    }

    #[test]
    fn test_layout_positions_rows_top_down() {
        let mut registry = FontRegistry::new();
        let mut table = two_column_table();
        table.set_header_visible(false);
        table.set_padding(2.0);
        for i in 0..2 {
            table.add_row().set_height(20.0);
            let font = registry.get_or_create("Courier").unwrap();
            table
                .row_mut(i)
                .unwrap()
                .column_mut(0)
                .unwrap()
                .add_text("x", font, 10.0);
        }
        let elements = table.layout_elements(10.0, 100.0);
        let texts: Vec<&TextElement> = elements
            .iter()
            .filter_map(|e| match e {
                Element::Text(t) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(texts.len(), 2);
        // top-aligned content: row top + padding
        assert_eq!(texts[0].y, 102.0);
        assert_eq!(texts[1].y, 122.0);
    }

    #[test]
    fn test_right_alignment_against_column_width() {
        let mut registry = FontRegistry::new();
        let mut table = two_column_table();
        table.set_header_visible(false);
        table.set_padding(2.0);
        table.add_row();
        let font = registry.get_or_create("Courier").unwrap();
        // column 1 is right-aligned, 80pt wide; "ab" is 12pt at size 10
        table
            .row_mut(0)
            .unwrap()
            .column_mut(1)
            .unwrap()
            .add_text("ab", font, 10.0);
        let elements = table.layout_elements(0.0, 0.0);
        let text = elements
            .iter()
            .find_map(|e| match e {
                Element::Text(t) => Some(t),
                _ => None,
            })
            .unwrap();
        // cell starts at x=100; right edge 180 - padding 2 - width 12
        assert_eq!(text.x, 166.0);
    }

    #[test]
    fn test_bottom_valign() {
        let mut registry = FontRegistry::new();
        let mut table = Table::new();
        table.add_column(50.0, Align::Left, VAlign::Bottom);
        table.set_header_visible(false);
        table.set_padding(2.0);
        table.add_row().set_height(50.0);
        let font = registry.get_or_create("Courier").unwrap();
        table
            .row_mut(0)
            .unwrap()
            .column_mut(0)
            .unwrap()
            .add_text("x", font, 10.0);
        let elements = table.layout_elements(0.0, 0.0);
        let text = elements
            .iter()
            .find_map(|e| match e {
                Element::Text(t) => Some(t),
                _ => None,
            })
            .unwrap();
        // 50 row height - 2 padding - 10 content
        assert_eq!(text.y, 38.0);
    }
}
