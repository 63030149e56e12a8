//! Layout engines: paragraph word-wrap and table sizing.
//!
//! Both engines run fully before compilation: they turn caller input
//! into positioned elements (or paragraph lines), and both support
//! cropping so content can continue on a following page, paragraphs by
//! line budget and tables by height.

mod paragraph;
mod table;

pub use paragraph::{layout_paragraph, Align, ParagraphLine};
pub use table::{Column, Row, RowStyle, Table, VAlign};
