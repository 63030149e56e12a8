//! # pdfsmith
//!
//! Builds structured documents (pages of positioned drawable elements,
//! fonts, images, a bookmark tree) and compiles them into a byte-exact
//! PDF with a classic flat cross-reference table and trailer.
//!
//! The pipeline has three stages:
//!
//! 1. **Layout**: the paragraph engine wraps text into lines and the
//!    table engine resolves row heights and absolute cell positions.
//!    Both support cropping so content can continue on another page.
//! 2. **Numbering**: one deterministic traversal of the whole document
//!    graph assigns every referenceable object a sequential ID.
//! 3. **Serialization**: a single forward pass writes each object
//!    exactly once in ID order, tracking cumulative byte offsets to
//!    emit a valid cross-reference table and trailer.
//!
//! # Quick start
//!
//! ```
//! use pdfsmith::{Document, PageSize};
//! use pdfsmith::elements::{Element, TextElement};
//!
//! # fn main() -> pdfsmith::Result<()> {
//! let mut doc = Document::new();
//! doc.info_mut().title = Some("Hello".to_string());
//! doc.add_page_sized(PageSize::A4)
//!     .add_element(Element::Text(TextElement::new(72.0, 72.0, "Hello, world!", 12.0)));
//! let bytes = doc.compile_to_vec()?;
//! assert!(bytes.starts_with(b"%PDF-"));
//! # Ok(())
//! # }
//! ```
//!
//! Image payloads encode on background tasks; compile fails with
//! [`Error::ImageNotReady`] if an encode has not finished, so callers
//! wanting a guarantee use the blocking constructors or
//! [`images::ImageRef::join`] first.

#![warn(missing_docs)]

pub mod document;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod geometry;
pub mod images;
pub mod layout;
pub mod object;
pub mod outline;
pub mod page;

pub(crate) mod writer;

pub use document::{Document, DocumentInfo, PageMarker};
pub use error::{Error, Result};
pub use geometry::{Color, Rect};
pub use images::{EncodeMode, ImageRef};
pub use layout::{layout_paragraph, Align, ParagraphLine, RowStyle, Table, VAlign};
pub use outline::{Bookmark, BookmarkId, Outline};
pub use page::{Page, PageSize};
