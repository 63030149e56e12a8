//! Error types for the document compiler.
//!
//! This module defines all error types that can occur while building a
//! document graph or compiling it to an output stream.

/// Result type alias for document compiler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during document construction and compilation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A table row is taller than the height a crop was asked to fit.
    /// Rows cannot be split, so this is a caller configuration error.
    #[error("Row {row} is {height}pt tall and cannot fit into a {max_height}pt crop")]
    RowTooTall {
        /// Index of the offending row
        row: usize,
        /// Resolved height of the row
        height: f32,
        /// Height the crop was asked to fit
        max_height: f32,
    },

    /// A font reference names neither a predefined font nor a registered
    /// embedded font.
    #[error("Font not loaded: '{0}' is not predefined and was never registered")]
    FontNotLoaded(String),

    /// An embedded registration tried to reuse a predefined font name.
    #[error("Font '{0}' is predefined and cannot be overridden")]
    FontPredefined(String),

    /// Row or column index out of range.
    #[error("Index out of range: {kind} {index} (len {len})")]
    BadIndex {
        /// What was being indexed ("row" or "column")
        kind: &'static str,
        /// The index requested
        index: usize,
        /// Number of entries available
        len: usize,
    },

    /// An image payload had not finished encoding when the compiler
    /// reached it. Callers can join the encode and compile again.
    #[error("Image payload not ready: {width}x{height} image is still encoding")]
    ImageNotReady {
        /// Image width in pixels
        width: u32,
        /// Image height in pixels
        height: u32,
    },

    /// An image encode task failed.
    #[error("Image encoding failed: {0}")]
    ImageEncode(String),

    /// A caller-supplied font program could not be parsed.
    #[error("Font program error: {0}")]
    FontProgram(String),

    /// IO error from the output sink.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_too_tall_message() {
        let err = Error::RowTooTall {
            row: 3,
            height: 120.0,
            max_height: 80.0,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Row 3"));
        assert!(msg.contains("120"));
        assert!(msg.contains("80"));
    }

    #[test]
    fn test_font_not_loaded_message() {
        let err = Error::FontNotLoaded("Frutiger".to_string());
        assert!(format!("{}", err).contains("Frutiger"));
    }

    #[test]
    fn test_bad_index_message() {
        let err = Error::BadIndex {
            kind: "column",
            index: 5,
            len: 3,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("column 5"));
        assert!(msg.contains("len 3"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
