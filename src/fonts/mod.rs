//! Font registry and font objects.
//!
//! Fonts come in two kinds: *predefined* fonts from the Base-14
//! catalog, fabricated lazily on first use, and *embedded* fonts backed
//! by a caller-supplied font program. A predefined font serializes to a
//! single object; an embedded font needs five (font dictionary,
//! descriptor, descendant CIDFont, ToUnicode map, font program).
//!
//! Font numbers are assigned in registration order, starting at 1, and
//! name the font inside every page's resource dictionary (`/F1`,
//! `/F2`, ...). They are independent of the object IDs assigned at
//! compile time.

mod embedded;
mod metrics;

pub use embedded::EmbeddedFontData;
pub use metrics::{is_predefined, PREDEFINED_FONTS};

use indexmap::IndexMap;
use metrics::StandardWidths;

use crate::error::{Error, Result};

/// A font registered with a document.
#[derive(Debug, Clone)]
pub struct Font {
    name: String,
    number: u32,
    kind: FontKind,
}

#[derive(Debug, Clone)]
enum FontKind {
    Standard(StandardWidths),
    Embedded(EmbeddedFontData),
}

impl Font {
    /// Reference name this font was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Per-document font number (1-based, registration order).
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Whether this is an embedded font.
    pub fn is_embedded(&self) -> bool {
        matches!(self.kind, FontKind::Embedded(_))
    }

    /// How many referenceable objects this font serializes to.
    pub fn object_count(&self) -> u32 {
        match self.kind {
            FontKind::Standard(_) => 1,
            FontKind::Embedded(_) => 5,
        }
    }

    /// Embedded font data, if this is an embedded font.
    pub fn embedded(&self) -> Option<&EmbeddedFontData> {
        match &self.kind {
            FontKind::Embedded(data) => Some(data),
            FontKind::Standard(_) => None,
        }
    }

    /// Measure the rendered width of `text` at `size`, in points.
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        let units: f32 = text.chars().map(|ch| self.char_width(ch)).sum();
        units * size / 1000.0
    }

    /// Crop `text` to the longest prefix that fits in `max_width`
    /// points at `size`.
    pub fn crop_to_width(&self, text: &str, size: f32, max_width: f32) -> String {
        let mut result = String::new();
        let mut width = 0.0;
        for ch in text.chars() {
            let w = self.char_width(ch) * size / 1000.0;
            if width + w > max_width {
                break;
            }
            width += w;
            result.push(ch);
        }
        result
    }

    /// Record that `text` was placed with this font. A no-op for
    /// predefined fonts; embedded fonts grow their used-character set.
    pub fn record_usage(&mut self, text: &str) {
        if let FontKind::Embedded(data) = &mut self.kind {
            data.record_usage(text);
        }
    }

    fn char_width(&self, ch: char) -> f32 {
        match &self.kind {
            FontKind::Standard(widths) => widths.char_width(ch),
            FontKind::Embedded(data) => data.char_width(ch),
        }
    }
}

/// Name-keyed font registry owned by a document.
///
/// Insertion order defines font numbers, so the map type must preserve
/// it.
#[derive(Debug, Clone, Default)]
pub struct FontRegistry {
    fonts: IndexMap<String, Font>,
}

impl FontRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a font by reference name, fabricating it on first use if the
    /// name is in the predefined catalog.
    ///
    /// Requesting a name that is neither predefined nor registered
    /// fails with [`Error::FontNotLoaded`].
    pub fn get_or_create(&mut self, name: &str) -> Result<&mut Font> {
        if !self.fonts.contains_key(name) {
            if !is_predefined(name) {
                return Err(Error::FontNotLoaded(name.to_string()));
            }
            let number = self.fonts.len() as u32 + 1;
            self.fonts.insert(
                name.to_string(),
                Font {
                    name: name.to_string(),
                    number,
                    kind: FontKind::Standard(StandardWidths::for_font(name)),
                },
            );
        }
        Ok(self.fonts.get_mut(name).expect("inserted above"))
    }

    /// Register an embedded font backed by `program` (TTF/OTF bytes).
    ///
    /// Registering a predefined name fails with
    /// [`Error::FontPredefined`]; re-registering an existing embedded
    /// name returns the already-registered font.
    pub fn register_embedded(&mut self, name: &str, program: Vec<u8>) -> Result<&mut Font> {
        if is_predefined(name) {
            return Err(Error::FontPredefined(name.to_string()));
        }
        if !self.fonts.contains_key(name) {
            let data = EmbeddedFontData::parse(program)?;
            let number = self.fonts.len() as u32 + 1;
            self.fonts.insert(
                name.to_string(),
                Font {
                    name: name.to_string(),
                    number,
                    kind: FontKind::Embedded(data),
                },
            );
        }
        Ok(self.fonts.get_mut(name).expect("inserted above"))
    }

    /// Register a synthetic embedded font without parsing a program.
    #[cfg(test)]
    pub(crate) fn register_embedded_stub(&mut self, name: &str) -> &mut Font {
        let number = self.fonts.len() as u32 + 1;
        self.fonts.insert(
            name.to_string(),
            Font {
                name: name.to_string(),
                number,
                kind: FontKind::Embedded(EmbeddedFontData::stub()),
            },
        );
        self.fonts.get_mut(name).expect("inserted above")
    }

    /// Look up a registered font by name.
    pub fn get(&self, name: &str) -> Option<&Font> {
        self.fonts.get(name)
    }

    /// Look up a font by its font number.
    pub fn by_number(&self, number: u32) -> Option<&Font> {
        // Numbers are assigned by insertion order, so this is an index
        if number == 0 {
            return None;
        }
        self.fonts.get_index(number as usize - 1).map(|(_, f)| f)
    }

    /// Fonts in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Font> {
        self.fonts.values()
    }

    /// Record text usage against the font with the given number, if it
    /// exists. Used by the compile pre-pass so embedded fonts see every
    /// text run before their subset data serializes.
    pub(crate) fn record_usage_by_number(&mut self, number: u32, text: &str) {
        if number == 0 {
            return;
        }
        if let Some((_, font)) = self.fonts.get_index_mut(number as usize - 1) {
            font.record_usage(text);
        }
    }

    /// Number of registered fonts.
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predefined_lazy_creation() {
        let mut registry = FontRegistry::new();
        let n1 = registry.get_or_create("Helvetica").unwrap().number();
        let n2 = registry.get_or_create("Times-Roman").unwrap().number();
        let again = registry.get_or_create("Helvetica").unwrap().number();
        assert_eq!(n1, 1);
        assert_eq!(n2, 2);
        assert_eq!(again, 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unknown_font_fails() {
        let mut registry = FontRegistry::new();
        let err = registry.get_or_create("Frutiger").unwrap_err();
        assert!(matches!(err, Error::FontNotLoaded(_)));
    }

    #[test]
    fn test_cannot_override_predefined() {
        let mut registry = FontRegistry::new();
        let err = registry
            .register_embedded("Helvetica", vec![0; 4])
            .unwrap_err();
        assert!(matches!(err, Error::FontPredefined(_)));
    }

    #[test]
    fn test_by_number() {
        let mut registry = FontRegistry::new();
        registry.get_or_create("Courier").unwrap();
        registry.get_or_create("Symbol").unwrap();
        assert_eq!(registry.by_number(1).unwrap().name(), "Courier");
        assert_eq!(registry.by_number(2).unwrap().name(), "Symbol");
        assert!(registry.by_number(3).is_none());
        assert!(registry.by_number(0).is_none());
    }

    #[test]
    fn test_courier_measure_is_exact() {
        let mut registry = FontRegistry::new();
        let font = registry.get_or_create("Courier").unwrap();
        // 600/1000 em per char
        assert_eq!(font.measure("abcd", 10.0), 24.0);
    }

    #[test]
    fn test_crop_to_width() {
        let mut registry = FontRegistry::new();
        let font = registry.get_or_create("Courier").unwrap();
        // 6pt per char at size 10
        assert_eq!(font.crop_to_width("hello world", 10.0, 20.0), "hel");
        assert_eq!(font.crop_to_width("hello", 10.0, 0.0), "");
    }

    #[test]
    fn test_standard_font_object_count() {
        let mut registry = FontRegistry::new();
        let font = registry.get_or_create("Helvetica").unwrap();
        assert_eq!(font.object_count(), 1);
        assert!(!font.is_embedded());
    }
}
