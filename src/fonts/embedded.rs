//! Embedded TrueType fonts.
//!
//! An embedded font is backed by a caller-supplied font program. Glyph
//! metrics are read with `ttf-parser` at registration time; the set of
//! characters actually placed with the font is accumulated so the
//! compiler can emit a subset-tagged name, a width array and a
//! ToUnicode map restricted to what the document uses.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Parsed data and subsetting bookkeeping for one embedded font.
#[derive(Debug, Clone)]
pub struct EmbeddedFontData {
    /// Raw font program bytes (embedded verbatim in the output)
    program: Arc<Vec<u8>>,
    /// Unicode codepoint -> glyph id
    glyph_ids: HashMap<char, u16>,
    /// Glyph id -> advance width in 1/1000 em
    glyph_widths: HashMap<u16, u16>,
    /// Characters placed with this font (char -> glyph id).
    /// BTreeMap so derived structures iterate deterministically.
    used: BTreeMap<char, u16>,
    /// Ascender in 1/1000 em
    pub(crate) ascender: i32,
    /// Descender in 1/1000 em (negative)
    pub(crate) descender: i32,
    /// Cap height in 1/1000 em
    pub(crate) cap_height: i32,
    /// Bounding box in 1/1000 em
    pub(crate) bbox: (i32, i32, i32, i32),
}

impl EmbeddedFontData {
    /// Parse a TrueType/OpenType font program.
    pub fn parse(program: Vec<u8>) -> Result<Self> {
        let face = ttf_parser::Face::parse(&program, 0)
            .map_err(|e| Error::FontProgram(e.to_string()))?;

        let upem = face.units_per_em() as i32;
        let scale = |v: i32| -> i32 {
            if upem == 0 {
                v
            } else {
                v * 1000 / upem
            }
        };

        // Map the Basic Multilingual Plane through the font's cmap
        let mut glyph_ids = HashMap::new();
        let mut glyph_widths = HashMap::new();
        for codepoint in 0..=0xFFFF_u32 {
            if let Some(ch) = char::from_u32(codepoint) {
                if let Some(gid) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(gid).unwrap_or(0) as i32;
                    glyph_ids.insert(ch, gid.0);
                    glyph_widths.insert(gid.0, scale(advance) as u16);
                }
            }
        }

        let bbox = face.global_bounding_box();
        Ok(Self {
            glyph_ids,
            glyph_widths,
            used: BTreeMap::new(),
            ascender: scale(face.ascender() as i32),
            descender: scale(face.descender() as i32),
            cap_height: scale(face.capital_height().unwrap_or(face.ascender()) as i32),
            bbox: (
                scale(bbox.x_min as i32),
                scale(bbox.y_min as i32),
                scale(bbox.x_max as i32),
                scale(bbox.y_max as i32),
            ),
            program: Arc::new(program),
        })
    }

    /// Raw font program bytes.
    pub fn program(&self) -> &[u8] {
        &self.program
    }

    /// Glyph id for a character, if the font maps it.
    pub fn glyph_id(&self, ch: char) -> Option<u16> {
        self.glyph_ids.get(&ch).copied()
    }

    /// Width of one character in 1/1000 em.
    pub fn char_width(&self, ch: char) -> f32 {
        self.glyph_id(ch)
            .and_then(|gid| self.glyph_widths.get(&gid))
            .copied()
            .unwrap_or(500) as f32
    }

    /// Record every character of `text` in the used set.
    pub fn record_usage(&mut self, text: &str) {
        for ch in text.chars() {
            if let Some(gid) = self.glyph_id(ch) {
                self.used.insert(ch, gid);
            }
        }
    }

    /// Number of distinct characters placed with this font.
    pub fn used_char_count(&self) -> usize {
        self.used.len()
    }

    /// Encode `text` as an Identity-H hex string (`<...>`), one 4-digit
    /// glyph id per character. Unmapped characters encode as glyph 0.
    pub fn encode_hex(&self, text: &str) -> String {
        let mut hex = String::with_capacity(text.len() * 4 + 2);
        hex.push('<');
        for ch in text.chars() {
            let gid = self.glyph_id(ch).unwrap_or(0);
            hex.push_str(&format!("{:04X}", gid));
        }
        hex.push('>');
        hex
    }

    /// Subset tag: six uppercase letters derived from the used glyph
    /// set, stable across compiles of the same graph.
    pub fn subset_tag(&self) -> String {
        let mut hash: u64 = 0xcbf29ce484222325;
        for (&ch, &gid) in &self.used {
            for byte in (ch as u32).to_be_bytes().iter().chain(gid.to_be_bytes().iter()) {
                hash ^= *byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
        }
        let mut tag = String::with_capacity(6);
        for _ in 0..6 {
            tag.push((b'A' + (hash % 26) as u8) as char);
            hash /= 26;
        }
        tag
    }

    /// CID width runs (`/W` entry source) for the used glyphs: each run
    /// is a starting glyph id and the widths of the consecutive glyphs
    /// from it.
    pub fn width_runs(&self) -> Vec<(u16, Vec<u16>)> {
        let mut glyphs: Vec<u16> = self.used.values().copied().collect();
        glyphs.sort_unstable();
        glyphs.dedup();

        let mut runs = Vec::new();
        let mut i = 0;
        while i < glyphs.len() {
            let start = glyphs[i];
            let mut widths = vec![self.glyph_widths.get(&start).copied().unwrap_or(500)];
            while i + 1 < glyphs.len() && glyphs[i + 1] == glyphs[i] + 1 {
                i += 1;
                widths.push(self.glyph_widths.get(&glyphs[i]).copied().unwrap_or(500));
            }
            runs.push((start, widths));
            i += 1;
        }
        runs
    }

    /// ToUnicode CMap source for the used glyphs.
    pub fn to_unicode_cmap(&self) -> String {
        let mut mappings: Vec<(u16, u32)> =
            self.used.iter().map(|(&ch, &gid)| (gid, ch as u32)).collect();
        mappings.sort_by_key(|&(gid, _)| gid);

        let mut cmap = String::new();
        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo <<\n");
        cmap.push_str("  /Registry (Adobe)\n");
        cmap.push_str("  /Ordering (UCS)\n");
        cmap.push_str("  /Supplement 0\n");
        cmap.push_str(">> def\n");
        cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n");
        cmap.push_str("<0000> <FFFF>\n");
        cmap.push_str("endcodespacerange\n");

        // At most 100 entries per bfchar section
        for chunk in mappings.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for &(gid, unicode) in chunk {
                if unicode <= 0xFFFF {
                    cmap.push_str(&format!("<{:04X}> <{:04X}>\n", gid, unicode));
                } else {
                    let high = ((unicode - 0x10000) >> 10) + 0xD800;
                    let low = ((unicode - 0x10000) & 0x3FF) + 0xDC00;
                    cmap.push_str(&format!("<{:04X}> <{:04X}{:04X}>\n", gid, high, low));
                }
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\n");
        cmap.push_str("end\n");
        cmap
    }
}

#[cfg(test)]
impl EmbeddedFontData {
    /// Synthetic font data for tests that need an embedded font without
    /// a real font program: maps `'a'..='z'` to glyph ids 1..=26.
    pub(crate) fn stub() -> Self {
        let mut glyph_ids = HashMap::new();
        let mut glyph_widths = HashMap::new();
        for (i, ch) in ('a'..='z').enumerate() {
            glyph_ids.insert(ch, (i + 1) as u16);
            glyph_widths.insert((i + 1) as u16, 500 + i as u16);
        }
        EmbeddedFontData {
            program: Arc::new(b"\x00\x01\x00\x00".to_vec()),
            glyph_ids,
            glyph_widths,
            used: BTreeMap::new(),
            ascender: 750,
            descender: -250,
            cap_height: 700,
            bbox: (-100, -250, 1000, 900),
        }
    }
}
