//! Parsed font faces

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustybuzz::ttf_parser::{self, name_id, GlyphId, Tag};

use crate::error::{Error, Result};

/// Names and style of a registered face
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontInfo {
    /// Family name (name ID 1)
    pub name: String,
    /// Typographic family (name ID 16), when the face declares one
    pub typographic_family: Option<String>,
    pub full_name: Option<String>,
    pub postscript_name: Option<String>,
    pub bold: bool,
    pub italic: bool,
    /// File the face was loaded from, if any
    pub source: Option<PathBuf>,
}

impl FontInfo {
    /// Case-insensitive match against any of the face's names
    pub fn matches(&self, requested: &str) -> bool {
        let requested = requested.trim();
        std::iter::once(&self.name)
            .chain(self.typographic_family.iter())
            .chain(self.full_name.iter())
            .chain(self.postscript_name.iter())
            .any(|n| n.eq_ignore_ascii_case(requested))
    }
}

/// A font face with its raw file data
#[derive(Debug)]
pub struct LoadedFont {
    data: Arc<Vec<u8>>,
    index: u32,
    info: FontInfo,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    cap_height: i16,
    bbox: [i16; 4],
    cff: bool,
}

impl LoadedFont {
    /// Parse every face in `data`; collections yield one entry per face
    pub fn load_all(data: Vec<u8>, source: Option<&Path>) -> Result<Vec<LoadedFont>> {
        let data = Arc::new(data);
        let count = ttf_parser::fonts_in_collection(&data).unwrap_or(1);

        (0..count)
            .map(|index| LoadedFont::load(Arc::clone(&data), index, source))
            .collect()
    }

    fn load(data: Arc<Vec<u8>>, index: u32, source: Option<&Path>) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, index).map_err(|e| {
            let origin = source
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "font data".to_string());
            Error::Font(format!("{} (face {}): {}", origin, index, e))
        })?;

        let name = |id: u16| -> Option<String> {
            face.names()
                .into_iter()
                .filter(|n| n.name_id == id && n.is_unicode())
                .find_map(|n| n.to_string())
                .filter(|s| !s.trim().is_empty())
        };

        let family = name(name_id::FAMILY)
            .or_else(|| name(name_id::FULL_NAME))
            .or_else(|| name(name_id::POST_SCRIPT_NAME))
            .ok_or_else(|| Error::Font("face has no usable family name".to_string()))?;

        let info = FontInfo {
            name: family,
            typographic_family: name(name_id::TYPOGRAPHIC_FAMILY),
            full_name: name(name_id::FULL_NAME),
            postscript_name: name(name_id::POST_SCRIPT_NAME),
            bold: face.is_bold(),
            italic: face.is_italic(),
            source: source.map(Path::to_path_buf),
        };

        let bbox = face.global_bounding_box();
        let units_per_em = face.units_per_em();
        let ascender = face.ascender();
        let descender = face.descender();
        let cap_height = face.capital_height().unwrap_or(ascender);
        let cff = face.raw_face().table(Tag::from_bytes(b"CFF ")).is_some();

        Ok(Self {
            info,
            index,
            units_per_em,
            ascender,
            descender,
            cap_height,
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
            cff,
            data,
        })
    }

    pub fn info(&self) -> &FontInfo {
        &self.info
    }

    /// Raw bytes of the file the face came from
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether two faces were loaded from identical bytes at the same index
    pub fn same_face(&self, data: &[u8], index: u32) -> bool {
        self.index == index && self.data.as_slice() == data
    }

    /// Face index within a collection, 0 for single-face files
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Whether outlines are CFF rather than TrueType `glyf`
    pub fn is_cff(&self) -> bool {
        self.cff
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    pub fn ascender(&self) -> i16 {
        self.ascender
    }

    pub fn descender(&self) -> i16 {
        self.descender
    }

    pub fn cap_height(&self) -> i16 {
        self.cap_height
    }

    /// Global bounding box as `[x_min, y_min, x_max, y_max]` in font units
    pub fn bbox(&self) -> [i16; 4] {
        self.bbox
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        // Validated in `load`, so this only fails if the data changed underneath
        ttf_parser::Face::parse(&self.data, self.index).ok()
    }

    /// Glyph for a character; 0 (`.notdef`) when the face lacks it
    pub fn glyph_id(&self, c: char) -> u16 {
        self.face()
            .and_then(|face| face.glyph_index(c))
            .map(|id| id.0)
            .unwrap_or(0)
    }

    /// Advance width of a glyph in font units
    pub fn glyph_advance(&self, gid: u16) -> u16 {
        self.face()
            .and_then(|face| face.glyph_hor_advance(GlyphId(gid)))
            .unwrap_or(0)
    }

    /// Shaped width of `text` in points
    ///
    /// Kerning and ligatures are off: text is drawn glyph by glyph from the
    /// cmap, so the measured advance has to match that.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let Some(face) = rustybuzz::Face::from_slice(&self.data, self.index) else {
            return 0.0;
        };

        let features = [
            rustybuzz::Feature::new(Tag::from_bytes(b"kern"), 0, ..),
            rustybuzz::Feature::new(Tag::from_bytes(b"liga"), 0, ..),
        ];
        let mut buffer = rustybuzz::UnicodeBuffer::new();
        buffer.push_str(text);
        let shaped = rustybuzz::shape(&face, &features, buffer);
        let advance: i32 = shaped.glyph_positions().iter().map(|p| p.x_advance).sum();

        advance as f32 / self.units_per_em as f32 * size
    }

    /// Distance from baseline to the top of the face, in points
    pub fn ascent(&self, size: f32) -> f32 {
        self.ascender as f32 / self.units_per_em as f32 * size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str) -> FontInfo {
        FontInfo {
            name: name.to_string(),
            typographic_family: None,
            full_name: Some(format!("{} Regular", name)),
            postscript_name: Some(format!("{}-Regular", name.replace(' ', ""))),
            bold: false,
            italic: false,
            source: None,
        }
    }

    #[test]
    fn test_matches_any_name_case_insensitive() {
        let font = info("JetBrains Mono");
        assert!(font.matches("jetbrains mono"));
        assert!(font.matches("JetBrains Mono Regular"));
        assert!(font.matches("JetBrainsMono-Regular"));
        assert!(font.matches(" JetBrains Mono "));
        assert!(!font.matches("JetBrains"));
    }

    #[test]
    fn test_load_rejects_non_font_data() {
        let result = LoadedFont::load_all(vec![0u8; 100], Some(Path::new("bogus.ttf")));
        match result {
            Err(Error::Font(message)) => assert!(message.contains("bogus.ttf")),
            other => panic!("expected font error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_rejects_empty_data() {
        assert!(LoadedFont::load_all(Vec::new(), None).is_err());
    }
}
