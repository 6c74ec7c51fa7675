//! Fonts chosen for one export, addressed by key

use std::sync::Arc;

use super::face::LoadedFont;
use super::standard::StandardFont;

/// Handle to a font in a [`FontSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontKey(usize);

impl FontKey {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A font as the PDF writer will reference it
#[derive(Debug, Clone)]
pub enum PdfFont {
    /// TrueType/OpenType face embedded as a CID font
    Embedded(Arc<LoadedFont>),
    /// Base-14 font, not embedded
    Standard(StandardFont),
}

impl PdfFont {
    /// Width of `text` in points
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        match self {
            PdfFont::Embedded(face) => face.text_width(text, size),
            PdfFont::Standard(font) => font.text_width(text, size),
        }
    }

    /// Distance from the baseline to the top of the font, in points
    pub fn ascent(&self, size: f32) -> f32 {
        match self {
            PdfFont::Embedded(face) => face.ascent(size),
            PdfFont::Standard(font) => font.ascent(size),
        }
    }

    /// Name shown in logs
    pub fn name(&self) -> &str {
        match self {
            PdfFont::Embedded(face) => &face.info().name,
            PdfFont::Standard(font) => font.base_font(),
        }
    }

    fn same_as(&self, other: &PdfFont) -> bool {
        match (self, other) {
            (PdfFont::Embedded(a), PdfFont::Embedded(b)) => Arc::ptr_eq(a, b),
            (PdfFont::Standard(a), PdfFont::Standard(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    family: String,
    bold: bool,
    italic: bool,
    key: FontKey,
}

/// Maps requested (family, bold, italic) triples to distinct PDF fonts
///
/// Several requests may share one font, e.g. every unresolved family falling
/// back to the same face; that font is written to the PDF once.
#[derive(Debug, Clone, Default)]
pub struct FontSet {
    fonts: Vec<PdfFont>,
    entries: Vec<Entry>,
}

impl FontSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the font used for a request, reusing an existing key for the same font
    pub fn insert(&mut self, family: &str, bold: bool, italic: bool, font: PdfFont) -> FontKey {
        let key = match self.fonts.iter().position(|f| f.same_as(&font)) {
            Some(index) => FontKey(index),
            None => {
                self.fonts.push(font);
                FontKey(self.fonts.len() - 1)
            }
        };

        match self.entry_mut(family, bold, italic) {
            Some(entry) => entry.key = key,
            None => self.entries.push(Entry {
                family: family.to_string(),
                bold,
                italic,
                key,
            }),
        }

        key
    }

    fn entry_mut(&mut self, family: &str, bold: bool, italic: bool) -> Option<&mut Entry> {
        self.entries
            .iter_mut()
            .find(|e| e.family.eq_ignore_ascii_case(family) && e.bold == bold && e.italic == italic)
    }

    /// Key recorded for a request
    pub fn key(&self, family: &str, bold: bool, italic: bool) -> Option<FontKey> {
        self.entries
            .iter()
            .find(|e| e.family.eq_ignore_ascii_case(family) && e.bold == bold && e.italic == italic)
            .map(|e| e.key)
    }

    /// Font behind a key handed out by this set
    pub fn get(&self, key: FontKey) -> &PdfFont {
        &self.fonts[key.0]
    }

    /// Distinct fonts in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (FontKey, &PdfFont)> {
        self.fonts.iter().enumerate().map(|(i, f)| (FontKey(i), f))
    }

    pub(crate) fn len(&self) -> usize {
        self.fonts.len()
    }
}
