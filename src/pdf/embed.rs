//! Font dictionaries for the exported PDF
//!
//! Embedded faces become Type0 fonts with Identity-H encoding, so every code
//! in a string is a two-byte glyph id of the embedded subset. TrueType
//! outlines go in as a CIDFontType2 `FontFile2`, CFF outlines as a
//! CIDFontType0 `FontFile3` of subtype `OpenType`. Standard fonts are plain
//! Type1 references with WinAnsi encoding.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use subsetter::GlyphRemapper;

use crate::error::{Error, Result};
use crate::fonts::{encode_win_ansi, LoadedFont, StandardFont};

/// Maximum entries per `beginbfchar` block
const BFCHAR_BLOCK: usize = 100;

/// Glyphs drawn with one embedded face
///
/// Glyph ids are remapped into the subset's numbering as text is encoded,
/// in order of first use; `.notdef` stays 0.
pub(crate) struct GlyphUsage {
    remapper: GlyphRemapper,
    /// Subset glyph id to the face's glyph id and the character drawn with it
    glyphs: BTreeMap<u16, (u16, char)>,
}

impl Default for GlyphUsage {
    fn default() -> Self {
        let mut remapper = GlyphRemapper::new();
        remapper.remap(0);
        Self {
            remapper,
            glyphs: BTreeMap::new(),
        }
    }
}

impl GlyphUsage {
    /// Encode text as big-endian subset glyph ids, recording every glyph used
    pub fn encode(&mut self, face: &LoadedFont, text: &str) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(text.len() * 2);
        for c in text.chars() {
            let gid = face.glyph_id(c);
            let new_gid = self.remapper.remap(gid);
            self.glyphs.entry(new_gid).or_insert((gid, c));
            bytes.extend_from_slice(&new_gid.to_be_bytes());
        }
        bytes
    }
}

/// Outline flavour of an embedded font program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FontProgram {
    TrueType,
    OpenTypeCff,
}

impl FontProgram {
    pub fn of(face: &LoadedFont) -> Self {
        if face.is_cff() {
            FontProgram::OpenTypeCff
        } else {
            FontProgram::TrueType
        }
    }

    /// Font descriptor key holding the program stream
    pub fn file_key(self) -> &'static str {
        match self {
            FontProgram::TrueType => "FontFile2",
            FontProgram::OpenTypeCff => "FontFile3",
        }
    }

    /// Subtype of the descendant CID font
    pub fn cid_subtype(self) -> &'static str {
        match self {
            FontProgram::TrueType => "CIDFontType2",
            FontProgram::OpenTypeCff => "CIDFontType0",
        }
    }

    /// Dictionary of the program stream
    fn stream_dict(self, length: usize) -> Dictionary {
        match self {
            FontProgram::TrueType => dictionary! { "Length1" => length as i64 },
            FontProgram::OpenTypeCff => dictionary! { "Subtype" => "OpenType" },
        }
    }
}

/// Single-face program holding only the used glyphs, numbered as in `usage`
pub(crate) fn subset_program(face: &LoadedFont, usage: &GlyphUsage) -> Result<Vec<u8>> {
    subsetter::subset(face.data(), face.index(), &usage.remapper).map_err(|e| {
        Error::Font(format!(
            "cannot subset '{}' (face {}): {}",
            face.info().name,
            face.index(),
            e
        ))
    })
}

/// PDF name for a face: PostScript name, or the family with spaces removed
fn base_font_name(face: &LoadedFont) -> String {
    let info = face.info();
    let name = info.postscript_name.as_deref().unwrap_or(&info.name);
    name.chars()
        .filter(|c| c.is_ascii_graphic() && !"()<>[]{}/%#".contains(*c))
        .collect()
}

/// Scale font units to the 1/1000 em text space units PDF fonts use
fn to_text_space(face: &LoadedFont, value: i32) -> i64 {
    let upem = face.units_per_em().max(1) as f32;
    (value as f32 * 1000.0 / upem).round() as i64
}

/// `W` array: runs of consecutive glyph ids share one width list
fn widths_array(face: &LoadedFont, usage: &GlyphUsage) -> Vec<Object> {
    let mut array = Vec::new();
    let mut start: Option<u16> = None;
    let mut previous: u16 = 0;
    let mut widths: Vec<Object> = Vec::new();

    for (&gid, &(original, _)) in &usage.glyphs {
        let width = Object::Integer(to_text_space(face, face.glyph_advance(original) as i32));
        match start {
            Some(_) if gid == previous.wrapping_add(1) => widths.push(width),
            _ => {
                if let Some(first) = start {
                    array.push(Object::Integer(first as i64));
                    array.push(Object::Array(std::mem::take(&mut widths)));
                }
                start = Some(gid);
                widths.push(width);
            }
        }
        previous = gid;
    }
    if let Some(first) = start {
        array.push(Object::Integer(first as i64));
        array.push(Object::Array(widths));
    }

    array
}

/// ToUnicode CMap mapping each used glyph back to its character
fn to_unicode_cmap(usage: &GlyphUsage) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );

    let entries: Vec<(u16, char)> = usage
        .glyphs
        .iter()
        .filter(|(gid, _)| **gid != 0)
        .map(|(gid, (_, c))| (*gid, *c))
        .collect();
    for block in entries.chunks(BFCHAR_BLOCK) {
        let _ = writeln!(cmap, "{} beginbfchar", block.len());
        for (gid, c) in block {
            let mut units = [0u16; 2];
            let hex: String = c.encode_utf16(&mut units).iter().map(|u| format!("{:04X}", u)).collect();
            let _ = writeln!(cmap, "<{:04X}> <{}>", gid, hex);
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap
}

/// Embed the used glyphs of a face and return the Type0 font object
pub(crate) fn embed_font(doc: &mut Document, face: &LoadedFont, usage: &GlyphUsage) -> Result<ObjectId> {
    let name = base_font_name(face);
    let info = face.info();
    let program = FontProgram::of(face);

    let data = subset_program(face, usage)?;
    let font_file_id = doc.add_object(Stream::new(program.stream_dict(data.len()), data));

    let [x_min, y_min, x_max, y_max] = face.bbox();
    let mut flags = 32; // Nonsymbolic
    if info.italic {
        flags |= 64;
    }

    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => Object::Name(name.clone().into_bytes()),
        "FontFamily" => Object::String(info.name.clone().into_bytes(), StringFormat::Literal),
        "Flags" => flags,
        "FontBBox" => [x_min, y_min, x_max, y_max]
            .iter()
            .map(|v| Object::Integer(to_text_space(face, *v as i32)))
            .collect::<Vec<Object>>(),
        "ItalicAngle" => if info.italic { -12 } else { 0 },
        "Ascent" => to_text_space(face, face.ascender() as i32),
        "Descent" => to_text_space(face, face.descender() as i32),
        "CapHeight" => to_text_space(face, face.cap_height() as i32),
        "StemV" => if info.bold { 120 } else { 80 },
        program.file_key() => font_file_id,
    });

    let mut cid_font = dictionary! {
        "Type" => "Font",
        "Subtype" => program.cid_subtype(),
        "BaseFont" => Object::Name(name.clone().into_bytes()),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => to_text_space(face, face.glyph_advance(0) as i32),
        "W" => widths_array(face, usage),
    };
    if program == FontProgram::TrueType {
        cid_font.set("CIDToGIDMap", "Identity");
    }
    let cid_font_id = doc.add_object(cid_font);

    let to_unicode_id = doc.add_object(Stream::new(
        Dictionary::new(),
        to_unicode_cmap(usage).into_bytes(),
    ));

    Ok(doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => Object::Name(name.into_bytes()),
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(cid_font_id)],
        "ToUnicode" => to_unicode_id,
    }))
}

/// Reference one of the base-14 Helvetica faces
pub(crate) fn use_standard_font(doc: &mut Document, font: StandardFont) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(),
        "Encoding" => "WinAnsiEncoding",
    })
}

/// WinAnsi text as a PDF literal string body, escaping delimiters and non-ASCII bytes
pub(crate) fn escape_pdf_string(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for byte in encode_win_ansi(text) {
        match byte {
            b'\\' => escaped.push_str("\\\\"),
            b'(' => escaped.push_str("\\("),
            b')' => escaped.push_str("\\)"),
            0x20..=0x7E => escaped.push(byte as char),
            _ => {
                let _ = write!(escaped, "\\{:03o}", byte);
            }
        }
    }
    escaped
}

/// Bytes as a PDF hex string body
pub(crate) fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}
