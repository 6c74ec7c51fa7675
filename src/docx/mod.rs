//! DOCX loading
//!
//! Reads the parts of a WordprocessingML package that matter for text layout:
//! the body paragraphs and runs, the style sheet, theme fonts, the font table
//! and the final section's page setup. Formatting is resolved up front so the
//! layout engine only ever sees concrete values.

pub mod reader;
mod body;
mod font_table;
mod props;
mod styles;
mod theme;

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use crate::error::{Error, Result};
use crate::layout::{Length, Margins, PageDimensions};

pub use props::{Alignment, Color, LineSpacing};
use reader::DocxReader;

/// Font family used when neither the runs, the styles nor the defaults name one
pub const FALLBACK_FONT_FAMILY: &str = "Times New Roman";

/// Font size used when nothing in the document sets one (Word's 10pt default)
pub const FALLBACK_FONT_SIZE: f32 = 10.0;

/// Character that stands for a hard page break inside run text
pub const PAGE_BREAK: char = '\u{c}';

/// Page size and margins of the document's final section
#[derive(Debug, Clone, Copy)]
pub struct PageSetup {
    pub dimensions: PageDimensions,
    pub margins: Margins,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            dimensions: PageDimensions::letter(),
            margins: Margins::standard(),
        }
    }
}

/// A run of text with fully resolved formatting
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub font_family: String,
    /// Font size in points
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Color,
}

/// A paragraph with fully resolved formatting
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub alignment: Alignment,
    /// Space before the paragraph in points
    pub space_before: f32,
    /// Space after the paragraph in points
    pub space_after: f32,
    pub line_spacing: LineSpacing,
    pub indent_left: f32,
    pub indent_right: f32,
    /// Negative for hanging indents
    pub indent_first_line: f32,
    pub page_break_before: bool,
    pub runs: Vec<Run>,
}

impl Paragraph {
    /// Concatenated text of all runs
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// In-memory model of a loaded word-processing document
#[derive(Debug, Clone)]
pub struct Document {
    pub page: PageSetup,
    pub paragraphs: Vec<Paragraph>,
    /// Font family from the document defaults, after theme resolution
    pub default_font_family: String,
    /// Font size from the document defaults, in points
    pub default_font_size: f32,
    /// Font names declared in `word/fontTable.xml`, in declaration order
    pub declared_fonts: Vec<String>,
}

impl Document {
    /// Distinct font families used by the runs, in first-use order
    pub fn used_font_families(&self) -> Vec<String> {
        let mut families: Vec<String> = Vec::new();
        for run in self.paragraphs.iter().flat_map(|p| p.runs.iter()) {
            if !families.iter().any(|f| f.eq_ignore_ascii_case(&run.font_family)) {
                families.push(run.font_family.clone());
            }
        }
        families
    }
}

/// Load a DOCX file from disk
pub fn parse(path: &Path) -> Result<Document> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let file = std::fs::File::open(path)?;
    parse_archive(DocxReader::new(std::io::BufReader::new(file))?)
}

/// Load a DOCX package held in memory
pub fn parse_bytes(bytes: &[u8]) -> Result<Document> {
    parse_archive(DocxReader::new(Cursor::new(bytes))?)
}

fn parse_archive<R: Read + Seek>(mut archive: DocxReader<R>) -> Result<Document> {
    if !archive.file_exists(reader::DOCUMENT_PART) {
        return Err(Error::InvalidDocument(format!(
            "missing {}",
            reader::DOCUMENT_PART
        )));
    }

    let theme = match archive.read_optional_part(reader::THEME_PART)? {
        Some(xml) => theme::parse(&xml)?,
        None => theme::ThemeFonts::default(),
    };

    let style_sheet = match archive.read_optional_part(reader::STYLES_PART)? {
        Some(xml) => styles::parse(&xml)?,
        None => styles::StyleSheet::default(),
    };

    let declared_fonts = match archive.read_optional_part(reader::FONT_TABLE_PART)? {
        Some(xml) => font_table::parse(&xml)?,
        None => Vec::new(),
    };

    let body_xml = archive.read_part(reader::DOCUMENT_PART)?;
    let body = body::parse(&body_xml)?;

    let default_font_family = style_sheet
        .defaults_run
        .font
        .as_ref()
        .and_then(|f| f.resolve(&theme))
        .unwrap_or_else(|| FALLBACK_FONT_FAMILY.to_string());
    let default_font_size = style_sheet
        .defaults_run
        .size
        .unwrap_or(FALLBACK_FONT_SIZE);

    let paragraphs = body
        .paragraphs
        .into_iter()
        .map(|raw| style_sheet.resolve_paragraph(raw, &theme))
        .collect();

    let page = PageSetup {
        dimensions: PageDimensions {
            width: body.page_width.map(Length::from_pt).unwrap_or(PageSetup::default().dimensions.width),
            height: body.page_height.map(Length::from_pt).unwrap_or(PageSetup::default().dimensions.height),
        },
        margins: Margins {
            top: body.margin_top.map(Length::from_pt).unwrap_or(Margins::standard().top),
            bottom: body.margin_bottom.map(Length::from_pt).unwrap_or(Margins::standard().bottom),
            left: body.margin_left.map(Length::from_pt).unwrap_or(Margins::standard().left),
            right: body.margin_right.map(Length::from_pt).unwrap_or(Margins::standard().right),
        },
    };

    Ok(Document {
        page,
        paragraphs,
        default_font_family,
        default_font_size,
        declared_fonts,
    })
}

/// Builds small DOCX packages for tests
#[cfg(test)]
pub(crate) mod fixture {
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    /// Wrap body XML in a `w:document` element
    pub fn document_xml(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{W_NS}"><w:body>{body}</w:body></w:document>"#
        )
    }

    /// Zip the given parts into a DOCX byte buffer
    pub fn package(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer
            .start_file("[Content_Types].xml", options)
            .expect("start content types");
        writer
            .write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)
            .expect("write content types");
        for (name, content) in parts {
            writer.start_file(*name, options).expect("start part");
            writer.write_all(content.as_bytes()).expect("write part");
        }
        writer.finish().expect("finish zip").into_inner()
    }

    /// A DOCX with a single document part built from body XML
    pub fn simple(body: &str) -> Vec<u8> {
        package(&[("word/document.xml", &document_xml(body))])
    }
}
