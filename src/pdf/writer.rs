//! Serialize laid-out pages into a PDF document

use std::fmt::Write as _;

use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use super::embed::{embed_font, escape_pdf_string, hex_string, use_standard_font, GlyphUsage};
use crate::error::{Error, Result};
use crate::fonts::{FontSet, PdfFont};
use crate::layout::{PageLayout, TextFragment};

/// Value of the `Producer` entry in the document information dictionary
pub const PRODUCER: &str = concat!("docx-font-probe ", env!("CARGO_PKG_VERSION"));

/// Underline offset below the baseline, as a fraction of the font size
const UNDERLINE_OFFSET: f32 = 0.1;
const UNDERLINE_THICKNESS: f32 = 0.05;

/// Resource name of a font in the shared font dictionary
fn resource_name(index: usize) -> String {
    format!("F{}", index + 1)
}

/// Compact decimal with at most two fractional digits
fn num(value: f32) -> String {
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" { "0".to_string() } else { text.to_string() }
}

/// Content stream operators for one page
fn page_content(page: &PageLayout, fonts: &FontSet, usage: &mut [GlyphUsage]) -> String {
    let mut content = String::new();
    let mut color = None;

    for fragment in &page.fragments {
        if color != Some(fragment.color) {
            let c = fragment.color;
            let _ = writeln!(
                content,
                "{} {} {} rg",
                num(c.r as f32 / 255.0),
                num(c.g as f32 / 255.0),
                num(c.b as f32 / 255.0)
            );
            color = Some(c);
        }

        let index = fragment.font.index();
        let string = match fonts.get(fragment.font) {
            PdfFont::Embedded(face) => format!("<{}>", hex_string(&usage[index].encode(face, &fragment.text))),
            PdfFont::Standard(_) => format!("({})", escape_pdf_string(&fragment.text)),
        };

        content.push_str("BT\n");
        let _ = writeln!(content, "/{} {} Tf", resource_name(index), num(fragment.size));
        let _ = writeln!(content, "1 0 0 1 {} {} Tm", num(fragment.x), num(fragment.y));
        let _ = writeln!(content, "{} Tj", string);
        content.push_str("ET\n");

        if fragment.underline {
            underline(&mut content, fragment);
        }
    }

    content
}

fn underline(content: &mut String, fragment: &TextFragment) {
    let thickness = (fragment.size * UNDERLINE_THICKNESS).max(0.5);
    let y = fragment.y - fragment.size * UNDERLINE_OFFSET - thickness;
    let _ = writeln!(
        content,
        "{} {} {} {} re f",
        num(fragment.x),
        num(y),
        num(fragment.width),
        num(thickness)
    );
}

/// Render pages into PDF bytes
///
/// Every fragment's font must come from `fonts`. Only fonts actually drawn
/// with are written; the output carries no timestamps or generated ids, so
/// identical input gives identical bytes.
pub fn export(pages: &[PageLayout], fonts: &FontSet) -> Result<Vec<u8>> {
    if pages.is_empty() {
        return Err(Error::General("Cannot export a document without pages".to_string()));
    }

    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    // Content first so glyph usage is known before fonts are embedded
    let mut usage: Vec<GlyphUsage> = fonts.iter().map(|_| GlyphUsage::default()).collect();
    let mut used = vec![false; fonts.len()];
    let contents: Vec<String> = pages
        .iter()
        .map(|page| {
            for fragment in &page.fragments {
                used[fragment.font.index()] = true;
            }
            page_content(page, fonts, &mut usage)
        })
        .collect();

    let mut font_dict = lopdf::Dictionary::new();
    for (key, font) in fonts.iter() {
        if !used[key.index()] {
            continue;
        }
        let font_id = match font {
            PdfFont::Embedded(face) => embed_font(&mut doc, face, &usage[key.index()])?,
            PdfFont::Standard(standard) => use_standard_font(&mut doc, *standard),
        };
        debug!("Font {} -> {}", resource_name(key.index()), font.name());
        font_dict.set(resource_name(key.index()), font_id);
    }

    let resources_id = doc.add_object(dictionary! {
        "Font" => font_dict,
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for (page, content) in pages.iter().zip(contents) {
        let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), content.into_bytes()));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(page.width), Object::Real(page.height)],
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Producer" => Object::string_literal(PRODUCER),
    });

    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}
