//! Document loading and PDF export over a font repository

use std::io::Write;
use std::path::Path;

use tracing::{debug, info};

use crate::docx::{self, Document};
use crate::error::{Error, Result};
use crate::fonts::{FontRepository, FontSet, PdfFont, StandardFont};
use crate::layout::layout_document;
use crate::pdf;
use crate::settings::{self, DrawingEngine};

/// Holds one loaded document and the fonts used to render it
#[derive(Debug)]
pub struct DocumentServer {
    fonts: FontRepository,
    engine: Option<DrawingEngine>,
    document: Option<Document>,
}

impl DocumentServer {
    pub fn new(fonts: FontRepository) -> Self {
        Self {
            fonts,
            engine: None,
            document: None,
        }
    }

    /// Use `engine` instead of the process-wide setting
    pub fn with_engine(mut self, engine: DrawingEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Drawing engine exports will use
    pub fn engine(&self) -> DrawingEngine {
        self.engine.unwrap_or_else(settings::drawing_engine)
    }

    pub fn fonts(&self) -> &FontRepository {
        &self.fonts
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Load a DOCX file, replacing any previously loaded document
    pub fn load_document(&mut self, path: &Path) -> Result<()> {
        let document = docx::parse(path)?;
        debug!(
            "Loaded {} paragraph(s), fonts used: {:?}",
            document.paragraphs.len(),
            document.used_font_families()
        );
        self.document = Some(document);
        Ok(())
    }

    /// Lay out the loaded document and write it as PDF
    ///
    /// Returns the number of bytes written.
    pub fn export_to_pdf<W: Write>(&mut self, out: &mut W) -> Result<usize> {
        let engine = self.engine();
        let document = self.document.as_ref().ok_or(Error::NoDocumentLoaded)?;

        let fonts = build_font_set(document, &mut self.fonts, engine)?;
        let pages = layout_document(document, &fonts)?;
        let bytes = pdf::export(&pages, &fonts)?;

        out.write_all(&bytes)?;
        info!(
            "Exported {} page(s) with {} font(s) using the {} engine",
            pages.len(),
            fonts.len(),
            engine
        );
        Ok(bytes.len())
    }
}

/// Resolve every (family, bold, italic) the runs ask for, in first-use order
fn build_font_set(document: &Document, repository: &mut FontRepository, engine: DrawingEngine) -> Result<FontSet> {
    let mut set = FontSet::new();

    for run in document.paragraphs.iter().flat_map(|p| p.runs.iter()) {
        if set.key(&run.font_family, run.bold, run.italic).is_some() {
            continue;
        }

        let font = match engine {
            DrawingEngine::Standard => PdfFont::Standard(StandardFont::for_style(run.bold, run.italic)),
            DrawingEngine::Embedded => {
                PdfFont::Embedded(repository.resolve(&run.font_family, run.bold, run.italic)?)
            }
        };
        debug!(
            "'{}' (bold={}, italic={}) drawn with {}",
            run.font_family,
            run.bold,
            run.italic,
            font.name()
        );
        set.insert(&run.font_family, run.bold, run.italic, font);
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::fixture;

    #[test]
    fn test_export_before_load_is_error() {
        let mut server = DocumentServer::new(FontRepository::new());
        let mut out = Vec::new();
        assert!(matches!(server.export_to_pdf(&mut out), Err(Error::NoDocumentLoaded)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_load_missing_document() {
        let mut server = DocumentServer::new(FontRepository::new());
        let result = server.load_document(Path::new("nonexistent.docx"));
        assert!(matches!(result, Err(Error::FileNotFound(_))));
        assert!(server.document().is_none());
    }

    #[test]
    fn test_engine_override() {
        let server = DocumentServer::new(FontRepository::new()).with_engine(DrawingEngine::Standard);
        assert_eq!(server.engine(), DrawingEngine::Standard);
    }

    #[test]
    fn test_standard_engine_export_without_fonts() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("doc.docx");
        std::fs::write(
            &path,
            fixture::simple(
                r#"<w:p><w:r><w:t>Plain</w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t> bold</w:t></w:r></w:p>"#,
            ),
        )
        .expect("write docx");

        let mut server = DocumentServer::new(FontRepository::new()).with_engine(DrawingEngine::Standard);
        server.load_document(&path).expect("load");

        let mut out = Vec::new();
        let written = server.export_to_pdf(&mut out).expect("export");
        assert_eq!(written, out.len());
        assert!(out.starts_with(b"%PDF-"));
        assert_eq!(pdf::inspect(&out).expect("inspect").page_count, 1);
    }

    #[test]
    fn test_embedded_engine_needs_a_font() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("doc.docx");
        std::fs::write(&path, fixture::simple(r#"<w:p><w:r><w:t>x</w:t></w:r></w:p>"#)).expect("write docx");

        let mut server = DocumentServer::new(FontRepository::new()).with_engine(DrawingEngine::Embedded);
        server.load_document(&path).expect("load");

        let mut out = Vec::new();
        assert!(matches!(server.export_to_pdf(&mut out), Err(Error::Font(_))));
        assert!(out.is_empty());
    }
}
