//! Main document part (`word/document.xml`) parsing
//!
//! Produces paragraphs and runs with their unresolved properties plus the page
//! setup of the last section. Table cells are flattened into the body flow;
//! text boxes and alternate content fallbacks are skipped.

use quick_xml::events::{BytesStart, Event};

use super::props::{ParaProps, RunProps};
use super::reader::{attr, parse_twips, xml_reader, DOCUMENT_PART};
use super::PAGE_BREAK;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub(crate) struct RawRun {
    pub style_id: Option<String>,
    pub props: RunProps,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RawParagraph {
    pub style_id: Option<String>,
    pub props: ParaProps,
    pub runs: Vec<RawRun>,
}

/// Everything read from the document part, in points where a length applies
#[derive(Debug, Default)]
pub(crate) struct Body {
    pub paragraphs: Vec<RawParagraph>,
    pub page_width: Option<f32>,
    pub page_height: Option<f32>,
    pub margin_top: Option<f32>,
    pub margin_bottom: Option<f32>,
    pub margin_left: Option<f32>,
    pub margin_right: Option<f32>,
}

/// Elements whose whole subtree is ignored
const SKIPPED: &[&[u8]] = &[b"txbxContent", b"Fallback", b"footnoteReference", b"instrText", b"delText"];

struct BodyParser {
    body: Body,
    stack: Vec<Vec<u8>>,
    paragraph: Option<RawParagraph>,
    run: Option<RawRun>,
    skip_depth: Option<usize>,
    saw_root: bool,
}

impl BodyParser {
    fn new() -> Self {
        Self {
            body: Body::default(),
            stack: Vec::new(),
            paragraph: None,
            run: None,
            skip_depth: None,
            saw_root: false,
        }
    }

    fn parent(&self) -> &[u8] {
        self.stack.last().map(Vec::as_slice).unwrap_or_default()
    }

    fn inside(&self, name: &[u8]) -> bool {
        self.stack.iter().any(|n| n.as_slice() == name)
    }

    fn open(&mut self, e: &BytesStart) {
        let local = e.local_name();
        let name = local.as_ref();

        if name == b"document" && self.stack.is_empty() {
            self.saw_root = true;
        }
        if self.skip_depth.is_some() {
            return;
        }
        if SKIPPED.contains(&name) {
            self.skip_depth = Some(self.stack.len());
            return;
        }

        match name {
            b"p" => self.paragraph = Some(RawParagraph::default()),
            b"r" if self.paragraph.is_some() => self.run = Some(RawRun::default()),
            b"pStyle" if self.parent() == b"pPr" => {
                if let Some(p) = self.paragraph.as_mut() {
                    p.style_id = attr(e, "val");
                }
            }
            b"rStyle" if self.parent() == b"rPr" => {
                if let Some(r) = self.run.as_mut() {
                    r.style_id = attr(e, "val");
                }
            }
            b"pgSz" if self.parent() == b"sectPr" => {
                self.body.page_width = attr(e, "w").as_deref().and_then(parse_twips);
                self.body.page_height = attr(e, "h").as_deref().and_then(parse_twips);
            }
            b"pgMar" if self.parent() == b"sectPr" => {
                self.body.margin_top = attr(e, "top").as_deref().and_then(parse_twips).map(f32::abs);
                self.body.margin_bottom = attr(e, "bottom").as_deref().and_then(parse_twips).map(f32::abs);
                self.body.margin_left = attr(e, "left").as_deref().and_then(parse_twips);
                self.body.margin_right = attr(e, "right").as_deref().and_then(parse_twips);
            }
            _ if self.parent() == b"pPr" => {
                if let Some(p) = self.paragraph.as_mut() {
                    p.props.read_property(e);
                }
            }
            // rPr under pPr formats the paragraph mark, not any text
            _ if self.parent() == b"rPr" && !self.inside(b"pPr") => {
                if let Some(r) = self.run.as_mut() {
                    r.props.read_property(e);
                }
            }
            b"br" if self.parent() == b"r" => {
                let is_page = attr(e, "type").as_deref() == Some("page");
                self.push_text(if is_page { PAGE_BREAK } else { '\n' });
            }
            b"cr" if self.parent() == b"r" => self.push_text('\n'),
            b"tab" if self.parent() == b"r" => self.push_text('\t'),
            b"noBreakHyphen" if self.parent() == b"r" => self.push_text('-'),
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        if let Some(depth) = self.skip_depth {
            if self.stack.len() == depth {
                self.skip_depth = None;
            }
            return;
        }

        match name {
            b"r" => {
                if let (Some(run), Some(paragraph)) = (self.run.take(), self.paragraph.as_mut()) {
                    paragraph.runs.push(run);
                }
            }
            b"p" => {
                if let Some(paragraph) = self.paragraph.take() {
                    self.body.paragraphs.push(paragraph);
                }
            }
            _ => {}
        }
    }

    fn push_text(&mut self, c: char) {
        if let Some(run) = self.run.as_mut() {
            run.text.push(c);
        }
    }

    fn text(&mut self, text: &str) {
        if self.skip_depth.is_none() && self.parent() == b"t" {
            if let Some(run) = self.run.as_mut() {
                run.text.push_str(text);
            }
        }
    }
}

pub(crate) fn parse(content: &str) -> Result<Body> {
    let mut reader = xml_reader(content);
    let mut parser = BodyParser::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                parser.open(&e);
                parser.stack.push(e.local_name().as_ref().to_vec());
            }
            Ok(Event::Empty(e)) => {
                parser.open(&e);
                parser.close(e.local_name().as_ref());
            }
            Ok(Event::End(e)) => {
                parser.stack.pop();
                parser.close(e.local_name().as_ref());
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| Error::xml(DOCUMENT_PART, e))?;
                parser.text(&text);
            }
            Ok(Event::CData(t)) => {
                let text = String::from_utf8_lossy(&t).into_owned();
                parser.text(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::xml(DOCUMENT_PART, e)),
            _ => {}
        }
    }

    if !parser.saw_root {
        return Err(Error::InvalidDocument("document part has no w:document root".to_string()));
    }

    Ok(parser.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::props::Alignment;

    fn parse_body(body: &str) -> Body {
        parse(&crate::docx::fixture::document_xml(body)).expect("parse body")
    }

    #[test]
    fn test_runs_and_whitespace() {
        let body = parse_body(
            r#"<w:p><w:r><w:t xml:space="preserve">Hello, </w:t></w:r><w:r><w:t>world &amp; co</w:t></w:r></w:p>"#,
        );
        assert_eq!(body.paragraphs.len(), 1);
        let runs = &body.paragraphs[0].runs;
        assert_eq!(runs[0].text, "Hello, ");
        assert_eq!(runs[1].text, "world & co");
    }

    #[test]
    fn test_breaks_and_tabs() {
        let body = parse_body(
            r#"<w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t><w:br w:type="page"/><w:t>d</w:t></w:r></w:p>"#,
        );
        assert_eq!(body.paragraphs[0].runs[0].text, "a\tb\nc\u{c}d");
    }

    #[test]
    fn test_paragraph_properties_ignore_mark_formatting() {
        let body = parse_body(
            r#"<w:p>
                 <w:pPr>
                   <w:pStyle w:val="Heading1"/>
                   <w:jc w:val="center"/>
                   <w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs>
                   <w:rPr><w:b/></w:rPr>
                 </w:pPr>
                 <w:r><w:rPr><w:rStyle w:val="Strong"/><w:i/></w:rPr><w:t>x</w:t></w:r>
               </w:p>"#,
        );
        let p = &body.paragraphs[0];
        assert_eq!(p.style_id.as_deref(), Some("Heading1"));
        assert_eq!(p.props.alignment, Some(Alignment::Center));
        assert_eq!(p.runs.len(), 1);
        assert_eq!(p.runs[0].text, "x");
        assert_eq!(p.runs[0].style_id.as_deref(), Some("Strong"));
        assert_eq!(p.runs[0].props.italic, Some(true));
        assert_eq!(p.runs[0].props.bold, None);
    }

    #[test]
    fn test_table_cells_flatten_and_textboxes_skip() {
        let body = parse_body(
            r#"<w:tbl><w:tr>
                 <w:tc><w:p><w:r><w:t>cell 1</w:t></w:r></w:p></w:tc>
                 <w:tc><w:p><w:r><w:t>cell 2</w:t></w:r></w:p></w:tc>
               </w:tr></w:tbl>
               <w:p><w:r><w:t>after</w:t>
                 <w:pict><w:txbxContent><w:p><w:r><w:t>hidden</w:t></w:r></w:p></w:txbxContent></w:pict>
               </w:r></w:p>"#,
        );
        let texts: Vec<String> = body
            .paragraphs
            .iter()
            .map(|p| p.runs.iter().map(|r| r.text.as_str()).collect())
            .collect();
        assert_eq!(texts, vec!["cell 1", "cell 2", "after"]);
    }

    #[test]
    fn test_field_instructions_are_not_text() {
        let body = parse_body(
            r#"<w:p><w:r><w:instrText> PAGE </w:instrText></w:r><w:r><w:t>1</w:t></w:r></w:p>"#,
        );
        let text: String = body.paragraphs[0].runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(text, "1");
    }

    #[test]
    fn test_malformed_document() {
        let result = parse("<w:document><w:body><w:p></w:body></w:document>");
        assert!(matches!(result, Err(Error::Xml { .. })));
    }
}
