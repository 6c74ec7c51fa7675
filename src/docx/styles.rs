//! Style sheet (`word/styles.xml`) parsing and formatting resolution

use std::collections::HashMap;

use quick_xml::events::Event;

use super::body::{RawParagraph, RawRun};
use super::props::{ParaProps, RunProps};
use super::reader::{attr, parse_on_off, xml_reader, STYLES_PART};
use super::theme::ThemeFonts;
use super::{Paragraph, Run, FALLBACK_FONT_FAMILY, FALLBACK_FONT_SIZE};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
struct Style {
    based_on: Option<String>,
    run: RunProps,
    para: ParaProps,
}

/// Document defaults plus named paragraph and character styles
#[derive(Debug, Clone, Default)]
pub(crate) struct StyleSheet {
    pub defaults_run: RunProps,
    pub defaults_para: ParaProps,
    default_paragraph_style: Option<String>,
    styles: HashMap<String, Style>,
}

impl StyleSheet {
    /// Style ids from the root of the `basedOn` chain down to `id`
    fn chain(&self, id: &str) -> Vec<&Style> {
        let mut chain = Vec::new();
        let mut visited: Vec<&str> = Vec::new();
        let mut current = Some(id);

        while let Some(id) = current {
            if visited.contains(&id) {
                break;
            }
            visited.push(id);
            match self.styles.get(id) {
                Some(style) => {
                    chain.push(style);
                    current = style.based_on.as_deref();
                }
                None => break,
            }
        }

        chain.reverse();
        chain
    }

    /// Apply defaults, styles and direct formatting to a parsed paragraph
    pub fn resolve_paragraph(&self, raw: RawParagraph, theme: &ThemeFonts) -> Paragraph {
        let para_style = raw
            .style_id
            .as_deref()
            .or(self.default_paragraph_style.as_deref());

        let mut para_props = self.defaults_para.clone();
        let mut base_run = self.defaults_run.clone();
        if let Some(id) = para_style {
            for style in self.chain(id) {
                para_props.apply(&style.para);
                base_run.apply(&style.run);
            }
        }
        para_props.apply(&raw.props);

        let runs = raw
            .runs
            .into_iter()
            .filter(|r| !r.text.is_empty())
            .map(|r| self.resolve_run(r, &base_run, theme))
            .collect();

        Paragraph {
            alignment: para_props.alignment.unwrap_or_default(),
            space_before: para_props.space_before.unwrap_or(0.0),
            space_after: para_props.space_after.unwrap_or(0.0),
            line_spacing: para_props.line_spacing.unwrap_or_default(),
            indent_left: para_props.indent_left.unwrap_or(0.0),
            indent_right: para_props.indent_right.unwrap_or(0.0),
            indent_first_line: para_props.indent_first_line.unwrap_or(0.0),
            page_break_before: para_props.page_break_before.unwrap_or(false),
            runs,
        }
    }

    fn resolve_run(&self, raw: RawRun, base: &RunProps, theme: &ThemeFonts) -> Run {
        let mut props = base.clone();
        if let Some(id) = raw.style_id.as_deref() {
            for style in self.chain(id) {
                props.apply(&style.run);
            }
        }
        props.apply(&raw.props);

        let font_family = props
            .font
            .as_ref()
            .and_then(|f| f.resolve(theme))
            .or_else(|| self.defaults_run.font.as_ref().and_then(|f| f.resolve(theme)))
            .unwrap_or_else(|| FALLBACK_FONT_FAMILY.to_string());

        Run {
            text: raw.text,
            font_family,
            font_size: props.size.unwrap_or(FALLBACK_FONT_SIZE),
            bold: props.bold.unwrap_or(false),
            italic: props.italic.unwrap_or(false),
            underline: props.underline.unwrap_or(false),
            color: props.color.unwrap_or_default(),
        }
    }
}

#[derive(PartialEq)]
enum Section {
    None,
    RunDefaults,
    ParaDefaults,
    Style,
}

pub(crate) fn parse(content: &str) -> Result<StyleSheet> {
    let mut reader = xml_reader(content);
    let mut sheet = StyleSheet::default();

    let mut section = Section::None;
    let mut current: Option<(String, Style)> = None;
    let mut in_rpr = false;
    let mut in_ppr = false;

    loop {
        let event = reader.read_event().map_err(|e| Error::xml(STYLES_PART, e))?;
        let (e, is_empty) = match event {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(e) => {
                match e.local_name().as_ref() {
                    b"rPrDefault" | b"pPrDefault" => section = Section::None,
                    b"style" => {
                        if let Some((id, style)) = current.take() {
                            sheet.styles.insert(id, style);
                        }
                        section = Section::None;
                    }
                    b"rPr" => in_rpr = false,
                    b"pPr" => in_ppr = false,
                    _ => {}
                }
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        match e.local_name().as_ref() {
            b"rPrDefault" => section = Section::RunDefaults,
            b"pPrDefault" => section = Section::ParaDefaults,
            b"style" => {
                let id = attr(&e, "styleId").unwrap_or_default();
                let kind = attr(&e, "type").unwrap_or_default();
                let is_default = attr(&e, "default").is_some_and(|v| parse_on_off(Some(v)));
                if kind == "paragraph" && is_default {
                    sheet.default_paragraph_style = Some(id.clone());
                }
                section = Section::Style;
                if is_empty {
                    sheet.styles.insert(id, Style::default());
                    section = Section::None;
                } else {
                    current = Some((id, Style::default()));
                }
            }
            b"basedOn" if section == Section::Style => {
                if let Some((_, style)) = current.as_mut() {
                    style.based_on = attr(&e, "val");
                }
            }
            b"rPr" if !is_empty => in_rpr = true,
            b"pPr" if !is_empty => in_ppr = true,
            _ if in_rpr => match section {
                Section::RunDefaults => sheet.defaults_run.read_property(&e),
                Section::Style => {
                    if let Some((_, style)) = current.as_mut() {
                        style.run.read_property(&e);
                    }
                }
                _ => {}
            },
            _ if in_ppr => match section {
                Section::ParaDefaults => sheet.defaults_para.read_property(&e),
                Section::Style => {
                    if let Some((_, style)) = current.as_mut() {
                        style.para.read_property(&e);
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }

    Ok(sheet)
}
