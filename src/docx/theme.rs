//! Theme font scheme (`word/theme/theme1.xml`)

use quick_xml::events::Event;

use super::reader::{attr, xml_reader, THEME_PART};
use crate::error::{Error, Result};

/// Latin typefaces of the theme's major (headings) and minor (body) fonts
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ThemeFonts {
    pub major: Option<String>,
    pub minor: Option<String>,
}

pub(crate) fn parse(content: &str) -> Result<ThemeFonts> {
    let mut reader = xml_reader(content);
    let mut fonts = ThemeFonts::default();
    let mut in_major = false;
    let mut in_minor = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"majorFont" => in_major = true,
                b"minorFont" => in_minor = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"latin" => {
                let typeface = attr(e, "typeface").filter(|t| !t.is_empty());
                if in_major && fonts.major.is_none() {
                    fonts.major = typeface;
                } else if in_minor && fonts.minor.is_none() {
                    fonts.minor = typeface;
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"majorFont" => in_major = false,
                b"minorFont" => in_minor = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::xml(THEME_PART, e)),
            _ => {}
        }
    }

    Ok(fonts)
}
