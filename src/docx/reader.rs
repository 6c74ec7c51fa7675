//! ZIP archive access and XML helpers shared by the DOCX part parsers

use std::io::{Read, Seek};

use quick_xml::events::BytesStart;
use zip::ZipArchive;

use crate::error::{Error, Result};

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const STYLES_PART: &str = "word/styles.xml";
pub const THEME_PART: &str = "word/theme/theme1.xml";
pub const FONT_TABLE_PART: &str = "word/fontTable.xml";

/// A wrapper around a ZIP archive for reading DOCX parts
pub struct DocxReader<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> DocxReader<R> {
    /// Open the archive; fails if the source is not a ZIP container
    pub fn new(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        Ok(Self { archive })
    }

    /// Read a required part as UTF-8 text
    pub fn read_part(&mut self, path: &str) -> Result<String> {
        self.read_optional_part(path)?
            .ok_or_else(|| Error::InvalidDocument(format!("missing {}", path)))
    }

    /// Read a part as UTF-8 text, or `None` if the archive does not contain it
    pub fn read_optional_part(&mut self, path: &str) -> Result<Option<String>> {
        let mut file = match self.archive.by_name(path) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| Error::InvalidDocument(format!("{} is not readable text: {}", path, e)))?;
        Ok(Some(contents))
    }

    /// Check if a part exists in the archive
    pub fn file_exists(&self, path: &str) -> bool {
        self.archive.file_names().any(|name| name == path)
    }
}

/// Create an XML reader over a part's text
pub(crate) fn xml_reader(content: &str) -> quick_xml::Reader<&[u8]> {
    // Whitespace inside w:t is significant, so text is never trimmed
    let mut reader = quick_xml::Reader::from_str(content);
    reader.config_mut().trim_text(false);
    reader
}

/// Get an attribute value by local name, ignoring its namespace prefix
pub(crate) fn attr(event: &BytesStart, local: &str) -> Option<String> {
    event
        .attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.local_name().as_ref() == local.as_bytes())
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Twips (1/20 pt) to points
pub(crate) fn parse_twips(value: &str) -> Option<f32> {
    value.trim().parse::<f32>().ok().map(|v| v / 20.0)
}

/// Half-points to points; font sizes are stored this way
pub(crate) fn parse_half_points(value: &str) -> Option<f32> {
    value.trim().parse::<f32>().ok().map(|v| v / 2.0)
}

/// WordprocessingML on/off values; an absent `w:val` means on
pub(crate) fn parse_on_off(value: Option<String>) -> bool {
    match value {
        Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "off" | "none"),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::events::Event;

    #[test]
    fn test_parse_twips() {
        assert_eq!(parse_twips("1440"), Some(72.0));
        assert_eq!(parse_twips("720"), Some(36.0));
        assert_eq!(parse_twips("abc"), None);
    }

    #[test]
    fn test_parse_half_points() {
        assert_eq!(parse_half_points("24"), Some(12.0));
        assert_eq!(parse_half_points("21"), Some(10.5));
    }

    #[test]
    fn test_parse_on_off() {
        assert!(parse_on_off(None));
        assert!(parse_on_off(Some("1".into())));
        assert!(parse_on_off(Some("true".into())));
        assert!(!parse_on_off(Some("0".into())));
        assert!(!parse_on_off(Some("false".into())));
        assert!(!parse_on_off(Some("off".into())));
    }

    #[test]
    fn test_attr_ignores_prefix() {
        let xml = r#"<w:rFonts xmlns:w="urn:w" w:ascii="Inter" hAnsi="Mono"/>"#;
        let mut reader = xml_reader(xml);
        match reader.read_event() {
            Ok(Event::Empty(e)) => {
                assert_eq!(attr(&e, "ascii").as_deref(), Some("Inter"));
                assert_eq!(attr(&e, "hAnsi").as_deref(), Some("Mono"));
                assert_eq!(attr(&e, "cs"), None);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
