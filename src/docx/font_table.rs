//! Font table (`word/fontTable.xml`): the fonts a document declares it uses

use quick_xml::events::Event;

use super::reader::{attr, xml_reader, FONT_TABLE_PART};
use crate::error::{Error, Result};

pub(crate) fn parse(content: &str) -> Result<Vec<String>> {
    let mut reader = xml_reader(content);
    let mut names = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"font" => {
                if let Some(name) = attr(e, "name") {
                    names.push(name);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::xml(FONT_TABLE_PART, e)),
            _ => {}
        }
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_font_names() {
        let xml = r#"<w:fonts xmlns:w="urn:w">
            <w:font w:name="Calibri"><w:panose1 w:val="020F0502020204030204"/></w:font>
            <w:font w:name="Times New Roman"/>
        </w:fonts>"#;
        assert_eq!(parse(xml).expect("parse"), vec!["Calibri", "Times New Roman"]);
    }

    #[test]
    fn test_malformed_xml() {
        let result = parse("<w:fonts><w:font w:name=\"A\"></w:fonts>");
        assert!(matches!(result, Err(Error::Xml { .. })));
    }
}
