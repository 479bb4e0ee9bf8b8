//! DOCX exporter.
//!
//! Writes a minimal WordprocessingML package: one `w:p` per non-blank line with
//! the line kept verbatim. No paragraph spacing is set here; Word's `Normal`
//! style decides it.

use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

use chrono::Utc;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::export::{paragraph_lines, write_temp_file, ExportError};
use crate::models::resume::{ExportFormat, ExportedFile};

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:eastAsia="Calibri" w:cs="Calibri"/><w:sz w:val="22"/><w:szCs w:val="22"/><w:lang w:val="en-US"/></w:rPr></w:rPrDefault><w:pPrDefault/></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style></w:styles>"#;

/// Renders `text` and writes it to a new `resume-*.docx` file in `dir`.
pub fn export_docx(text: &str, dir: &Path) -> Result<ExportedFile, ExportError> {
    write_temp_file(dir, ExportFormat::Docx, |file| {
        let writer = write_package(text, BufWriter::new(file))?;
        writer.into_inner().map_err(|e| e.into_error())?;
        Ok(())
    })
}

/// Writes the full DOCX zip package to `target` and returns it once finished.
pub fn write_package<W: Write + Seek>(text: &str, target: W) -> Result<W, ExportError> {
    let document_xml = document_xml(text)?;
    let core_xml = core_properties_xml();

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(target);

    let parts: [(&str, &[u8]); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
        ("_rels/.rels", ROOT_RELS_XML.as_bytes()),
        ("word/document.xml", &document_xml),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.as_bytes()),
        ("word/styles.xml", STYLES_XML.as_bytes()),
        ("docProps/core.xml", core_xml.as_bytes()),
    ];
    for (name, bytes) in parts {
        zip.start_file(name, options)?;
        zip.write_all(bytes)?;
    }

    Ok(zip.finish()?)
}

fn xml_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::Xml(e.to_string())
}

/// XML 1.0 cannot carry most C0 control characters, escaped or not.
fn check_xml_text(line: &str) -> Result<(), ExportError> {
    match line
        .chars()
        .find(|&c| (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r'))
    {
        Some(c) => Err(ExportError::InvalidText(format!(
            "control character U+{:04X}",
            c as u32
        ))),
        None => Ok(()),
    }
}

/// Builds `word/document.xml`. Text escaping is left to the XML writer.
fn document_xml(text: &str) -> Result<Vec<u8>, ExportError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Start(
            BytesStart::new("w:document").with_attributes([("xmlns:w", WORDML_NS)]),
        ))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Start(BytesStart::new("w:body")))
        .map_err(xml_err)?;

    for line in paragraph_lines(text) {
        check_xml_text(line)?;
        for event in [
            Event::Start(BytesStart::new("w:p")),
            Event::Start(BytesStart::new("w:r")),
            Event::Start(BytesStart::new("w:t").with_attributes([("xml:space", "preserve")])),
            Event::Text(BytesText::new(line)),
            Event::End(BytesEnd::new("w:t")),
            Event::End(BytesEnd::new("w:r")),
            Event::End(BytesEnd::new("w:p")),
        ] {
            writer.write_event(event).map_err(xml_err)?;
        }
    }

    // Letter, 1" margins.
    writer
        .write_event(Event::Start(BytesStart::new("w:sectPr")))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Empty(
            BytesStart::new("w:pgSz").with_attributes([("w:w", "12240"), ("w:h", "15840")]),
        ))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Empty(BytesStart::new("w:pgMar").with_attributes([
            ("w:top", "1440"),
            ("w:right", "1440"),
            ("w:bottom", "1440"),
            ("w:left", "1440"),
            ("w:header", "720"),
            ("w:footer", "720"),
            ("w:gutter", "0"),
        ])))
        .map_err(xml_err)?;
    for name in ["w:sectPr", "w:body", "w:document"] {
        writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_err)?;
    }

    Ok(writer.into_inner().into_inner())
}

fn core_properties_xml() -> String {
    let now = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>Resume</dc:title><dc:creator>{}</dc:creator><dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{now}</dcterms:modified></cp:coreProperties>"#,
        env!("CARGO_PKG_NAME"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    use quick_xml::escape::resolve_predefined_entity;
    use quick_xml::Reader;

    /// Pulls paragraph texts back out of `word/document.xml`.
    fn read_paragraphs(bytes: &[u8]) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();

        let mut reader = Reader::from_str(&xml);
        let mut paragraphs = Vec::new();
        let mut current: Option<String> = None;

        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) if e.name().as_ref() == b"w:p" => current = Some(String::new()),
                Event::End(e) if e.name().as_ref() == b"w:p" => {
                    paragraphs.push(current.take().unwrap());
                }
                Event::Text(e) => {
                    if let Some(text) = current.as_mut() {
                        text.push_str(&e.decode().unwrap());
                    }
                }
                Event::GeneralRef(e) => {
                    if let Some(text) = current.as_mut() {
                        let name = e.decode().unwrap();
                        text.push_str(resolve_predefined_entity(&name).unwrap());
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        paragraphs
    }

    fn package(text: &str) -> Vec<u8> {
        write_package(text, Cursor::new(Vec::new()))
            .unwrap()
            .into_inner()
    }

    #[test]
    fn test_blank_input_yields_valid_empty_document() {
        let bytes = package("\n \n\t\n");
        assert!(read_paragraphs(&bytes).is_empty());

        let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for part in ["[Content_Types].xml", "_rels/.rels", "word/document.xml", "word/styles.xml"] {
            assert!(names.contains(&part), "missing {part}");
        }
    }

    #[test]
    fn test_blank_lines_produce_no_paragraphs() {
        assert_eq!(
            read_paragraphs(&package("Line one\n\nLine two")),
            vec!["Line one", "Line two"]
        );
    }

    #[test]
    fn test_n_lines_give_n_paragraphs_in_order() {
        let lines: Vec<String> = (1..=9).map(|i| format!("- item {i}")).collect();
        let text = lines.join("\n \n");
        assert_eq!(read_paragraphs(&package(&text)), lines);
    }

    #[test]
    fn test_ampersand_and_angle_brackets_are_literal() {
        let paragraphs = read_paragraphs(&package("R&D lead\nVec<String> & <b>"));
        assert_eq!(paragraphs, vec!["R&D lead", "Vec<String> & <b>"]);
    }

    #[test]
    fn test_leading_whitespace_is_preserved() {
        assert_eq!(read_paragraphs(&package("    indented")), vec!["    indented"]);
    }

    #[test]
    fn test_control_characters_fail_the_export() {
        let result = write_package("bad \u{0007} bell", Cursor::new(Vec::new()));
        assert!(matches!(result, Err(ExportError::InvalidText(_))));
    }

    #[test]
    fn test_export_writes_docx_file() {
        let dir = tempfile::tempdir().unwrap();
        let exported = export_docx("Line one\n\nLine two", dir.path()).unwrap();

        assert_eq!(exported.format, ExportFormat::Docx);
        assert!(exported.file_name.ends_with(".docx"));
        let bytes = std::fs::read(&exported.path).unwrap();
        assert_eq!(read_paragraphs(&bytes), vec!["Line one", "Line two"]);
    }
}
