//! DOCX output, built structurally from the record (no HTML involved).
//!
//! The package is the minimal WordprocessingML set: content types, package
//! relationships, the main document, its styles and core properties. Section
//! order comes from the same projection the HTML renderer uses.

use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::render::sections::{contact_line, project, SectionBody};
use crate::render::{OutputFormat, RenderFailure, Renderer};
use crate::resume::ResumeRecord;

// Twentieths of a point: 1in = 1440.
const PAGE_WIDTH_TWIPS: u32 = 12240;
const PAGE_HEIGHT_TWIPS: u32 = 15840;
const MARGIN_Y_TWIPS: u32 = 720; // 0.5in
const MARGIN_X_TWIPS: u32 = 1008; // 0.7in

// Half-points.
pub const TITLE_SIZE: u32 = 32;
pub const HEADING_SIZE: u32 = 24;
pub const BODY_SIZE: u32 = 21;

pub const TITLE_STYLE: &str = "Title";
pub const HEADING_STYLE: &str = "Heading1";

const NS_MAIN: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

#[derive(Debug, Error)]
enum DocxError {
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

impl DocxError {
    fn into_failure(self) -> RenderFailure {
        match self {
            DocxError::Xml(e) => RenderFailure::from_engine(OutputFormat::Docx, e),
            DocxError::Io(e) => RenderFailure::from_engine(OutputFormat::Docx, e),
            DocxError::Zip(e) => RenderFailure::from_engine(OutputFormat::Docx, e),
        }
    }
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

// ────────────────────────────────────────────────────────────────────────────
// Paragraph builder
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Para<'a> {
    style: Option<&'a str>,
    centered: bool,
    space_after: Option<u32>,
    bold: bool,
    italic: bool,
    size: Option<u32>,
    text: &'a str,
}

fn empty(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<(), DocxError> {
    let mut el = BytesStart::new(name);
    for attr in attrs {
        el.push_attribute(*attr);
    }
    w.write_event(Event::Empty(el))?;
    Ok(())
}

fn start(w: &mut XmlWriter, name: &str) -> Result<(), DocxError> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    Ok(())
}

fn end(w: &mut XmlWriter, name: &str) -> Result<(), DocxError> {
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_para(w: &mut XmlWriter, p: &Para<'_>) -> Result<(), DocxError> {
    start(w, "w:p")?;

    start(w, "w:pPr")?;
    if let Some(style) = p.style {
        empty(w, "w:pStyle", &[("w:val", style)])?;
    }
    if let Some(after) = p.space_after {
        empty(w, "w:spacing", &[("w:after", &after.to_string())])?;
    }
    if p.centered {
        empty(w, "w:jc", &[("w:val", "center")])?;
    }
    end(w, "w:pPr")?;

    start(w, "w:r")?;
    if p.bold || p.italic || p.size.is_some() {
        start(w, "w:rPr")?;
        if p.bold {
            empty(w, "w:b", &[])?;
        }
        if p.italic {
            empty(w, "w:i", &[])?;
        }
        if let Some(size) = p.size {
            empty(w, "w:sz", &[("w:val", &size.to_string())])?;
        }
        end(w, "w:rPr")?;
    }
    let mut t = BytesStart::new("w:t");
    t.push_attribute(("xml:space", "preserve"));
    w.write_event(Event::Start(t))?;
    w.write_event(Event::Text(BytesText::new(p.text)))?;
    end(w, "w:t")?;
    end(w, "w:r")?;

    end(w, "w:p")?;
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Package parts
// ────────────────────────────────────────────────────────────────────────────

fn document_xml(record: &ResumeRecord) -> Result<Vec<u8>, DocxError> {
    let mut w = Writer::new(Cursor::new(Vec::new()));
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

    let mut root = BytesStart::new("w:document");
    root.push_attribute(("xmlns:w", NS_MAIN));
    w.write_event(Event::Start(root))?;
    start(&mut w, "w:body")?;

    // header block
    write_para(
        &mut w,
        &Para {
            style: Some(TITLE_STYLE),
            centered: true,
            space_after: Some(40),
            text: record.name(),
            ..Para::default()
        },
    )?;
    write_para(
        &mut w,
        &Para {
            centered: true,
            space_after: Some(40),
            italic: true,
            size: Some(HEADING_SIZE),
            text: record.role(),
            ..Para::default()
        },
    )?;
    let contact = contact_line(record);
    write_para(
        &mut w,
        &Para {
            centered: true,
            space_after: Some(120),
            size: Some(BODY_SIZE),
            text: &contact,
            ..Para::default()
        },
    )?;

    // sections
    for section in project(record) {
        write_para(
            &mut w,
            &Para {
                style: Some(HEADING_STYLE),
                text: section.title,
                ..Para::default()
            },
        )?;
        let bulleted = matches!(section.body, SectionBody::Bullets(_));
        for line in section.body.lines() {
            let text = if bulleted { format!("\u{2022} {line}") } else { line };
            write_para(
                &mut w,
                &Para {
                    space_after: Some(if bulleted { 20 } else { 80 }),
                    text: &text,
                    ..Para::default()
                },
            )?;
        }
    }

    // page geometry
    start(&mut w, "w:sectPr")?;
    empty(
        &mut w,
        "w:pgSz",
        &[
            ("w:w", &PAGE_WIDTH_TWIPS.to_string()),
            ("w:h", &PAGE_HEIGHT_TWIPS.to_string()),
        ],
    )?;
    let (x, y) = (MARGIN_X_TWIPS.to_string(), MARGIN_Y_TWIPS.to_string());
    empty(
        &mut w,
        "w:pgMar",
        &[
            ("w:top", &y),
            ("w:right", &x),
            ("w:bottom", &y),
            ("w:left", &x),
            ("w:header", "360"),
            ("w:footer", "360"),
            ("w:gutter", "0"),
        ],
    )?;
    end(&mut w, "w:sectPr")?;

    end(&mut w, "w:body")?;
    end(&mut w, "w:document")?;
    Ok(w.into_inner().into_inner())
}

fn styles_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{NS_MAIN}"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="{BODY_SIZE}"/><w:szCs w:val="{BODY_SIZE}"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="80" w:line="259" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style><w:style w:type="paragraph" w:styleId="{TITLE_STYLE}"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="{TITLE_SIZE}"/><w:szCs w:val="{TITLE_SIZE}"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="{HEADING_STYLE}"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="200" w:after="60"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="{HEADING_SIZE}"/><w:szCs w:val="{HEADING_SIZE}"/></w:rPr></w:style></w:styles>"#
    )
}

fn core_xml(record: &ResumeRecord) -> Result<Vec<u8>, DocxError> {
    let mut w = Writer::new(Cursor::new(Vec::new()));
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    let mut root = BytesStart::new("cp:coreProperties");
    root.push_attribute((
        "xmlns:cp",
        "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
    ));
    root.push_attribute(("xmlns:dc", "http://purl.org/dc/elements/1.1/"));
    w.write_event(Event::Start(root))?;

    let title = format!("{} - {}", record.name(), record.role());
    for (tag, value) in [("dc:title", title.as_str()), ("dc:creator", record.name())] {
        start(&mut w, tag)?;
        w.write_event(Event::Text(BytesText::new(value)))?;
        end(&mut w, tag)?;
    }

    end(&mut w, "cp:coreProperties")?;
    Ok(w.into_inner().into_inner())
}

fn package(record: &ResumeRecord) -> Result<Vec<u8>, DocxError> {
    let parts: [(&str, Vec<u8>); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes().to_vec()),
        ("_rels/.rels", PACKAGE_RELS.as_bytes().to_vec()),
        ("word/document.xml", document_xml(record)?),
        ("word/styles.xml", styles_xml().into_bytes()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes().to_vec()),
        ("docProps/core.xml", core_xml(record)?),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, bytes) in parts {
        zip.start_file(name, options)?;
        zip.write_all(&bytes)?;
    }
    Ok(zip.finish()?.into_inner())
}

#[derive(Debug, Default)]
pub struct DocxRenderer;

impl DocxRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render_docx(&self, record: &ResumeRecord) -> Result<Vec<u8>, RenderFailure> {
        let bytes = package(record).map_err(DocxError::into_failure)?;
        debug!(bytes = bytes.len(), "DOCX rendered");
        Ok(bytes)
    }
}

impl Renderer for DocxRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Docx
    }

    fn render(&self, record: &ResumeRecord) -> Result<Vec<u8>, RenderFailure> {
        self.render_docx(record)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::sync::Arc;

    use quick_xml::Reader;

    use super::*;
    use crate::layout::{parse_blocks, BlockKind};
    use crate::render::html::HtmlRenderer;
    use crate::render::test_support::{full_record, minimal_record};
    use crate::render::theme::ThemeAssets;

    /// `(paragraph style, paragraph text)` for every paragraph in document.xml.
    fn paragraphs(docx: &[u8]) -> Vec<(Option<String>, String)> {
        let mut archive = zip::ZipArchive::new(Cursor::new(docx)).unwrap();
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();

        let mut reader = Reader::from_str(&xml);
        let mut out = Vec::new();
        let mut style: Option<String> = None;
        let mut text = String::new();
        let mut in_text = false;
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) if e.name().as_ref() == b"w:p" => {
                    style = None;
                    text.clear();
                }
                Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
                Event::End(e) if e.name().as_ref() == b"w:t" => in_text = false,
                Event::Empty(e) if e.name().as_ref() == b"w:pStyle" => {
                    let val = e.try_get_attribute("w:val").unwrap().unwrap();
                    style = Some(val.unescape_value().unwrap().into_owned());
                }
                Event::Text(t) if in_text => text.push_str(&t.unescape().unwrap()),
                Event::End(e) if e.name().as_ref() == b"w:p" => {
                    out.push((style.take(), std::mem::take(&mut text)));
                }
                Event::Eof => break,
                _ => {}
            }
        }
        out
    }

    fn is_heading_level(style: &Option<String>) -> bool {
        matches!(style.as_deref(), Some(s) if s == TITLE_STYLE || s.starts_with("Heading"))
    }

    #[test]
    fn test_minimal_record_has_one_name_heading() {
        let bytes = DocxRenderer::new().render_docx(&minimal_record()).unwrap();
        assert!(bytes.starts_with(b"PK"));

        let paras = paragraphs(&bytes);
        let name_headings = paras
            .iter()
            .filter(|(style, text)| is_heading_level(style) && text == "Jane Doe")
            .count();
        assert_eq!(name_headings, 1);
        assert!(paras.iter().any(|(_, text)| text == "jane@example.com"));
    }

    #[test]
    fn test_empty_skills_has_no_skills_heading() {
        let paras = paragraphs(&DocxRenderer::new().render_docx(&minimal_record()).unwrap());
        assert!(!paras
            .iter()
            .any(|(style, text)| is_heading_level(style) && text == "Skills"));
        // title only: no section headings at all
        assert_eq!(paras.iter().filter(|(s, _)| is_heading_level(s)).count(), 1);
    }

    #[test]
    fn test_skills_are_comma_joined() {
        let paras = paragraphs(&DocxRenderer::new().render_docx(&full_record()).unwrap());
        let at = paras
            .iter()
            .position(|(style, text)| style.as_deref() == Some(HEADING_STYLE) && text == "Skills")
            .unwrap();
        assert_eq!(paras[at + 1].1, "Rust, Go, Kubernetes, PostgreSQL");
    }

    #[test]
    fn test_section_order_matches_html() {
        let record = full_record();
        let docx_headings: Vec<String> =
            paragraphs(&DocxRenderer::new().render_docx(&record).unwrap())
                .into_iter()
                .filter(|(style, _)| style.as_deref() == Some(HEADING_STYLE))
                .map(|(_, text)| text)
                .collect();

        let html = HtmlRenderer::new(Arc::new(ThemeAssets::builtin()), None).render_html(&record);
        let html_headings: Vec<String> = parse_blocks(&html)
            .unwrap()
            .into_iter()
            .filter(|b| b.kind == BlockKind::Heading)
            .map(|b| b.text)
            .collect();

        assert_eq!(docx_headings.len(), 7);
        assert_eq!(docx_headings, html_headings);
    }

    #[test]
    fn test_text_is_xml_escaped() {
        let paras = paragraphs(&DocxRenderer::new().render_docx(&full_record()).unwrap());
        assert!(paras
            .iter()
            .any(|(_, text)| text.contains("distributed systems & the teams")));
    }

    #[test]
    fn test_package_parts_and_margins() {
        let bytes = DocxRenderer::new().render_docx(&minimal_record()).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/styles.xml",
            "word/_rels/document.xml.rels",
            "docProps/core.xml",
        ] {
            assert!(archive.by_name(part).is_ok(), "missing {part}");
        }

        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        assert!(xml.contains(r#"w:top="720""#));
        assert!(xml.contains(r#"w:left="1008""#));
    }
}
