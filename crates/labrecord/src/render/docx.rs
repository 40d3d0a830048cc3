//! DOCX backend: a minimal WordprocessingML package written with `zip`.
//!
//! The table flows as one piece; the consuming word processor decides where
//! pages break. QR codes are represented by a `[QR]` text placeholder.

use std::fmt::Write as _;
use std::io::{Cursor, Write};

use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{DocumentFormat, DocumentRenderer, Pagination, RenderedDocument};
use crate::config::{DocumentConfig, DEFAULT_CONFIRMATION_STATEMENT};
use crate::error::Result;
use crate::model::{ExperimentRecord, FormSnapshot};

const BLANK: &str = "___________";
const SIGNATURE_LINE: &str = "____________________";
const QR_PLACEHOLDER: &str = "[QR]";
const DETAIL_GAP: &str = "               ";

/// Half-point font sizes.
const TITLE_SIZE: u32 = 32;
const HEADING_SIZE: u32 = 28;

/// Text width of an A4 page with one-inch margins, in twips.
const TABLE_WIDTH_TWIPS: u32 = 9026;
const COLUMN_TWIPS: [u32; 6] = [700, 1300, 3400, 1200, 1000, 1426];
const HEADERS: [&str; 6] = [
    "S.No",
    "Date",
    "Experiment Title",
    "QR Code",
    "Marks",
    "Signature",
];

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;

const DOCUMENT_TAIL: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#;

/// Renders the lab record as a single-section DOCX.
#[derive(Debug, Clone)]
pub struct DocxRenderer {
    confirmation_statement: String,
}

impl Default for DocxRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIRMATION_STATEMENT)
    }
}

impl DocxRenderer {
    /// Create a renderer with the given confirmation statement.
    #[must_use]
    pub fn new(confirmation_statement: impl Into<String>) -> Self {
        Self {
            confirmation_statement: confirmation_statement.into(),
        }
    }

    /// Create a renderer from the `[document]` config section.
    #[must_use]
    pub fn from_config(config: &DocumentConfig) -> Self {
        Self::new(config.confirmation_statement.clone())
    }

    /// The `word/document.xml` body for `snapshot`.
    #[must_use]
    pub fn document_xml(&self, snapshot: &FormSnapshot) -> String {
        let mut xml = String::from(DOCUMENT_HEAD);

        // Logo placeholder.
        xml.push_str(r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:br/></w:r></w:p>"#);
        paragraph(&mut xml, Some("center"), &[Run::bold(&snapshot.course_title, TITLE_SIZE)]);
        paragraph(&mut xml, Some("center"), &[Run::bold("Table of Contents", HEADING_SIZE)]);
        spacer(&mut xml, 200);

        table(&mut xml, &snapshot.experiments);

        spacer(&mut xml, 300);
        paragraph(&mut xml, None, &[Run::bold(&self.confirmation_statement, 0)]);
        spacer(&mut xml, 200);

        let name = format!("Name: {}{DETAIL_GAP}", or_blank(&snapshot.student_name));
        let register = format!("Register Number: {}", or_blank(&snapshot.register_number));
        paragraph(&mut xml, None, &[Run::plain(&name), Run::plain(&register)]);

        let date = format!("Date: {}{DETAIL_GAP}", or_blank(&snapshot.confirm_date));
        let signature = format!("Learner Signature: {SIGNATURE_LINE}");
        paragraph(&mut xml, None, &[Run::plain(&date), Run::plain(&signature)]);

        xml.push_str(DOCUMENT_TAIL);
        xml
    }
}

impl DocumentRenderer for DocxRenderer {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn pagination(&self) -> Pagination {
        Pagination::Continuous
    }

    fn render(&self, snapshot: &FormSnapshot) -> Result<RenderedDocument> {
        let document = self.document_xml(snapshot);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, contents) in [
            ("[Content_Types].xml", CONTENT_TYPES_XML),
            ("_rels/.rels", RELS_XML),
            ("word/document.xml", document.as_str()),
        ] {
            zip.start_file(name, options)?;
            zip.write_all(contents.as_bytes())?;
        }
        let bytes = zip.finish()?.into_inner();

        debug!(
            "Rendered DOCX: {} experiment(s), {} bytes",
            snapshot.experiments.len(),
            bytes.len()
        );
        Ok(RenderedDocument::new(DocumentFormat::Docx, bytes, None))
    }
}

struct Run<'a> {
    text: &'a str,
    bold: bool,
    size: u32,
}

impl<'a> Run<'a> {
    fn plain(text: &'a str) -> Self {
        Self {
            text,
            bold: false,
            size: 0,
        }
    }

    /// Bold run; a `size` of zero keeps the default size.
    fn bold(text: &'a str, size: u32) -> Self {
        Self {
            text,
            bold: true,
            size,
        }
    }

    fn write(&self, xml: &mut String) {
        xml.push_str("<w:r>");
        if self.bold || self.size > 0 {
            xml.push_str("<w:rPr>");
            if self.bold {
                xml.push_str("<w:b/>");
            }
            if self.size > 0 {
                let _ = write!(xml, r#"<w:sz w:val="{0}"/><w:szCs w:val="{0}"/>"#, self.size);
            }
            xml.push_str("</w:rPr>");
        }
        for (i, line) in self.text.split('\n').enumerate() {
            if i > 0 {
                xml.push_str("<w:br/>");
            }
            let _ = write!(xml, r#"<w:t xml:space="preserve">{}</w:t>"#, escape(line));
        }
        xml.push_str("</w:r>");
    }
}

fn paragraph(xml: &mut String, align: Option<&str>, runs: &[Run<'_>]) {
    xml.push_str("<w:p>");
    if let Some(align) = align {
        let _ = write!(xml, r#"<w:pPr><w:jc w:val="{align}"/></w:pPr>"#);
    }
    for run in runs {
        run.write(xml);
    }
    xml.push_str("</w:p>");
}

fn spacer(xml: &mut String, before: u32) {
    let _ = write!(xml, r#"<w:p><w:pPr><w:spacing w:before="{before}"/></w:pPr></w:p>"#);
}

fn cell(xml: &mut String, width: u32, align: &str, run: &Run<'_>) {
    let _ = write!(xml, r#"<w:tc><w:tcPr><w:tcW w:w="{width}" w:type="dxa"/></w:tcPr>"#);
    paragraph(xml, Some(align), std::slice::from_ref(run));
    xml.push_str("</w:tc>");
}

fn table(xml: &mut String, experiments: &[ExperimentRecord]) {
    let _ = write!(
        xml,
        r#"<w:tbl><w:tblPr><w:tblW w:w="{TABLE_WIDTH_TWIPS}" w:type="dxa"/><w:tblBorders>{}</w:tblBorders></w:tblPr><w:tblGrid>"#,
        ["top", "left", "bottom", "right", "insideH", "insideV"]
            .iter()
            .map(|side| format!(r#"<w:{side} w:val="single" w:sz="4" w:space="0" w:color="000000"/>"#))
            .collect::<String>()
    );
    for width in COLUMN_TWIPS {
        let _ = write!(xml, r#"<w:gridCol w:w="{width}"/>"#);
    }
    xml.push_str("</w:tblGrid>");

    xml.push_str("<w:tr>");
    for (header, width) in HEADERS.iter().zip(COLUMN_TWIPS) {
        cell(xml, width, "center", &Run::bold(header, 0));
    }
    xml.push_str("</w:tr>");

    for (index, exp) in experiments.iter().enumerate() {
        let number = (index + 1).to_string();
        let title = format!("{}\n{}", exp.title, exp.link);
        xml.push_str("<w:tr>");
        cell(xml, COLUMN_TWIPS[0], "center", &Run::plain(&number));
        cell(xml, COLUMN_TWIPS[1], "center", &Run::plain(&exp.date));
        cell(xml, COLUMN_TWIPS[2], "left", &Run::plain(&title));
        cell(xml, COLUMN_TWIPS[3], "center", &Run::plain(QR_PLACEHOLDER));
        cell(xml, COLUMN_TWIPS[4], "center", &Run::plain(&exp.marks));
        cell(xml, COLUMN_TWIPS[5], "center", &Run::plain(""));
        xml.push_str("</w:tr>");
    }

    xml.push_str("</w:tbl>");
}

fn or_blank(value: &str) -> &str {
    if value.is_empty() {
        BLANK
    } else {
        value
    }
}

/// Escape markup and drop characters XML 1.0 does not allow in text.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            '\u{0}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}' => {}
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    fn snapshot() -> FormSnapshot {
        FormSnapshot {
            course_title: "CS101 - Intro to Programming".into(),
            student_name: "Ada Lovelace".into(),
            register_number: String::new(),
            confirm_date: "2024-06-30".into(),
            experiments: vec![
                ExperimentRecord {
                    date: "2024-01-15".into(),
                    title: "Hello World".into(),
                    link: "https://github.com/ada/lab1".into(),
                    marks: "10".into(),
                },
                ExperimentRecord {
                    title: "Loops & <Conditions>".into(),
                    ..ExperimentRecord::default()
                },
            ],
        }
    }

    fn read_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut contents = String::new();
        file.read_to_string(&mut contents).unwrap();
        contents
    }

    #[test]
    fn test_render_package_parts() {
        let doc = DocxRenderer::default().render(&snapshot()).unwrap();
        assert_eq!(doc.format(), DocumentFormat::Docx);
        assert_eq!(doc.page_count(), None);
        assert!(doc.bytes().starts_with(b"PK"));

        let archive = zip::ZipArchive::new(Cursor::new(doc.bytes())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"[Content_Types].xml"));
        assert!(names.contains(&"_rels/.rels"));
        assert!(names.contains(&"word/document.xml"));
    }

    #[test]
    fn test_document_contents() {
        let doc = DocxRenderer::default().render(&snapshot()).unwrap();
        let xml = read_entry(doc.bytes(), "word/document.xml");

        assert!(xml.contains("CS101 - Intro to Programming"));
        assert!(xml.contains("Table of Contents"));
        for header in HEADERS {
            assert!(xml.contains(header), "missing header {header}");
        }
        assert_eq!(xml.matches(QR_PLACEHOLDER).count(), 2);
        // Dates are written as entered.
        assert!(xml.contains("2024-01-15"));
        assert!(xml.contains("Name: Ada Lovelace"));
        assert!(xml.contains("Register Number: ___________"));
        assert!(xml.contains("Learner Signature: ____________________"));
        assert!(xml.contains(DEFAULT_CONFIRMATION_STATEMENT));
    }

    #[test]
    fn test_title_and_link_on_separate_lines() {
        let xml = DocxRenderer::default().document_xml(&snapshot());
        assert!(xml.contains(
            r#"Hello World</w:t><w:br/><w:t xml:space="preserve">https://github.com/ada/lab1"#
        ));
    }

    #[test]
    fn test_text_is_escaped() {
        let xml = DocxRenderer::default().document_xml(&snapshot());
        assert!(xml.contains("Loops &amp; &lt;Conditions&gt;"));
        assert!(!xml.contains("<Conditions>"));
    }

    #[test]
    fn test_custom_confirmation_statement() {
        let renderer = DocxRenderer::new("All my own work.");
        let xml = renderer.document_xml(&FormSnapshot::default());
        assert!(xml.contains("All my own work."));
        assert!(xml.contains("Date: ___________"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"a&b<c>"d'"#), "a&amp;b&lt;c&gt;&quot;d&apos;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_escape_drops_forbidden_control_characters() {
        assert_eq!(escape("a\u{1}b\u{8}c\u{1f}"), "abc");
        assert_eq!(escape("tab\there"), "tab\there");
        assert_eq!(escape("x\u{fffe}y"), "xy");
    }

    #[test]
    fn test_control_characters_never_reach_document_xml() {
        let mut form = snapshot();
        form.course_title = "CS101\u{1}Intro".into();
        form.experiments[0].title = "Tab\u{8}bed".into();
        let xml = DocxRenderer::default().document_xml(&form);
        let forbidden: Vec<char> = xml
            .chars()
            .filter(|&c| c < ' ' && !matches!(c, '\t' | '\n' | '\r'))
            .collect();
        assert!(forbidden.is_empty(), "forbidden characters: {forbidden:?}");
        assert!(xml.contains("CS101Intro"));
        assert!(xml.contains("Tabbed"));
    }
}
