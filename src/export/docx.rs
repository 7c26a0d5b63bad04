//! Minimal DOCX writer.
//!
//! A document is a flat list of paragraphs and page breaks over a single
//! `Normal` style. Lengths are in twentieths of a point (twips) except font
//! size, which WordprocessingML counts in half-points.

use super::ExportError;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const TWIPS_PER_INCH: u32 = 1440;
pub const TWIPS_PER_POINT: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    /// Line breaks inside the text become soft breaks within the paragraph.
    pub text: String,
    pub align: Align,
    pub bold: bool,
    /// `Some(0)` clears the style's first-line indent.
    pub first_line_indent: Option<u32>,
    /// Line spacing in 240ths of a line; `None` keeps the style's.
    pub line_spacing: Option<u32>,
    pub space_before: Option<u32>,
    pub space_after: Option<u32>,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Self::default() }
    }

    /// Paragraph with no first-line indent.
    pub fn flush(text: impl Into<String>) -> Self {
        Self { first_line_indent: Some(0), ..Self::new(text) }
    }

    pub fn centered(text: impl Into<String>) -> Self {
        Self { align: Align::Center, ..Self::flush(text) }
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn single_spaced(mut self) -> Self {
        self.line_spacing = Some(240);
        self
    }

    pub fn space_before_pt(mut self, points: u32) -> Self {
        self.space_before = Some(points * TWIPS_PER_POINT);
        self
    }

    pub fn space_after_pt(mut self, points: u32) -> Self {
        self.space_after = Some(points * TWIPS_PER_POINT);
        self
    }

    fn write_xml(&self, out: &mut String) {
        out.push_str("<w:p>");
        // Element order inside pPr is fixed by the schema: spacing, ind, jc.
        let mut props = String::new();
        if self.line_spacing.is_some() || self.space_before.is_some() || self.space_after.is_some() {
            props.push_str("<w:spacing");
            if let Some(before) = self.space_before {
                props.push_str(&format!(r#" w:before="{before}""#));
            }
            if let Some(after) = self.space_after {
                props.push_str(&format!(r#" w:after="{after}""#));
            }
            if let Some(line) = self.line_spacing {
                props.push_str(&format!(r#" w:line="{line}" w:lineRule="auto""#));
            }
            props.push_str("/>");
        }
        if let Some(indent) = self.first_line_indent {
            props.push_str(&format!(r#"<w:ind w:firstLine="{indent}"/>"#));
        }
        match self.align {
            Align::Left => {}
            Align::Center => props.push_str(r#"<w:jc w:val="center"/>"#),
            Align::Right => props.push_str(r#"<w:jc w:val="right"/>"#),
        }
        if !props.is_empty() {
            out.push_str("<w:pPr>");
            out.push_str(&props);
            out.push_str("</w:pPr>");
        }
        if !self.text.is_empty() {
            out.push_str("<w:r>");
            if self.bold {
                out.push_str("<w:rPr><w:b/></w:rPr>");
            }
            for (i, line) in self.text.split('\n').enumerate() {
                if i > 0 {
                    out.push_str("<w:br/>");
                }
                out.push_str(r#"<w:t xml:space="preserve">"#);
                out.push_str(&escape(line));
                out.push_str("</w:t>");
            }
            out.push_str("</w:r>");
        }
        out.push_str("</w:p>");
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Block {
    Paragraph(Paragraph),
    PageBreak,
}

/// Page and `Normal` style settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PageStyle {
    pub font: String,
    pub font_size_pt: u32,
    pub margin: u32,
    pub line_spacing: u32,
    pub first_line_indent: u32,
}

impl Default for PageStyle {
    /// Standard manuscript format: Times New Roman 12pt, 1" margins, double
    /// spacing, half-inch first-line indent.
    fn default() -> Self {
        Self {
            font: "Times New Roman".to_string(),
            font_size_pt: 12,
            margin: TWIPS_PER_INCH,
            line_spacing: 480,
            first_line_indent: TWIPS_PER_INCH / 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    style: PageStyle,
    blocks: Vec<Block>,
}

impl Document {
    pub fn new(style: PageStyle) -> Self {
        Self { style, blocks: Vec::new() }
    }

    pub fn push(&mut self, paragraph: Paragraph) {
        self.blocks.push(Block::Paragraph(paragraph));
    }

    /// `count` empty unindented paragraphs.
    pub fn spacer(&mut self, count: usize) {
        for _ in 0..count {
            self.push(Paragraph::flush(""));
        }
    }

    pub fn page_break(&mut self) {
        self.blocks.push(Block::PageBreak);
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::PageBreak => None,
        })
    }

    pub fn page_breaks(&self) -> usize {
        self.blocks.iter().filter(|b| matches!(b, Block::PageBreak)).count()
    }

    pub fn document_xml(&self) -> String {
        let mut body = String::new();
        for block in &self.blocks {
            match block {
                Block::Paragraph(p) => p.write_xml(&mut body),
                Block::PageBreak => body.push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#),
            }
        }
        let m = self.style.margin;
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="{m}" w:right="{m}" w:bottom="{m}" w:left="{m}" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr></w:body></w:document>"#
        )
    }

    fn styles_xml(&self) -> String {
        let PageStyle { font, font_size_pt, line_spacing, first_line_indent, .. } = &self.style;
        let font = escape(font);
        let half_points = font_size_pt * 2;
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}" w:eastAsia="{font}"/><w:sz w:val="{half_points}"/><w:szCs w:val="{half_points}"/></w:rPr></w:rPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:pPr><w:spacing w:before="0" w:after="0" w:line="{line_spacing}" w:lineRule="auto"/><w:ind w:firstLine="{first_line_indent}"/></w:pPr><w:rPr><w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/><w:sz w:val="{half_points}"/><w:szCs w:val="{half_points}"/></w:rPr></w:style></w:styles>"#
        )
    }

    /// The complete `.docx` package.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ExportError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let parts = [
            ("[Content_Types].xml", CONTENT_TYPES.to_string()),
            ("_rels/.rels", PACKAGE_RELS.to_string()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
            ("word/styles.xml", self.styles_xml()),
            ("word/document.xml", self.document_xml()),
        ];
        for (name, content) in parts {
            zip.start_file(name, options)?;
            zip.write_all(content.as_bytes()).map_err(zip::result::ZipError::Io)?;
        }
        Ok(zip.finish()?.into_inner())
    }

    pub fn save(&self, path: &Path) -> Result<(), ExportError> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).map_err(|source| ExportError::Io { path: path.display().to_string(), source })
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            // Control characters other than tab are not valid XML 1.0.
            c if c.is_control() && c != '\t' => {}
            c => out.push(c),
        }
    }
    out
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Read;

    /// Read one part back out of a package.
    pub(crate) fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("archive");
        let mut file = archive.by_name(name).expect("part");
        let mut out = String::new();
        file.read_to_string(&mut out).expect("read");
        out
    }

    #[test]
    fn package_has_required_parts() {
        let mut doc = Document::default();
        doc.push(Paragraph::new("Hello"));
        let bytes = doc.to_bytes().expect("bytes");
        for part in ["[Content_Types].xml", "_rels/.rels", "word/styles.xml", "word/document.xml"] {
            assert!(!read_part(&bytes, part).is_empty(), "{part}");
        }
        let styles = read_part(&bytes, "word/styles.xml");
        assert!(styles.contains(r#"w:ascii="Times New Roman""#));
        assert!(styles.contains(r#"<w:sz w:val="24"/>"#));
        assert!(styles.contains(r#"w:line="480""#));
        assert!(styles.contains(r#"<w:ind w:firstLine="720"/>"#));
    }

    #[test]
    fn paragraph_properties_are_ordered_and_text_escaped() {
        let mut doc = Document::default();
        doc.push(Paragraph::centered("Tom & \"Jerry\"\nby <me>").bold().space_after_pt(24));
        let xml = doc.document_xml();
        assert!(xml.contains(
            r#"<w:pPr><w:spacing w:after="480"/><w:ind w:firstLine="0"/><w:jc w:val="center"/></w:pPr>"#
        ));
        assert!(xml.contains("<w:rPr><w:b/></w:rPr>"));
        assert!(xml.contains("Tom &amp; &quot;Jerry&quot;</w:t><w:br/>"));
        assert!(xml.contains("by &lt;me&gt;"));
        assert!(xml.contains(r#"<w:pgMar w:top="1440""#));
    }

    #[test]
    fn page_breaks_are_counted() {
        let mut doc = Document::default();
        doc.spacer(2);
        doc.page_break();
        assert_eq!(doc.paragraphs().count(), 2);
        assert_eq!(doc.page_breaks(), 1);
        assert!(doc.document_xml().contains(r#"<w:br w:type="page"/>"#));
    }
}
