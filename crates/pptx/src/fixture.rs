//! In-memory PPTX decks for tests.
//!
//! Produces the minimum set of parts the loader reads: `presentation.xml`
//! with its relationships, and one part per slide.

use std::io::{Cursor, Write};
use zip::result::ZipResult;
use zip::write::FileOptions;
use zip::ZipWriter;

const SLIDE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const MASTER_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";

/// Builder for small synthetic decks.
#[derive(Debug, Clone)]
pub struct DeckBuilder {
    slides: Vec<Vec<String>>,
    order: Option<Vec<usize>>,
    presentation_part: bool,
    relationships: bool,
    slide_parts: bool,
}

impl Default for DeckBuilder {
    fn default() -> Self {
        Self {
            slides: Vec::new(),
            order: None,
            presentation_part: true,
            relationships: true,
            slide_parts: true,
        }
    }
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slide with one text shape per entry.
    pub fn slide(mut self, shapes: &[&str]) -> Self {
        self.slides
            .push(shapes.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Presentation order as 1-based slide part numbers.
    pub fn order(mut self, order: &[usize]) -> Self {
        self.order = Some(order.to_vec());
        self
    }

    pub fn without_presentation_part(mut self) -> Self {
        self.presentation_part = false;
        self
    }

    pub fn without_relationships(mut self) -> Self {
        self.relationships = false;
        self
    }

    /// Declare the slides in the relationships but leave their parts out.
    pub fn without_slide_parts(mut self) -> Self {
        self.slide_parts = false;
        self
    }

    pub fn build(self) -> ZipResult<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(content_types_xml(self.slides.len()).as_bytes())?;

        if self.presentation_part {
            let order = self
                .order
                .clone()
                .unwrap_or_else(|| (1..=self.slides.len()).collect());
            zip.start_file("ppt/presentation.xml", options)?;
            zip.write_all(presentation_xml(&order).as_bytes())?;
        }

        if self.relationships {
            zip.start_file("ppt/_rels/presentation.xml.rels", options)?;
            zip.write_all(relationships_xml(self.slides.len()).as_bytes())?;
        }

        let parts: &[Vec<String>] = if self.slide_parts { &self.slides } else { &[] };
        for (idx, shapes) in parts.iter().enumerate() {
            let shapes: Vec<&str> = shapes.iter().map(String::as_str).collect();
            zip.start_file(format!("ppt/slides/slide{}.xml", idx + 1), options)?;
            zip.write_all(slide_xml(&shapes).as_bytes())?;
        }

        Ok(zip.finish()?.into_inner())
    }
}

/// Build a deck with the given slides in natural order.
pub fn build_pptx(slides: &[&[&str]]) -> ZipResult<Vec<u8>> {
    slides
        .iter()
        .fold(DeckBuilder::new(), |builder, shapes| builder.slide(shapes))
        .build()
}

/// Slide part XML with one text shape per entry.
pub fn slide_xml(shapes: &[&str]) -> String {
    let mut body = String::new();
    for (idx, text) in shapes.iter().enumerate() {
        body.push_str(&format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="Shape {}"/></p:nvSpPr><p:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
            idx + 2,
            idx + 1,
            escape(text)
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>"#,
        body
    )
}

fn presentation_xml(order: &[usize]) -> String {
    let ids: String = order
        .iter()
        .enumerate()
        .map(|(pos, n)| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + pos, n + 1))
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{}</p:sldIdLst></p:presentation>"#,
        ids
    )
}

fn relationships_xml(slide_count: usize) -> String {
    let mut rels = format!(
        r#"<Relationship Id="rId1" Type="{}" Target="slideMasters/slideMaster1.xml"/>"#,
        MASTER_REL_TYPE
    );
    for n in 1..=slide_count {
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{}" Target="slides/slide{}.xml"/>"#,
            n + 1,
            SLIDE_REL_TYPE,
            n
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        rels
    )
}

fn content_types_xml(slide_count: usize) -> String {
    let overrides: String = (1..=slide_count)
        .map(|n| {
            format!(
                r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
                n
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">{}</Types>"#,
        overrides
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
