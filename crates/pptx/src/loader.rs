//! PPTX deck loader.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Read, Seek};
use thesis_core::{Error, Result, Slide};
use zip::ZipArchive;

const PRESENTATION_PATH: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PATH: &str = "ppt/_rels/presentation.xml.rels";

/// ZIP local file header magic, which every PPTX starts with.
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Whether the bytes look like a ZIP container.
pub fn is_zip(bytes: &[u8]) -> bool {
    bytes.starts_with(&ZIP_MAGIC)
}

/// Loader for PPTX (Office Open XML) decks.
pub struct PptxLoader;

impl PptxLoader {
    /// Create a new PPTX loader.
    pub fn new() -> Self {
        Self
    }

    /// Count the slides in a deck without extracting their text.
    pub fn load<R: Read + Seek>(&self, reader: R) -> Result<usize> {
        let mut archive = open_archive(reader)?;
        Ok(self.slide_paths(&mut archive)?.len())
    }

    /// Extract every slide's text, in presentation order.
    ///
    /// Slides without text are kept with an empty `raw_text` so that slide
    /// numbers stay aligned with the source deck.
    pub fn extract<R: Read + Seek>(&self, reader: R) -> Result<Vec<Slide>> {
        let mut archive = open_archive(reader)?;
        let paths = self.slide_paths(&mut archive)?;

        let mut slides = Vec::with_capacity(paths.len());
        for (idx, path) in paths.iter().enumerate() {
            let content = self.read_file_from_archive(&mut archive, path)?;
            let texts = extract_shape_texts(&content)
                .map_err(|e| Error::XmlError(format!("{}: {}", path, e)))?;
            log::debug!("Slide {} ({}): {} text shapes", idx + 1, path, texts.len());
            slides.push(Slide::new(idx + 1, texts.join(" ")));
        }

        Ok(slides)
    }

    /// Get the ordered list of slide part paths.
    ///
    /// Order comes from the `sldIdLst` in `presentation.xml`. If that list is
    /// missing, slide parts are sorted by the number in their name.
    fn slide_paths<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content = self.read_file_from_archive(archive, PRESENTATION_RELS_PATH)?;
        let slide_rels = parse_slide_relationships(&rels_content)?;

        let order = match self.read_file_from_archive(archive, PRESENTATION_PATH) {
            Ok(content) => parse_slide_id_list(&content)?,
            Err(e) => {
                log::warn!("No readable presentation.xml, ordering slides by name: {}", e);
                Vec::new()
            }
        };

        if order.is_empty() {
            let mut paths: Vec<String> = slide_rels.into_values().collect();
            paths.sort_by_key(|p| (extract_slide_number(p), p.clone()));
            return Ok(paths);
        }

        let mut paths = Vec::with_capacity(order.len());
        for rel_id in order {
            match slide_rels.get(&rel_id) {
                Some(path) => paths.push(path.clone()),
                None => log::warn!("Slide relationship '{}' has no target, skipping", rel_id),
            }
        }
        Ok(paths)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for PptxLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn open_archive<R: Read + Seek>(reader: R) -> Result<ZipArchive<R>> {
    ZipArchive::new(reader)
        .map_err(|e| Error::Format(format!("not a presentation container: {}", e)))
}

/// Map relationship ids to slide part paths from `presentation.xml.rels`.
fn parse_slide_relationships(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut slides = HashMap::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut rel_type = String::new();
                let mut target = String::new();
                let mut id = String::new();

                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Type" => rel_type = value,
                        b"Target" => target = value,
                        b"Id" => id = value,
                        _ => {}
                    }
                }

                // Layouts and masters have their own relationship types.
                if rel_type.ends_with("/slide") && !id.is_empty() {
                    slides.insert(id, resolve_target(&target));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(slides)
}

/// Relationship ids of the slides in `sldIdLst`, in presentation order.
fn parse_slide_id_list(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                // The bare `id` attribute is the numeric slide id; the
                // namespaced one (`r:id`) is the relationship id.
                let rel_id = e.attributes().flatten().find_map(|attr| {
                    let key = attr.key.as_ref();
                    (key != b"id" && local_name(key) == b"id")
                        .then(|| String::from_utf8_lossy(&attr.value).to_string())
                });
                if let Some(rel_id) = rel_id {
                    ids.push(rel_id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing presentation.xml: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Collect the trimmed, non-empty text of every shape on a slide.
///
/// Only `p:sp` shapes carry a text frame; text in tables and charts is not
/// collected. Paragraphs and line breaks within a shape become newlines.
fn extract_shape_texts(xml: &str) -> std::result::Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut texts = Vec::new();

    let mut shape_text: Option<String> = None;
    let mut in_text_body = false;
    let mut in_run_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"sp" => shape_text = Some(String::new()),
                    b"txBody" if shape_text.is_some() => in_text_body = true,
                    b"p" if in_text_body => {
                        if let Some(buf) = shape_text.as_mut() {
                            if !buf.is_empty() {
                                buf.push('\n');
                            }
                        }
                    }
                    b"t" if in_text_body => in_run_text = true,
                    _ => {}
                }
            }
            Event::Empty(ref e) => {
                let name = e.name();
                if in_text_body && local_name(name.as_ref()) == b"br" {
                    if let Some(buf) = shape_text.as_mut() {
                        buf.push('\n');
                    }
                }
            }
            Event::Text(ref e) if in_run_text => {
                let text = e.unescape()?;
                if let Some(buf) = shape_text.as_mut() {
                    buf.push_str(&text);
                }
            }
            Event::End(ref e) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"t" => in_run_text = false,
                    b"txBody" => in_text_body = false,
                    b"sp" => {
                        if let Some(buf) = shape_text.take() {
                            let trimmed = buf.trim();
                            if !trimmed.is_empty() {
                                texts.push(trimmed.to_string());
                            }
                        }
                        in_text_body = false;
                        in_run_text = false;
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(texts)
}

/// Resolve a relationship target (relative to `ppt/`) to an archive path.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{}", target),
    }
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
