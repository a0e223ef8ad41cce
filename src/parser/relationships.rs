//! Package-level parts: workbook relationships, sheet list, shared strings.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{BufReader, Read, Seek};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::Result;

use super::worksheet::SheetInfo;

/// The two relationship kinds the preview needs, as archive paths.
#[derive(Default, Debug)]
pub(super) struct WorkbookRelationships {
    /// Relationship id to worksheet part ("rId1" to "xl/worksheets/sheet1.xml").
    pub worksheets: HashMap<String, String>,
    pub shared_strings: Option<String>,
}

fn attr_string(value: &[u8]) -> String {
    String::from_utf8_lossy(value).into_owned()
}

/// Read `xl/_rels/workbook.xml.rels`.
///
/// The part is optional; a package without it falls back to default paths.
pub(super) fn parse_workbook_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<WorkbookRelationships> {
    let mut rels = WorkbookRelationships::default();

    let file = match archive.by_name("xl/_rels/workbook.xml.rels") {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(rels),
        Err(e) => return Err(e.into()),
    };

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(true);
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Empty(ref e) | Event::Start(ref e)
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = String::new();
                let mut target = String::new();
                let mut rel_type = String::new();

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = attr_string(&attr.value),
                        b"Target" => target = attr_string(&attr.value),
                        b"Type" => rel_type = attr_string(&attr.value),
                        _ => {}
                    }
                }

                let full_path = match target.strip_prefix('/') {
                    Some(stripped) => stripped.to_string(),
                    None => format!("xl/{target}"),
                };

                if rel_type.ends_with("/worksheet") && !id.is_empty() && !target.is_empty() {
                    rels.worksheets.insert(id, full_path);
                } else if rel_type.ends_with("/sharedStrings") {
                    rels.shared_strings = Some(full_path);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Sheet names and part paths from xl/workbook.xml, in workbook order.
pub(super) fn get_sheet_info<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    relationships: &HashMap<String, String>,
) -> Result<Vec<SheetInfo>> {
    let file = archive.by_name("xl/workbook.xml")?;

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(true);

    let mut sheets = Vec::new();
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Empty(ref e) | Event::Start(ref e) if e.local_name().as_ref() == b"sheet" => {
                let mut name = String::new();
                let mut r_id = String::new();

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"name" => {
                            name = attr
                                .unescape_value()
                                .map_or_else(|_| attr_string(&attr.value), |v| v.into_owned());
                        }
                        key if key.ends_with(b":id") || key == b"id" => {
                            r_id = attr_string(&attr.value);
                        }
                        _ => {}
                    }
                }

                if !name.is_empty() {
                    let path = relationships.get(&r_id).cloned().unwrap_or_else(|| {
                        let idx = sheets.len() + 1;
                        format!("xl/worksheets/sheet{idx}.xml")
                    });
                    sheets.push(SheetInfo { name, path });
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

/// Parse the shared string table.
///
/// Rich-text runs of one item are concatenated; phonetic guides (`rPh`) are
/// skipped. A missing part yields an empty table.
pub(super) fn parse_shared_strings<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Result<Vec<String>> {
    let sst_path = path.unwrap_or("xl/sharedStrings.xml");
    let file = match archive.by_name(sst_path) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(false);

    let mut strings = Vec::new();
    let mut buf = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut phonetic_depth: u32 = 0;

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"rPh" => phonetic_depth += 1,
                b"t" if in_si && phonetic_depth == 0 => in_t = true,
                _ => {}
            },
            // <si/> and <t/> are legal empty strings
            Event::Empty(ref e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(ref e) if in_t => current.push_str(&e.unescape()?),
            Event::End(ref e) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(std::mem::take(&mut current));
                    in_si = false;
                }
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"t" => in_t = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}
