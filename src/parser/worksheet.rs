//! Worksheet parsing - reads cell values of one sheet part into a [`Sheet`].

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{BufRead, BufReader, Read, Seek};
use zip::ZipArchive;

use crate::cell_ref::{in_sheet_bounds, parse_cell_ref_bytes};
use crate::error::Result;
use crate::types::{parse_number, CellValue, Sheet, UsedRange};

/// Sheet metadata from workbook.xml
pub(super) struct SheetInfo {
    pub name: String,
    pub path: String,
}

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Default,
}

pub(super) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        _ => CellTypeTag::Default,
    }
}

pub(super) fn parse_u32_bytes(value: &[u8]) -> Option<u32> {
    let mut num: u32 = 0;
    let mut seen = false;
    for &b in value {
        if !b.is_ascii_digit() {
            return None;
        }
        seen = true;
        num = num.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
    }
    seen.then_some(num)
}

/// Turn the raw text of a cell into a typed value.
///
/// Shared-string indices outside the table are treated as empty. Untyped
/// cells are numbers when they parse as one, otherwise text.
pub(super) fn resolve_cell_value(
    raw: Option<&str>,
    tag: CellTypeTag,
    shared_strings: &[String],
) -> CellValue {
    let Some(raw) = raw else {
        return CellValue::Empty;
    };
    match tag {
        CellTypeTag::Shared => raw
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|idx| shared_strings.get(idx))
            .map_or(CellValue::Empty, |s| CellValue::Text(s.clone())),
        CellTypeTag::Str | CellTypeTag::Inline => CellValue::Text(raw.to_string()),
        CellTypeTag::Bool => CellValue::Boolean(matches!(raw.trim(), "1" | "true" | "TRUE")),
        CellTypeTag::Error => CellValue::Error(raw.to_string()),
        CellTypeTag::Default => match parse_number(raw) {
            Some(n) => CellValue::Number(n),
            None if raw.is_empty() => CellValue::Empty,
            None => CellValue::Text(raw.to_string()),
        },
    }
}

/// Read the body of a `<c>` element up to its closing tag.
///
/// Returns the text of `<v>`, or the concatenated `<t>` runs of an inline `<is>`.
fn read_cell_text<B: BufRead>(xml: &mut Reader<B>, buf: &mut Vec<u8>) -> Result<Option<String>> {
    let mut value: Option<String> = None;
    let mut in_text = false;
    let mut phonetic_depth: u32 = 0;

    loop {
        buf.clear();
        match xml.read_event_into(buf)? {
            Event::Start(ref inner) => match inner.local_name().as_ref() {
                b"v" | b"t" if phonetic_depth == 0 => {
                    in_text = true;
                    value.get_or_insert_with(String::new);
                }
                b"rPh" => phonetic_depth += 1,
                _ => {}
            },
            Event::Text(ref text) if in_text => {
                let unescaped = text.unescape()?;
                value.get_or_insert_with(String::new).push_str(&unescaped);
            }
            Event::End(ref inner) => match inner.local_name().as_ref() {
                b"c" => break,
                b"v" | b"t" => in_text = false,
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(value)
}

fn dimension_ref(e: &BytesStart<'_>) -> Option<UsedRange> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"ref")
        .and_then(|attr| std::str::from_utf8(&attr.value).ok().and_then(UsedRange::parse))
}

/// Parse a single worksheet part.
///
/// Cells without an `r` attribute take the column after the previous cell in
/// the same row. Cells that land past `XFD1048576`, or whose `r` does not
/// parse, are dropped. The used range is the declared `<dimension>` (clamped to
/// the sheet) widened to cover every cell actually present.
pub(super) fn parse_sheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    info: &SheetInfo,
    shared_strings: &[String],
) -> Result<Sheet> {
    let file = archive.by_name(&info.path)?;
    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(false);

    let mut sheet = Sheet::new(info.name.clone());

    let mut buf = Vec::new();
    let mut cell_buf = Vec::new();
    let mut current_row: u32 = 0;
    let mut next_row: u32 = 0;
    let mut next_col: u32 = 0;

    loop {
        match xml.read_event_into(&mut buf)? {
            ref event @ (Event::Start(_) | Event::Empty(_)) => {
                let (Event::Start(ref e) | Event::Empty(ref e)) = event else {
                    continue;
                };
                let is_start_event = matches!(event, Event::Start(_));

                match e.local_name().as_ref() {
                    b"dimension" => sheet.set_used_range(dimension_ref(e)),

                    b"row" => {
                        current_row = e
                            .attributes()
                            .flatten()
                            .find(|attr| attr.key.as_ref() == b"r")
                            .and_then(|attr| parse_u32_bytes(&attr.value))
                            .and_then(|r| r.checked_sub(1))
                            .unwrap_or(next_row);
                        next_row = current_row.saturating_add(1);
                        next_col = 0;
                    }

                    b"c" => {
                        let mut position = Some((current_row, next_col));
                        let mut cell_type = CellTypeTag::Default;

                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"r" => {
                                    position =
                                        parse_cell_ref_bytes(&attr.value).map(|(c, r)| (r, c));
                                }
                                b"t" => cell_type = parse_cell_type_tag(&attr.value),
                                _ => {}
                            }
                        }
                        next_col = position.map_or(next_col, |(_, c)| c).saturating_add(1);

                        // <c r="A1"/> has no children
                        let raw = if is_start_event {
                            read_cell_text(&mut xml, &mut cell_buf)?
                        } else {
                            None
                        };
                        match position.filter(|&(r, c)| in_sheet_bounds(r, c)) {
                            Some((row, col)) if is_start_event => {
                                let value =
                                    resolve_cell_value(raw.as_deref(), cell_type, shared_strings);
                                sheet.set_cell(row, col, value);
                            }
                            Some(_) => {}
                            None => log::debug!("{}: skipping cell outside the sheet", info.name),
                        }
                    }

                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    sheet.fit_used_range();
    Ok(sheet)
}
