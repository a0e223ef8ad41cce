//! Workbook readers.
//!
//! [`parse_bytes`] is the single entry point: it picks the CSV or XLSX reader
//! from the declared MIME type, falling back to sniffing the bytes.

mod relationships;
mod worksheet;

use std::io::Cursor;
use zip::ZipArchive;

use crate::csv::parse_csv;
use crate::error::{PreviewError, Result};
use crate::mime::FileFormat;
use crate::types::Workbook;

use relationships::{get_sheet_info, parse_shared_strings, parse_workbook_relationships};
use worksheet::parse_sheet;

/// Parse file bytes into a [`Workbook`].
///
/// An unrecognised or absent `mime` is not an error here; the format is then
/// sniffed from the content (ZIP signature means XLSX, anything else is CSV).
pub fn parse_bytes(data: &[u8], mime: Option<&str>) -> Result<Workbook> {
    let format = mime
        .and_then(FileFormat::from_mime)
        .unwrap_or_else(|| FileFormat::sniff(data));
    parse(data, format)
}

/// Parse file bytes with an explicit format.
pub fn parse(data: &[u8], format: FileFormat) -> Result<Workbook> {
    log::debug!("parsing {} bytes as {:?}", data.len(), format);
    match format {
        FileFormat::Csv => parse_csv(data),
        FileFormat::Xlsx => parse_xlsx(data),
    }
}

/// Parse an XLSX package, values only.
///
/// Sheets come out in workbook order. Styles, formulas and drawings are ignored.
pub fn parse_xlsx(data: &[u8]) -> Result<Workbook> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;

    let relationships = parse_workbook_relationships(&mut archive)?;
    let shared_strings =
        parse_shared_strings(&mut archive, relationships.shared_strings.as_deref())?;
    let sheet_info = get_sheet_info(&mut archive, &relationships.worksheets)?;

    if sheet_info.is_empty() {
        return Err(PreviewError::Parse("workbook contains no sheets".into()));
    }

    let mut sheets = Vec::with_capacity(sheet_info.len());
    for info in &sheet_info {
        let sheet = parse_sheet(&mut archive, info, &shared_strings)?;
        log::debug!(
            "sheet {:?} ({}): {} cells, range {:?}",
            sheet.name,
            info.path,
            sheet.cell_count(),
            sheet.used_range().map(|r| r.to_a1())
        );
        sheets.push(sheet);
    }

    let workbook = Workbook::new(sheets);
    if let Some(name) = workbook.duplicate_sheet_name() {
        return Err(PreviewError::Parse(format!("duplicate sheet name {name:?}")));
    }

    log::info!(
        "parsed XLSX: {} sheets, {} shared strings",
        workbook.sheets.len(),
        shared_strings.len()
    );

    Ok(workbook)
}
