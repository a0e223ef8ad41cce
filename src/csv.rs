//! CSV reader that produces a [`Workbook`] with a single sheet.

use crate::error::Result;
use crate::types::{parse_number, CellValue, Sheet, UsedRange, Workbook};

/// Name given to the only sheet of a CSV file.
pub const CSV_SHEET_NAME: &str = "Sheet1";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Count the empty lines at the start of `data[start..end]`.
///
/// The csv reader drops empty lines, so the bytes it consumed for a record
/// begin with whatever blank lines preceded it. `\r\n` counts once, including
/// when the `\r` closed the previous record.
fn skipped_blank_lines(data: &[u8], start: usize, end: usize) -> u32 {
    let span = data.get(start..end).unwrap_or_default();
    let mut prev = start.checked_sub(1).and_then(|i| data.get(i)).copied();
    let mut count: u32 = 0;
    for &b in span {
        match b {
            b'\n' if prev == Some(b'\r') => {}
            b'\r' | b'\n' => count = count.saturating_add(1),
            _ => break,
        }
        prev = Some(b);
    }
    count
}

fn byte_offset(pos: &::csv::Position) -> usize {
    usize::try_from(pos.byte()).unwrap_or(usize::MAX)
}

/// Parse CSV bytes into a [`Workbook`] with one sheet.
///
/// There is no header row: the first line is row 0. Every line break outside
/// quotes starts a new row, so interior blank lines are kept as empty rows;
/// blank lines after the last record add nothing. Records may have differing
/// field counts; the used range spans the widest one. Numeric-looking fields
/// become numbers and empty fields are absent cells.
pub(crate) fn parse_csv(data: &[u8]) -> Result<Workbook> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let text = String::from_utf8_lossy(data);
    let bytes = text.as_bytes();

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut sheet = Sheet::new(CSV_SHEET_NAME);
    let mut next_row: u32 = 0;
    let mut last_row: Option<u32> = None;
    let mut max_fields: u32 = 0;
    let mut record = ::csv::StringRecord::new();

    loop {
        let start = byte_offset(reader.position());
        if !reader.read_record(&mut record)? {
            break;
        }
        let end = byte_offset(reader.position());
        let row = next_row.saturating_add(skipped_blank_lines(bytes, start, end));

        let mut fields: u32 = 0;
        for field in &record {
            let col = fields;
            fields = fields.saturating_add(1);
            if field.is_empty() {
                continue;
            }
            let value = match parse_number(field) {
                Some(n) => CellValue::Number(n),
                None => CellValue::Text(field.to_string()),
            };
            sheet.set_cell(row, col, value);
        }
        max_fields = max_fields.max(fields);
        last_row = Some(row);
        next_row = row.saturating_add(1);
    }

    if let Some(last_row) = last_row.filter(|_| max_fields > 0) {
        sheet.set_used_range(Some(UsedRange::new(0, 0, last_row, max_fields - 1)));
    }

    log::debug!(
        "parsed CSV: {} rows, {} columns, {} cells",
        next_row,
        max_fields,
        sheet.cell_count()
    );

    Ok(Workbook::new(vec![sheet]))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_basic() {
        let data = b"Name,Age,City\nAlice,30,NYC\nBob,25,LA";
        let wb = parse_csv(data).unwrap();
        assert_eq!(wb.sheets.len(), 1);
        let sheet = &wb.sheets[0];
        assert_eq!(sheet.name, "Sheet1");
        assert_eq!(sheet.used_range(), UsedRange::parse("A1:C3"));
        assert_eq!(sheet.cell(1, 0), Some(&CellValue::Text("Alice".into())));
        assert_eq!(sheet.cell(1, 1), Some(&CellValue::Number(30.0)));
    }

    #[test]
    fn test_quoted_fields() {
        let data = b"\"Hello, World\",42\n\"She said \"\"hi\"\"\",0\n\"multi\nline\",1";
        let wb = parse_csv(data).unwrap();
        let sheet = &wb.sheets[0];
        assert_eq!(sheet.display_value(0, 0), "Hello, World");
        assert_eq!(sheet.display_value(1, 0), "She said \"hi\"");
        assert_eq!(sheet.display_value(2, 0), "multi\nline");
        assert_eq!(sheet.total_rows(), 3);
    }

    #[test]
    fn test_ragged_rows_and_gaps() {
        let data = b"a\nb,,c,d\ne,f";
        let wb = parse_csv(data).unwrap();
        let sheet = &wb.sheets[0];
        assert_eq!(sheet.used_range(), UsedRange::parse("A1:D3"));
        assert!(sheet.cell(1, 1).is_none());
        assert_eq!(sheet.display_value(1, 3), "d");
    }

    #[test]
    fn test_bom_is_stripped() {
        let data = b"\xEF\xBB\xBFid,name\n1,x";
        let wb = parse_csv(data).unwrap();
        assert_eq!(wb.sheets[0].display_value(0, 0), "id");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let data = b"caf\xE9,1";
        let wb = parse_csv(data).unwrap();
        assert_eq!(wb.sheets[0].display_value(0, 0), "caf\u{FFFD}");
    }

    #[test]
    fn test_interior_blank_lines_keep_their_rows() {
        let wb = parse_csv(b"a\n\nb\n").unwrap();
        let sheet = &wb.sheets[0];
        assert_eq!(sheet.used_range(), UsedRange::parse("A1:A3"));
        assert_eq!(sheet.display_value(0, 0), "a");
        assert_eq!(sheet.display_value(1, 0), "");
        assert_eq!(sheet.display_value(2, 0), "b");
    }

    #[test]
    fn test_blank_lines_with_crlf() {
        let wb = parse_csv(b"a,1\r\n\r\n\r\nb,2\r\n").unwrap();
        let sheet = &wb.sheets[0];
        assert_eq!(sheet.used_range(), UsedRange::parse("A1:B4"));
        assert_eq!(sheet.display_value(3, 0), "b");
    }

    #[test]
    fn test_leading_blank_line_and_trailing_newlines() {
        let wb = parse_csv(b"\nx\n\n\n").unwrap();
        let sheet = &wb.sheets[0];
        assert_eq!(sheet.used_range(), UsedRange::parse("A1:A2"));
        assert_eq!(sheet.display_value(1, 0), "x");
    }

    #[test]
    fn test_quoted_newline_is_not_a_row_break() {
        let wb = parse_csv(b"\"two\nlines\",1\n\nend").unwrap();
        let sheet = &wb.sheets[0];
        assert_eq!(sheet.display_value(0, 0), "two\nlines");
        assert_eq!(sheet.display_value(2, 0), "end");
        assert_eq!(sheet.total_rows(), 3);
    }

    #[test]
    fn test_empty_csv() {
        let wb = parse_csv(b"").unwrap();
        assert_eq!(wb.sheets.len(), 1);
        assert_eq!(wb.sheets[0].cell_count(), 0);
        assert_eq!(wb.sheets[0].total_rows(), 0);
    }
}
