//! Utilities for parsing and encoding Excel-style cell references and ranges.

/// Rows in an Excel sheet (`1..=1048576`).
pub const MAX_ROWS: u32 = 1_048_576;
/// Columns in an Excel sheet (`A..=XFD`).
pub const MAX_COLS: u32 = 16_384;

/// Whether 0-based (row, col) lies on an Excel sheet.
#[must_use]
pub fn in_sheet_bounds(row: u32, col: u32) -> bool {
    row < MAX_ROWS && col < MAX_COLS
}

/// Parse a cell reference like "A1" into (col, row) where col and row are 0-indexed.
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    parse_cell_ref_bytes(cell_ref.trim().as_bytes())
}

/// Parse a cell reference from raw bytes (ASCII) into (col, row) where col and row are 0-indexed.
///
/// This is the bytes equivalent of [`parse_cell_ref`] for use with raw XML
/// attribute values. Letters must precede digits; `$` anchors are ignored.
/// References past `XFD1048576` are rejected.
pub fn parse_cell_ref_bytes(ref_bytes: &[u8]) -> Option<(u32, u32)> {
    parse_coords(ref_bytes).filter(|&(col, row)| in_sheet_bounds(row, col))
}

/// (col, row) of a reference with no sheet-size limit, only u32 overflow.
fn parse_coords(ref_bytes: &[u8]) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for &b in ref_bytes {
        if b == b'$' {
            continue;
        }
        if b.is_ascii_alphabetic() {
            if saw_row {
                return None;
            }
            let upper = b.to_ascii_uppercase();
            col = col
                .checked_mul(26)?
                .checked_add(u32::from(upper - b'A') + 1)?;
            saw_col = true;
        } else if b.is_ascii_digit() {
            row = row.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
            saw_row = true;
        } else {
            return None;
        }
    }

    if !saw_col || !saw_row || row == 0 {
        return None;
    }

    Some((col - 1, row - 1))
}

/// Parse a cell range like "A1:B10" or "A1" into (start_row, start_col, end_row, end_col).
///
/// Corners may come in any order ("C5:A1" is the same range as "A1:C5").
/// Corners past the last row or column are pulled back onto the sheet.
pub fn parse_cell_range(range: &str) -> Option<(u32, u32, u32, u32)> {
    let corner = |a1: &str| {
        parse_coords(a1.trim().as_bytes())
            .map(|(col, row)| (col.min(MAX_COLS - 1), row.min(MAX_ROWS - 1)))
    };
    let (first, second) = range.split_once(':').unwrap_or((range, range));
    let (c1, r1) = corner(first)?;
    let (c2, r2) = corner(second)?;
    Some((r1.min(r2), c1.min(c2), r1.max(r2), c1.max(c2)))
}

/// Convert a 0-based column index to Excel column letters (A, B, ..., Z, AA, AB, ...)
pub fn col_to_letter(col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = u64::from(col) + 1;
    while n > 0 {
        n -= 1;
        // n % 26 < 26, fits in u8
        #[allow(clippy::cast_possible_truncation)]
        letters.push(char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }
    letters.iter().rev().collect()
}

/// Encode 0-based (row, col) as an A1-style address.
pub fn encode_cell(row: u32, col: u32) -> String {
    format!("{}{}", col_to_letter(col), u64::from(row) + 1)
}
