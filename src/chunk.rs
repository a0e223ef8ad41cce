//! Fixed-size row chunks over a sheet's used range.
//!
//! Chunk `k` of a sheet covers rows
//! `[start_row + k * size, min(start_row + (k + 1) * size - 1, end_row)]`
//! and every column of the used range. Absent cells come out as `""`.

use crate::types::{Sheet, UsedRange, Workbook};

/// Default number of rows materialized per chunk.
pub const CHUNK_SIZE: u32 = 30;

/// One materialized row: display values, one per used-range column.
pub type Row = Vec<String>;

/// Inclusive row bounds of chunk `cursor`, or `None` once past the end.
#[must_use]
pub fn chunk_bounds(range: UsedRange, cursor: u32, chunk_size: u32) -> Option<(u32, u32)> {
    let size = u64::from(chunk_size.max(1));
    let start = u64::from(range.start_row) + u64::from(cursor) * size;
    if start > u64::from(range.end_row) {
        return None;
    }
    let end = (start + size - 1).min(u64::from(range.end_row));
    // both bounded by end_row, which is a u32
    Some((u32::try_from(start).ok()?, u32::try_from(end).ok()?))
}

/// Materialize rows `start..=end` of `sheet` across the columns of `range`.
#[must_use]
pub fn extract_rows(sheet: &Sheet, range: UsedRange, start: u32, end: u32) -> Vec<Row> {
    (start..=end)
        .map(|row| {
            (range.start_col..=range.end_col)
                .map(|col| sheet.display_value(row, col))
                .collect()
        })
        .collect()
}

/// Rows of chunk `cursor` for `sheet`; empty at or past the end of the sheet.
#[must_use]
pub fn sheet_chunk(sheet: &Sheet, cursor: u32, chunk_size: u32) -> Vec<Row> {
    sheet
        .used_range()
        .and_then(|range| {
            chunk_bounds(range, cursor, chunk_size)
                .map(|(start, end)| extract_rows(sheet, range, start, end))
        })
        .unwrap_or_default()
}

/// Rows of chunk `cursor` of the named sheet, using [`CHUNK_SIZE`].
///
/// Unknown sheets and exhausted cursors both yield no rows.
#[must_use]
pub fn next_chunk(workbook: &Workbook, sheet_name: &str, cursor: u32) -> Vec<Row> {
    next_chunk_sized(workbook, sheet_name, cursor, CHUNK_SIZE)
}

#[must_use]
pub fn next_chunk_sized(
    workbook: &Workbook,
    sheet_name: &str,
    cursor: u32,
    chunk_size: u32,
) -> Vec<Row> {
    workbook
        .sheet(sheet_name)
        .map(|sheet| sheet_chunk(sheet, cursor, chunk_size))
        .unwrap_or_default()
}
