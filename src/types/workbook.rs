use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::CellValue;
use crate::cell_ref::{encode_cell, parse_cell_range};

/// Inclusive rectangular bounds of a sheet's data (0-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsedRange {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl UsedRange {
    /// Build a range from two corners in any order.
    #[must_use]
    pub fn new(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Self {
        Self {
            start_row: start_row.min(end_row),
            start_col: start_col.min(end_col),
            end_row: start_row.max(end_row),
            end_col: start_col.max(end_col),
        }
    }

    #[must_use]
    pub fn cell(row: u32, col: u32) -> Self {
        Self::new(row, col, row, col)
    }

    /// Parse an A1 range such as `A1:D65` (a single address is a 1x1 range).
    #[must_use]
    pub fn parse(a1: &str) -> Option<Self> {
        let (start_row, start_col, end_row, end_col) = parse_cell_range(a1)?;
        Some(Self::new(start_row, start_col, end_row, end_col))
    }

    /// Number of rows, `end_row - start_row + 1`, saturating at `u32::MAX`.
    #[must_use]
    pub fn row_count(&self) -> u32 {
        span(self.start_row, self.end_row)
    }

    #[must_use]
    pub fn col_count(&self) -> u32 {
        span(self.start_col, self.end_col)
    }

    #[must_use]
    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.start_row..=self.end_row).contains(&row)
            && (self.start_col..=self.end_col).contains(&col)
    }

    /// Smallest range covering both `self` and `other`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            start_row: self.start_row.min(other.start_row),
            start_col: self.start_col.min(other.start_col),
            end_row: self.end_row.max(other.end_row),
            end_col: self.end_col.max(other.end_col),
        }
    }

    #[must_use]
    pub fn to_a1(&self) -> String {
        format!(
            "{}:{}",
            encode_cell(self.start_row, self.start_col),
            encode_cell(self.end_row, self.end_col)
        )
    }
}

fn span(start: u32, end: u32) -> u32 {
    let len = u64::from(end) - u64::from(start.min(end)) + 1;
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// A single worksheet: sparse cell map plus its used range.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    cells: HashMap<(u32, u32), CellValue>,
    used_range: Option<UsedRange>,
}

impl Sheet {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: HashMap::new(),
            used_range: None,
        }
    }

    /// Store a value at (row, col). Empty values clear the cell.
    ///
    /// The used range is not touched; call [`Sheet::fit_used_range`] or
    /// [`Sheet::set_used_range`] once all cells are in.
    pub fn set_cell(&mut self, row: u32, col: u32, value: CellValue) {
        if value.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
    }

    #[must_use]
    pub fn cell(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    /// Display text at (row, col); an absent cell is `""`, never an error.
    #[must_use]
    pub fn display_value(&self, row: u32, col: u32) -> String {
        self.cell(row, col).map(CellValue::display).unwrap_or_default()
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn used_range(&self) -> Option<UsedRange> {
        self.used_range
    }

    pub fn set_used_range(&mut self, range: Option<UsedRange>) {
        self.used_range = range;
    }

    /// Bounding box of the cells actually present.
    #[must_use]
    pub fn cell_extent(&self) -> Option<UsedRange> {
        self.cells
            .keys()
            .map(|&(row, col)| UsedRange::cell(row, col))
            .reduce(UsedRange::union)
    }

    /// Widen the declared range (if any) so every stored cell lies inside it.
    pub fn fit_used_range(&mut self) {
        self.used_range = match (self.used_range, self.cell_extent()) {
            (Some(declared), Some(extent)) => Some(declared.union(extent)),
            (declared, extent) => declared.or(extent),
        };
    }

    /// `end_row - start_row + 1`, or 0 for a sheet with no used range.
    #[must_use]
    pub fn total_rows(&self) -> u32 {
        self.used_range.map_or(0, |r| r.row_count())
    }

    #[must_use]
    pub fn summary(&self) -> SheetSummary {
        SheetSummary {
            name: self.name.clone(),
            used_range: self.used_range.map(|r| r.to_a1()),
            total_rows: self.total_rows(),
            total_cols: self.used_range.map_or(0, |r| r.col_count()),
            cell_count: self.cells.len(),
        }
    }
}

/// Serializable overview of one sheet, for the CLI and JS callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_range: Option<String>,
    pub total_rows: u32,
    pub total_cols: u32,
    pub cell_count: usize,
}

/// A parsed workbook: sheets in file order. Immutable once parsed.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    #[must_use]
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    #[must_use]
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    #[must_use]
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    /// First sheet name that appears more than once.
    #[must_use]
    pub fn duplicate_sheet_name(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.sheets
            .iter()
            .map(|s| s.name.as_str())
            .find(|name| !seen.insert(*name))
    }

    #[must_use]
    pub fn summaries(&self) -> Vec<SheetSummary> {
        self.sheets.iter().map(Sheet::summary).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_used_range_counts() {
        let r = UsedRange::parse("B3:D12").unwrap();
        assert_eq!(r.row_count(), 10);
        assert_eq!(r.col_count(), 3);
        assert!(r.contains(2, 1));
        assert!(!r.contains(1, 1));
        assert_eq!(r.to_a1(), "B3:D12");
    }

    #[test]
    fn test_used_range_normalizes_corners() {
        let r = UsedRange::new(9, 4, 0, 0);
        assert_eq!(r, UsedRange::parse("A1:E10").unwrap());
    }

    #[test]
    fn test_full_width_range_does_not_overflow() {
        let r = UsedRange::new(0, 0, u32::MAX, u32::MAX);
        assert_eq!(r.row_count(), u32::MAX);
        assert_eq!(r.col_count(), u32::MAX);
        assert_eq!(UsedRange::cell(u32::MAX, 3).row_count(), 1);
    }

    #[test]
    fn test_oversized_range_is_clamped_on_parse() {
        let r = UsedRange::parse("A1:FXSHRXW2").unwrap();
        assert_eq!(r.col_count(), 16_384);
        assert_eq!(r.row_count(), 2);
        assert_eq!(r.to_a1(), "A1:XFD2");
    }

    #[test]
    fn test_set_cell_empty_clears() {
        let mut sheet = Sheet::new("S");
        sheet.set_cell(0, 0, CellValue::Number(1.0));
        sheet.set_cell(0, 0, CellValue::Empty);
        assert_eq!(sheet.cell_count(), 0);
        assert_eq!(sheet.display_value(0, 0), "");
    }

    #[test]
    fn test_fit_used_range_widens_declared() {
        let mut sheet = Sheet::new("S");
        sheet.set_cell(20, 5, CellValue::Text("late".into()));
        sheet.set_used_range(UsedRange::parse("A1:B2"));
        sheet.fit_used_range();
        assert_eq!(sheet.used_range(), UsedRange::parse("A1:F21"));
        assert_eq!(sheet.total_rows(), 21);
    }

    #[test]
    fn test_empty_sheet_has_no_rows() {
        let mut sheet = Sheet::new("Empty");
        sheet.fit_used_range();
        assert_eq!(sheet.used_range(), None);
        assert_eq!(sheet.total_rows(), 0);
        assert_eq!(sheet.summary().used_range, None);
    }

    #[test]
    fn test_duplicate_sheet_name() {
        let wb = Workbook::new(vec![Sheet::new("A"), Sheet::new("B"), Sheet::new("A")]);
        assert_eq!(wb.duplicate_sheet_name(), Some("A"));
        let wb = Workbook::new(vec![Sheet::new("A"), Sheet::new("a")]);
        assert_eq!(wb.duplicate_sheet_name(), None);
    }

    #[test]
    fn test_workbook_lookup_by_name() {
        let wb = Workbook::new(vec![Sheet::new("One"), Sheet::new("Two")]);
        assert_eq!(wb.sheet_names(), vec!["One", "Two"]);
        assert!(wb.sheet("Two").is_some());
        assert!(wb.sheet("Three").is_none());
    }
}
