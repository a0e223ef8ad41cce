//! Test fixtures for generating CSV and XLSX files in memory.
//!
//! # Example
//!
//! ```rust,ignore
//! use fixtures::{SheetBuilder, XlsxBuilder};
//!
//! let xlsx = XlsxBuilder::new()
//!     .add_sheet("Sales")
//!     .add_cell("A1", "Region")
//!     .add_cell("B1", 42.0)
//!     .build();
//!
//! let workbook = xlpreview::parser::parse_xlsx(&xlsx).unwrap();
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation,
    clippy::cast_lossless
)]

use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

// ============================================================================
// Cell Value
// ============================================================================

/// Represents a cell value that can be added to a sheet.
#[derive(Debug, Clone)]
pub enum CellValue {
    /// A shared string.
    String(String),
    /// A numeric value.
    Number(f64),
    /// A boolean value.
    Boolean(bool),
    /// An error value (e.g., "#DIV/0!").
    Error(String),
    /// An inline string (not shared).
    InlineString(String),
    /// A formula with its cached result.
    Formula { formula: String, cached: f64 },
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<u32> for CellValue {
    fn from(n: u32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

// ============================================================================
// Sheet Builder
// ============================================================================

/// A cell in the sheet.
#[derive(Debug, Clone)]
pub struct CellEntry {
    pub cell_ref: String,
    pub value: CellValue,
}

/// How the `<dimension>` element is written.
#[derive(Debug, Clone, Default)]
pub enum Dimension {
    /// Computed from the cells.
    #[default]
    Auto,
    /// Written verbatim.
    Explicit(String),
    /// Left out.
    Omitted,
}

/// Builder for a single worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    pub name: String,
    pub cells: Vec<CellEntry>,
    pub dimension: Dimension,
    /// Omit `r` attributes on rows and cells.
    pub implicit_refs: bool,
}

impl SheetBuilder {
    /// Create a new sheet builder with the given name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Add a cell with a value.
    #[must_use]
    pub fn cell<V: Into<CellValue>>(mut self, cell_ref: &str, value: V) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
        });
        self
    }

    /// Add an inline-string cell.
    #[must_use]
    pub fn inline(self, cell_ref: &str, text: &str) -> Self {
        self.cell(cell_ref, CellValue::InlineString(text.to_string()))
    }

    /// Add a formula cell with a cached numeric result.
    #[must_use]
    pub fn formula(self, cell_ref: &str, formula: &str, cached: f64) -> Self {
        self.cell(
            cell_ref,
            CellValue::Formula {
                formula: formula.to_string(),
                cached,
            },
        )
    }

    /// Fill rows `first..=last` with `"r{row}c{col}"` shared strings in
    /// columns A.. for `cols` columns.
    #[must_use]
    pub fn grid(mut self, first: u32, last: u32, cols: u32) -> Self {
        for row in first..=last {
            for col in 0..cols {
                let cell_ref = format!("{}{row}", col_letter(col));
                self = self.cell(&cell_ref, format!("r{row}c{}", col + 1));
            }
        }
        self
    }

    /// Write `<dimension ref="...">` verbatim.
    #[must_use]
    pub fn dimension(mut self, range: &str) -> Self {
        self.dimension = Dimension::Explicit(range.to_string());
        self
    }

    /// Leave `<dimension>` out entirely.
    #[must_use]
    pub fn no_dimension(mut self) -> Self {
        self.dimension = Dimension::Omitted;
        self
    }

    /// Write rows and cells without `r` attributes.
    #[must_use]
    pub fn implicit_refs(mut self) -> Self {
        self.implicit_refs = true;
        self
    }
}

// ============================================================================
// XLSX Builder
// ============================================================================

/// Builder for creating complete XLSX files.
#[derive(Debug, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetBuilder>,
    inline_only: bool,
}

impl XlsxBuilder {
    /// Create a new XLSX builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a finished sheet.
    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Add a simple sheet by name (returns a builder for chaining).
    #[must_use]
    pub fn add_sheet(self, name: &str) -> XlsxSheetAdder {
        XlsxSheetAdder {
            builder: self,
            sheet: SheetBuilder::new(name),
        }
    }

    /// Write strings inline and skip the shared string table.
    #[must_use]
    pub fn without_shared_strings(mut self) -> Self {
        self.inline_only = true;
        self
    }

    /// Build the XLSX file as bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let cursor = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(cursor);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut shared_strings: Vec<String> = Vec::new();
        if !self.inline_only {
            for cell in self.sheets.iter().flat_map(|s| &s.cells) {
                if let CellValue::String(ref s) = cell.value {
                    if !shared_strings.contains(s) {
                        shared_strings.push(s.clone());
                    }
                }
            }
        }

        let _ = zip.start_file("[Content_Types].xml", options);
        let _ = zip.write_all(generate_content_types(self.sheets.len()).as_bytes());

        let _ = zip.start_file("_rels/.rels", options);
        let _ = zip.write_all(generate_rels().as_bytes());

        let _ = zip.start_file("xl/_rels/workbook.xml.rels", options);
        let _ = zip.write_all(
            generate_workbook_rels(self.sheets.len(), !shared_strings.is_empty()).as_bytes(),
        );

        let _ = zip.start_file("xl/workbook.xml", options);
        let _ = zip.write_all(generate_workbook(&self.sheets).as_bytes());

        if !shared_strings.is_empty() {
            let _ = zip.start_file("xl/sharedStrings.xml", options);
            let _ = zip.write_all(generate_shared_strings(&shared_strings).as_bytes());
        }

        for (i, sheet) in self.sheets.iter().enumerate() {
            let path = format!("xl/worksheets/sheet{}.xml", i + 1);
            let _ = zip.start_file(&path, options);
            let _ = zip.write_all(generate_sheet_xml(sheet, &shared_strings).as_bytes());
        }

        let cursor = zip.finish().expect("Failed to finish ZIP");
        cursor.into_inner()
    }
}

/// Helper for fluent sheet building within `XlsxBuilder`.
pub struct XlsxSheetAdder {
    builder: XlsxBuilder,
    sheet: SheetBuilder,
}

impl XlsxSheetAdder {
    /// Add a cell to the current sheet.
    #[must_use]
    pub fn add_cell<V: Into<CellValue>>(mut self, cell_ref: &str, value: V) -> Self {
        self.sheet = self.sheet.cell(cell_ref, value);
        self
    }

    /// Finish the current sheet and return the builder.
    #[must_use]
    pub fn done(mut self) -> XlsxBuilder {
        self.builder.sheets.push(self.sheet);
        self.builder
    }

    /// Build the XLSX directly (finishes the current sheet automatically).
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.done().build()
    }
}

// ============================================================================
// Raw archives
// ============================================================================

/// Zip arbitrary `(path, contents)` parts, for malformed-package tests.
#[must_use]
pub fn zip_parts(parts: &[(&str, &str)]) -> Vec<u8> {
    let cursor = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(cursor);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (path, contents) in parts {
        let _ = zip.start_file(*path, options);
        let _ = zip.write_all(contents.as_bytes());
    }
    zip.finish().expect("Failed to finish ZIP").into_inner()
}

/// `rows` lines of `"{n},item {n}"`, numbered from 1.
#[must_use]
pub fn csv_rows(rows: u32) -> Vec<u8> {
    (1..=rows)
        .map(|i| format!("{i},item {i}\n"))
        .collect::<String>()
        .into_bytes()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Zero-based column index to letters.
fn col_letter(mut col: u32) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap()
}

/// Split "B12" into (12, 1).
fn split_ref(cell_ref: &str) -> (u32, u32) {
    let digits = cell_ref.find(|c: char| c.is_ascii_digit()).unwrap();
    let (letters, row) = cell_ref.split_at(digits);
    let col = letters
        .bytes()
        .fold(0u32, |acc, b| acc * 26 + u32::from(b - b'A' + 1))
        - 1;
    (row.parse().unwrap(), col)
}

/// Escape XML special characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Generate [Content_Types].xml
fn generate_content_types(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

/// Generate _rels/.rels
fn generate_rels() -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    xml.push_str(r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#);
    xml.push_str("</Relationships>");
    xml
}

/// Generate xl/_rels/workbook.xml.rels
fn generate_workbook_rels(sheet_count: usize, shared_strings: bool) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }
    if shared_strings {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
            sheet_count + 1
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// Generate xl/workbook.xml
fn generate_workbook(sheets: &[SheetBuilder]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
    xml.push_str("<sheets>");
    for (i, sheet) in sheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape_xml(&sheet.name),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets>");
    xml.push_str("</workbook>");
    xml
}

/// Generate xl/sharedStrings.xml
fn generate_shared_strings(strings: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    ));
    for s in strings {
        xml.push_str(&format!(
            r#"<si><t xml:space="preserve">{}</t></si>"#,
            escape_xml(s)
        ));
    }
    xml.push_str("</sst>");
    xml
}

fn auto_dimension(cells: &[CellEntry]) -> Option<String> {
    let refs: Vec<(u32, u32)> = cells.iter().map(|c| split_ref(&c.cell_ref)).collect();
    let min_row = refs.iter().map(|r| r.0).min()?;
    let max_row = refs.iter().map(|r| r.0).max()?;
    let min_col = refs.iter().map(|r| r.1).min()?;
    let max_col = refs.iter().map(|r| r.1).max()?;
    Some(format!(
        "{}{min_row}:{}{max_row}",
        col_letter(min_col),
        col_letter(max_col)
    ))
}

fn cell_xml(entry: &CellEntry, r_attr: &str, shared_strings: &[String]) -> String {
    match &entry.value {
        CellValue::String(s) => match shared_strings.iter().position(|x| x == s) {
            Some(idx) => format!(r#"<c{r_attr} t="s"><v>{idx}</v></c>"#),
            None => format!(
                r#"<c{r_attr} t="inlineStr"><is><t>{}</t></is></c>"#,
                escape_xml(s)
            ),
        },
        CellValue::InlineString(s) => format!(
            r#"<c{r_attr} t="inlineStr"><is><t>{}</t></is></c>"#,
            escape_xml(s)
        ),
        CellValue::Number(n) => format!(r#"<c{r_attr}><v>{n}</v></c>"#),
        CellValue::Boolean(b) => {
            format!(r#"<c{r_attr} t="b"><v>{}</v></c>"#, u8::from(*b))
        }
        CellValue::Error(e) => format!(r#"<c{r_attr} t="e"><v>{}</v></c>"#, escape_xml(e)),
        CellValue::Formula { formula, cached } => format!(
            r#"<c{r_attr}><f>{}</f><v>{cached}</v></c>"#,
            escape_xml(formula)
        ),
    }
}

/// Generate xl/worksheets/sheetN.xml
fn generate_sheet_xml(sheet: &SheetBuilder, shared_strings: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);

    let dimension = match &sheet.dimension {
        Dimension::Auto => auto_dimension(&sheet.cells),
        Dimension::Explicit(range) => Some(range.clone()),
        Dimension::Omitted => None,
    };
    if let Some(range) = dimension {
        xml.push_str(&format!(r#"<dimension ref="{range}"/>"#));
    }

    let mut rows: BTreeMap<u32, Vec<(u32, &CellEntry)>> = BTreeMap::new();
    for entry in &sheet.cells {
        let (row, col) = split_ref(&entry.cell_ref);
        rows.entry(row).or_default().push((col, entry));
    }

    if rows.is_empty() {
        xml.push_str("<sheetData/>");
    } else {
        xml.push_str("<sheetData>");
        for (row, mut cells) in rows {
            cells.sort_by_key(|(col, _)| *col);
            if sheet.implicit_refs {
                xml.push_str("<row>");
            } else {
                xml.push_str(&format!(r#"<row r="{row}">"#));
            }
            for (_, entry) in cells {
                let r_attr = if sheet.implicit_refs {
                    String::new()
                } else {
                    format!(r#" r="{}""#, entry.cell_ref)
                };
                xml.push_str(&cell_xml(entry, &r_attr, shared_strings));
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData>");
    }

    xml.push_str("</worksheet>");
    xml
}
