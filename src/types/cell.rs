use serde::{Deserialize, Serialize};

/// A single cell's parsed value.
///
/// Values are kept as parsed; nothing here applies number formats or
/// evaluates formulas. [`CellValue::display`] produces the text shown in the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "camelCase")]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Boolean(bool),
    /// Error code as stored in the file, e.g. `#DIV/0!`
    Error(String),
}

impl CellValue {
    /// Display text for the grid. Absent and empty cells both show as `""`.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) | Self::Error(s) => s.clone(),
            Self::Number(n) => format_number(*n),
            Self::Boolean(true) => "TRUE".to_string(),
            Self::Boolean(false) => "FALSE".to_string(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Shortest round-trip decimal form; integral values print without a fraction.
pub(crate) fn format_number(n: f64) -> String {
    n.to_string()
}

/// Parse a text field as a number if it looks like one.
///
/// Rejects `inf`/`NaN` spellings that `f64::from_str` would otherwise accept.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if !trimmed.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}
