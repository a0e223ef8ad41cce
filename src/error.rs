//! Structured error types for xlpreview.
//!
//! Every failure on the load path ends up as one of two user-facing kinds,
//! [`ErrorKind::Fetch`] or [`ErrorKind::Parse`]; the viewer never shows the
//! distinction, but logs and the CLI do.

/// All errors that can occur while fetching, parsing, or configuring a preview.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    /// Transport failure retrieving the file.
    #[error("Network request failed: {0}")]
    Fetch(String),

    /// The server answered, but not with a success status.
    #[error("HTTP {status} while fetching {url}")]
    HttpStatus { status: u16, url: String },

    /// ZIP archive error (XLSX container).
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// CSV reader error.
    #[error("CSV parsing: {0}")]
    Csv(#[from] ::csv::Error),

    /// General parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O error (local file reads on native builds).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// MIME type outside the accepted set.
    #[error("Unsupported file type: {0}")]
    UnsupportedMime(String),

    /// Invalid viewer configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Coarse classification of a [`PreviewError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bytes could not be retrieved.
    Fetch,
    /// The bytes could not be interpreted as a workbook.
    Parse,
    /// The viewer was misconfigured by its host.
    Config,
}

impl PreviewError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fetch(_) | Self::HttpStatus { .. } | Self::Io(_) => ErrorKind::Fetch,
            Self::Zip(_) | Self::Xml(_) | Self::Csv(_) | Self::Parse(_) => ErrorKind::Parse,
            Self::UnsupportedMime(_) => ErrorKind::Parse,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PreviewError>;

#[cfg(target_arch = "wasm32")]
impl From<PreviewError> for wasm_bindgen::JsValue {
    fn from(e: PreviewError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
