//! xlpreview - chunked CSV/XLSX preview for chat file panels
//!
//! Fetches a spreadsheet once, parses it to plain cell values, and shows the
//! active sheet in fixed-size row chunks that load as the user scrolls:
//! - CSV and XLSX (values only: no styles, formulas or charts)
//! - One tab per sheet, first chunk of every sheet ready on open
//! - A sentinel row triggers the next chunk via `IntersectionObserver`
//! - Localized loading and error messages (Korean by default)
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { SheetPreview, is_supported_mime } from 'xlpreview';
//! await init();
//! if (is_supported_mime(file.mime_type)) {
//!     const preview = new SheetPreview(container, { locale: 'ko' });
//!     await preview.open(file, url);
//! }
//! ```

// Parsing modules
pub mod cell_ref;
pub mod csv;
pub mod error;
pub mod mime;
pub mod parser;
pub mod types;

// Preview state
pub mod chunk;
pub mod config;
pub mod i18n;
pub mod panel;
pub mod session;
pub mod state;

// Platform glue
pub mod fetch;
pub mod logging;
#[cfg(target_arch = "wasm32")]
pub mod viewer;

use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
pub use viewer::SheetPreview;

pub use chunk::{next_chunk, Row, CHUNK_SIZE};
pub use config::ViewerConfig;
pub use error::{ErrorKind, PreviewError, Result};
pub use fetch::load;
pub use mime::{FileDescriptor, FileFormat};
pub use panel::PanelModel;
pub use parser::parse_bytes;
pub use session::PreviewSession;
pub use state::{ChunkOutcome, ViewState, ViewStatus};
pub use types::*;

/// Whether the preview handles files of this MIME type (exact match).
#[must_use]
#[wasm_bindgen]
pub fn is_supported_mime(mime_type: &str) -> bool {
    mime::is_supported(mime_type)
}

/// Whether the preview handles this file descriptor (`{ id?, mime_type, link? }`).
///
/// Malformed descriptors are simply unsupported.
#[must_use]
#[wasm_bindgen]
pub fn is_supported_file(descriptor: JsValue) -> bool {
    serde_wasm_bindgen::from_value::<FileDescriptor>(descriptor)
        .map(|d| d.is_supported())
        .unwrap_or(false)
}

/// Parse a file and return a summary of every sheet
///
/// # Arguments
/// * `data` - The raw bytes of the CSV or XLSX file
/// * `mime_type` - Declared MIME type; the format is sniffed when absent
///
/// # Errors
/// Returns an error if the file cannot be parsed.
#[wasm_bindgen]
pub fn parse_summary(data: &[u8], mime_type: Option<String>) -> std::result::Result<JsValue, JsValue> {
    let workbook = parser::parse_bytes(data, mime_type.as_deref())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    serde_wasm_bindgen::to_value(&workbook.summaries())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
