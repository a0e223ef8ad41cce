//! Integration tests for xlpreview.
//!
//! This module provides the test infrastructure shared by the test files:
//!
//! - `fixtures`: Builders for creating CSV and XLSX files in memory
//! - `common`: Session helpers and assertions
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use crate::fixtures::{SheetBuilder, XlsxBuilder};
//! use crate::common::{open_xlsx, active_rows};
//!
//! fn test_first_chunk() {
//!     let xlsx = XlsxBuilder::new()
//!         .sheet(SheetBuilder::new("Data").grid(1, 40, 2))
//!         .build();
//!
//!     let session = open_xlsx(xlsx);
//!     assert_eq!(active_rows(&session).len(), 30);
//! }
//! ```
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation,
    clippy::cast_lossless
)]

pub mod common;
pub mod fixtures;

// Re-export commonly used items at the top level
pub use common::{
    active_rows, assert_ready, drain, failure_message, first_column, open, open_csv, open_xlsx,
    session,
};
pub use fixtures::{csv_rows, zip_parts, CellValue, SheetBuilder, XlsxBuilder};
