//! Data types for the spreadsheet preview.

mod cell;
mod workbook;

pub use cell::*;
pub use workbook::*;
