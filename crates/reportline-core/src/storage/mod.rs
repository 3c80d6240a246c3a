//! Workbook storage in the `.grd` text format.
//!
//! ```text
//! # comment
//! [Sheet name]
//! A1: "text"
//! B1: 37.5
//! C1: @2024-03-01
//! D1: =B1 * 8
//! !D1: 300
//! ```
//!
//! `!REF:` lines carry the cached result of the formula at REF.

mod parser;
mod writer;

pub use parser::{parse_workbook, parse_workbook_content};
pub use writer::{write_workbook, write_workbook_content};

/// Sheet name used when cells appear before any `[Sheet]` header.
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";
