//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell references
//! (e.g., "A1", "C39", "AA100") and zero-indexed column/row coordinates.
//! Columns use bijective base-26 letters (A = 0, Z = 25, AA = 26), rows are
//! 1-based in text form. Parsing is case-insensitive; formatting is always
//! uppercase, so `parse(format(r)) == r` and `format(parse(t)) == t` for any
//! canonical `t`.
//!
//! # Examples
//!
//! ```
//! use reportline_engine::engine::CellRef;
//!
//! let cell = CellRef::parse("C39").unwrap();
//! assert_eq!(cell.col, 2);  // 0-indexed
//! assert_eq!(cell.row, 38);
//! assert_eq!(cell.to_string(), "C39");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Malformed cell coordinate text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid cell reference: {0:?}")]
    Malformed(String),

    #[error("Invalid column letters: {0:?}")]
    Column(String),
}

/// A reference to a cell by column and row indices (0-indexed).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

fn a1_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Za-z]+)(?<numbers>[1-9][0-9]*)$")
            .expect("A1 reference regex must compile")
    })
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell reference from spreadsheet notation (e.g., "A1", "b2", "AA10").
    pub fn parse(name: &str) -> Result<CellRef, AddressError> {
        Self::parse_a1(name).ok_or_else(|| AddressError::Malformed(name.to_string()))
    }

    /// Lenient variant of [`CellRef::parse`] used while scanning formula text.
    pub fn from_a1(name: &str) -> Option<CellRef> {
        Self::parse_a1(name)
    }

    fn parse_a1(name: &str) -> Option<CellRef> {
        let caps = a1_re().captures(name)?;
        let col = Self::letters_to_col(&caps["letters"])?;
        let row = caps["numbers"].parse::<usize>().ok()?.checked_sub(1)?;
        Some(CellRef::new(col, row))
    }

    /// Parse bare column letters ("A", "aa") into a 0-indexed column.
    pub fn parse_column(letters: &str) -> Result<usize, AddressError> {
        if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(AddressError::Column(letters.to_string()));
        }
        Self::letters_to_col(letters).ok_or_else(|| AddressError::Column(letters.to_string()))
    }

    fn letters_to_col(letters: &str) -> Option<usize> {
        let mut col_acc = 0usize;
        for c in letters.to_ascii_uppercase().bytes() {
            let digit = (c - b'A') as usize + 1;
            col_acc = col_acc.checked_mul(26)?.checked_add(digit)?;
        }
        col_acc.checked_sub(1)
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }
}

impl std::str::FromStr for CellRef {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row as u128 + 1)
    }
}
