//! Cell data structures for the spreadsheet grid.
//!
//! This module provides the core data types for representing cells:
//! - [`CellType`] - The tagged content of a cell (blank, text, number, date or formula)
//! - [`CellValue`] - The last evaluated result of a formula cell
//! - [`Cell`] - A cell with content, dependencies, and cached evaluation result
//! - [`Grid`] - Sparse storage for cells (backed by `DashMap`)
//! - [`ValueCache`] - Values computed during the current evaluation pass

use chrono::NaiveDate;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::cell_ref::CellRef;
use super::deps::extract_dependencies;
use super::format::{format_date, format_number};

/// The type of content stored in a cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CellType {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Script(String),
}

/// Evaluated result of a formula cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Blank,
    Number(f64),
    Text(String),
    Bool(bool),
    /// Spreadsheet-native error literal such as `#VALUE!`.
    Error(String),
}

impl CellValue {
    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Blank => Ok(()),
            CellValue::Number(n) => f.write_str(&format_number(*n)),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            CellValue::Error(e) => f.write_str(e),
        }
    }
}

/// A cell in the spreadsheet grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub contents: CellType,
    pub depends_on: Vec<CellRef>,
    /// Last evaluated result for script cells.
    pub cached_value: Option<CellValue>,
}

impl Cell {
    pub fn new_empty() -> Cell {
        Cell {
            contents: CellType::Empty,
            depends_on: vec![],
            cached_value: None,
        }
    }

    pub fn new_text(text: &str) -> Cell {
        Cell {
            contents: CellType::Text(text.to_string()),
            depends_on: vec![],
            cached_value: None,
        }
    }

    pub fn new_number(n: f64) -> Cell {
        Cell {
            contents: CellType::Number(n),
            depends_on: vec![],
            cached_value: None,
        }
    }

    pub fn new_date(date: NaiveDate) -> Cell {
        Cell {
            contents: CellType::Date(date),
            depends_on: vec![],
            cached_value: None,
        }
    }

    /// Create a new cell containing a script/formula (without the leading '=').
    /// Dependencies are automatically extracted from the script.
    pub fn new_script(script: &str) -> Cell {
        Cell {
            depends_on: extract_dependencies(script),
            contents: CellType::Script(script.to_string()),
            cached_value: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.contents, CellType::Empty)
    }

    pub fn is_script(&self) -> bool {
        matches!(self.contents, CellType::Script(_))
    }

    /// The literal text content of the cell.
    ///
    /// Numbers and dates render with the grid's own formatting; script cells
    /// render their cached result (blank until evaluated).
    pub fn text(&self) -> String {
        match &self.contents {
            CellType::Empty => String::new(),
            CellType::Text(s) => s.clone(),
            CellType::Number(n) => format_number(*n),
            CellType::Date(d) => format_date(*d),
            CellType::Script(_) => self
                .cached_value
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_default(),
        }
    }
}

/// Sparse grid storage. A missing entry is a blank cell.
pub type Grid = Arc<DashMap<CellRef, Cell>>;

/// Values computed during an evaluation pass, keyed by cell position.
/// Lets formula references use freshly computed values instead of stale
/// cached results.
pub type ValueCache = Arc<DashMap<CellRef, rhai::Dynamic>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_of_each_cell_type() {
        assert_eq!(Cell::new_empty().text(), "");
        assert_eq!(Cell::new_text("Kowalski").text(), "Kowalski");
        assert_eq!(Cell::new_number(37.5).text(), "37.5");
        assert_eq!(Cell::new_number(40.0).text(), "40");
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(Cell::new_date(date).text(), "2024-03-01");
    }

    #[test]
    fn test_script_text_is_cached_result() {
        let mut cell = Cell::new_script("A1 + B1");
        assert_eq!(cell.text(), "");
        assert_eq!(cell.depends_on, vec![CellRef::new(0, 0), CellRef::new(1, 0)]);

        cell.cached_value = Some(CellValue::Number(8.0));
        assert_eq!(cell.text(), "8");
        cell.cached_value = Some(CellValue::Error("#VALUE!".to_string()));
        assert_eq!(cell.text(), "#VALUE!");
    }
}
