//! Sheets and workbooks: the cell model the report pipeline works against.
//!
//! A [`Sheet`] wraps a sparse [`Grid`]; reading an unset position yields a
//! blank cell, writing creates storage on demand. Cloning a sheet (or a
//! [`Workbook`]) copies every cell, so each clone is independently owned even
//! though the grid itself is reference counted for the formula engine.

use chrono::NaiveDate;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

use super::cell::{Cell, Grid};
use super::cell_ref::CellRef;

pub struct Sheet {
    name: String,
    grid: Grid,
}

impl Sheet {
    pub fn new(name: &str) -> Sheet {
        Sheet {
            name: name.to_string(),
            grid: Arc::new(DashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle to the underlying grid (used by the formula engine).
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Cell at `at`, or a blank cell if nothing is stored there.
    pub fn get(&self, at: &CellRef) -> Cell {
        self.grid
            .get(at)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(Cell::new_empty)
    }

    /// Store `cell` at `at`. Storing a blank cell removes the entry.
    pub fn set(&mut self, at: &CellRef, cell: Cell) {
        if cell.is_empty() {
            self.grid.remove(at);
        } else {
            self.grid.insert(*at, cell);
        }
    }

    pub fn set_text(&mut self, at: &CellRef, text: &str) {
        self.set(at, Cell::new_text(text));
    }

    pub fn set_number(&mut self, at: &CellRef, n: f64) {
        self.set(at, Cell::new_number(n));
    }

    pub fn set_date(&mut self, at: &CellRef, date: NaiveDate) {
        self.set(at, Cell::new_date(date));
    }

    /// Literal text content of the cell at `at` (empty for blanks).
    pub fn text_of(&self, at: &CellRef) -> String {
        self.grid
            .get(at)
            .map(|entry| entry.text())
            .unwrap_or_default()
    }

    /// All stored cells in row-major order.
    pub fn cells(&self) -> Vec<(CellRef, Cell)> {
        let mut cells: Vec<(CellRef, Cell)> = self
            .grid
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        cells.sort_by(|a, b| a.0.cmp(&b.0));
        cells
    }

    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }
}

impl Clone for Sheet {
    fn clone(&self) -> Self {
        let grid: Grid = Arc::new(DashMap::with_capacity(self.grid.len()));
        for entry in self.grid.iter() {
            grid.insert(*entry.key(), entry.value().clone());
        }
        Sheet {
            name: self.name.clone(),
            grid,
        }
    }
}

impl PartialEq for Sheet {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.cells() == other.cells()
    }
}

impl fmt::Debug for Sheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sheet")
            .field("name", &self.name)
            .field("cells", &self.cells())
            .finish()
    }
}

/// An ordered sequence of sheets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Workbook {
        Workbook::default()
    }

    pub fn push_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}
