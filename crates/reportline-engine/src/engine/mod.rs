//! Spreadsheet engine API.
//!
//! This module provides the cell model and computation engine for reports:
//!
//! - [`CellRef`] - Cell reference parsing (A1 notation ↔ row/col indices)
//! - [`Cell`], [`CellType`], [`CellValue`], [`Grid`] - Data structures for cell storage
//! - [`Sheet`], [`Workbook`] - Owned sheets with blank-on-miss reads
//! - [`Evaluator`] - Re-evaluates formula cells of a sheet
//! - [`detect_cycle`], [`EvalStack`] - Circular dependency detection
//! - [`extract_dependencies`] - Parse formula dependencies
//! - [`preprocess_script`] - Transform formulas for Rhai evaluation

mod cell;
mod cell_ref;
mod cycle;
mod deps;
mod eval;
mod format;
mod preprocess;
mod sheet;

pub use cell::{Cell, CellType, CellValue, Grid, ValueCache};
pub use cell_ref::{AddressError, CellRef};
pub use cycle::{EvalStack, detect_cycle};
pub use deps::extract_dependencies;
pub use eval::{Evaluator, create_engine, dynamic_to_value};
pub use format::{DATE_FORMAT, date_to_serial, format_date, format_number};
pub use preprocess::preprocess_script;
pub use sheet::{Sheet, Workbook};

pub use rhai::Dynamic;
