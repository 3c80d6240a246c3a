//! Error types for Reportline core.

use std::path::PathBuf;

use reportline_engine::engine::{AddressError, CellRef};
use thiserror::Error;

/// Errors that can occur while generating a report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),

    #[error("No value bound for placeholder {key:?} at {sheet}!{address}")]
    MissingBinding {
        key: String,
        sheet: String,
        address: CellRef,
    },

    #[error("No value bound for placeholder {key:?} in filename pattern {pattern:?}")]
    MissingFilenameBinding { key: String, pattern: String },

    #[error("Bound value would leave placeholder {key:?} in the output")]
    TokenInValue { key: String },

    #[error("Invalid page capacity {0}: must be at least 1 and fit the report's summary rows")]
    InvalidCapacity(usize),

    #[error("Template {name:?} not found at {}", path.display())]
    TemplateNotFound { name: String, path: PathBuf },

    #[error("Refusing to read template {name:?}: {size} bytes exceeds the {max} byte limit")]
    TemplateTooLarge { name: String, size: u64, max: u64 },

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Workbook has no sheet at index {0}")]
    SheetNotFound(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
