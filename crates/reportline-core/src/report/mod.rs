//! Report kinds and the orchestrator that renders them.

mod definition;
mod generator;

pub use definition::{
    ATTENDANCE_PAGE_CAPACITY, ATTENDANCE_REPORT, ATTENDANCE_SUMMARY_ROWS, ATTENDANCE_TEMPLATE,
    EVIDENCE_REPORT, EVIDENCE_TEMPLATE, ReportDefinition,
};
pub use generator::{RenderedReport, ReportGenerator, page_model};
