use std::ops::RangeInclusive;

use crate::error::{ReportError, Result};
use crate::paginate::validate_capacity;
use crate::recompute::{RecomputePlan, RowTarget};

pub const EVIDENCE_REPORT: &str = "evidence";
pub const EVIDENCE_TEMPLATE: &str = "evidence";

pub const ATTENDANCE_REPORT: &str = "attendance";
pub const ATTENDANCE_TEMPLATE: &str = "attendance_list";
pub const ATTENDANCE_PAGE_CAPACITY: usize = 5;
/// 1-based rows of the per-person summary block in the attendance template.
pub const ATTENDANCE_SUMMARY_ROWS: RangeInclusive<usize> = 39..=43;

/// Everything that distinguishes one report kind from another.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportDefinition {
    pub name: String,
    /// Template name passed to the loader.
    pub template: String,
    /// Filename pattern, with `{{key}}` tokens resolved against the report
    /// parameters.
    pub filename: String,
    /// Entities per document. `None` for single-document reports.
    pub page_capacity: Option<usize>,
    pub recompute: Option<RecomputePlan>,
}

impl ReportDefinition {
    pub fn new(
        name: impl Into<String>,
        template: impl Into<String>,
        filename: impl Into<String>,
    ) -> ReportDefinition {
        ReportDefinition {
            name: name.into(),
            template: template.into(),
            filename: filename.into(),
            page_capacity: None,
            recompute: None,
        }
    }

    pub fn with_page_capacity(mut self, capacity: usize) -> Self {
        self.page_capacity = Some(capacity);
        self
    }

    pub fn with_recompute(mut self, plan: RecomputePlan) -> Self {
        self.recompute = Some(plan);
        self
    }

    /// Yearly work-time evidence sheet for one person.
    pub fn evidence() -> ReportDefinition {
        ReportDefinition::new(
            EVIDENCE_REPORT,
            EVIDENCE_TEMPLATE,
            "evidence_{{last_name}}_{{year}}.grd",
        )
    }

    /// Monthly attendance list, one document per page of employees.
    ///
    /// The summary formulas in columns C..F of each person row are refreshed
    /// when the row's name cell (column A) is filled.
    pub fn attendance_list() -> ReportDefinition {
        let rows = ATTENDANCE_SUMMARY_ROWS
            .map(|row_number| RowTarget {
                row: row_number - 1,
                sentinel_col: 0,
                formula_cols: vec![2, 3, 4, 5],
            })
            .collect();
        ReportDefinition::new(
            ATTENDANCE_REPORT,
            ATTENDANCE_TEMPLATE,
            "attendance_list_{{month}}_{{year}}.grd",
        )
        .with_page_capacity(ATTENDANCE_PAGE_CAPACITY)
        .with_recompute(RecomputePlan { sheet: 0, rows })
    }

    /// Look up a built-in report kind by name.
    pub fn builtin(name: &str) -> Option<ReportDefinition> {
        match name {
            EVIDENCE_REPORT => Some(ReportDefinition::evidence()),
            ATTENDANCE_REPORT => Some(ReportDefinition::attendance_list()),
            _ => None,
        }
    }

    pub fn is_paginated(&self) -> bool {
        self.page_capacity.is_some()
    }

    /// Reject misconfiguration before anything is rendered.
    ///
    /// A paginated report with a recompute plan needs one plan row per page
    /// slot, otherwise entities past the last row would be bound nowhere.
    pub fn validate(&self) -> Result<()> {
        let Some(capacity) = self.page_capacity else {
            return Ok(());
        };
        validate_capacity(capacity)?;
        if let Some(plan) = &self.recompute
            && capacity > plan.rows.len()
        {
            return Err(ReportError::InvalidCapacity(capacity));
        }
        Ok(())
    }
}
