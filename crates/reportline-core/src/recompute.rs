//! Selective formula recomputation.
//!
//! After binding, cached formula results in the template are stale. Rather
//! than evaluating a dependency graph, each report kind declares the rows
//! whose summary formulas must be refreshed. A row whose sentinel cell is
//! blank is an unused template row for this page and is skipped entirely.

use reportline_engine::engine::{AddressError, CellRef, Evaluator, Workbook};

use crate::error::{ReportError, Result};

/// One template row to refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowTarget {
    /// 0-indexed row.
    pub row: usize,
    /// Column tested for "row in use".
    pub sentinel_col: usize,
    /// Columns holding the formulas to refresh.
    pub formula_cols: Vec<usize>,
}

impl RowTarget {
    /// Build a target from a 1-based row number and column letters,
    /// e.g. `RowTarget::parse(39, "A", &["C", "D"])`.
    pub fn parse(row_number: usize, sentinel: &str, formula_cols: &[&str]) -> Result<RowTarget> {
        let row = row_number
            .checked_sub(1)
            .ok_or_else(|| AddressError::Malformed(format!("{}{}", sentinel, row_number)))?;
        let sentinel_col = CellRef::parse_column(sentinel)?;
        let formula_cols = formula_cols
            .iter()
            .map(|col| CellRef::parse_column(col))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(RowTarget {
            row,
            sentinel_col,
            formula_cols,
        })
    }

    pub fn sentinel(&self) -> CellRef {
        CellRef::new(self.sentinel_col, self.row)
    }

    pub fn formula_cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        self.formula_cols
            .iter()
            .map(move |col| CellRef::new(*col, self.row))
    }
}

/// Rows to refresh on one sheet of a template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecomputePlan {
    pub sheet: usize,
    pub rows: Vec<RowTarget>,
}

impl RecomputePlan {
    /// Same sentinel and formula columns on every row of `row_numbers` (1-based).
    pub fn uniform<I>(
        sheet: usize,
        row_numbers: I,
        sentinel: &str,
        formula_cols: &[&str],
    ) -> Result<RecomputePlan>
    where
        I: IntoIterator<Item = usize>,
    {
        let rows = row_numbers
            .into_iter()
            .map(|row| RowTarget::parse(row, sentinel, formula_cols))
            .collect::<Result<Vec<_>>>()?;
        Ok(RecomputePlan { sheet, rows })
    }
}

/// Outcome of one recompute pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecomputeReport {
    pub rows_evaluated: usize,
    pub rows_skipped: usize,
    pub cells_recomputed: usize,
    /// Cells whose formula resolved to an error value.
    pub cells_failed: usize,
}

/// Refresh the cached results of the target formula cells on `sheet_index`.
///
/// Formula text is never changed. Per-cell failures become error values in
/// that cell and are counted, not returned.
pub fn recompute(
    workbook: &mut Workbook,
    sheet_index: usize,
    targets: &[RowTarget],
) -> Result<RecomputeReport> {
    let sheet = workbook
        .sheet_mut(sheet_index)
        .ok_or(ReportError::SheetNotFound(sheet_index))?;
    let evaluator = Evaluator::new(sheet);
    let mut report = RecomputeReport::default();

    for target in targets {
        if sheet.text_of(&target.sentinel()).trim().is_empty() {
            report.rows_skipped += 1;
            continue;
        }
        report.rows_evaluated += 1;

        for at in target.formula_cells() {
            let Some(value) = evaluator.evaluate(&at) else {
                continue;
            };
            if value.is_error() {
                log::warn!("formula at {}!{} evaluated to {}", sheet.name(), at, value);
                report.cells_failed += 1;
            }
            let mut cell = sheet.get(&at);
            cell.cached_value = Some(value);
            sheet.set(&at, cell);
            report.cells_recomputed += 1;
        }
    }

    log::debug!(
        "recomputed {} cells on {} ({} rows skipped)",
        report.cells_recomputed,
        sheet.name(),
        report.rows_skipped
    );
    Ok(report)
}

/// Run `plan` against `workbook`.
pub fn recompute_plan(workbook: &mut Workbook, plan: &RecomputePlan) -> Result<RecomputeReport> {
    recompute(workbook, plan.sheet, &plan.rows)
}
