//! Parser for the .grd workbook format

use crate::error::{ReportError, Result};
use chrono::NaiveDate;
use reportline_engine::engine::{Cell, CellRef, CellValue, DATE_FORMAT, Sheet, Workbook};
use std::fs;
use std::path::Path;

use super::DEFAULT_SHEET_NAME;

/// Parse a .grd file into a Workbook
pub fn parse_workbook(path: &Path) -> Result<Workbook> {
    let content = fs::read_to_string(path)?;
    parse_workbook_content(&content)
}

/// Parse .grd content from a string
pub fn parse_workbook_content(content: &str) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let mut current: Option<Sheet> = None;

    for (line_idx, line) in content.lines().enumerate() {
        let line_num = line_idx + 1;
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim();
            if name.is_empty() {
                return Err(parse_error(line_num, "Sheet name must not be empty"));
            }
            let duplicate = workbook.sheet_by_name(name).is_some()
                || current.as_ref().is_some_and(|s| s.name() == name);
            if duplicate {
                return Err(parse_error(line_num, &format!("Duplicate sheet: {}", name)));
            }
            if let Some(sheet) = current.replace(Sheet::new(name)) {
                workbook.push_sheet(sheet);
            }
            continue;
        }

        let sheet = current.get_or_insert_with(|| Sheet::new(DEFAULT_SHEET_NAME));

        // Cached formula result: "!CELLREF: VALUE"
        if let Some(rest) = line.strip_prefix('!') {
            let (cell_ref, value_str) = split_entry(rest, line_num)?;
            let mut cell = sheet.get(&cell_ref);
            if !cell.is_script() {
                return Err(parse_error(
                    line_num,
                    &format!("Cached value for {} without a formula", cell_ref),
                ));
            }
            cell.cached_value = Some(parse_cached_value(value_str, line_num)?);
            sheet.set(&cell_ref, cell);
            continue;
        }

        // "CELLREF: VALUE"
        let (cell_ref, value_str) = split_entry(line, line_num)?;
        let cell = parse_cell_value(value_str, line_num)?;
        sheet.set(&cell_ref, cell);
    }

    if let Some(sheet) = current {
        workbook.push_sheet(sheet);
    }
    if workbook.is_empty() {
        workbook.push_sheet(Sheet::new(DEFAULT_SHEET_NAME));
    }

    Ok(workbook)
}

fn parse_error(line: usize, message: &str) -> ReportError {
    ReportError::Parse {
        line,
        message: message.to_string(),
    }
}

fn split_entry(line: &str, line_num: usize) -> Result<(CellRef, &str)> {
    let Some((cell_ref_str, value_str)) = line.split_once(':') else {
        return Err(parse_error(line_num, "Expected 'CELLREF: VALUE' format"));
    };

    let cell_ref_str = cell_ref_str.trim();
    let cell_ref = CellRef::parse(cell_ref_str).map_err(|_| {
        parse_error(
            line_num,
            &format!("Invalid cell reference: {}", cell_ref_str),
        )
    })?;
    Ok((cell_ref, value_str.trim()))
}

/// Parse a cell value string into a Cell
fn parse_cell_value(value: &str, line_num: usize) -> Result<Cell> {
    if value.is_empty() {
        return Ok(Cell::new_empty());
    }

    // Formula: starts with '='
    if let Some(formula) = value.strip_prefix('=') {
        return Ok(Cell::new_script(formula.trim()));
    }

    // Date: @YYYY-MM-DD
    if let Some(date) = value.strip_prefix('@') {
        return NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map(Cell::new_date)
            .map_err(|_| parse_error(line_num, &format!("Invalid date: {}", date)));
    }

    if let Some(text) = quoted(value) {
        return Ok(Cell::new_text(&unescape_grd_text(text)));
    }

    if let Ok(n) = value.parse::<f64>() {
        return Ok(Cell::new_number(n));
    }

    Err(parse_error(
        line_num,
        &format!("Invalid value: {}. Use quotes for text.", value),
    ))
}

fn parse_cached_value(value: &str, line_num: usize) -> Result<CellValue> {
    if value.is_empty() {
        return Ok(CellValue::Blank);
    }
    if value.starts_with('#') {
        return Ok(CellValue::Error(value.to_string()));
    }
    match value {
        "TRUE" => return Ok(CellValue::Bool(true)),
        "FALSE" => return Ok(CellValue::Bool(false)),
        _ => {}
    }
    if let Some(text) = quoted(value) {
        return Ok(CellValue::Text(unescape_grd_text(text)));
    }
    value
        .parse::<f64>()
        .map(CellValue::Number)
        .map_err(|_| parse_error(line_num, &format!("Invalid cached value: {}", value)))
}

fn quoted(value: &str) -> Option<&str> {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        Some(&value[1..value.len() - 1])
    } else {
        None
    }
}

fn unescape_grd_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                match next {
                    '\\' => out.push('\\'),
                    '"' => out.push('"'),
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    _ => {
                        out.push('\\');
                        out.push(next);
                    }
                }
            } else {
                out.push('\\');
            }
        } else {
            out.push(ch);
        }
    }
    out
}
