//! Writer for the .grd workbook format

use crate::error::Result;
use reportline_engine::engine::{CellType, CellValue, DATE_FORMAT, Workbook};
use std::fs;
use std::path::Path;

/// Write a Workbook to a .grd file
pub fn write_workbook(path: &Path, workbook: &Workbook) -> Result<()> {
    let content = write_workbook_content(workbook);
    fs::write(path, content)?;
    Ok(())
}

/// Write a Workbook to a .grd format string
pub fn write_workbook_content(workbook: &Workbook) -> String {
    let mut lines = vec!["# Reportline Workbook".to_string()];

    for sheet in workbook.sheets() {
        lines.push(format!("[{}]", sheet.name()));

        for (cell_ref, cell) in sheet.cells() {
            let value_str = match &cell.contents {
                CellType::Empty => continue, // Skip empty cells
                CellType::Number(n) => n.to_string(),
                CellType::Text(s) => format!("\"{}\"", escape_grd_text(s)),
                CellType::Date(d) => format!("@{}", d.format(DATE_FORMAT)),
                CellType::Script(s) => format!("={}", s),
            };
            lines.push(format!("{}: {}", cell_ref, value_str));

            if let Some(cached) = cell.cached_value.as_ref().and_then(cached_value_str) {
                lines.push(format!("!{}: {}", cell_ref, cached));
            }
        }
    }

    lines.join("\n") + "\n"
}

fn cached_value_str(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Blank => None,
        CellValue::Number(n) => Some(n.to_string()),
        CellValue::Text(s) => Some(format!("\"{}\"", escape_grd_text(s))),
        CellValue::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        CellValue::Error(e) => Some(e.clone()),
    }
}

fn escape_grd_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::parse_workbook_content;
    use chrono::NaiveDate;
    use reportline_engine::engine::{Cell, CellRef, Sheet};

    fn single_sheet(cells: &[(CellRef, Cell)]) -> Workbook {
        let mut sheet = Sheet::new("Sheet1");
        for (at, cell) in cells {
            sheet.set(at, cell.clone());
        }
        let mut workbook = Workbook::new();
        workbook.push_sheet(sheet);
        workbook
    }

    #[test]
    fn test_write_scalars() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let content = write_workbook_content(&single_sheet(&[
            (CellRef::new(0, 0), Cell::new_number(42.0)),
            (CellRef::new(1, 0), Cell::new_text("Say \"hi\"")),
            (CellRef::new(2, 0), Cell::new_date(date)),
        ]));
        assert!(content.contains("[Sheet1]"));
        assert!(content.contains("A1: 42"));
        assert!(content.contains(r#"B1: "Say \"hi\"""#));
        assert!(content.contains("C1: @2024-03-01"));
    }

    #[test]
    fn test_write_formula_with_cached_value() {
        let mut cell = Cell::new_script("B1 + C1");
        cell.cached_value = Some(CellValue::Number(37.5));
        let content = write_workbook_content(&single_sheet(&[(CellRef::new(0, 0), cell)]));
        assert!(content.contains("A1: =B1 + C1\n!A1: 37.5\n"));
    }

    #[test]
    fn test_sorted_output() {
        let content = write_workbook_content(&single_sheet(&[
            (CellRef::new(1, 1), Cell::new_number(3.0)), // B2
            (CellRef::new(0, 0), Cell::new_number(1.0)), // A1
            (CellRef::new(1, 0), Cell::new_number(2.0)), // B1
        ]));
        let lines: Vec<_> = content.lines().collect();
        // After header and sheet line, should be A1, B1, B2
        assert!(lines[2].starts_with("A1"));
        assert!(lines[3].starts_with("B1"));
        assert!(lines[4].starts_with("B2"));
    }

    #[test]
    fn test_written_workbook_reads_back() {
        let mut formula = Cell::new_script("SUM(B1:B2)");
        formula.cached_value = Some(CellValue::Error("#VALUE!".to_string()));
        let workbook = single_sheet(&[
            (CellRef::new(0, 0), Cell::new_text("back\\slash")),
            (CellRef::new(1, 0), Cell::new_number(0.1)),
            (CellRef::new(2, 2), formula),
        ]);
        let parsed = parse_workbook_content(&write_workbook_content(&workbook)).unwrap();
        assert_eq!(parsed, workbook);
    }

    #[test]
    fn test_multiline_text_stays_in_its_cell() {
        let mut formula = Cell::new_script("A1");
        formula.cached_value = Some(CellValue::Text("x\r\ny".to_string()));
        let workbook = single_sheet(&[
            (CellRef::new(0, 0), Cell::new_text("Jan Nowak\nB5: 99\tok")),
            (CellRef::new(2, 0), formula),
        ]);
        let content = write_workbook_content(&workbook);
        assert!(content.contains(r#"A1: "Jan Nowak\nB5: 99\tok""#));
        assert!(content.contains(r#"!C1: "x\r\ny""#));

        let parsed = parse_workbook_content(&content).unwrap();
        assert_eq!(parsed, workbook);
        let sheet = parsed.sheet(0).unwrap();
        assert_eq!(sheet.get(&CellRef::parse("B5").unwrap()).contents, CellType::Empty);
    }
}
