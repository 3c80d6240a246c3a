//! Placeholder substitution.
//!
//! Template text cells carry `{{key}}` tokens. Binding replaces every token
//! with the model's value for `key`. A cell whose whole text is a single
//! token bound to a number or date becomes a number/date cell, so formulas
//! can use it; anything else stays text with the rendered value spliced in.
//!
//! Binding is strict and transactional: every token of every cell is
//! resolved before the first write, and a missing key aborts with
//! [`ReportError::MissingBinding`] leaving the workbook untouched. A value
//! that would leave a token in the bound text is refused with
//! [`ReportError::TokenInValue`], so a bound workbook never has tokens left.

use regex::Regex;
use reportline_engine::engine::{Cell, CellRef, CellType, Workbook};
use std::ops::Range;
use std::sync::OnceLock;

use crate::error::{ReportError, Result};
use crate::model::{Model, ModelValue};

/// A placeholder occurrence inside a piece of text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub key: &'a str,
    pub span: Range<usize>,
}

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").expect("placeholder regex must compile")
    })
}

/// All placeholder tokens in `text`, left to right.
pub fn tokens(text: &str) -> Vec<Token<'_>> {
    token_re()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let key = caps.get(1)?;
            Some(Token {
                key: key.as_str(),
                span: whole.range(),
            })
        })
        .collect()
}

pub fn contains_token(text: &str) -> bool {
    token_re().is_match(text)
}

/// Bind `model` into every text cell of `workbook` that carries a token.
///
/// Returns the same workbook for chaining. Re-binding an already bound
/// workbook is a no-op since no tokens remain.
pub fn bind<'w>(workbook: &'w mut Workbook, model: &Model) -> Result<&'w mut Workbook> {
    let mut writes: Vec<(usize, CellRef, Cell)> = Vec::new();

    for (index, sheet) in workbook.sheets().iter().enumerate() {
        for (at, cell) in sheet.cells() {
            let CellType::Text(text) = &cell.contents else {
                continue;
            };
            if !contains_token(text) {
                continue;
            }
            let bound = resolve_cell(text, model, |key| ReportError::MissingBinding {
                key: key.to_string(),
                sheet: sheet.name().to_string(),
                address: at,
            })?;
            writes.push((index, at, bound));
        }
    }

    log::debug!("binding {} placeholder cells", writes.len());
    for (index, at, cell) in writes {
        if let Some(sheet) = workbook.sheet_mut(index) {
            sheet.set(&at, cell);
        }
    }

    Ok(workbook)
}

/// Resolve every token of a filename pattern against `model`.
pub fn resolve_pattern(pattern: &str, model: &Model) -> Result<String> {
    let values = lookup_all(pattern, model, |key| ReportError::MissingFilenameBinding {
        key: key.to_string(),
        pattern: pattern.to_string(),
    })?;
    settled(splice(pattern, &values))
}

fn resolve_cell<F>(text: &str, model: &Model, missing: F) -> Result<Cell>
where
    F: Fn(&str) -> ReportError,
{
    let values = lookup_all(text, model, missing)?;

    if let [(token, value)] = values.as_slice()
        && token.span == (0..text.len())
    {
        return Ok(match value {
            ModelValue::Number(n) => Cell::new_number(*n),
            ModelValue::Date(d) => Cell::new_date(*d),
            ModelValue::Text(s) => Cell::new_text(s),
        });
    }

    Ok(Cell::new_text(&settled(splice(text, &values))?))
}

/// Refuse bound text that still reads as a placeholder.
fn settled(bound: String) -> Result<String> {
    let leftover = tokens(&bound).first().map(|token| token.key.to_string());
    match leftover {
        Some(key) => Err(ReportError::TokenInValue { key }),
        None => Ok(bound),
    }
}

/// Look up every token of `text` before anything is substituted.
fn lookup_all<'t, 'm, F>(
    text: &'t str,
    model: &'m Model,
    missing: F,
) -> Result<Vec<(Token<'t>, &'m ModelValue)>>
where
    F: Fn(&str) -> ReportError,
{
    tokens(text)
        .into_iter()
        .map(|token| match model.get(token.key) {
            Some(ModelValue::Text(s)) if contains_token(s) => Err(ReportError::TokenInValue {
                key: token.key.to_string(),
            }),
            Some(value) => Ok((token, value)),
            None => Err(missing(token.key)),
        })
        .collect()
}

fn splice(text: &str, values: &[(Token<'_>, &ModelValue)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (token, value) in values {
        out.push_str(&text[last..token.span.start]);
        out.push_str(&value.render());
        last = token.span.end;
    }
    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use reportline_engine::engine::Sheet;

    fn workbook_with(cells: &[(&str, Cell)]) -> Workbook {
        let mut sheet = Sheet::new("Sheet1");
        for (addr, cell) in cells {
            sheet.set(&CellRef::parse(addr).unwrap(), cell.clone());
        }
        let mut workbook = Workbook::new();
        workbook.push_sheet(sheet);
        workbook
    }

    fn cell_at(workbook: &Workbook, addr: &str) -> Cell {
        workbook.sheet(0).unwrap().get(&CellRef::parse(addr).unwrap())
    }

    #[test]
    fn test_tokens_left_to_right() {
        let found = tokens("{{first}} {{ last }}!");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].key, "first");
        assert_eq!(found[0].span, 0..9);
        assert_eq!(found[1].key, "last");
        assert!(tokens("no tokens {here}").is_empty());
    }

    #[test]
    fn test_single_numeric_token_becomes_number() {
        let mut workbook = workbook_with(&[("B2", Cell::new_text("{{hours}}"))]);
        let model = Model::builder().insert("hours", 37.5).build();
        bind(&mut workbook, &model).unwrap();
        assert_eq!(cell_at(&workbook, "B2"), Cell::new_number(37.5));
    }

    #[test]
    fn test_single_date_token_becomes_date() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let mut workbook = workbook_with(&[("A1", Cell::new_text("{{from}}"))]);
        let model = Model::builder().insert("from", date).build();
        bind(&mut workbook, &model).unwrap();
        assert_eq!(cell_at(&workbook, "A1"), Cell::new_date(date));
    }

    #[test]
    fn test_mixed_text_is_spliced() {
        let mut workbook = workbook_with(&[(
            "A1",
            Cell::new_text("{{last_name}}, {{first_name}}: {{hours}} h"),
        )]);
        let model = Model::builder()
            .insert("first_name", "Jan")
            .insert("last_name", "Kowalski")
            .insert("hours", 37.5)
            .build();
        bind(&mut workbook, &model).unwrap();
        assert_eq!(cell_at(&workbook, "A1"), Cell::new_text("Kowalski, Jan: 37.5 h"));
    }

    #[test]
    fn test_cells_without_tokens_are_untouched() {
        let mut formula = Cell::new_script("SUM(B2:B3)");
        formula.cached_value = Some(reportline_engine::engine::CellValue::Number(1.0));
        let mut workbook = workbook_with(&[
            ("A1", Cell::new_text("Hours")),
            ("B4", formula.clone()),
            ("C1", Cell::new_number(2.0)),
        ]);
        let before = workbook.clone();
        bind(&mut workbook, &Model::default()).unwrap();
        assert_eq!(workbook, before);
        assert_eq!(cell_at(&workbook, "B4"), formula);
    }

    #[test]
    fn test_missing_key_reports_key_and_address() {
        let mut workbook = workbook_with(&[("D7", Cell::new_text("{{deciders}}"))]);
        let err = bind(&mut workbook, &Model::default()).unwrap_err();
        match err {
            ReportError::MissingBinding {
                key,
                sheet,
                address,
            } => {
                assert_eq!(key, "deciders");
                assert_eq!(sheet, "Sheet1");
                assert_eq!(address.to_string(), "D7");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_partially_resolvable_cell_is_not_mutated() {
        let mut workbook = workbook_with(&[
            ("A1", Cell::new_text("{{name}}")),
            ("A2", Cell::new_text("{{name}} / {{deciders}}")),
        ]);
        let before = workbook.clone();
        let model = Model::builder().insert("name", "Jan").build();

        assert!(bind(&mut workbook, &model).is_err());
        assert_eq!(workbook, before);
    }

    #[test]
    fn test_bind_is_idempotent() {
        let mut workbook = workbook_with(&[
            ("A1", Cell::new_text("{{name}}")),
            ("B1", Cell::new_text("{{hours}}")),
            ("C1", Cell::new_text("Total: {{hours}}")),
        ]);
        let model = Model::builder()
            .insert("name", "Jan")
            .insert("hours", 8)
            .build();

        bind(&mut workbook, &model).unwrap();
        let once = workbook.clone();
        bind(&mut workbook, &model).unwrap();
        assert_eq!(workbook, once);
    }

    #[test]
    fn test_value_carrying_a_token_is_refused() {
        let mut workbook = workbook_with(&[
            ("A1", Cell::new_text("{{a}}")),
            ("A2", Cell::new_text("{{b}}")),
        ]);
        let before = workbook.clone();
        let model = Model::builder().insert("a", "{{b}}").insert("b", "x").build();

        match bind(&mut workbook, &model) {
            Err(ReportError::TokenInValue { key }) => assert_eq!(key, "a"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(workbook, before);
    }

    #[test]
    fn test_splice_forming_a_token_is_refused() {
        let mut workbook = workbook_with(&[("A1", Cell::new_text("{{{open}}b}}"))]);
        let model = Model::builder().insert("open", "{").build();
        assert!(matches!(
            bind(&mut workbook, &model),
            Err(ReportError::TokenInValue { key }) if key == "b"
        ));
        assert!(matches!(
            resolve_pattern("{{{open}}b}}.grd", &model),
            Err(ReportError::TokenInValue { .. })
        ));
    }

    #[test]
    fn test_resolve_pattern() {
        let model = Model::builder().insert("month", 3).insert("year", 2024).build();
        assert_eq!(
            resolve_pattern("attendance_list_{{month}}_{{year}}.grd", &model).unwrap(),
            "attendance_list_3_2024.grd"
        );
        assert!(matches!(
            resolve_pattern("{{nope}}.grd", &model),
            Err(ReportError::MissingFilenameBinding { .. })
        ));
    }
}
