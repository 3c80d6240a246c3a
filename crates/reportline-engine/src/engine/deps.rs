//! Dependency extraction from formula strings.
//!
//! Parses formula text to find all cell references (e.g., `A1`, `B2:C5`)
//! that the formula depends on. Used for cycle detection before a formula
//! is recomputed.
//!
//! Handles:
//! - Simple cell references: `A1`, `@B2`
//! - Range references in aggregate functions: `SUM(A1:B5)`
//! - Ignores references inside string literals

use regex::Regex;
use std::sync::OnceLock;

use super::cell_ref::CellRef;

const MAX_DEPENDENCY_RANGE_CELLS: usize = 1_000_000;

/// Extract all cell references from a script as dependencies.
pub fn extract_dependencies(script: &str) -> Vec<CellRef> {
    let mut deps = Vec::new();

    let script = strip_string_literals(script);

    let range_re = crate::builtins::range_fn_re();

    // Remove range function calls first to avoid double-counting their endpoints
    let script_without_ranges = range_re.replace_all(&script, "").to_string();

    for caps in range_re.captures_iter(&script) {
        if let (Some(start), Some(end)) = (CellRef::from_a1(&caps[2]), CellRef::from_a1(&caps[3]))
        {
            deps.extend(range_cells(start, end));
        }
    }

    for caps in cell_ref_re().captures_iter(&script_without_ranges) {
        let cell_ref = format!("{}{}", &caps[1], &caps[2]);
        if let Some(cr) = CellRef::from_a1(&cell_ref) {
            deps.push(cr);
        }
    }

    deps
}

/// Every cell of the rectangle spanned by `a` and `b`, row-major.
/// Ranges over the size limit contribute nothing.
fn range_cells(a: CellRef, b: CellRef) -> Vec<CellRef> {
    let (min_row, max_row) = (a.row.min(b.row), a.row.max(b.row));
    let (min_col, max_col) = (a.col.min(b.col), a.col.max(b.col));
    let too_large = (max_row - min_row + 1)
        .checked_mul(max_col - min_col + 1)
        .is_none_or(|n| n > MAX_DEPENDENCY_RANGE_CELLS);
    if too_large {
        return Vec::new();
    }
    (min_row..=max_row)
        .flat_map(|row| (min_col..=max_col).map(move |col| CellRef::new(col, row)))
        .collect()
}

pub(crate) fn cell_ref_re() -> &'static Regex {
    static CELL_RE: OnceLock<Regex> = OnceLock::new();
    CELL_RE.get_or_init(|| {
        Regex::new(r"\b([A-Za-z]+)([0-9]+)\b")
            .expect("dependency cell reference regex must compile")
    })
}

fn strip_string_literals(script: &str) -> String {
    let mut out = String::with_capacity(script.len());
    let mut in_string = false;
    let mut escaped = false;

    for ch in script.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(' ');
                continue;
            }
            if ch == '\\' {
                escaped = true;
                out.push(' ');
                continue;
            }
            if ch == '"' {
                in_string = false;
                out.push('"');
            } else {
                out.push(' ');
            }
        } else if ch == '"' {
            in_string = true;
            out.push('"');
        } else {
            out.push(ch);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_dependencies_skips_over_limit_ranges() {
        let deps = extract_dependencies("SUM(A1:A1000001)+B2");
        assert_eq!(deps, vec![CellRef::new(1, 1)]);
    }

    #[test]
    fn test_extract_dependencies_with_ranges() {
        let deps = extract_dependencies("SUM(C2:C4) + D2");
        assert_eq!(
            deps,
            vec![
                CellRef::new(2, 1),
                CellRef::new(2, 2),
                CellRef::new(2, 3),
                CellRef::new(3, 1),
            ]
        );
    }

    #[test]
    fn test_extract_dependencies_ignores_string_literals() {
        let deps = extract_dependencies(r#"IF(A1 > 0, "B2", "C3")"#);
        assert_eq!(deps, vec![CellRef::new(0, 0)]);
    }
}
