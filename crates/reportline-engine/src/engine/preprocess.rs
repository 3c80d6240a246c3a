//! Formula preprocessing.
//!
//! Before formulas can be evaluated by Rhai, cell references like `A1` must
//! be transformed into function calls like `CELL(0, 0)`:
//!
//! - `A1` → `CELL(0, 0)` and `@A1` → `VALUE(0, 0)` (col/row order)
//! - `SUM(A1:B5)` → `SUM_RANGE(0, 0, 1, 4)`
//!
//! References inside string literals are left alone.

use regex::Regex;
use std::sync::OnceLock;

use super::cell_ref::CellRef;
use super::deps::cell_ref_re;

fn value_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"@([A-Za-z]+)([0-9]+)\b").expect("typed reference regex must compile")
    })
}

/// Replace cell references like "A1" with Rhai function calls like "CELL(0, 0)".
/// Typed refs like "@A1" become "VALUE(0, 0)" (returns Dynamic).
/// Range functions like SUM(A1:B5) become SUM_RANGE(0, 0, 1, 4).
pub fn preprocess_script(script: &str) -> String {
    let with_ranges = crate::builtins::range_fn_re()
        .replace_all(script, |caps: &regex::Captures| {
            let Some(rhai_name) = crate::builtins::range_rhai_name(&caps[1]) else {
                return caps[0].to_string();
            };
            let rest_args = caps.get(4).map(|m| m.as_str()).unwrap_or("");

            match (CellRef::from_a1(&caps[2]), CellRef::from_a1(&caps[3])) {
                (Some(start), Some(end)) => format!(
                    "{}({}, {}, {}, {}{})",
                    rhai_name, start.col, start.row, end.col, end.row, rest_args
                ),
                _ => caps[0].to_string(),
            }
        })
        .to_string();

    replace_cell_refs_outside_strings(&with_ranges)
}

fn replace_cell_refs_outside_strings(script: &str) -> String {
    let replace_cells = |seg: &str| {
        let seg = value_ref_re()
            .replace_all(seg, |caps: &regex::Captures| {
                let cell_ref = format!("{}{}", &caps[1], &caps[2]);
                match CellRef::from_a1(&cell_ref) {
                    Some(cr) => format!("VALUE({}, {})", cr.col, cr.row),
                    None => caps[0].to_string(),
                }
            })
            .to_string();

        cell_ref_re()
            .replace_all(&seg, |caps: &regex::Captures| {
                let cell_ref = format!("{}{}", &caps[1], &caps[2]);
                match CellRef::from_a1(&cell_ref) {
                    Some(cr) => format!("CELL({}, {})", cr.col, cr.row),
                    None => caps[0].to_string(),
                }
            })
            .to_string()
    };

    let bytes = script.as_bytes();
    let mut out = String::new();
    let mut seg_start = 0;
    let mut in_string = false;
    let mut backslashes = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if b == b'\\' {
                backslashes += 1;
                i += 1;
                continue;
            }
            if b == b'"' && backslashes.is_multiple_of(2) {
                out.push_str(&script[seg_start..=i]);
                in_string = false;
                seg_start = i + 1;
            }
            backslashes = 0;
            i += 1;
            continue;
        }

        if b == b'"' {
            out.push_str(&replace_cells(&script[seg_start..i]));
            in_string = true;
            seg_start = i;
            backslashes = 0;
            i += 1;
            continue;
        }

        i += 1;
    }

    if seg_start < script.len() {
        if in_string {
            out.push_str(&script[seg_start..]);
        } else {
            out.push_str(&replace_cells(&script[seg_start..]));
        }
    }

    out
}
