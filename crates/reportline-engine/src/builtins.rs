//! Built-in spreadsheet functions (Rust) and their metadata.
//!
//! Conventions:
//! - Spreadsheet-facing built-in names are ALL CAPS (e.g. `SUM`, `AVERAGE`).
//! - Range built-ins rewrite to ALLCAPS Rhai function names (e.g. `SUM_RANGE`).
//! - If you add a new built-in range function, update `RANGE_BUILTINS` and
//!   register its implementation in `register_builtins`.

use crate::engine::{
    CellRef, CellType, EvalStack, Grid, ValueCache, date_to_serial, preprocess_script,
};
use regex::Regex;
use rhai::{Dynamic, Engine, NativeCallContext};

use std::sync::OnceLock;

/// Spreadsheet range function name and the Rhai function it rewrites to.
pub const RANGE_BUILTINS: &[(&str, &str)] = &[
    ("SUM", "SUM_RANGE"),
    ("AVERAGE", "AVG_RANGE"),
    ("AVG", "AVG_RANGE"),
    ("COUNTA", "COUNTA_RANGE"),
    ("COUNT", "COUNT_RANGE"),
    ("MIN", "MIN_RANGE"),
    ("MAX", "MAX_RANGE"),
];

/// Regex that matches built-in range calls like `SUM(A1:B5)`.
///
/// Captures:
/// - group 1: function name (e.g. `SUM`)
/// - group 2: start cell ref (e.g. `A1`)
/// - group 3: end cell ref (e.g. `B5`)
pub fn range_fn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let names = RANGE_BUILTINS
            .iter()
            .map(|(sheet_name, _)| *sheet_name)
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(
            r"\b({})\(([A-Za-z]+[0-9]+):([A-Za-z]+[0-9]+)(\s*,[^)]*)?\)",
            names
        ))
        .expect("built-in range regex must compile")
    })
}

pub fn range_rhai_name(sheet_name: &str) -> Option<&'static str> {
    RANGE_BUILTINS
        .iter()
        .find(|(name, _)| *name == sheet_name)
        .map(|(_, rhai_name)| *rhai_name)
}

/// Evaluate the formula at `at` on demand and remember its value.
///
/// Returns `None` when `at` is already being evaluated (a cycle), when the
/// nesting limit is reached, or when the formula fails.
fn eval_formula_cell(
    ctx: &NativeCallContext,
    value_cache: &ValueCache,
    stack: &EvalStack,
    at: CellRef,
    script: &str,
) -> Option<Dynamic> {
    if !stack.enter(at) {
        return None;
    }
    let result = ctx
        .engine()
        .eval::<Dynamic>(&preprocess_script(script))
        .ok();
    stack.leave(&at);
    if let Some(value) = &result {
        value_cache.insert(at, value.clone());
    }
    result
}

fn dynamic_number(value: &Dynamic) -> Option<f64> {
    if let Ok(n) = value.as_float() {
        return Some(n);
    }
    if let Ok(n) = value.as_int() {
        return Some(n as f64);
    }
    None
}

/// Numeric value of a cell for aggregates; `None` for text, blanks and
/// formulas that cannot be evaluated, which aggregates skip.
fn cell_number(
    ctx: &NativeCallContext,
    grid: &Grid,
    value_cache: &ValueCache,
    stack: &EvalStack,
    col: usize,
    row: usize,
) -> Option<f64> {
    let cell_ref = CellRef::new(col, row);

    if let Some(cached_val) = value_cache.get(&cell_ref) {
        return dynamic_number(&cached_val);
    }

    let cell = grid.get(&cell_ref)?;
    match &cell.contents {
        CellType::Number(n) => Some(*n),
        CellType::Date(d) => Some(date_to_serial(*d)),
        CellType::Script(s) => {
            let script = s.clone();
            drop(cell);
            eval_formula_cell(ctx, value_cache, stack, cell_ref, &script)
                .and_then(|value| dynamic_number(&value))
        }
        CellType::Empty | CellType::Text(_) => None,
    }
}

fn range_bounds(c1: i64, r1: i64, c2: i64, r2: i64) -> (usize, usize, usize, usize) {
    let clamp = |v: i64| v.max(0) as usize;
    (
        clamp(c1.min(c2)),
        clamp(r1.min(r2)),
        clamp(c1.max(c2)),
        clamp(r1.max(r2)),
    )
}

/// Collect the numeric values of a range, skipping text and blanks.
fn range_numbers(
    ctx: &NativeCallContext,
    grid: &Grid,
    value_cache: &ValueCache,
    stack: &EvalStack,
    bounds: (i64, i64, i64, i64),
) -> Vec<f64> {
    let (min_col, min_row, max_col, max_row) = range_bounds(bounds.0, bounds.1, bounds.2, bounds.3);
    let mut values = Vec::new();
    for row in min_row..=max_row {
        for col in min_col..=max_col {
            if let Some(n) = cell_number(ctx, grid, value_cache, stack, col, row) {
                values.push(n);
            }
        }
    }
    values
}

fn register_aggregate(
    engine: &mut Engine,
    name: &str,
    grid: &Grid,
    value_cache: &ValueCache,
    stack: &EvalStack,
    fold: fn(&[f64]) -> f64,
) {
    let grid = grid.clone();
    let value_cache = value_cache.clone();
    let stack = stack.clone();
    engine.register_fn(
        name,
        move |ctx: NativeCallContext, c1: i64, r1: i64, c2: i64, r2: i64| -> f64 {
            fold(&range_numbers(&ctx, &grid, &value_cache, &stack, (c1, r1, c2, r2)))
        },
    );
}

/// Register all built-in functions into the Rhai engine.
pub fn register_builtins(
    engine: &mut Engine,
    grid: Grid,
    value_cache: ValueCache,
    stack: EvalStack,
) {
    // CELL(col, row): numeric value at cell (text -> NaN, blank -> 0)
    // Checks value cache first for values computed in the current pass.
    let grid_cell = grid.clone();
    let cache_cell = value_cache.clone();
    let stack_cell = stack.clone();
    engine.register_fn(
        "CELL",
        move |ctx: NativeCallContext, col: i64, row: i64| -> f64 {
            if col < 0 || row < 0 {
                return f64::NAN;
            }
            let cell_ref = CellRef::new(col as usize, row as usize);

            if let Some(cached_val) = cache_cell.get(&cell_ref) {
                return dynamic_number(&cached_val).unwrap_or(f64::NAN);
            }

            let Some(entry) = grid_cell.get(&cell_ref) else {
                return 0.0;
            };
            match &entry.contents {
                CellType::Number(n) => *n,
                CellType::Date(d) => date_to_serial(*d),
                CellType::Empty => 0.0,
                CellType::Text(_) => f64::NAN,
                CellType::Script(s) => {
                    let script = s.clone();
                    drop(entry);
                    eval_formula_cell(&ctx, &cache_cell, &stack_cell, cell_ref, &script)
                        .and_then(|value| dynamic_number(&value))
                        .unwrap_or(f64::NAN)
                }
            }
        },
    );

    // VALUE(col, row): typed value at cell (number/text/bool) as Dynamic.
    // Empty cells => "" so string functions behave intuitively.
    let grid_value = grid.clone();
    let cache_value = value_cache.clone();
    let stack_value = stack.clone();
    engine.register_fn(
        "VALUE",
        move |ctx: NativeCallContext, col: i64, row: i64| -> Dynamic {
            if col < 0 || row < 0 {
                return Dynamic::UNIT;
            }
            let cell_ref = CellRef::new(col as usize, row as usize);

            if let Some(cached_val) = cache_value.get(&cell_ref) {
                return cached_val.clone();
            }

            let Some(entry) = grid_value.get(&cell_ref) else {
                return Dynamic::from("".to_string());
            };

            match &entry.contents {
                CellType::Empty => Dynamic::from("".to_string()),
                CellType::Number(n) => Dynamic::from(*n),
                CellType::Date(d) => Dynamic::from(date_to_serial(*d)),
                CellType::Text(s) => Dynamic::from(s.clone()),
                CellType::Script(s) => {
                    let script = s.clone();
                    drop(entry);
                    eval_formula_cell(&ctx, &cache_value, &stack_value, cell_ref, &script)
                        .unwrap_or(Dynamic::UNIT)
                }
            }
        },
    );

    // Numeric aggregates over RANGE(c1, r1, c2, r2); text and blanks are skipped.
    register_aggregate(engine, "SUM_RANGE", &grid, &value_cache, &stack, |values| {
        values.iter().sum()
    });
    // no numbers -> NaN (#VALUE!)
    register_aggregate(engine, "AVG_RANGE", &grid, &value_cache, &stack, |values| {
        if values.is_empty() {
            f64::NAN
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    });
    register_aggregate(engine, "COUNT_RANGE", &grid, &value_cache, &stack, |values| {
        values.iter().filter(|n| n.is_finite()).count() as f64
    });
    // no numbers -> 0
    register_aggregate(engine, "MIN_RANGE", &grid, &value_cache, &stack, |values| {
        values.iter().copied().reduce(f64::min).unwrap_or(0.0)
    });
    register_aggregate(engine, "MAX_RANGE", &grid, &value_cache, &stack, |values| {
        values.iter().copied().reduce(f64::max).unwrap_or(0.0)
    });

    // COUNTA_RANGE(c1, r1, c2, r2): count non-empty cells
    let grid_counta = grid.clone();
    let cache_counta = value_cache.clone();
    engine.register_fn(
        "COUNTA_RANGE",
        move |c1: i64, r1: i64, c2: i64, r2: i64| -> f64 {
            let (min_col, min_row, max_col, max_row) = range_bounds(c1, r1, c2, r2);
            let mut count = 0;
            for row in min_row..=max_row {
                for col in min_col..=max_col {
                    let cell_ref = CellRef::new(col, row);
                    if cache_counta.contains_key(&cell_ref) {
                        count += 1;
                        continue;
                    }
                    if let Some(cell) = grid_counta.get(&cell_ref)
                        && !matches!(cell.contents, CellType::Empty)
                    {
                        count += 1;
                    }
                }
            }
            count as f64
        },
    );

    // POW(base, exp): Rhai has no float pow operator for mixed types,
    // so register every int/float combination.
    engine.register_fn("POW", |base: f64, exp: f64| -> f64 { base.powf(exp) });
    engine.register_fn("POW", |base: f64, exp: i64| -> f64 {
        base.powf(exp as f64)
    });
    engine.register_fn("POW", |base: i64, exp: f64| -> f64 {
        (base as f64).powf(exp)
    });
    engine.register_fn("POW", |base: i64, exp: i64| -> f64 {
        (base as f64).powf(exp as f64)
    });

    engine.register_fn("SQRT", |x: f64| -> f64 { x.sqrt() });
    engine.register_fn("SQRT", |x: i64| -> f64 { (x as f64).sqrt() });

    engine.register_fn("ABS", |x: f64| -> f64 { x.abs() });
    engine.register_fn("ABS", |x: i64| -> f64 { (x as f64).abs() });

    // ROUND(x, digits): half away from zero
    engine.register_fn("ROUND", |x: f64, digits: i64| -> f64 { round_to(x, digits) });
    engine.register_fn("ROUND", |x: i64, digits: i64| -> f64 {
        round_to(x as f64, digits)
    });

    // IF(condition, then, else)
    engine.register_fn("IF", |cond: bool, then: Dynamic, otherwise: Dynamic| -> Dynamic {
        if cond { then } else { otherwise }
    });
}

fn round_to(x: f64, digits: i64) -> f64 {
    let factor = 10f64.powi(digits.clamp(-15, 15) as i32);
    (x * factor).round() / factor
}
