//! Rhai engine creation and formula evaluation.
//!
//! Creates the Rhai scripting engine with all spreadsheet built-in functions
//! registered (SUM, AVERAGE, cell accessors, etc.) and maps evaluation results
//! onto spreadsheet-native values. A failing formula never aborts the caller:
//! it resolves to an error literal in that one cell.

use rhai::{Engine, EvalAltResult};

use super::{
    CellRef, CellType, CellValue, Dynamic, EvalStack, Grid, Sheet, ValueCache, detect_cycle,
};
use super::preprocess::preprocess_script;

/// Create a Rhai engine with built-ins registered over `grid`.
pub fn create_engine(grid: Grid, value_cache: ValueCache, stack: EvalStack) -> Engine {
    let mut engine = Engine::new();
    crate::builtins::register_builtins(&mut engine, grid, value_cache, stack);
    engine
}

/// Evaluates formula cells of a single sheet.
///
/// Results are remembered for the lifetime of the evaluator, so formulas that
/// reference an already evaluated cell see the fresh value rather than the
/// template's stale cached result.
pub struct Evaluator {
    engine: Engine,
    grid: Grid,
    value_cache: ValueCache,
    stack: EvalStack,
}

impl Evaluator {
    pub fn new(sheet: &Sheet) -> Evaluator {
        let grid = sheet.grid().clone();
        let value_cache = ValueCache::default();
        let stack = EvalStack::default();
        let engine = create_engine(grid.clone(), value_cache.clone(), stack.clone());
        Evaluator {
            engine,
            grid,
            value_cache,
            stack,
        }
    }

    /// Evaluate the formula at `at`.
    ///
    /// Returns `None` when the cell does not hold a formula.
    pub fn evaluate(&self, at: &CellRef) -> Option<CellValue> {
        let script = match self.grid.get(at) {
            Some(entry) => match &entry.contents {
                CellType::Script(s) => s.clone(),
                _ => return None,
            },
            None => return None,
        };

        if detect_cycle(at, &self.grid).is_some() {
            return Some(self.cycle(at));
        }

        self.stack.take_reentered();
        self.stack.enter(*at);
        let result = self.engine.eval::<Dynamic>(&preprocess_script(&script));
        self.stack.leave(at);
        // a formula reached itself through a range the dependency scan skips
        if self.stack.take_reentered() {
            return Some(self.cycle(at));
        }

        match result {
            Ok(result) => {
                let value = dynamic_to_value(&result);
                self.value_cache.insert(*at, result);
                Some(value)
            }
            Err(err) => {
                log::debug!("formula at {} failed: {}", at, err);
                self.value_cache.insert(*at, Dynamic::from(f64::NAN));
                Some(CellValue::Error(error_literal(&err).to_string()))
            }
        }
    }

    fn cycle(&self, at: &CellRef) -> CellValue {
        self.value_cache.insert(*at, Dynamic::from(f64::NAN));
        CellValue::Error("#CYCLE!".to_string())
    }
}

/// Map a Rhai result onto a cell value.
pub fn dynamic_to_value(value: &Dynamic) -> CellValue {
    if value.is_unit() {
        return CellValue::Blank;
    }
    if let Ok(n) = value.as_float() {
        return number_value(n);
    }
    if let Ok(n) = value.as_int() {
        return CellValue::Number(n as f64);
    }
    if let Ok(b) = value.as_bool() {
        return CellValue::Bool(b);
    }
    if let Ok(s) = value.clone().into_string() {
        return CellValue::Text(s);
    }
    CellValue::Error("#VALUE!".to_string())
}

fn number_value(n: f64) -> CellValue {
    if n.is_nan() {
        CellValue::Error("#VALUE!".to_string())
    } else if n.is_infinite() {
        CellValue::Error("#DIV/0!".to_string())
    } else {
        CellValue::Number(n)
    }
}

fn error_literal(err: &EvalAltResult) -> &'static str {
    match err {
        EvalAltResult::ErrorArithmetic(message, _) if message.contains("zero") => "#DIV/0!",
        EvalAltResult::ErrorArithmetic(..) => "#NUM!",
        _ => "#ERR!",
    }
}
