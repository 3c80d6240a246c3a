//! Circular dependency detection for formula cells.
//!
//! A formula is only evaluated once no cycle is reachable from it, since
//! on-demand evaluation of referenced formulas would otherwise recurse
//! forever (C39 -> D39 -> C39).
//!
//! [`detect_cycle`] checks the extracted dependencies up front. Those skip
//! very large ranges, so [`EvalStack`] also guards evaluation itself: a
//! formula reached again while it is still being evaluated is not entered.

use dashmap::DashSet;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{CellRef, Grid};

/// Nesting limit for on-demand evaluation of referenced formulas.
pub const MAX_EVAL_DEPTH: usize = 256;

/// Formula cells currently being evaluated.
///
/// Shared between the evaluator and the built-ins that evaluate referenced
/// formulas on demand.
#[derive(Clone, Debug, Default)]
pub struct EvalStack {
    active: Arc<DashSet<CellRef>>,
    reentered: Arc<AtomicBool>,
}

impl EvalStack {
    /// Mark `at` as in progress.
    ///
    /// Returns `false` when `at` is already in progress (the re-entry is
    /// remembered) or the nesting limit is reached.
    pub fn enter(&self, at: CellRef) -> bool {
        if self.active.len() >= MAX_EVAL_DEPTH {
            return false;
        }
        if self.active.insert(at) {
            return true;
        }
        self.reentered.store(true, Ordering::Relaxed);
        false
    }

    pub fn leave(&self, at: &CellRef) {
        self.active.remove(at);
    }

    /// Whether a re-entry happened since the last call, resetting the flag.
    pub fn take_reentered(&self) -> bool {
        self.reentered.swap(false, Ordering::Relaxed)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnPath,
    Done,
}

/// Find a cycle reachable from `start`.
///
/// Returns the path from `start` up to and including the repeated cell, or
/// `None` if every reachable formula terminates.
pub fn detect_cycle(start: &CellRef, grid: &Grid) -> Option<Vec<CellRef>> {
    let mut marks: HashMap<CellRef, Mark> = HashMap::new();
    // (cell, its dependencies, index of the next dependency to visit)
    let mut stack: Vec<(CellRef, Vec<CellRef>, usize)> = Vec::new();

    marks.insert(*start, Mark::OnPath);
    stack.push((*start, depends_on(start, grid), 0));

    while let Some((_, deps, next)) = stack.last_mut() {
        let Some(dep) = deps.get(*next).copied() else {
            if let Some((done, _, _)) = stack.pop() {
                marks.insert(done, Mark::Done);
            }
            continue;
        };
        *next += 1;

        match marks.get(&dep) {
            Some(Mark::OnPath) => {
                let mut path: Vec<CellRef> = stack.iter().map(|(cell, _, _)| *cell).collect();
                path.push(dep);
                return Some(path);
            }
            Some(Mark::Done) => {}
            None => {
                marks.insert(dep, Mark::OnPath);
                stack.push((dep, depends_on(&dep, grid), 0));
            }
        }
    }
    None
}

fn depends_on(at: &CellRef, grid: &Grid) -> Vec<CellRef> {
    grid.get(at)
        .map(|entry| entry.depends_on.clone())
        .unwrap_or_default()
}
