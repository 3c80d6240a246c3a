//! reportline_engine - Cell grid, A1 addressing and Rhai formula evaluation.

pub(crate) mod builtins;
pub mod engine;
