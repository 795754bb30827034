//! Formula engine API.
//!
//! This module provides the core computation engine for the grid:
//!
//! - [`Cell`], [`Grid`], [`InFlight`] - Data structures for cell storage
//! - [`CellRef`], [`parse_address`], [`parse_range`], [`expand_range`] - Reference grammar
//! - [`detect_cycle`] - Circular dependency detection
//! - [`extract_dependencies`] - Parse formula dependencies
//! - [`preprocess_formula`] - Transform formulas for Rhai evaluation
//! - [`offset_formula_references`] - Shift relative references for fill/copy
//! - [`create_engine`], [`compile_formula`], [`evaluate`] - Evaluation
//! - [`format_number`] - Format values for display

mod cell;
mod cell_ref;
mod cycle;
mod deps;
mod eval;
mod format;
mod preprocess;

pub use cell::{Cell, FORMULA_MARKER, Grid, InFlight, is_formula, parse_literal};
pub(crate) use cell_ref::ADDRESS_PATTERN;
pub use cell_ref::{
    CellAddress, CellRef, RangeRef, expand_range, parse_address, parse_range, to_address_text,
};
pub use cycle::detect_cycle;
pub use deps::{extract_dependencies, range_corners};
pub use eval::{
    EngineOptions, compile_formula, create_engine, create_engine_with_options, evaluate,
    evaluate_compiled,
};
pub use format::{dynamic_to_number, format_number};
pub use preprocess::{
    REF_ERROR, is_incomplete, normalize_symbols, offset_formula_references, preprocess_formula,
};

pub use rhai::{AST, Dynamic};
