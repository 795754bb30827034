//! Cell data structures for the formula grid.
//!
//! This module provides the core data types for representing cells:
//! - [`Cell`] - Raw input, compiled formula, cached result and status flags
//! - [`Grid`] - Shared sparse storage for cells (backed by `DashMap`)
//! - [`InFlight`] - Cells currently being resolved, used to break re-entrant reads

use dashmap::DashMap;
use rhai::AST;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use super::cell_ref::CellRef;
use super::format::format_number;

/// Marker that starts a formula.
pub const FORMULA_MARKER: char = '=';

/// A cell in the grid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cell {
    /// Exactly what the user typed.
    pub raw_input: String,
    /// Full `=...` text, present iff `raw_input` is a formula.
    pub formula: Option<String>,
    /// Compiled expression for `formula` (not serialized).
    #[serde(skip)]
    pub compiled: Option<AST>,
    /// Last evaluated result of the formula.
    pub cached_result: Option<f64>,
    pub editable: bool,
    /// Opaque quiz metadata; never read by the engine.
    pub expected_answer: Option<f64>,
    /// Human-readable failure annotation.
    pub diagnostic: Option<String>,
    /// Cells referenced by the formula, ranges expanded.
    pub depends_on: Vec<CellRef>,
    /// Text shown for the cell.
    pub display: String,
}

impl Cell {
    pub fn new(raw_input: &str, editable: bool, expected_answer: Option<f64>) -> Cell {
        let mut cell = Cell {
            raw_input: String::new(),
            formula: None,
            compiled: None,
            cached_result: None,
            editable,
            expected_answer,
            diagnostic: None,
            depends_on: Vec::new(),
            display: String::new(),
        };
        cell.set_input(raw_input);
        cell
    }

    pub fn new_empty(editable: bool) -> Cell {
        Cell::new("", editable, None)
    }

    /// Replace the raw input, dropping any formula state derived from the old input.
    ///
    /// Dependencies and the compiled expression are filled in by the sheet at commit.
    pub fn set_input(&mut self, raw_input: &str) {
        self.raw_input = raw_input.to_string();
        self.formula = is_formula(raw_input).then(|| raw_input.trim().to_string());
        self.compiled = None;
        self.cached_result = None;
        self.diagnostic = None;
        self.depends_on.clear();
        self.display = if self.formula.is_some() {
            String::new()
        } else {
            raw_input.to_string()
        };
    }

    /// Reset to an empty editable state.
    pub fn clear(&mut self) {
        self.set_input("");
    }

    pub fn is_formula(&self) -> bool {
        self.formula.is_some()
    }

    /// Formula body without the leading marker.
    pub fn formula_body(&self) -> Option<&str> {
        self.formula
            .as_deref()
            .and_then(|f| f.strip_prefix(FORMULA_MARKER))
    }

    /// Numeric value of a non-formula cell.
    pub fn literal_value(&self, thousands_separator: char) -> f64 {
        parse_literal(&self.raw_input, thousands_separator)
    }

    /// Effective value: cached formula result, or parsed literal.
    pub fn value(&self, thousands_separator: char) -> f64 {
        if self.is_formula() {
            self.cached_result.unwrap_or(0.0)
        } else {
            self.literal_value(thousands_separator)
        }
    }

    /// Record a successful evaluation.
    pub fn store_result(&mut self, value: f64, update_display: bool) {
        self.cached_result = Some(value);
        self.diagnostic = None;
        if update_display {
            self.display = format_number(value);
        }
    }

    /// Record a failed evaluation: value falls back to `0`, formula is kept.
    pub fn store_failure(&mut self, diagnostic: String, update_display: bool) {
        self.cached_result = Some(0.0);
        self.diagnostic = Some(diagnostic);
        if update_display {
            self.display = format_number(0.0);
        }
    }

    /// Get the text shown when the cell is focused for editing.
    pub fn to_input_string(&self) -> String {
        match &self.formula {
            Some(f) => f.clone(),
            None => self.raw_input.clone(),
        }
    }
}

/// Whether raw input is a formula (trimmed text starts with `=`).
pub fn is_formula(raw_input: &str) -> bool {
    raw_input.trim_start().starts_with(FORMULA_MARKER)
}

/// Parse literal text as a number after stripping whitespace and thousands separators.
/// Unparsable or non-finite text resolves to `0`.
pub fn parse_literal(raw: &str, thousands_separator: char) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != thousands_separator)
        .collect();
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

/// Shared sparse grid storage.
pub type Grid = Arc<DashMap<CellRef, Cell>>;

/// Cells whose formulas are being evaluated right now.
/// Builtins consult this so a re-entrant read resolves to `0` instead of recursing forever.
pub type InFlight = Arc<Mutex<HashSet<CellRef>>>;
