//! Rhai engine creation and formula evaluation.
//!
//! Creates a raw Rhai engine (no standard packages) with only the spreadsheet
//! builtins registered, compiles preprocessed formulas into expression ASTs,
//! and evaluates those ASTs against live cell values.

use rhai::Engine;

use super::preprocess::{is_incomplete, preprocess_formula};
use super::{AST, Dynamic, Grid, InFlight, dynamic_to_number};
use crate::error::{FormulaError, FormulaResult};

/// Nesting allowed in a formula. Every address becomes a `CELL(r, c)` call,
/// so long `A1+A2+...` chains nest deeper than Rhai's defaults permit.
const MAX_EXPR_DEPTH: usize = 512;

/// Knobs that change how builtins read cells.
#[derive(Clone, Debug)]
pub struct EngineOptions {
    /// Stripped from literal cell text before parsing it as a number.
    pub thousands_separator: char,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            thousands_separator: ',',
        }
    }
}

/// Create a Rhai engine with built-ins registered over `grid`.
pub fn create_engine(grid: Grid) -> Engine {
    create_engine_with_options(grid, InFlight::default(), EngineOptions::default())
}

/// Create a Rhai engine with built-ins, a shared in-flight set and options.
pub fn create_engine_with_options(grid: Grid, in_flight: InFlight, options: EngineOptions) -> Engine {
    let mut engine = Engine::new_raw();
    engine.set_max_expr_depths(MAX_EXPR_DEPTH, MAX_EXPR_DEPTH);
    crate::builtins::register_builtins(&mut engine, grid, in_flight, options);
    engine
}

/// Compile a formula (`=...`) into an expression AST.
///
/// Incomplete formulas are rejected before any parsing is attempted.
pub fn compile_formula(engine: &Engine, formula: &str) -> FormulaResult<AST> {
    let trimmed = formula.trim();
    if is_incomplete(trimmed) {
        return Err(FormulaError::Incomplete {
            formula: trimmed.to_string(),
        });
    }

    let body = trimmed.strip_prefix('=').unwrap_or(trimmed);
    let processed = preprocess_formula(body);
    engine
        .compile_expression(&processed)
        .map_err(|e| FormulaError::Compile {
            formula: trimmed.to_string(),
            message: e.to_string(),
        })
}

/// Evaluate a compiled formula. Non-numeric, NaN or infinite results are invalid.
pub fn evaluate_compiled(engine: &Engine, formula: &str, ast: &AST) -> FormulaResult<f64> {
    let value = engine
        .eval_ast::<Dynamic>(ast)
        .map_err(|e| FormulaError::Eval {
            formula: formula.trim().to_string(),
            message: e.to_string(),
        })?;

    match dynamic_to_number(&value) {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(FormulaError::Invalid {
            formula: formula.trim().to_string(),
        }),
    }
}

/// Compile and evaluate a formula in one step.
pub fn evaluate(engine: &Engine, formula: &str) -> FormulaResult<f64> {
    let ast = compile_formula(engine, formula)?;
    evaluate_compiled(engine, formula, &ast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Cell, CellRef};
    use dashmap::DashMap;
    use std::sync::Arc;

    fn grid_with(cells: &[(usize, usize, &str)]) -> Grid {
        let grid: Grid = Arc::new(DashMap::new());
        for (row, col, raw) in cells {
            grid.insert(CellRef::new(*row, *col), Cell::new(raw, true, None));
        }
        grid
    }

    #[test]
    fn test_arithmetic_uses_float_semantics() {
        let engine = create_engine(grid_with(&[]));
        assert_eq!(evaluate(&engine, "=1+2*3").unwrap(), 7.0);
        assert_eq!(evaluate(&engine, "=7/2").unwrap(), 3.5);
        assert_eq!(evaluate(&engine, "=-(2+3)").unwrap(), -5.0);
        assert_eq!(evaluate(&engine, "=6×2÷4").unwrap(), 3.0);
    }

    #[test]
    fn test_incomplete_is_rejected_before_compiling() {
        let engine = create_engine(grid_with(&[]));
        assert!(matches!(
            compile_formula(&engine, "=1+"),
            Err(FormulaError::Incomplete { .. })
        ));
    }

    #[test]
    fn test_division_by_zero_is_invalid() {
        let engine = create_engine(grid_with(&[]));
        assert!(matches!(
            evaluate(&engine, "=1/0"),
            Err(FormulaError::Invalid { .. }) | Err(FormulaError::Eval { .. })
        ));
        assert!(matches!(
            evaluate(&engine, "=AVERAGE(A1:A1)-1/0"),
            Err(FormulaError::Invalid { .. }) | Err(FormulaError::Eval { .. })
        ));
    }

    #[test]
    fn test_unknown_function_fails() {
        let engine = create_engine(grid_with(&[]));
        assert!(matches!(
            evaluate(&engine, "=FOO(1)"),
            Err(FormulaError::Eval { .. })
        ));
    }

    #[test]
    fn test_malformed_expression_fails_to_compile() {
        let engine = create_engine(grid_with(&[]));
        assert!(matches!(
            evaluate(&engine, "=1+*2"),
            Err(FormulaError::Compile { .. })
        ));
    }

    #[test]
    fn test_references_and_ranges() {
        let grid = grid_with(&[(0, 0, "1"), (1, 0, "2"), (2, 0, "3"), (0, 1, "-5")]);
        let engine = create_engine(grid);
        assert_eq!(evaluate(&engine, "=SUM(A1:A3)").unwrap(), 6.0);
        assert_eq!(evaluate(&engine, "=average(A1:A3)").unwrap(), 2.0);
        assert_eq!(evaluate(&engine, "=MIN(A1:A3)+MAX(A1:A3)").unwrap(), 4.0);
        assert_eq!(evaluate(&engine, "=ABS(B1)").unwrap(), 5.0);
        assert_eq!(evaluate(&engine, "=$A$2*A3").unwrap(), 6.0);
    }

    #[test]
    fn test_missing_and_text_cells_resolve_to_zero() {
        let grid = grid_with(&[(0, 0, "hello"), (1, 0, "1,500")]);
        let engine = create_engine(grid);
        assert_eq!(evaluate(&engine, "=A1+Z50").unwrap(), 0.0);
        assert_eq!(evaluate(&engine, "=A2").unwrap(), 1500.0);
    }

    #[test]
    fn test_unevaluated_formula_cells_resolve_recursively() {
        let grid = grid_with(&[(0, 0, "4"), (0, 1, "=A1*2")]);
        let engine = create_engine(grid);
        assert_eq!(evaluate(&engine, "=B1+1").unwrap(), 9.0);
    }

    #[test]
    fn test_long_chains_and_deep_nesting_evaluate() {
        let cells: Vec<(usize, usize, &str)> = (0..100).map(|row| (row, 0, "1")).collect();
        let engine = create_engine(grid_with(&cells));

        let chain: Vec<String> = (1..=100).map(|row| format!("A{}", row)).collect();
        assert_eq!(evaluate(&engine, &format!("={}", chain.join("+"))).unwrap(), 100.0);

        let nested = format!("={}A1+1{}", "(".repeat(60), ")".repeat(60));
        assert_eq!(evaluate(&engine, &nested).unwrap(), 2.0);
    }

    #[test]
    fn test_self_reference_resolves_to_zero_instead_of_recursing() {
        let grid = grid_with(&[(0, 0, "=A1+1")]);
        let engine = create_engine(grid);
        assert_eq!(evaluate(&engine, "=A1").unwrap(), 1.0);
    }
}
