//! quizgrid_engine - Formula engine + Rhai integration.

pub(crate) mod builtins;
pub mod engine;
pub mod error;
pub mod functions;

pub use error::{FormulaError, FormulaResult};

#[cfg(test)]
mod tests {
    use crate::engine::*;
    use crate::error::FormulaError;
    use dashmap::DashMap;
    use std::sync::Arc;

    fn sample_grid() -> Grid {
        let grid: Grid = Arc::new(DashMap::new());
        grid.insert(CellRef::new(0, 0), Cell::new("1", true, None)); // A1
        grid.insert(CellRef::new(1, 0), Cell::new("2", true, None)); // A2
        grid.insert(CellRef::new(2, 0), Cell::new("3", true, None)); // A3
        grid
    }

    #[test]
    fn test_from_str_single_letter_columns() {
        let a1 = CellRef::from_str("A1").unwrap();
        assert_eq!(a1.row, 0);
        assert_eq!(a1.col, 0);

        let z1 = CellRef::from_str("Z1").unwrap();
        assert_eq!(z1.row, 0);
        assert_eq!(z1.col, 25);
    }

    #[test]
    fn test_from_str_case_insensitive() {
        let lower = CellRef::from_str("b7").unwrap();
        assert_eq!(lower, CellRef::new(6, 1));
    }

    #[test]
    fn test_to_address_text() {
        assert_eq!(to_address_text(0, 0), "A1");
        assert_eq!(to_address_text(98, 25), "Z99");
    }

    #[test]
    fn test_sum_and_average_over_column() {
        let engine = create_engine(sample_grid());
        assert_eq!(evaluate(&engine, "=SUM(A1:A3)").unwrap(), 6.0);
        assert_eq!(evaluate(&engine, "=AVERAGE(A1:A3)").unwrap(), 2.0);
    }

    #[test]
    fn test_abs_of_negative_cell() {
        let grid = sample_grid();
        grid.insert(CellRef::new(0, 0), Cell::new("-5", true, None));
        let engine = create_engine(grid);
        assert_eq!(evaluate(&engine, "=ABS(A1)").unwrap(), 5.0);
        assert_eq!(evaluate(&engine, "=abs(A1 - 5)").unwrap(), 10.0);
    }

    #[test]
    fn test_cached_result_wins_over_reevaluation() {
        let grid = sample_grid();
        let mut cell = Cell::new("=A1+A2", true, None);
        cell.cached_result = Some(42.0);
        grid.insert(CellRef::new(0, 1), cell);
        let engine = create_engine(grid);
        assert_eq!(evaluate(&engine, "=B1").unwrap(), 42.0);
    }

    #[test]
    fn test_compiled_ast_sees_live_values() {
        let grid = sample_grid();
        let engine = create_engine(grid.clone());
        let ast = compile_formula(&engine, "=A1*10").unwrap();
        assert_eq!(evaluate_compiled(&engine, "=A1*10", &ast).unwrap(), 10.0);

        grid.insert(CellRef::new(0, 0), Cell::new("7", true, None));
        assert_eq!(evaluate_compiled(&engine, "=A1*10", &ast).unwrap(), 70.0);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let engine = create_engine(sample_grid());
        let first = evaluate(&engine, "=SUM(A1:A3)*2").unwrap();
        let second = evaluate(&engine, "=SUM(A1:A3)*2").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_range_outside_function_is_invalid() {
        let engine = create_engine(sample_grid());
        assert!(matches!(
            evaluate(&engine, "=A1:A3"),
            Err(FormulaError::Compile { .. }) | Err(FormulaError::Eval { .. })
        ));
    }

    #[test]
    fn test_custom_thousands_separator() {
        let grid: Grid = Arc::new(DashMap::new());
        grid.insert(CellRef::new(0, 0), Cell::new("1.250", true, None));
        let engine = create_engine_with_options(
            grid,
            InFlight::default(),
            EngineOptions {
                thousands_separator: '.',
            },
        );
        assert_eq!(evaluate(&engine, "=A1").unwrap(), 1250.0);
    }
}
