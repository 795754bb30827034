//! Rhai registrations for the spreadsheet builtins.
//!
//! Preprocessed formulas only ever call the functions registered here:
//! `CELL(row, col)`, the `*_RANGE(r1, c1, r2, c2)` family and `ABS(x)`.
//! Every lookup goes through [`resolve_cell_value`], which implements the
//! cell resolution rule (missing → 0, cached result, recursive evaluation,
//! parsed literal).

use crate::engine::{
    CellRef, Dynamic, EngineOptions, Grid, InFlight, dynamic_to_number, expand_range,
    preprocess_formula,
};
use crate::functions::{self, ABS_RHAI_NAME, RANGE_FUNCTIONS, RangeFunction};
use regex::Regex;
use rhai::{Engine, EvalAltResult, NativeCallContext, Position};

use std::sync::OnceLock;

/// Regex that matches built-in range calls like `SUM(A1:B5)`, in any case.
///
/// Captures:
/// - group 1: function name (e.g. `SUM`)
/// - group 2: start address (e.g. `A1`)
/// - group 3: end address (e.g. `B5`)
pub fn range_fn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let names = RANGE_FUNCTIONS
            .iter()
            .map(|b| b.sheet_name)
            .collect::<Vec<_>>()
            .join("|");
        let addr = crate::engine::ADDRESS_PATTERN;
        Regex::new(&format!(
            r"(?i)\b({})\s*\(\s*({})\s*:\s*({})\s*\)",
            names, addr, addr
        ))
        .expect("built-in range regex must compile")
    })
}

fn invalid_arg(message: &str) -> Box<EvalAltResult> {
    EvalAltResult::ErrorRuntime(message.into(), Position::NONE).into()
}

fn to_index(value: i64, label: &str) -> Result<usize, Box<EvalAltResult>> {
    usize::try_from(value).map_err(|_| invalid_arg(&format!("{} must be >= 0", label)))
}

/// Resolve the numeric value of a cell for use inside another formula.
///
/// - no cell at the address → `0`
/// - formula with a cached result → the cached result
/// - formula not evaluated yet → evaluated now (re-entrant reads give `0`)
/// - literal → parsed number, unparsable text → `0`
pub fn resolve_cell_value(
    ctx: &NativeCallContext,
    grid: &Grid,
    in_flight: &InFlight,
    options: &EngineOptions,
    cell_ref: CellRef,
) -> f64 {
    let Some(cell) = grid.get(&cell_ref) else {
        return 0.0;
    };

    if !cell.is_formula() {
        return cell.literal_value(options.thousands_separator);
    }
    if let Some(cached) = cell.cached_result {
        return cached;
    }

    let compiled = cell.compiled.clone();
    let body = cell.formula_body().unwrap_or_default().to_string();
    drop(cell);

    {
        let mut guard = in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !guard.insert(cell_ref) {
            log::debug!("re-entrant read of {} resolved to 0", cell_ref);
            return 0.0;
        }
    }

    let result = match compiled {
        Some(ast) => ctx.engine().eval_ast::<Dynamic>(&ast),
        None => ctx
            .engine()
            .eval_expression::<Dynamic>(&preprocess_formula(&body)),
    };

    in_flight
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .remove(&cell_ref);

    match result.ok().as_ref().and_then(dynamic_to_number) {
        Some(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

fn register_range_fn(
    engine: &mut Engine,
    function: RangeFunction,
    grid: &Grid,
    in_flight: &InFlight,
    options: &EngineOptions,
) {
    let grid = grid.clone();
    let in_flight = in_flight.clone();
    let options = options.clone();
    engine.register_fn(
        function.rhai_name(),
        move |ctx: NativeCallContext,
              r1: i64,
              c1: i64,
              r2: i64,
              c2: i64|
              -> Result<f64, Box<EvalAltResult>> {
            let start = CellRef::new(to_index(r1, "row")?, to_index(c1, "col")?);
            let end = CellRef::new(to_index(r2, "row")?, to_index(c2, "col")?);
            let values: Vec<f64> = expand_range(&start, &end)
                .into_iter()
                .map(|cell_ref| resolve_cell_value(&ctx, &grid, &in_flight, &options, cell_ref))
                .collect();
            Ok(function.apply(&values))
        },
    );
}

/// Register all built-in functions into the Rhai engine.
pub fn register_builtins(
    engine: &mut Engine,
    grid: Grid,
    in_flight: InFlight,
    options: EngineOptions,
) {
    // CELL(row, col): numeric value at cell
    let grid_cell = grid.clone();
    let in_flight_cell = in_flight.clone();
    let options_cell = options.clone();
    engine.register_fn(
        "CELL",
        move |ctx: NativeCallContext, row: i64, col: i64| -> Result<f64, Box<EvalAltResult>> {
            let cell_ref = CellRef::new(to_index(row, "row")?, to_index(col, "col")?);
            Ok(resolve_cell_value(
                &ctx,
                &grid_cell,
                &in_flight_cell,
                &options_cell,
                cell_ref,
            ))
        },
    );

    for builtin in RANGE_FUNCTIONS {
        register_range_fn(engine, builtin.function, &grid, &in_flight, &options);
    }

    // ABS(x): scalar absolute value of an already-resolved sub-expression
    engine.register_fn(ABS_RHAI_NAME, |x: f64| -> f64 { functions::abs(x) });
    engine.register_fn(ABS_RHAI_NAME, |x: i64| -> f64 { functions::abs(x as f64) });

    // Unary signs; the raw engine carries no packages.
    engine.register_fn("-", |x: f64| -> f64 { -x });
    engine.register_fn("+", |x: f64| -> f64 { x });
}
