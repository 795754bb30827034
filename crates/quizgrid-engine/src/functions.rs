//! Built-in spreadsheet functions and their metadata.
//!
//! Conventions:
//! - Spreadsheet-facing names are matched case-insensitively (`sum` == `SUM`).
//! - Range functions rewrite to ALLCAPS Rhai names (e.g. `SUM_RANGE`).
//! - If you add a new range function, add a `RangeFunction` variant and a
//!   `RANGE_FUNCTIONS` entry; `register_builtins` walks the table.

/// A function that takes a cell range as its only argument.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RangeFunction {
    Sum,
    Average,
    Min,
    Max,
}

pub struct RangeBuiltin {
    pub function: RangeFunction,
    pub sheet_name: &'static str,
    /// One-line summary shown in usage output.
    pub description: &'static str,
}

pub const RANGE_FUNCTIONS: &[RangeBuiltin] = &[
    RangeBuiltin {
        function: RangeFunction::Sum,
        sheet_name: "SUM",
        description: "Sum of numeric values in a cell range",
    },
    RangeBuiltin {
        function: RangeFunction::Average,
        sheet_name: "AVERAGE",
        description: "Average of numeric values in a cell range",
    },
    RangeBuiltin {
        function: RangeFunction::Min,
        sheet_name: "MIN",
        description: "Minimum numeric value in a cell range",
    },
    RangeBuiltin {
        function: RangeFunction::Max,
        sheet_name: "MAX",
        description: "Maximum numeric value in a cell range",
    },
];

/// Name of the scalar absolute-value builtin inside Rhai.
pub const ABS_RHAI_NAME: &str = "ABS";

impl RangeFunction {
    /// Look up a range function by its spreadsheet name, ignoring case.
    pub fn from_name(name: &str) -> Option<RangeFunction> {
        RANGE_FUNCTIONS
            .iter()
            .find(|b| b.sheet_name.eq_ignore_ascii_case(name))
            .map(|b| b.function)
    }

    pub fn rhai_name(self) -> &'static str {
        match self {
            RangeFunction::Sum => "SUM_RANGE",
            RangeFunction::Average => "AVERAGE_RANGE",
            RangeFunction::Min => "MIN_RANGE",
            RangeFunction::Max => "MAX_RANGE",
        }
    }

    pub fn apply(self, values: &[f64]) -> f64 {
        match self {
            RangeFunction::Sum => sum(values),
            RangeFunction::Average => average(values),
            RangeFunction::Min => min(values),
            RangeFunction::Max => max(values),
        }
    }
}

pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Arithmetic mean. Empty input yields NaN, which callers report as an invalid formula.
pub fn average(values: &[f64]) -> f64 {
    sum(values) / values.len() as f64
}

pub fn min(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

pub fn max(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

pub fn abs(value: f64) -> f64 {
    value.abs()
}
