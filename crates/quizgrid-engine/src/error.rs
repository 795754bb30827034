//! Formula failure taxonomy.

use thiserror::Error;

/// Why a formula could not produce a number.
///
/// These never cross the sheet boundary as errors: the sheet turns them into a
/// per-cell diagnostic and a `0` fallback.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("{formula}: incomplete formula")]
    Incomplete { formula: String },

    #[error("{formula}: invalid formula")]
    Invalid { formula: String },

    #[error("{formula}: invalid formula ({message})")]
    Compile { formula: String, message: String },

    #[error("{formula}: invalid formula ({message})")]
    Eval { formula: String, message: String },

    #[error("{formula}: circular reference")]
    Circular { formula: String },
}

impl FormulaError {
    /// Incomplete formulas keep the cell's previous value; every other failure forces `0`.
    pub fn keeps_previous_value(&self) -> bool {
        matches!(self, FormulaError::Incomplete { .. })
    }
}

pub type FormulaResult<T> = std::result::Result<T, FormulaError>;
