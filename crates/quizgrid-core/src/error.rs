//! Error types for the quizgrid sheet.
//!
//! Formula failures are not errors at this level: they become per-cell
//! diagnostics. These variants cover misuse of the sheet API and problems
//! reading fixtures or configuration.

use thiserror::Error;

use quizgrid_engine::engine::CellRef;

/// Errors that can occur when driving a sheet
#[derive(Error, Debug)]
pub enum QuizgridError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Cell {cell} is outside the {rows}x{cols} grid")]
    OutOfBounds { cell: CellRef, rows: usize, cols: usize },

    #[error("Cell {0} is read-only")]
    ReadOnly(CellRef),

    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    #[error("Grid is {rows}x{cols} but {found} initial cells were given")]
    DimensionMismatch {
        rows: usize,
        cols: usize,
        found: usize,
    },

    #[error("Cannot fill from {source_cell} to {target}: target must be right of or below the source")]
    InvalidFillTarget { source_cell: CellRef, target: CellRef },
}

pub type Result<T> = std::result::Result<T, QuizgridError>;
