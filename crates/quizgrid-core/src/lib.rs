//! quizgrid-core - UI-agnostic sheet model, fill handle and fixtures.

pub mod config;
pub mod document;
pub mod error;
pub mod storage;

pub use config::SheetConfig;
pub use document::{Dimensions, FillGesture, FillOutcome, InitialCell, Sheet};
pub use error::{QuizgridError, Result};

pub use quizgrid_engine::engine::CellRef;
