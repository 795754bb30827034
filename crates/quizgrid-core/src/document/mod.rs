//! Sheet state and logic (UI-agnostic).

mod eval;
mod fill;
mod ops;
mod state;

pub use fill::{FillAxis, FillGesture, FillOutcome};
pub use state::{ChangeListener, Dimensions, InitialCell, Sheet};
