//! Fill handle: copying a cell along a row or column with reference adjustment.
//!
//! The drag gesture is a small state machine owned by the sheet. The UI only
//! forwards pointer events (`fill_press`, `fill_move_to`, `fill_release`,
//! `fill_cancel`) and reads back the highlighted run.

use super::Sheet;
use crate::error::{QuizgridError, Result};
use quizgrid_engine::engine::{CellRef, is_formula, offset_formula_references};

/// Direction a fill copies in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillAxis {
    /// Same column, rows below the source.
    Down,
    /// Same row, columns right of the source.
    Right,
}

impl FillAxis {
    /// Axis and 1-based distance from `source` to `target`, if `target` lies
    /// strictly below or strictly right of it.
    pub fn between(source: &CellRef, target: &CellRef) -> Option<(FillAxis, usize)> {
        if target.col == source.col && target.row > source.row {
            Some((FillAxis::Down, target.row - source.row))
        } else if target.row == source.row && target.col > source.col {
            Some((FillAxis::Right, target.col - source.col))
        } else {
            None
        }
    }

    /// `(delta_row, delta_col)` for a destination `k` cells away.
    fn offset(self, k: usize) -> (isize, isize) {
        let k = k as isize;
        match self {
            FillAxis::Down => (k, 0),
            FillAxis::Right => (0, k),
        }
    }
}

/// Fill handle drag state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FillGesture {
    #[default]
    Idle,
    /// Pointer is down on the handle, nothing moved yet.
    Armed { source: CellRef },
    Dragging {
        source: CellRef,
        /// Cell under the pointer, if any
        target: Option<CellRef>,
        /// Destination run for the current target (empty when unaligned)
        highlighted: Vec<CellRef>,
    },
}

/// How a gesture ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillOutcome {
    Committed { source: CellRef, written: usize },
    Cancelled,
}

impl Sheet {
    /// Destination run from `source` towards `target`.
    ///
    /// Only cells strictly right in the same row or strictly below in the same
    /// column qualify; the run is clamped to the grid and skips read-only cells.
    /// Unaligned targets give an empty run.
    pub fn fill_run(&self, source: &CellRef, target: &CellRef) -> Vec<CellRef> {
        if !self.dimensions.contains(source) {
            return Vec::new();
        }
        let Some((axis, _)) = FillAxis::between(source, target) else {
            return Vec::new();
        };

        let cells: Vec<CellRef> = match axis {
            FillAxis::Down => {
                let last = target.row.min(self.dimensions.rows.saturating_sub(1));
                (source.row + 1..=last)
                    .map(|row| CellRef::new(row, source.col))
                    .collect()
            }
            FillAxis::Right => {
                let last = target.col.min(self.dimensions.cols.saturating_sub(1));
                (source.col + 1..=last)
                    .map(|col| CellRef::new(source.row, col))
                    .collect()
            }
        };

        cells
            .into_iter()
            .filter(|cell_ref| self.is_editable(cell_ref.row, cell_ref.col))
            .collect()
    }

    /// Copy `source` into every cell of `run`.
    ///
    /// Formulas have their unlocked references shifted by each destination's
    /// distance from the source; plain values are copied verbatim. Read-only
    /// destinations are skipped. Every destination is evaluated as it is
    /// written, then one recalculation sweep runs. Returns the number of
    /// cells written.
    pub fn copy(&mut self, source: &CellRef, run: &[CellRef]) -> Result<usize> {
        self.check_bounds(source)?;
        let mut placements = Vec::with_capacity(run.len());
        for target in run {
            self.check_bounds(target)?;
            let (axis, distance) = FillAxis::between(source, target).ok_or_else(|| {
                QuizgridError::InvalidFillTarget {
                    source_cell: *source,
                    target: *target,
                }
            })?;
            placements.push((*target, axis.offset(distance)));
        }

        let content = self
            .grid
            .get(source)
            .map(|cell| cell.to_input_string())
            .unwrap_or_default();
        let formula = is_formula(&content);

        let mut written = 0;
        for (target, (delta_row, delta_col)) in placements {
            if !self.is_editable(target.row, target.col) {
                log::debug!("fill {} -> {}: read-only, skipped", source, target);
                continue;
            }
            let text = if formula {
                offset_formula_references(&content, delta_row, delta_col)
            } else {
                content.clone()
            };
            log::debug!("fill {} -> {}: {:?}", source, target, text);
            self.commit_input(&target, &text, true);
            written += 1;
        }

        self.recalculate_all();
        Ok(written)
    }

    /// Pointer down on the fill handle of `source`.
    pub fn fill_press(&mut self, source: CellRef) -> Result<()> {
        self.check_bounds(&source)?;
        self.fill = FillGesture::Armed { source };
        Ok(())
    }

    /// Pointer moved over `target` (`None` when it left the grid).
    ///
    /// Recomputes the highlighted run. Ignored unless a gesture is active.
    pub fn fill_move_to(&mut self, target: Option<CellRef>) {
        let source = match &self.fill {
            FillGesture::Idle => return,
            FillGesture::Armed { source } | FillGesture::Dragging { source, .. } => *source,
        };
        let highlighted = target
            .map(|t| self.fill_run(&source, &t))
            .unwrap_or_default();
        self.fill = FillGesture::Dragging {
            source,
            target,
            highlighted,
        };
    }

    /// Pointer released over `target`.
    ///
    /// Commits a copy when the target yields a non-empty run; otherwise the
    /// gesture is cancelled without touching any cell.
    pub fn fill_release(&mut self, target: Option<CellRef>) -> Result<FillOutcome> {
        let source = match std::mem::take(&mut self.fill) {
            FillGesture::Idle => return Ok(FillOutcome::Cancelled),
            FillGesture::Armed { source } | FillGesture::Dragging { source, .. } => source,
        };
        let run = target
            .map(|t| self.fill_run(&source, &t))
            .unwrap_or_default();
        if run.is_empty() {
            log::debug!("fill from {} cancelled", source);
            return Ok(FillOutcome::Cancelled);
        }

        let written = self.copy(&source, &run)?;
        Ok(FillOutcome::Committed { source, written })
    }

    pub fn fill_cancel(&mut self) {
        self.fill = FillGesture::Idle;
    }

    pub fn fill_state(&self) -> &FillGesture {
        &self.fill
    }

    /// Cells to highlight while dragging.
    pub fn fill_highlight(&self) -> &[CellRef] {
        match &self.fill {
            FillGesture::Dragging { highlighted, .. } => highlighted,
            _ => &[],
        }
    }

    /// Source cell shown as "filling" once the pointer has moved.
    pub fn filling_source(&self) -> Option<CellRef> {
        match &self.fill {
            FillGesture::Dragging { source, .. } => Some(*source),
            _ => None,
        }
    }
}
