use super::Sheet;
use crate::error::{QuizgridError, Result};
use quizgrid_engine::engine::{Cell, CellRef, format_number, is_formula, is_incomplete};

impl Sheet {
    /// Effective numeric value: cached formula result, or the parsed literal.
    /// Missing cells read as `0`.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.grid
            .get(&CellRef::new(row, col))
            .map(|cell| Cell::value(&cell, self.config.thousands_separator))
            .unwrap_or(0.0)
    }

    /// Snapshot of a cell.
    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.grid.get(&CellRef::new(row, col)).map(|r| r.clone())
    }

    /// Text the UI shows for a cell.
    pub fn display(&self, row: usize, col: usize) -> String {
        self.grid
            .get(&CellRef::new(row, col))
            .map(|cell| cell.display.clone())
            .unwrap_or_default()
    }

    /// Exactly what was last committed to the cell.
    pub fn raw_input(&self, row: usize, col: usize) -> String {
        self.grid
            .get(&CellRef::new(row, col))
            .map(|cell| cell.raw_input.clone())
            .unwrap_or_default()
    }

    pub fn diagnostic(&self, row: usize, col: usize) -> Option<String> {
        self.grid
            .get(&CellRef::new(row, col))
            .and_then(|cell| cell.diagnostic.clone())
    }

    pub fn is_editable(&self, row: usize, col: usize) -> bool {
        self.grid
            .get(&CellRef::new(row, col))
            .is_some_and(|cell| cell.editable)
    }

    /// Commit new raw input to a cell.
    ///
    /// Formulas are evaluated immediately and, on success, reported to the
    /// change listener. Every formula that reads the cell is then recalculated
    /// in dependency order. Formula failures end up in the cell's diagnostic,
    /// never in the returned `Result`.
    pub fn set(&mut self, row: usize, col: usize, text: &str) -> Result<()> {
        let cell_ref = CellRef::new(row, col);
        self.check_bounds(&cell_ref)?;
        if !self.is_editable(row, col) {
            return Err(QuizgridError::ReadOnly(cell_ref));
        }

        self.commit_input(&cell_ref, text, true);
        self.recalculate_dependents(&cell_ref);
        Ok(())
    }

    /// Set a cell from its textual address, e.g. `set_at("B2", "=A1*2")`.
    pub fn set_at(&mut self, address: &str, text: &str) -> Result<()> {
        let cell_ref = CellRef::from_str(address)
            .ok_or_else(|| QuizgridError::InvalidAddress(address.to_string()))?;
        self.set(cell_ref.row, cell_ref.col, text)
    }

    /// Write raw input into an editable cell and evaluate it if it is a formula.
    ///
    /// Does not recalculate dependents; callers decide how wide to recompute.
    pub(crate) fn commit_input(&mut self, cell_ref: &CellRef, text: &str, notify: bool) {
        let old_deps = {
            let Some(mut cell) = self.grid.get_mut(cell_ref) else {
                return;
            };
            let old_deps = std::mem::take(&mut cell.depends_on);

            if is_formula(text) && is_incomplete(text) {
                // Keep the previous value until the formula is finished.
                if cell.cached_result.is_none() {
                    let previous = Cell::value(&cell, self.config.thousands_separator);
                    cell.cached_result = Some(previous);
                }
                cell.raw_input = text.to_string();
                cell.formula = Some(text.trim().to_string());
                cell.compiled = None;
            } else {
                cell.set_input(text);
            }
            old_deps
        };

        self.prepare_formula(cell_ref);
        let new_deps = self
            .grid
            .get(cell_ref)
            .map(|cell| cell.depends_on.clone())
            .unwrap_or_default();
        self.update_dependents(cell_ref, &old_deps, &new_deps);

        if !is_formula(text) {
            log::debug!("{} = {:?}", cell_ref, text);
            return;
        }

        if let Some(value) = self.evaluate_cell(cell_ref) {
            log::debug!("{} {} => {}", cell_ref, text.trim(), value);
            if notify && let Some(listener) = self.listener.as_mut() {
                listener(cell_ref.row, cell_ref.col, value);
            }
        }
    }

    /// Reset every editable cell; read-only cells are left untouched.
    pub fn clear(&mut self) {
        for mut entry in self.grid.iter_mut() {
            if entry.editable {
                entry.clear();
            }
        }
        self.editing = None;
        self.rebuild_dependents();
        self.recalculate_all();
    }

    /// Mark a cell as being edited; recalculation will not touch its display.
    pub fn begin_edit(&mut self, row: usize, col: usize) {
        self.editing = Some(CellRef::new(row, col));
    }

    /// Close the editor, refreshing the display of the edited cell.
    pub fn end_edit(&mut self) {
        let Some(cell_ref) = self.editing.take() else {
            return;
        };
        if let Some(mut cell) = self.grid.get_mut(&cell_ref)
            && let Some(value) = cell.cached_result
        {
            cell.display = format_number(value);
        }
    }
}
