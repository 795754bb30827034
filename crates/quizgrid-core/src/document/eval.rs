//! Formula evaluation and recalculation for a sheet.
//!
//! Every formula is compiled once when committed; recalculation re-runs the
//! cached ASTs in dependency order so each formula reads already-fresh values.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::Sheet;
use quizgrid_engine::engine::{
    CellRef, compile_formula, detect_cycle, evaluate, evaluate_compiled, extract_dependencies,
};
use quizgrid_engine::{FormulaError, FormulaResult};

impl Sheet {
    /// Compile a formula cell and record its dependencies.
    ///
    /// Compile failures are kept for `evaluate_cell` to report.
    pub(crate) fn prepare_formula(&mut self, cell_ref: &CellRef) {
        let Some(mut cell) = self.grid.get_mut(cell_ref) else {
            return;
        };
        let Some(formula) = cell.formula.clone() else {
            cell.compiled = None;
            cell.depends_on.clear();
            return;
        };
        cell.depends_on = extract_dependencies(&formula);
        cell.compiled = compile_formula(&self.engine, &formula).ok();
    }

    /// Evaluate one formula cell and store the outcome on it.
    ///
    /// Incomplete formulas keep their previous value; every other failure
    /// stores `0` and a diagnostic. Returns the new value on success.
    pub(crate) fn evaluate_cell(&mut self, cell_ref: &CellRef) -> Option<f64> {
        let (formula, compiled) = {
            let cell = self.grid.get(cell_ref)?;
            (cell.formula.clone()?, cell.compiled.clone())
        };

        let outcome = if self.config.detect_cycles && detect_cycle(cell_ref, &self.grid).is_some() {
            Err(FormulaError::Circular {
                formula: formula.clone(),
            })
        } else {
            // The cell itself is in flight, so a loop back to it reads 0.
            self.in_flight
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(*cell_ref);
            let outcome = match compiled {
                Some(ast) => evaluate_compiled(&self.engine, &formula, &ast),
                None => compile_formula(&self.engine, &formula)
                    .and_then(|ast| evaluate_compiled(&self.engine, &formula, &ast)),
            };
            self.in_flight
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(cell_ref);
            outcome
        };

        self.store_outcome(cell_ref, outcome)
    }

    /// Evaluate a one-off formula against the current cell values.
    ///
    /// Nothing is stored; a leading `=` is optional.
    pub fn evaluate_formula(&self, formula: &str) -> FormulaResult<f64> {
        let formula = formula.trim();
        if formula.starts_with('=') {
            evaluate(&self.engine, formula)
        } else {
            evaluate(&self.engine, &format!("={}", formula))
        }
    }

    fn store_outcome(
        &mut self,
        cell_ref: &CellRef,
        outcome: Result<f64, FormulaError>,
    ) -> Option<f64> {
        let update_display = self.editing != Some(*cell_ref);
        let mut cell = self.grid.get_mut(cell_ref)?;

        match outcome {
            Ok(value) => {
                cell.store_result(value, update_display);
                Some(value)
            }
            Err(err) if err.keeps_previous_value() => {
                log::debug!("{}: {}", cell_ref, err);
                cell.diagnostic = Some(err.to_string());
                None
            }
            Err(err) => {
                log::warn!("{}: {}", cell_ref, err);
                cell.store_failure(err.to_string(), update_display);
                None
            }
        }
    }

    fn mark_circular(&mut self, cell_ref: &CellRef) {
        let Some(formula) = self.grid.get(cell_ref).and_then(|c| c.formula.clone()) else {
            return;
        };
        self.store_outcome(cell_ref, Err(FormulaError::Circular { formula }));
    }

    /// One recalculation sweep over every formula cell.
    ///
    /// Cells are visited so that a formula runs after the formulas it reads.
    /// Failures are recorded per cell and never stop the sweep.
    pub fn recalculate_all(&mut self) {
        let formula_cells: HashSet<CellRef> = self
            .grid
            .iter()
            .filter(|entry| entry.value().is_formula())
            .map(|entry| *entry.key())
            .collect();
        log::debug!("recalculating {} formula cells", formula_cells.len());
        self.evaluate_in_order(&formula_cells);
    }

    /// Recalculate every formula that (transitively) reads `changed`.
    pub(crate) fn recalculate_dependents(&mut self, changed: &CellRef) {
        let affected = self.collect_dependents(changed);
        if affected.is_empty() {
            return;
        }
        log::debug!("{} changed, recalculating {} dependents", changed, affected.len());
        self.evaluate_in_order(&affected);
    }

    /// Transitive closure of formula cells that depend on `changed` (excluding it).
    pub(crate) fn collect_dependents(&self, changed: &CellRef) -> HashSet<CellRef> {
        let mut to_process = vec![*changed];
        let mut visited = HashSet::new();
        while let Some(cell_ref) = to_process.pop() {
            if let Some(deps) = self.dependents.get(&cell_ref) {
                for dep in deps {
                    if visited.insert(*dep) {
                        to_process.push(*dep);
                    }
                }
            }
        }
        visited.remove(changed);
        visited
    }

    fn evaluate_in_order(&mut self, cells: &HashSet<CellRef>) {
        let (ordered, looped) = self.topological_order(cells);
        for cell_ref in &ordered {
            self.evaluate_cell(cell_ref);
        }

        if looped.is_empty() {
            return;
        }
        if self.config.detect_cycles {
            for cell_ref in &looped {
                self.mark_circular(cell_ref);
            }
        } else {
            // Best effort: evaluate in storage order; re-entrant reads give 0.
            for cell_ref in &looped {
                self.evaluate_cell(cell_ref);
            }
        }
    }

    /// Order `cells` so every cell comes after the cells of the set it reads.
    ///
    /// Ties are broken row-major. Returns the ordered cells and, separately,
    /// the cells that could not be ordered because they sit on or behind a loop.
    pub(crate) fn topological_order(
        &self,
        cells: &HashSet<CellRef>,
    ) -> (Vec<CellRef>, Vec<CellRef>) {
        let mut pending: HashMap<CellRef, usize> = HashMap::new();
        for cell_ref in cells {
            let count = self
                .grid
                .get(cell_ref)
                .map(|cell| {
                    cell.depends_on
                        .iter()
                        .filter(|dep| *dep != cell_ref && cells.contains(*dep))
                        .count()
                })
                .unwrap_or(0);
            let self_loop = self
                .grid
                .get(cell_ref)
                .is_some_and(|cell| cell.depends_on.contains(cell_ref));
            pending.insert(*cell_ref, count + usize::from(self_loop));
        }

        let mut ready: BTreeSet<CellRef> = pending
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(cell_ref, _)| *cell_ref)
            .collect();
        let mut ordered = Vec::with_capacity(cells.len());

        while let Some(cell_ref) = ready.pop_first() {
            pending.remove(&cell_ref);
            ordered.push(cell_ref);
            if let Some(readers) = self.dependents.get(&cell_ref) {
                for reader in readers {
                    if *reader == cell_ref {
                        continue;
                    }
                    if let Some(count) = pending.get_mut(reader) {
                        *count -= 1;
                        if *count == 0 {
                            ready.insert(*reader);
                        }
                    }
                }
            }
        }

        let mut looped: Vec<CellRef> = pending.into_keys().collect();
        looped.sort();
        (ordered, looped)
    }
}
