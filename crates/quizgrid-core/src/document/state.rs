use crate::config::SheetConfig;
use crate::error::{QuizgridError, Result};
use quizgrid_engine::engine::{Cell, CellRef, Grid, InFlight, create_engine_with_options};
use rhai::Engine;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

use super::fill::FillGesture;

/// Called with `(row, col, value)` after a formula commit succeeds.
pub type ChangeListener = Box<dyn FnMut(usize, usize, f64)>;

/// Fixed size of a sheet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Dimensions {
    pub rows: usize,
    pub cols: usize,
}

impl Dimensions {
    pub fn new(rows: usize, cols: usize) -> Self {
        Dimensions { rows, cols }
    }

    pub fn contains(&self, cell_ref: &CellRef) -> bool {
        cell_ref.row < self.rows && cell_ref.col < self.cols
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }
}

/// One initial value handed over by the embedding application.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InitialCell {
    pub value: String,
    pub readonly: bool,
    pub expected_answer: Option<f64>,
}

impl InitialCell {
    pub fn new(value: &str) -> Self {
        InitialCell {
            value: value.to_string(),
            ..Default::default()
        }
    }

    pub fn readonly(value: &str) -> Self {
        InitialCell {
            value: value.to_string(),
            readonly: true,
            ..Default::default()
        }
    }
}

/// UI-agnostic state of one embedded grid.
pub struct Sheet {
    /// The cell store (DashMap is internally Arc-based, clones are cheap)
    pub grid: Grid,
    /// Rhai engine for evaluating formulas; its builtins read `grid` directly
    pub engine: Engine,
    /// Cells being resolved right now, shared with the engine builtins
    pub(crate) in_flight: InFlight,
    pub config: SheetConfig,
    pub(crate) dimensions: Dimensions,
    /// Reverse dependency map: cell -> formula cells that reference it
    pub dependents: HashMap<CellRef, HashSet<CellRef>>,
    /// Cell whose editor is open; recalculation leaves its display alone
    pub(crate) editing: Option<CellRef>,
    /// Fill-handle drag state
    pub(crate) fill: FillGesture,
    pub(crate) listener: Option<ChangeListener>,
}

impl Sheet {
    /// Create an empty 0x0 sheet.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new(config: SheetConfig) -> Self {
        let grid: Grid = std::sync::Arc::new(dashmap::DashMap::new());
        let in_flight = InFlight::default();
        let engine =
            create_engine_with_options(grid.clone(), in_flight.clone(), config.engine_options());

        Sheet {
            grid,
            engine,
            in_flight,
            config,
            dimensions: Dimensions::default(),
            dependents: HashMap::new(),
            editing: None,
            fill: FillGesture::Idle,
            listener: None,
        }
    }

    /// Create a sheet and load initial cells into it.
    pub fn with_cells(
        dimensions: Dimensions,
        cells: Vec<InitialCell>,
        config: SheetConfig,
    ) -> Result<Self> {
        let mut sheet = Self::new(config);
        sheet.initialize(dimensions, cells)?;
        Ok(sheet)
    }

    /// Replace the whole grid.
    ///
    /// Initial cells are laid out row-major; positions without one get an
    /// empty editable cell. Every formula is compiled and evaluated once.
    /// No change notifications are fired.
    pub fn initialize(&mut self, dimensions: Dimensions, cells: Vec<InitialCell>) -> Result<()> {
        if cells.len() > dimensions.cell_count() {
            return Err(QuizgridError::DimensionMismatch {
                rows: dimensions.rows,
                cols: dimensions.cols,
                found: cells.len(),
            });
        }

        self.grid.clear();
        self.dependents.clear();
        self.editing = None;
        self.fill = FillGesture::Idle;
        self.dimensions = dimensions;

        let mut initial = cells.into_iter();
        for row in 0..dimensions.rows {
            for col in 0..dimensions.cols {
                let cell = match initial.next() {
                    Some(init) => Cell::new(&init.value, !init.readonly, init.expected_answer),
                    None => Cell::new_empty(true),
                };
                self.grid.insert(CellRef::new(row, col), cell);
            }
        }

        let formula_cells: Vec<CellRef> = self
            .grid
            .iter()
            .filter(|entry| entry.value().is_formula())
            .map(|entry| *entry.key())
            .collect();
        for cell_ref in &formula_cells {
            self.prepare_formula(cell_ref);
        }
        self.rebuild_dependents();

        log::debug!(
            "initialized {}x{} sheet with {} formula cells",
            dimensions.rows,
            dimensions.cols,
            formula_cells.len()
        );
        self.recalculate_all();
        Ok(())
    }

    /// Register the listener for successful formula commits, replacing any previous one.
    pub fn on_change<F>(&mut self, listener: F)
    where
        F: FnMut(usize, usize, f64) + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Rebuild the reverse dependency map from the grid.
    pub(crate) fn rebuild_dependents(&mut self) {
        self.dependents.clear();
        for entry in self.grid.iter() {
            let cell_ref = entry.key();
            for dep in &entry.value().depends_on {
                self.dependents.entry(*dep).or_default().insert(*cell_ref);
            }
        }
    }

    /// Move one cell's edges in the reverse dependency map.
    pub(crate) fn update_dependents(
        &mut self,
        cell_ref: &CellRef,
        old_deps: &[CellRef],
        new_deps: &[CellRef],
    ) {
        for dep in old_deps {
            if let Some(set) = self.dependents.get_mut(dep) {
                set.remove(cell_ref);
                if set.is_empty() {
                    self.dependents.remove(dep);
                }
            }
        }
        for dep in new_deps {
            self.dependents.entry(*dep).or_default().insert(*cell_ref);
        }
    }

    pub(crate) fn check_bounds(&self, cell_ref: &CellRef) -> Result<()> {
        if self.dimensions.contains(cell_ref) {
            Ok(())
        } else {
            Err(QuizgridError::OutOfBounds {
                cell: *cell_ref,
                rows: self.dimensions.rows,
                cols: self.dimensions.cols,
            })
        }
    }
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new(SheetConfig::default())
    }
}
