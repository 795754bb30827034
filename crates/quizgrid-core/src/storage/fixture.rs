//! Parser for TOML grid fixtures.
//!
//! A fixture declares the grid size and its initial cells, row-major:
//!
//! ```toml
//! rows = 2
//! cols = 2
//!
//! [[cells]]
//! value = "10"
//! readonly = true
//!
//! [[cells]]
//! value = "=A1*2"
//! expected_answer = 20.0
//! ```

use crate::config::SheetConfig;
use crate::document::{Dimensions, InitialCell, Sheet};
use crate::error::{QuizgridError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridFixture {
    pub rows: usize,
    pub cols: usize,
    #[serde(default)]
    pub cells: Vec<InitialCell>,
}

impl GridFixture {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.rows, self.cols)
    }
}

/// Load a fixture file from disk.
pub fn load_fixture(path: &Path) -> Result<GridFixture> {
    let content = fs::read_to_string(path)?;
    parse_fixture(&content)
}

/// Parse fixture content from a string.
pub fn parse_fixture(content: &str) -> Result<GridFixture> {
    let fixture: GridFixture = toml::from_str(content)?;
    if fixture.cells.len() > fixture.rows * fixture.cols {
        return Err(QuizgridError::DimensionMismatch {
            rows: fixture.rows,
            cols: fixture.cols,
            found: fixture.cells.len(),
        });
    }
    Ok(fixture)
}

impl Sheet {
    /// Build a sheet from a parsed fixture.
    pub fn from_fixture(fixture: GridFixture, config: SheetConfig) -> Result<Sheet> {
        let dimensions = fixture.dimensions();
        Sheet::with_cells(dimensions, fixture.cells, config)
    }
}
