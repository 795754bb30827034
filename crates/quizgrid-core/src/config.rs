//! Sheet configuration.
//!
//! Loaded from TOML; every field is optional and falls back to its default.
//!
//! ```toml
//! thousands_separator = ","
//! detect_cycles = true
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::error::Result;
use quizgrid_engine::engine::EngineOptions;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetConfig {
    /// Stripped from literal cell text before it is read as a number.
    pub thousands_separator: char,
    /// Report formulas that take part in a reference loop as circular.
    /// When off, re-entrant reads silently resolve to `0`.
    pub detect_cycles: bool,
}

impl Default for SheetConfig {
    fn default() -> Self {
        SheetConfig {
            thousands_separator: ',',
            detect_cycles: true,
        }
    }
}

impl SheetConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub(crate) fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            thousands_separator: self.thousands_separator,
        }
    }
}
