//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style addresses
//! (e.g., "A1", "$B$2", "c$10") and zero-indexed row/column coordinates,
//! plus the `A1:C3` range form and its expansion into individual cells.
//!
//! # Examples
//!
//! ```
//! use quizgrid_engine::engine::{CellRef, parse_address};
//!
//! let addr = parse_address("$B3").unwrap();
//! assert_eq!(addr.cell, CellRef::new(2, 1));
//! assert!(addr.col_locked);
//! assert!(!addr.row_locked);
//! assert_eq!(addr.cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Regex fragment matching one address with optional lock markers.
pub(crate) const ADDRESS_PATTERN: &str = r"\$?[A-Za-z]+\$?[0-9]+";

/// A reference to a cell by row and column indices (0-indexed).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

/// A parsed textual address, keeping its `$` lock markers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CellAddress {
    pub cell: CellRef,
    pub col_locked: bool,
    pub row_locked: bool,
}

/// A parsed `START:END` range.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RangeRef {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRef {
    pub fn new(row: usize, col: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell reference from spreadsheet notation, ignoring lock markers.
    /// Returns None if the input is invalid.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<CellRef> {
        parse_address(name).map(|addr| addr.cell)
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }

    /// Convert spreadsheet letters back to a column index ("A" -> 0).
    pub fn letters_to_col(letters: &str) -> Option<usize> {
        if letters.is_empty() {
            return None;
        }
        let mut acc = 0usize;
        for c in letters.to_ascii_uppercase().bytes() {
            if !c.is_ascii_uppercase() {
                return None;
            }
            let digit = (c - b'A') as usize + 1;
            acc = acc.checked_mul(26)?.checked_add(digit)?;
        }
        acc.checked_sub(1)
    }
}

impl std::str::FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CellRef::from_str(s).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}

impl CellAddress {
    /// Render the address back to text, keeping lock markers.
    pub fn to_text(&self) -> String {
        format!(
            "{}{}{}{}",
            if self.col_locked { "$" } else { "" },
            CellRef::col_to_letters(self.cell.col),
            if self.row_locked { "$" } else { "" },
            self.cell.row + 1
        )
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl RangeRef {
    /// All cells covered by the range, in expansion order.
    pub fn cells(&self) -> Vec<CellRef> {
        expand_range(&self.start.cell, &self.end.cell)
    }

    /// Number of cells covered by the range.
    pub fn cell_count(&self) -> Option<usize> {
        let rows = self.start.cell.row.abs_diff(self.end.cell.row) + 1;
        let cols = self.start.cell.col.abs_diff(self.end.cell.col) + 1;
        rows.checked_mul(cols)
    }
}

fn address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<col_lock>\$?)(?<letters>[A-Za-z]+)(?<row_lock>\$?)(?<numbers>[0-9]+)$")
            .expect("address regex must compile")
    })
}

/// Regex that finds addresses embedded in formula text.
///
/// Captures:
/// - group 1: column lock (`$` or empty)
/// - group 2: column letters
/// - group 3: row lock (`$` or empty)
/// - group 4: row digits
pub(crate) fn embedded_address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\$?)\b([A-Za-z]+)(\$?)([0-9]+)\b")
            .expect("embedded address regex must compile")
    })
}

/// Parse a single address such as `B3`, `$B3`, `B$3` or `$B$3`.
pub fn parse_address(text: &str) -> Option<CellAddress> {
    let caps = address_re().captures(text.trim())?;
    let col = CellRef::letters_to_col(&caps["letters"])?;
    let row = caps["numbers"].parse::<usize>().ok()?.checked_sub(1)?;

    Some(CellAddress {
        cell: CellRef::new(row, col),
        col_locked: !caps["col_lock"].is_empty(),
        row_locked: !caps["row_lock"].is_empty(),
    })
}

/// Parse a range like `A1:C3`. Fails if either half is not a valid address.
pub fn parse_range(text: &str) -> Option<RangeRef> {
    let (start, end) = text.split_once(':')?;
    Some(RangeRef {
        start: parse_address(start)?,
        end: parse_address(end)?,
    })
}

/// Expand a range into its cells.
///
/// - same row: columns left to right
/// - same column: rows top to bottom
/// - otherwise: the full rectangle in row-major order
pub fn expand_range(start: &CellRef, end: &CellRef) -> Vec<CellRef> {
    let (min_row, max_row) = (start.row.min(end.row), start.row.max(end.row));
    let (min_col, max_col) = (start.col.min(end.col), start.col.max(end.col));

    if start.row == end.row {
        return (min_col..=max_col)
            .map(|col| CellRef::new(start.row, col))
            .collect();
    }
    if start.col == end.col {
        return (min_row..=max_row)
            .map(|row| CellRef::new(row, start.col))
            .collect();
    }

    let mut cells = Vec::with_capacity((max_row - min_row + 1) * (max_col - min_col + 1));
    for row in min_row..=max_row {
        for col in min_col..=max_col {
            cells.push(CellRef::new(row, col));
        }
    }
    cells
}

/// Textual address of a zero-based (row, col) pair.
pub fn to_address_text(row: usize, col: usize) -> String {
    CellRef::new(row, col).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_a1_overflow_returns_none() {
        let huge = format!("{}1", "Z".repeat(40));
        assert!(CellRef::from_str(&huge).is_none());
    }

    #[test]
    fn test_col_to_letters_handles_max_usize() {
        let letters = CellRef::col_to_letters(usize::MAX);
        assert!(!letters.is_empty());
        assert!(letters.chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_round_trip_a1_to_z99() {
        for row in 0..99 {
            for col in 0..26 {
                let text = to_address_text(row, col);
                let addr = parse_address(&text).unwrap();
                assert_eq!(addr.cell, CellRef::new(row, col), "{}", text);
            }
        }
    }

    #[test]
    fn test_parse_address_lock_markers() {
        let addr = parse_address("$b$2").unwrap();
        assert_eq!(addr.cell, CellRef::new(1, 1));
        assert!(addr.col_locked && addr.row_locked);
        assert_eq!(addr.to_text(), "$B$2");

        let mixed = parse_address("A$1").unwrap();
        assert!(!mixed.col_locked);
        assert!(mixed.row_locked);
    }

    #[test]
    fn test_parse_address_rejects_garbage() {
        for bad in ["", "1A", "A0", "A", "12", "$$A1", "A 1", "A1B"] {
            assert!(parse_address(bad).is_none(), "{bad}");
        }
    }

    #[test]
    fn test_parse_range_requires_both_halves() {
        let range = parse_range("A1:C3").unwrap();
        assert_eq!(range.start.cell, CellRef::new(0, 0));
        assert_eq!(range.end.cell, CellRef::new(2, 2));
        assert_eq!(range.cell_count(), Some(9));
        assert!(parse_range("A1:").is_none());
        assert!(parse_range("A1").is_none());
        assert!(parse_range("A1:3C").is_none());
    }

    #[test]
    fn test_expand_range_orders() {
        let row = expand_range(&CellRef::new(0, 0), &CellRef::new(0, 2));
        let names: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        assert_eq!(names, ["A1", "B1", "C1"]);

        let col = expand_range(&CellRef::new(0, 0), &CellRef::new(2, 0));
        let names: Vec<String> = col.iter().map(|c| c.to_string()).collect();
        assert_eq!(names, ["A1", "A2", "A3"]);

        let rect = expand_range(&CellRef::new(0, 0), &CellRef::new(1, 1));
        let names: Vec<String> = rect.iter().map(|c| c.to_string()).collect();
        assert_eq!(names, ["A1", "B1", "A2", "B2"]);
    }

    #[test]
    fn test_expand_range_reversed_endpoints() {
        let cells = expand_range(&CellRef::new(0, 2), &CellRef::new(0, 0));
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0], CellRef::new(0, 0));
    }
}
