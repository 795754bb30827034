//! Dependency extraction from formula strings.
//!
//! Parses formula text to find all cell references (e.g., `A1`, `$B$2`,
//! `SUM(B2:C5)`) that the formula depends on. This is used to build the
//! dependency graph for recalculation ordering and cycle detection.

use std::collections::HashSet;

use super::cell_ref::{CellRef, embedded_address_re, parse_address, parse_range};

const MAX_DEPENDENCY_RANGE_CELLS: usize = 1_000_000;

/// Extract all cell references from a formula as dependencies.
///
/// Ranges inside range functions are expanded; duplicates are removed and
/// first-seen order is kept.
pub fn extract_dependencies(formula: &str) -> Vec<CellRef> {
    let mut deps = Vec::new();
    let range_re = crate::builtins::range_fn_re();

    // Remove range function calls first so their endpoints are not counted twice.
    let without_ranges = range_re.replace_all(formula, "").to_string();

    for caps in range_re.captures_iter(formula) {
        let (Some(start), Some(end)) = (parse_address(&caps[2]), parse_address(&caps[3])) else {
            continue;
        };
        let range = super::cell_ref::RangeRef { start, end };
        match range.cell_count() {
            Some(count) if count <= MAX_DEPENDENCY_RANGE_CELLS => deps.extend(range.cells()),
            _ => continue,
        }
    }

    for caps in embedded_address_re().captures_iter(&without_ranges) {
        if let Some(addr) = parse_address(&caps[0]) {
            deps.push(addr.cell);
        }
    }

    let mut seen = HashSet::new();
    deps.retain(|cell| seen.insert(*cell));
    deps
}

/// Parse a cell range like "A1:B5" and return its two corner cells.
pub fn range_corners(range: &str) -> Option<(CellRef, CellRef)> {
    let range = parse_range(range)?;
    Some((range.start.cell, range.end.cell))
}
