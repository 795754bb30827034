//! Circular dependency detection for formula cells.
//!
//! When a formula is committed, we verify it doesn't create a cycle
//! (e.g., A1 references B1, B1 references C1, C1 references A1).
//! This module uses depth-first search to find such cycles before
//! evaluation reads stale or placeholder values.

use std::collections::HashSet;

use super::{CellRef, Grid};

/// Detect a circular dependency reachable from a cell.
/// Returns Some(cycle_path) if a cycle is found, None otherwise.
///
/// The path ends with the cell that closes the loop.
pub fn detect_cycle(start: &CellRef, grid: &Grid) -> Option<Vec<CellRef>> {
    let mut visiting = HashSet::new();
    let mut finished = HashSet::new();
    let mut path = Vec::new();

    if detect_cycle_dfs(start, grid, &mut visiting, &mut finished, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn detect_cycle_dfs(
    current: &CellRef,
    grid: &Grid,
    visiting: &mut HashSet<CellRef>,
    finished: &mut HashSet<CellRef>,
    path: &mut Vec<CellRef>,
) -> bool {
    if visiting.contains(current) {
        path.push(*current);
        return true;
    }
    if finished.contains(current) {
        return false;
    }

    let deps = match grid.get(current) {
        Some(entry) => entry.depends_on.clone(),
        None => return false,
    };

    visiting.insert(*current);
    path.push(*current);

    for dep in &deps {
        if detect_cycle_dfs(dep, grid, visiting, finished, path) {
            return true;
        }
    }

    path.pop();
    visiting.remove(current);
    finished.insert(*current);
    false
}
