//! Formula preprocessing and reference transformation.
//!
//! Before formulas can be compiled by Rhai, spreadsheet syntax must be
//! rewritten into plain expressions over registered builtins:
//!
//! - **Symbols**: `×` → `*`, `÷` → `/`
//! - **Literals**: `3` → `3.0` so arithmetic always runs in floating point
//! - **Range functions**: `SUM(A1:B5)` → `SUM_RANGE(0, 0, 4, 1)` (row/col)
//! - **Absolute value**: `abs(...)` in any case → `ABS(...)`
//! - **Cell references**: `$A$1` → `CELL(0, 0)`
//! - **Fill offsets**: shifting unlocked references when a formula is copied

use regex::Regex;
use std::sync::OnceLock;

use super::cell_ref::{CellRef, embedded_address_re, parse_address};
use crate::functions::{ABS_RHAI_NAME, RangeFunction};

/// Characters that cannot end a complete formula.
const DANGLING_TOKENS: &[char] = &['+', '-', '*', '/', '×', '÷', '('];

/// Placeholder written in place of a reference that moved off the grid.
pub const REF_ERROR: &str = "#REF!";

/// Whether a formula (with or without its `=` marker) is obviously unfinished.
pub fn is_incomplete(formula: &str) -> bool {
    let body = formula.trim();
    let body = body.strip_prefix('=').unwrap_or(body).trim_end();
    match body.chars().last() {
        None => true,
        Some(last) => DANGLING_TOKENS.contains(&last),
    }
}

/// Map the UI multiplication/division glyphs to ASCII operators.
pub fn normalize_symbols(script: &str) -> String {
    script.replace('×', "*").replace('÷', "/")
}

/// Rewrite a formula body (without `=`) into a Rhai expression.
pub fn preprocess_formula(script: &str) -> String {
    let script = normalize_symbols(script);
    let script = floatify_literals(&script);

    let with_ranges = crate::builtins::range_fn_re()
        .replace_all(&script, |caps: &regex::Captures| {
            let Some(function) = RangeFunction::from_name(&caps[1]) else {
                return caps[0].to_string();
            };
            match (parse_address(&caps[2]), parse_address(&caps[3])) {
                (Some(start), Some(end)) => format!(
                    "{}({}, {}, {}, {})",
                    function.rhai_name(),
                    start.cell.row,
                    start.cell.col,
                    end.cell.row,
                    end.cell.col
                ),
                _ => caps[0].to_string(),
            }
        })
        .to_string();

    let with_abs = abs_fn_re()
        .replace_all(&with_ranges, format!("{}(", ABS_RHAI_NAME))
        .to_string();

    embedded_address_re()
        .replace_all(&with_abs, |caps: &regex::Captures| {
            let text = format!("{}{}", &caps[2], &caps[4]);
            match CellRef::from_str(&text) {
                Some(cr) if i64::try_from(cr.row).is_ok() && i64::try_from(cr.col).is_ok() => {
                    format!("CELL({}, {})", cr.row, cr.col)
                }
                // Row 0 or an overflowing address names no cell.
                _ => "0.0".to_string(),
            }
        })
        .to_string()
}

fn abs_fn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\babs\s*\(").expect("abs regex must compile"))
}

/// Rewrite numeric literals so Rhai treats them as floats (`7` → `7.0`, `.5` → `0.5`).
///
/// Digits that belong to an address (`A1`, `$B$2`) are left alone.
fn floatify_literals(script: &str) -> String {
    let chars: Vec<char> = script.chars().collect();
    let mut out = String::with_capacity(script.len() + 8);
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        let prev = i.checked_sub(1).map(|p| chars[p]);
        let next_is_digit = chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
        let starts_number = (c.is_ascii_digit() || (c == '.' && next_is_digit))
            && !prev.is_some_and(|p| p.is_ascii_alphanumeric() || p == '_' || p == '$' || p == '.');

        if !starts_number {
            out.push(c);
            i += 1;
            continue;
        }

        let mut int_part = String::new();
        while i < chars.len() && chars[i].is_ascii_digit() {
            int_part.push(chars[i]);
            i += 1;
        }

        let mut frac_part = String::new();
        if i < chars.len() && chars[i] == '.' {
            i += 1;
            while i < chars.len() && chars[i].is_ascii_digit() {
                frac_part.push(chars[i]);
                i += 1;
            }
        }

        let mut exponent = String::new();
        if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
            let mut j = i + 1;
            let mut candidate = String::new();
            if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                candidate.push(chars[j]);
                j += 1;
            }
            let digits_start = j;
            while j < chars.len() && chars[j].is_ascii_digit() {
                candidate.push(chars[j]);
                j += 1;
            }
            if j > digits_start {
                exponent = candidate;
                i = j;
            }
        }

        out.push_str(if int_part.is_empty() { "0" } else { &int_part });
        out.push('.');
        out.push_str(if frac_part.is_empty() { "0" } else { &frac_part });
        if !exponent.is_empty() {
            out.push('e');
            out.push_str(&exponent);
        }
    }

    out
}

/// Offset every unlocked reference in a formula by a row/column delta.
/// Used by fill/copy so copied formulas preserve relative references.
///
/// Rules:
/// - `A1` offset by (+2, +1) becomes `B3`
/// - `$` before the letters pins the column, `$` before the digits pins the row
/// - range endpoints are offset independently: `SUM(A1:A3)` by (+1, 0) → `SUM(A2:A4)`
/// - refs that move before row 1 or column A become `#REF!`
pub fn offset_formula_references(formula: &str, delta_row: isize, delta_col: isize) -> String {
    if delta_col == 0 && delta_row == 0 {
        return formula.to_string();
    }

    embedded_address_re()
        .replace_all(formula, |caps: &regex::Captures| {
            let Some(addr) = parse_address(&caps[0]) else {
                return caps[0].to_string();
            };

            let new_row = if addr.row_locked {
                addr.cell.row as isize
            } else {
                addr.cell.row as isize + delta_row
            };
            let new_col = if addr.col_locked {
                addr.cell.col as isize
            } else {
                addr.cell.col as isize + delta_col
            };
            if new_row < 0 || new_col < 0 {
                return REF_ERROR.to_string();
            }

            let mut moved = addr;
            moved.cell = CellRef::new(new_row as usize, new_col as usize);
            moved.to_text()
        })
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_incomplete() {
        assert!(is_incomplete("=1+"));
        assert!(is_incomplete("=A1 * "));
        assert!(is_incomplete("=SUM("));
        assert!(is_incomplete("=2÷"));
        assert!(is_incomplete("="));
        assert!(!is_incomplete("=1+2"));
        assert!(!is_incomplete("=(1+2)"));
    }

    #[test]
    fn test_floatify_literals_skips_addresses() {
        assert_eq!(floatify_literals("1+2*3"), "1.0+2.0*3.0");
        assert_eq!(floatify_literals("A1+$B$2*10"), "A1+$B$2*10.0");
        assert_eq!(floatify_literals(".5+1.25"), "0.5+1.25");
        assert_eq!(floatify_literals("2e3"), "2.0e3");
        assert_eq!(floatify_literals("1.5E-2"), "1.5e-2");
    }

    #[test]
    fn test_preprocess_formula_references_and_ranges() {
        assert_eq!(preprocess_formula("A1"), "CELL(0, 0)");
        assert_eq!(preprocess_formula("$B$2*2"), "CELL(1, 1)*2.0");
        assert_eq!(
            preprocess_formula("sum(A1:A3) + c1"),
            "SUM_RANGE(0, 0, 2, 0) + CELL(0, 2)"
        );
        assert_eq!(
            preprocess_formula("Average($A$1:B2)"),
            "AVERAGE_RANGE(0, 0, 1, 1)"
        );
        assert_eq!(preprocess_formula("abs(A1)"), "ABS(CELL(0, 0))");
        assert_eq!(preprocess_formula("A1×2÷4"), "CELL(0, 0)*2.0/4.0");
    }

    #[test]
    fn test_preprocess_leaves_unknown_functions() {
        assert_eq!(preprocess_formula("FOO(1)"), "FOO(1.0)");
    }

    #[test]
    fn test_unparsable_addresses_become_zero() {
        assert_eq!(preprocess_formula("A0+5"), "0.0+5.0");
        assert_eq!(preprocess_formula("A99999999999999999999*2"), "0.0*2.0");
        assert_eq!(preprocess_formula("$B$0"), "0.0");
    }

    #[test]
    fn test_offset_formula_references_vertical() {
        assert_eq!(offset_formula_references("=A1*2", 1, 0), "=A2*2");
        assert_eq!(offset_formula_references("=A$1*2", 1, 0), "=A$1*2");
        assert_eq!(offset_formula_references("=SUM(A1:A3)", 2, 0), "=SUM(A3:A5)");
    }

    #[test]
    fn test_offset_formula_references_horizontal() {
        assert_eq!(offset_formula_references("=A1*2", 0, 1), "=B1*2");
        assert_eq!(offset_formula_references("=$A1*2", 0, 1), "=$A1*2");
        assert_eq!(offset_formula_references("=A$1+B2", 0, 2), "=C$1+D2");
    }

    #[test]
    fn test_offset_formula_references_out_of_bounds() {
        assert_eq!(offset_formula_references("=A1+B2", 0, -1), "=#REF!+A2");
    }
}
