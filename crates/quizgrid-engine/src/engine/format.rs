use super::Dynamic;

/// Maximum number of fractional digits shown for a value.
const MAX_DECIMALS: usize = 6;

/// Extract a number from an evaluation result (floats and ints both accepted).
pub fn dynamic_to_number(value: &Dynamic) -> Option<f64> {
    if let Ok(n) = value.as_float() {
        Some(n)
    } else if let Ok(n) = value.as_int() {
        Some(n as f64)
    } else {
        None
    }
}

/// Format a number for display.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "#NAN!".to_string()
    } else if n.is_infinite() {
        "#INF!".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        let fixed = format!("{:.*}", MAX_DECIMALS, n);
        let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
        if trimmed == "-0" {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(30.0), "30");
        assert_eq!(format_number(-4.0), "-4");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(1.0 / 3.0), "0.333333");
        assert_eq!(format_number(f64::NAN), "#NAN!");
    }

    #[test]
    fn test_dynamic_to_number() {
        assert_eq!(dynamic_to_number(&Dynamic::from(3_i64)), Some(3.0));
        assert_eq!(dynamic_to_number(&Dynamic::from(1.5_f64)), Some(1.5));
        assert_eq!(dynamic_to_number(&Dynamic::from("x".to_string())), None);
    }
}
