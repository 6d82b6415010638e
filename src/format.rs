/// Renders a result with at most six decimals, dropping trailing zeros and a
/// dangling decimal point. Never switches to scientific notation.
pub fn format_result(value: f64) -> String {
    let fixed = format!("{:.6}", value);
    if !fixed.contains('.') {
        return fixed;
    }

    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_values() {
        assert_eq!(format_result(4.0), "4");
        assert_eq!(format_result(0.0), "0");
        assert_eq!(format_result(-12.0), "-12");
        assert_eq!(format_result(100.0), "100");
    }

    #[test]
    fn test_six_decimal_places() {
        assert_eq!(format_result(4.3333333333), "4.333333");
        assert_eq!(format_result(2.0 / 3.0), "0.666667");
        assert_eq!(format_result(0.1), "0.1");
        assert_eq!(format_result(1.5), "1.5");
    }

    #[test]
    fn test_tiny_values_round_to_zero() {
        assert_eq!(format_result(0.0000001), "0");
        assert_eq!(format_result(-0.0000001), "0");
        assert_eq!(format_result(-0.0), "0");
    }

    #[test]
    fn test_no_scientific_notation() {
        assert_eq!(format_result(1e12), "1000000000000");
        assert_eq!(format_result(2f64.powf(40.0)), "1099511627776");
        assert_eq!(format_result(0.000001), "0.000001");
    }
}
