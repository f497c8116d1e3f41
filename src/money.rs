//! Helpers for working with currency amounts stored as floating point numbers.

/// Round `value` to the nearest cent.
pub fn round_to_cents(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;

    // Avoid "-0.0" in JSON responses.
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Whether `value` has no more than two decimal places.
pub fn has_at_most_two_decimals(value: f64) -> bool {
    let cents = value * 100.0;

    (cents - cents.round()).abs() < 1e-6
}

/// `part` as a percentage of `total`, rounded to two decimal places.
///
/// Returns zero when `total` is zero so that empty reports never divide by zero.
pub fn percent_of(part: f64, total: f64) -> f64 {
    if total == 0.0 || !total.is_finite() {
        return 0.0;
    }

    round_to_cents(part / total * 100.0)
}

#[cfg(test)]
mod tests {
    use super::{has_at_most_two_decimals, percent_of, round_to_cents};

    #[test]
    fn rounds_to_nearest_cent() {
        assert_eq!(round_to_cents(0.1 + 0.2), 0.3);
        assert_eq!(round_to_cents(10.005_1), 10.01);
        assert_eq!(round_to_cents(-2.344), -2.34);
    }

    #[test]
    fn negative_zero_becomes_zero() {
        assert!(round_to_cents(-0.001).is_sign_positive());
    }

    #[test]
    fn detects_extra_decimal_places() {
        assert!(has_at_most_two_decimals(12.0));
        assert!(has_at_most_two_decimals(12.34));
        assert!(has_at_most_two_decimals(0.07));
        assert!(!has_at_most_two_decimals(12.345));
        assert!(!has_at_most_two_decimals(0.001));
    }

    #[test]
    fn percent_of_zero_total_is_zero() {
        assert_eq!(percent_of(50.0, 0.0), 0.0);
        assert_eq!(percent_of(0.0, 0.0), 0.0);
    }

    #[test]
    fn percent_of_is_rounded() {
        assert_eq!(percent_of(1.0, 3.0), 33.33);
        assert_eq!(percent_of(25.0, 100.0), 25.0);
        assert_eq!(percent_of(-10.0, 40.0), -25.0);
    }
}
