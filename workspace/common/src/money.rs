//! BRL display formatting for report values.

use rust_decimal::Decimal;
use rusty_money::{Money, iso};

/// Formats a value as Brazilian reais, rounded to cents.
///
/// Values `Decimal` cannot represent (NaN, infinities) fall back to the
/// plain float rendering.
pub fn format_brl(value: f64) -> String {
    match Decimal::from_f64_retain(value) {
        Some(amount) => Money::from_decimal(amount.round_dp(2), iso::BRL).to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uses_brl_separators() {
        let formatted = format_brl(1234.567);
        assert!(formatted.contains("R$"), "{formatted}");
        assert!(formatted.contains("1.234,57"), "{formatted}");
    }

    #[test]
    fn test_format_negative() {
        let formatted = format_brl(-808_491.83);
        assert!(formatted.starts_with('-'), "{formatted}");
        assert!(formatted.contains("808.491,83"), "{formatted}");
    }

    #[test]
    fn test_format_non_finite() {
        assert_eq!(format_brl(f64::NAN), "NaN");
    }
}
