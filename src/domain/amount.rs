//! Human-unit amount strings.
//!
//! Balances travel as decimal strings in human units ("1.25" ETH) and are
//! never converted to floating point.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Fractional digits a [`Decimal`] holds without rounding.
const DECIMAL_MAX_SCALE: usize = 28;

/// True for "", "0", "0.0", "000.000" and any other spelling of zero.
///
/// Amounts that fit a [`Decimal`] are compared numerically. Longer
/// fractions (tokens with more than 28 decimals produce them) would be
/// rounded by the parser, so those and anything it rejects use the trim
/// test: zero if nothing but `0` and `.` remain after removing the sign.
#[must_use]
pub fn is_zero_amount(amount: &str) -> bool {
    let amount = amount.trim();
    if amount.is_empty() {
        return true;
    }
    let unsigned = amount.trim_start_matches(['+', '-']);
    let fraction_len = unsigned.split_once('.').map_or(0, |(_, fraction)| fraction.len());
    if fraction_len <= DECIMAL_MAX_SCALE {
        if let Ok(value) = Decimal::from_str(amount) {
            return value.is_zero();
        }
    }
    unsigned.chars().all(|c| c == '0' || c == '.')
}

/// Render an unsigned integer amount of base units as a human decimal.
///
/// `raw` is the base-10 digit string of the integer (wei, token units).
/// Trailing fractional zeros are dropped: `format_units("1500000", 6)` is
/// `"1.5"`.
#[must_use]
pub fn format_units(raw: &str, decimals: u8) -> String {
    let digits = raw.trim().trim_start_matches('0');
    if digits.is_empty() {
        return "0".to_string();
    }

    let scale = usize::from(decimals);
    let (int_part, frac_part) = if digits.len() > scale {
        let split = digits.len() - scale;
        (digits[..split].to_string(), digits[split..].to_string())
    } else {
        ("0".to_string(), format!("{digits:0>scale$}"))
    };

    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        int_part
    } else {
        format!("{int_part}.{frac_part}")
    }
}

/// Render a satoshi count (8 decimals) as a human decimal, sign preserved.
#[must_use]
pub fn format_satoshis(sats: i64) -> String {
    Decimal::new(sats, 8).normalize().to_string()
}

/// Signed pending delta in human units; empty when there is none.
#[must_use]
pub fn format_unconfirmed(sats: i64) -> String {
    if sats == 0 {
        String::new()
    } else {
        format_satoshis(sats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_spellings() {
        for zero in ["", "0", "0.0", "00.000", "-0", " 0 ", "0."] {
            assert!(is_zero_amount(zero), "{zero:?} should be zero");
        }
    }

    #[test]
    fn non_zero_amounts() {
        for amount in ["1", "0.001", "100.5", "-0.2", "0.00000001"] {
            assert!(!is_zero_amount(amount), "{amount:?} should be non-zero");
        }
    }

    #[test]
    fn oversized_amount_uses_trim_test() {
        let huge_zero = format!("0.{}", "0".repeat(60));
        assert!(is_zero_amount(&huge_zero));
        let huge = format!("{}1", "9".repeat(60));
        assert!(!is_zero_amount(&huge));
    }

    #[test]
    fn dust_beyond_decimal_scale_is_not_zero() {
        let dust = format!("0.{}1", "0".repeat(29));
        assert!(!is_zero_amount(&dust));
        assert!(!is_zero_amount(&format_units("1", 40)));
        assert!(is_zero_amount(&format!("0.{}", "0".repeat(40))));
    }

    #[test]
    fn format_units_scales() {
        assert_eq!(format_units("1500000", 6), "1.5");
        assert_eq!(format_units("1000000000000000000", 18), "1");
        assert_eq!(format_units("1", 18), "0.000000000000000001");
        assert_eq!(format_units("0", 18), "0");
        assert_eq!(format_units("", 6), "0");
        assert_eq!(format_units("123", 0), "123");
    }

    #[test]
    fn format_satoshi_amounts() {
        assert_eq!(format_satoshis(100_000), "0.001");
        assert_eq!(format_satoshis(150_000_000), "1.5");
        assert_eq!(format_satoshis(0), "0");
        assert_eq!(format_unconfirmed(0), "");
        assert_eq!(format_unconfirmed(-5_000), "-0.00005");
    }
}
