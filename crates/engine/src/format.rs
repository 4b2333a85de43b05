//! Display formatting for decimal amounts.
//!
//! Pure projections of engine values into strings. Every formatter accepts
//! loosely-typed input and returns a default (`"0"`, `"0%"`, `"$0.00"`) for
//! anything that is not a finite number. Rounding is half-up.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::calculator::CollateralRatio;
use crate::numeric::ToDecimal;

/// Round `value` half-up to exactly `decimals` places, without grouping.
pub fn fixed(value: Decimal, decimals: u32) -> String {
    let mut rounded =
        value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(decimals);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded.to_string()
}

/// Format a number with comma thousands separators, e.g. `1,234,567.89`.
pub fn format_number<T: ToDecimal + ?Sized>(value: &T, decimals: u32) -> String {
    match value.to_decimal() {
        Some(d) => group_thousands(&fixed(d, decimals)),
        None => "0".to_string(),
    }
}

/// Format a USD amount, e.g. `$1,234.56`.
pub fn format_usd<T: ToDecimal + ?Sized>(value: &T, decimals: u32) -> String {
    let amount = value.to_decimal().unwrap_or(Decimal::ZERO);
    format!("${}", group_thousands(&fixed(amount, decimals)))
}

/// Format a fraction as a percentage, e.g. `1.55` → `155.00%`.
pub fn format_percent<T: ToDecimal + ?Sized>(value: &T, decimals: u32) -> String {
    match value
        .to_decimal()
        .and_then(|d| d.checked_mul(Decimal::ONE_HUNDRED))
    {
        Some(pct) => format!("{}%", fixed(pct, decimals)),
        None => "0%".to_string(),
    }
}

/// Format a collateral ratio as a percentage, `∞` when unbounded.
pub fn format_ratio(ratio: &CollateralRatio, decimals: u32) -> String {
    match ratio {
        CollateralRatio::Unbounded => "∞".to_string(),
        CollateralRatio::Finite(r) => format_percent(r, decimals),
    }
}

/// Format a timestamp for display, e.g. `Mar 5, 2026, 3:07 PM`.
pub fn format_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%b %-d, %Y, %-I:%M %p").to_string()
}

/// Coarse age of a timestamp relative to `now`, e.g. `42s ago`, `5m ago`.
///
/// Timestamps in the future read as `0s ago`.
pub fn time_since(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - timestamp).num_seconds().max(0);
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3_600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3_600)
    } else {
        format!("{}d ago", secs / 86_400)
    }
}

/// Insert commas into the integer part of a plain decimal string.
fn group_thousands(plain: &str) -> String {
    let (sign, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_number_groups_thousands() {
        assert_eq!(format_number(&dec!(1234567.891), 2), "1,234,567.89");
        assert_eq!(format_number(&dec!(999), 2), "999.00");
        assert_eq!(format_number(&dec!(1000), 0), "1,000");
        assert_eq!(format_number(&dec!(-1234.5), 1), "-1,234.5");
    }

    #[test]
    fn test_format_number_does_not_group_fraction() {
        assert_eq!(format_number(&dec!(0.123456), 6), "0.123456");
    }

    #[test]
    fn test_rounding_is_half_up() {
        assert_eq!(format_number(&dec!(2.345), 2), "2.35");
        assert_eq!(format_number(&dec!(2.5), 0), "3");
        assert_eq!(format_number(&dec!(-0.001), 2), "0.00");
    }

    #[test]
    fn test_invalid_input_defaults() {
        assert_eq!(format_number("abc", 2), "0");
        assert_eq!(format_percent("abc", 2), "0%");
        assert_eq!(format_usd("abc", 2), "$0.00");
        let missing: Option<Decimal> = None;
        assert_eq!(format_number(&missing, 2), "0");
        assert_eq!(format_usd(&f64::NAN, 2), "$0.00");
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(&dec!(1425), 2), "$1,425.00");
        assert_eq!(format_usd("0.00002145", 8), "$0.00002145");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(&dec!(1.55), 2), "155.00%");
        assert_eq!(format_percent(&dec!(0.06), 1), "6.0%");
        assert_eq!(format_percent("0.04275", 2), "4.28%");
    }

    #[test]
    fn test_format_ratio() {
        assert_eq!(format_ratio(&CollateralRatio::Unbounded, 2), "∞");
        assert_eq!(format_ratio(&CollateralRatio::Finite(dec!(2.85)), 2), "285.00%");
    }

    #[test]
    fn test_format_date() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 5, 15, 7, 0).unwrap();
        assert_eq!(format_date(ts), "Mar 5, 2026, 3:07 PM");
    }

    #[test]
    fn test_time_since_buckets() {
        let now = Utc::now();
        assert_eq!(time_since(now - Duration::seconds(42), now), "42s ago");
        assert_eq!(time_since(now - Duration::seconds(300), now), "5m ago");
        assert_eq!(time_since(now - Duration::hours(3), now), "3h ago");
        assert_eq!(time_since(now - Duration::days(2), now), "2d ago");
        assert_eq!(time_since(now + Duration::seconds(5), now), "0s ago");
    }
}
