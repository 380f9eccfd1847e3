//! Currency rounding and display helpers.

use serde::ser::SerializeMap;
use serde::Serializer;
use std::collections::BTreeMap;

/// Rounds to cents, half-up. The epsilon scale absorbs binary representation
/// error so values like `1.005` round to `1.01`.
pub fn round_currency(amount: f64) -> f64 {
    if !amount.is_finite() {
        return 0.0;
    }
    let cents = (amount * 100.0 * (1.0 + f64::EPSILON)).round();
    if !cents.is_finite() {
        // Too large to carry cents.
        return amount;
    }
    let rounded = cents / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Renders `1234567.5` as `1,234,567.50`.
pub fn format_currency(amount: f64) -> String {
    let rounded = round_currency(amount);
    let negative = rounded < 0.0;
    let fixed = format!("{:.2}", rounded.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if negative {
        format!("-{grouped}.{cents}")
    } else {
        format!("{grouped}.{cents}")
    }
}

/// Serializes an amount rounded to cents. Breakdown totals are already
/// cent-rounded in memory; category and agency sums are not.
pub(crate) fn serialize_cents<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(round_currency(*value))
}

pub(crate) fn serialize_cent_map<S>(
    totals: &BTreeMap<String, f64>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(totals.len()))?;
    for (key, value) in totals {
        map.serialize_entry(key, &round_currency(*value))?;
    }
    map.end()
}

/// Renders a per-unit rate with at least two and at most four decimals.
pub fn format_rate(rate: f64) -> String {
    let fixed = format!("{rate:.4}");
    let trimmed = fixed.trim_end_matches('0');
    let decimals = trimmed
        .split_once('.')
        .map(|(_, fraction)| fraction.len())
        .unwrap_or(0);
    if decimals >= 2 {
        trimmed.to_string()
    } else {
        format!("{rate:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_up_on_cents() {
        assert_eq!(round_currency(1.005), 1.01);
        assert_eq!(round_currency(0.285), 0.29);
        assert_eq!(round_currency(2.344), 2.34);
        assert_eq!(round_currency(0.1 * 10_000.0), 1000.0);
        assert_eq!(round_currency(f64::NAN), 0.0);
        assert_eq!(round_currency(1e307), 1e307);
    }

    #[test]
    fn formats_currency_with_grouping() {
        assert_eq!(format_currency(0.0), "0.00");
        assert_eq!(format_currency(999.999), "1,000.00");
        assert_eq!(format_currency(1_234_567.5), "1,234,567.50");
        assert_eq!(format_currency(-45.1), "-45.10");
    }

    #[test]
    fn formats_rates_with_two_to_four_decimals() {
        assert_eq!(format_rate(0.1), "0.10");
        assert_eq!(format_rate(250.0), "250.00");
        assert_eq!(format_rate(0.0325), "0.0325");
        assert_eq!(format_rate(1.125), "1.125");
    }
}
