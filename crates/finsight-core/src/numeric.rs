//! Numeric safety helpers.
//!
//! Everything that reaches a ratio, a total or a score goes through these
//! functions first, so a missing or non-finite upstream value degrades to a
//! default instead of leaking into a user-facing figure. None of them panic.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::Rate;

/// Convert a boundary value into a `Decimal`, or `None` when it is absent,
/// non-finite, or outside the range `Decimal` can represent.
pub fn finite(value: Option<f64>) -> Option<Decimal> {
    value
        .filter(|v| v.is_finite())
        .and_then(Decimal::from_f64)
}

/// The value when it is a finite number, else `default`.
pub fn safe_number(value: Option<f64>, default: Decimal) -> Decimal {
    finite(value).unwrap_or(default)
}

/// Bound `value` to `[lo, hi]`. An inverted range collapses to `lo`.
pub fn clamp(value: Decimal, lo: Decimal, hi: Decimal) -> Decimal {
    if hi < lo {
        return lo;
    }
    value.max(lo).min(hi)
}

/// `numerator / denominator`, or `default` when the denominator is zero or
/// the quotient overflows.
pub fn safe_divide(numerator: Decimal, denominator: Decimal, default: Decimal) -> Decimal {
    if denominator.is_zero() {
        return default;
    }
    numerator.checked_div(denominator).unwrap_or(default)
}

/// `a + b`, saturating at the `Decimal` bounds instead of overflowing.
pub fn safe_add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or_else(|| saturated(b.is_sign_negative()))
}

/// `a - b`, saturating at the `Decimal` bounds instead of overflowing.
pub fn safe_sub(a: Decimal, b: Decimal) -> Decimal {
    a.checked_sub(b).unwrap_or_else(|| saturated(!b.is_sign_negative()))
}

/// `a * b`, saturating at the `Decimal` bounds instead of overflowing.
pub fn safe_mul(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b)
        .unwrap_or_else(|| saturated(a.is_sign_negative() != b.is_sign_negative()))
}

/// Saturating sum of `values`.
pub fn safe_sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values.into_iter().fold(Decimal::ZERO, safe_add)
}

/// Arithmetic mean, always within `[min, max]` of `values`; 0 when empty.
///
/// Falls back to summing `v / n` when the plain sum would overflow.
pub fn safe_mean(values: &[Decimal]) -> Decimal {
    let (Some(min), Some(max)) = (values.iter().min(), values.iter().max()) else {
        return Decimal::ZERO;
    };
    let n = Decimal::from(values.len() as u64);
    let mean = values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
        .map(|sum| safe_divide(sum, n, Decimal::ZERO))
        .unwrap_or_else(|| safe_sum(values.iter().map(|v| safe_divide(*v, n, Decimal::ZERO))));
    clamp(mean, *min, *max)
}

fn saturated(negative: bool) -> Decimal {
    if negative {
        Decimal::MIN
    } else {
        Decimal::MAX
    }
}

/// Rates above 1 are read as percentages (`10` means 10%).
pub fn normalize_rate(rate: Rate) -> Rate {
    if rate > Decimal::ONE {
        rate / dec!(100)
    } else {
        rate
    }
}

/// Lenient `serde` field deserialisers for upstream JSON.
///
/// The dashboard and projection engine send numbers as numbers, numeric
/// strings, `null`, or `"Infinity"`; all of these must deserialise.
pub mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Any JSON scalar that reads as a number. Non-finite values are kept so
    /// that callers can decide how to treat them.
    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(coerce_number))
    }

    /// Booleans, `"true"`/`"yes"`/`"on"` strings, and 0/1 numbers.
    pub fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Bool(b)) => Some(b),
            Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "on" | "1" => Some(true),
                "false" | "no" | "n" | "off" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        })
    }

    /// Non-empty trimmed strings; numbers are rendered as text.
    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    /// A list that may also arrive as `null`.
    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// A whole section that may arrive as `null`.
    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    fn coerce_number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => {
                let cleaned: String = s
                    .trim()
                    .trim_start_matches('$')
                    .chars()
                    .filter(|c| *c != ',' && *c != '_')
                    .collect();
                cleaned.parse::<f64>().ok()
            }
            _ => None,
        }
    }
}
