//! # Cell Coercion
//!
//! The sheet is edited by hand, so a cell may hold anything: a number where a
//! string was expected, a string where a number was expected, nothing at all.
//! These helpers never fail; they coerce the way a lenient spreadsheet reader
//! would.
//!
//! ```text
//! ┌──────────────────┬──────────────┬────────────────┬───────────────────┐
//! │ Cell             │ as_text      │ as_number      │ as_integer        │
//! ├──────────────────┼──────────────┼────────────────┼───────────────────┤
//! │ "12.5"           │ "12.5"       │ 12.5           │ 12                │
//! │ 12.5             │ "12.5"       │ 12.5           │ 12                │
//! │ "3 unidades"     │ "3 unidades" │ 3.0            │ 3                 │
//! │ "abc" / "" / null│ as-is / ""   │ None           │ None              │
//! └──────────────────┴──────────────┴────────────────┴───────────────────┘
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Number, Value};
use tienda_core::Money;

/// Cell as text. Numbers print without a trailing `.0`; null is empty.
pub fn as_text(cell: Option<&Value>) -> String {
    match cell {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Cell as text, `None` when blank.
pub fn as_optional_text(cell: Option<&Value>) -> Option<String> {
    let text = as_text(cell);
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Longest leading decimal number in `s`, after leading whitespace.
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start || digits > 0 {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // Optional exponent, only if complete.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

/// Cell as a decimal number.
pub fn as_number(cell: Option<&Value>) -> Option<f64> {
    match cell? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(s),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

/// Cell as a whole number, truncating any fraction.
pub fn as_integer(cell: Option<&Value>) -> Option<i64> {
    let cell = cell?;
    if let Value::Number(n) = cell {
        if let Some(i) = n.as_i64() {
            return Some(i);
        }
    }
    let value = as_number(Some(cell))?.trunc();
    if value < i64::MIN as f64 || value > i64::MAX as f64 {
        return None;
    }
    Some(value as i64)
}

/// Cell as money in pesos. `None` when the cell holds no number.
pub fn as_money(cell: Option<&Value>) -> Option<Money> {
    as_number(cell).and_then(Money::from_major)
}

/// Cell as an RFC 3339 timestamp.
pub fn as_timestamp(cell: Option<&Value>) -> Option<DateTime<Utc>> {
    let text = as_text(cell);
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// True for a missing, null or whitespace-only cell.
pub fn is_blank(cell: Option<&Value>) -> bool {
    as_text(cell).trim().is_empty()
}

// =============================================================================
// Writing
// =============================================================================

/// Money as a sheet number in pesos: an integer when there are no centavos.
pub fn money_value(money: Money) -> Value {
    if money.is_whole() {
        Value::from(money.pesos())
    } else {
        Number::from_f64(money.to_major())
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Timestamp in the `2024-03-15T14:00:00.000Z` shape.
pub fn timestamp_value(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Optional text as a cell, `""` for `None`.
pub fn optional_text_value(text: Option<&str>) -> Value {
    Value::String(text.unwrap_or_default().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_as_text() {
        assert_eq!(as_text(Some(&json!("abc"))), "abc");
        assert_eq!(as_text(Some(&json!(12))), "12");
        assert_eq!(as_text(Some(&json!(12.0))), "12");
        assert_eq!(as_text(Some(&json!(12.5))), "12.5");
        assert_eq!(as_text(Some(&Value::Null)), "");
        assert_eq!(as_text(None), "");
        assert_eq!(as_optional_text(Some(&json!("  "))), None);
    }

    #[test]
    fn test_as_number_reads_leading_digits() {
        assert_eq!(as_number(Some(&json!("12.5"))), Some(12.5));
        assert_eq!(as_number(Some(&json!(" 3 unidades"))), Some(3.0));
        assert_eq!(as_number(Some(&json!("-.5"))), Some(-0.5));
        assert_eq!(as_number(Some(&json!("1e3x"))), Some(1000.0));
        assert_eq!(as_number(Some(&json!("7e"))), Some(7.0));
        assert_eq!(as_number(Some(&json!("abc"))), None);
        assert_eq!(as_number(Some(&json!(""))), None);
        assert_eq!(as_number(Some(&json!("."))), None);
        assert_eq!(as_number(Some(&json!(true))), None);
    }

    #[test]
    fn test_money_cells() {
        assert_eq!(as_money(Some(&json!("150.25"))), Some(Money::from_cents(15025)));
        assert_eq!(as_money(Some(&json!(9000))), Some(Money::from_pesos(9000)));
        assert_eq!(as_money(Some(&json!("gratis"))), None);
        assert_eq!(money_value(Money::from_pesos(9000)), json!(9000));
        assert_eq!(money_value(Money::from_cents(15025)), json!(150.25));
    }

    #[test]
    fn test_timestamps() {
        let at = as_timestamp(Some(&json!("2024-03-15T14:00:00.000Z"))).unwrap();
        assert_eq!(timestamp_value(at), json!("2024-03-15T14:00:00.000Z"));
        assert_eq!(as_timestamp(Some(&json!("ayer"))), None);
        assert!(is_blank(Some(&json!("  "))));
        assert!(!is_blank(Some(&json!(0))));
    }

    #[test]
    fn test_as_integer_truncates() {
        assert_eq!(as_integer(Some(&json!(5))), Some(5));
        assert_eq!(as_integer(Some(&json!("5.9"))), Some(5));
        assert_eq!(as_integer(Some(&json!(-2.7))), Some(-2));
        assert_eq!(as_integer(Some(&json!("x"))), None);
        assert_eq!(as_integer(None), None);
    }
}
