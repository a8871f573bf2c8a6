//! Numeric normalization helpers.
//!
//! Exchanges deliver amounts and prices as native JSON numbers or as numeric
//! strings, sometimes both within one response. Financial fields go through
//! the strict variants, which fail with [`ExchangeError::Protocol`] instead
//! of coercing garbage to zero; the lenient variants exist for display-only
//! ticker fields where a zero fallback is acceptable.

use serde_json::Value;

use crate::error::{ExchangeError, Result};

/// Lenient read of a JSON number-or-string; anything unparsable becomes 0.
pub fn lenient_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => lenient_str_f64(s),
        _ => 0.0,
    }
}

/// Lenient read of a numeric string; unparsable input becomes 0.
pub fn lenient_str_f64(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(0.0)
}

/// Strict read of a JSON number-or-string. `field` names the offender in the
/// error message.
pub fn strict_f64(value: &Value, field: &str) -> Result<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ExchangeError::protocol(format!("field `{field}` is not a finite number"))),
        Value::String(s) => strict_str_f64(s, field),
        other => Err(ExchangeError::protocol(format!(
            "field `{field}` has unexpected type: {other}"
        ))),
    }
}

/// Strict read of a numeric string.
pub fn strict_str_f64(raw: &str, field: &str) -> Result<f64> {
    raw.trim().parse().map_err(|_| {
        ExchangeError::protocol(format!("field `{field}` is not numeric: {raw:?}"))
    })
}
