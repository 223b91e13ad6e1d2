//! Lenient coercion for loosely-typed caller payloads.
//!
//! The frontend and the billing system send booleans as `"on"`/`"off"`
//! strings and numbers as either JSON numbers or numeric strings. Rather than
//! coercing ad hoc per route, every request type funnels through the helpers
//! here: one canonical boolean parser, one canonical integer parser.
//!
//! Use with serde:
//!
//! ```
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Payload {
//!     #[serde(default, deserialize_with = "studio_billing_core::coerce::opt_i64")]
//!     wp_user_id: Option<i64>,
//!     #[serde(default, deserialize_with = "studio_billing_core::coerce::opt_bool")]
//!     active: Option<bool>,
//! }
//! ```

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Interpret a JSON value as an integer.
///
/// Accepts integer numbers, fraction-free floats, and trimmed numeric
/// strings. Anything else is `None`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Interpret a JSON value as a float.
///
/// Accepts numbers and trimmed numeric strings.
#[must_use]
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// The canonical boolean parser.
///
/// Accepts `on`/`off`, `true`/`false`, `1`/`0`, `yes`/`no` (case-insensitive,
/// trimmed). Anything else is `None`.
#[must_use]
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Interpret a JSON value as a boolean via the canonical parser.
///
/// Accepts JSON booleans, the numbers `0`/`1`, and the canonical string set.
#[must_use]
pub fn value_as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => parse_bool(s),
        _ => None,
    }
}

/// Deserialize an optional integer field leniently.
///
/// # Errors
///
/// Rejects values present but not coercible to an integer.
pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value_as_i64(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected an integer, got {value}"))),
    }
}

/// Deserialize an optional float field leniently.
///
/// # Errors
///
/// Rejects values present but not coercible to a number.
pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value_as_f64(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a number, got {value}"))),
    }
}

/// Deserialize an optional boolean field via the canonical parser.
///
/// # Errors
///
/// Rejects values present but outside the canonical boolean set.
pub fn opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value_as_bool(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a boolean, got {value}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integers_coerce_from_numbers_and_strings() {
        assert_eq!(value_as_i64(&json!(42)), Some(42));
        assert_eq!(value_as_i64(&json!("42")), Some(42));
        assert_eq!(value_as_i64(&json!(" 42 ")), Some(42));
        assert_eq!(value_as_i64(&json!(42.0)), Some(42));
        assert_eq!(value_as_i64(&json!(42.5)), None);
        assert_eq!(value_as_i64(&json!("4x2")), None);
        assert_eq!(value_as_i64(&json!(true)), None);
    }

    #[test]
    fn canonical_boolean_set() {
        for raw in ["on", "true", "1", "yes", "ON", " Yes "] {
            assert_eq!(parse_bool(raw), Some(true), "{raw}");
        }
        for raw in ["off", "false", "0", "no", "OFF", " No "] {
            assert_eq!(parse_bool(raw), Some(false), "{raw}");
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn booleans_coerce_from_bools_numbers_and_strings() {
        assert_eq!(value_as_bool(&json!(true)), Some(true));
        assert_eq!(value_as_bool(&json!(0)), Some(false));
        assert_eq!(value_as_bool(&json!(1)), Some(true));
        assert_eq!(value_as_bool(&json!(2)), None);
        assert_eq!(value_as_bool(&json!("off")), Some(false));
        assert_eq!(value_as_bool(&json!([])), None);
    }

    #[test]
    fn serde_helpers_apply_uniformly() {
        #[derive(Deserialize)]
        struct Payload {
            #[serde(default, deserialize_with = "opt_i64")]
            wp_user_id: Option<i64>,
            #[serde(default, deserialize_with = "opt_bool")]
            active: Option<bool>,
        }

        let p: Payload =
            serde_json::from_value(json!({ "wp_user_id": "42", "active": "on" })).unwrap();
        assert_eq!(p.wp_user_id, Some(42));
        assert_eq!(p.active, Some(true));

        let p: Payload = serde_json::from_value(json!({})).unwrap();
        assert_eq!(p.wp_user_id, None);
        assert_eq!(p.active, None);

        assert!(serde_json::from_value::<Payload>(json!({ "active": "perhaps" })).is_err());
    }
}
