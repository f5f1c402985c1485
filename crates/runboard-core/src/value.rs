//! Runtime value types for run data
//!
//! The `Value` enum represents every value that can appear in a run's config,
//! summary or in a filter literal. It mirrors JSON, but objects keep their keys
//! ordered so that anything derived from them is deterministic.

use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Runtime value type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// Null value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Number value (f64 handles both int and float, as well as NaN/Infinity).
    /// Non-finite numbers serialize as the strings `NaN`, `Infinity` and
    /// `-Infinity`, since JSON has no literal for them.
    #[serde(serialize_with = "serialize_number")]
    Number(f64),
    /// String value
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Object (ordered key-value map)
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Returns true for `Value::Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for scalars (null, bool, number, string)
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Object(_))
    }

    /// The number held by this value, without any coercion
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string held by this value, without any coercion
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Coerce to a number: numbers pass through, numeric strings are parsed.
    ///
    /// Booleans, nulls and compound values do not coerce.
    pub fn coerce_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok()
            }
            _ => None,
        }
    }

    /// Total ordering used by sorting. Numbers come before every other value
    /// and compare numerically; the rest compare as case-sensitive strings.
    /// Callers handle nulls before reaching here.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Number(l), Value::Number(r)) => l.total_cmp(r),
            (Value::Number(_), _) => Ordering::Less,
            (_, Value::Number(_)) => Ordering::Greater,
            _ => self.to_string().cmp(&other.to_string()),
        }
    }

    /// Turn the string form of non-finite numbers back into numbers, through
    /// arrays and objects. Only for values known to hold metrics.
    pub fn restore_non_finite(self) -> Value {
        match self {
            Value::String(s) => match s.as_str() {
                "NaN" => Value::Number(f64::NAN),
                "Infinity" => Value::Number(f64::INFINITY),
                "-Infinity" => Value::Number(f64::NEG_INFINITY),
                _ => Value::String(s),
            },
            Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::restore_non_finite).collect())
            }
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, v.restore_non_finite()))
                    .collect(),
            ),
            other => other,
        }
    }

    /// Build a value from parsed JSON
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(json)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// Stringified form used for regex matching, equality fallback and grouping.
///
/// Null renders as the empty string; numbers render without a trailing `.0`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Object(map) => {
                let json = serde_json::to_string(map).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

fn serialize_number<S: Serializer>(n: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if n.is_finite() {
        serializer.serialize_f64(*n)
    } else {
        serializer.serialize_str(&format_number(*n))
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        format!("{}", n)
    }
}

/// Parse a literal typed into a filter builder.
///
/// `"true"`/`"false"` become booleans, `"null"` becomes null, and strings
/// that are entirely a number become numbers. A number with a dangling
/// decimal point such as `"3."` is still being typed and stays a string.
pub fn parse_value(input: &Value) -> Value {
    let text = match input {
        Value::String(s) => s,
        other => return other.clone(),
    };

    match text.as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }

    if is_plain_number(text) {
        if let Ok(n) = text.parse::<f64>() {
            return Value::Number(n);
        }
    }
    Value::String(text.clone())
}

fn is_plain_number(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let mut parts = digits.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next();

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    match frac_part {
        None => all_digits(int_part),
        Some(frac) => all_digits(int_part) && all_digits(frac),
    }
}
