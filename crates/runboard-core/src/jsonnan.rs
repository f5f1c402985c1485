//! JSON parsing that tolerates `NaN` and `Infinity` literals
//!
//! Summary metrics are written by Python clients, whose JSON encoder emits
//! bare `NaN`, `Infinity` and `-Infinity` tokens. Standard JSON rejects them,
//! so before handing the text to `serde_json` those tokens (outside of string
//! literals) are rewritten to sentinel strings and mapped back to `f64`
//! values afterwards.

use crate::value::Value;

const NAN_SENTINEL: &str = "\u{1}runboard:NaN";
const INF_SENTINEL: &str = "\u{1}runboard:Infinity";
const NEG_INF_SENTINEL: &str = "\u{1}runboard:-Infinity";

/// Parse JSON text, accepting `NaN`, `Infinity` and `-Infinity` as numbers
pub fn parse(text: &str) -> serde_json::Result<Value> {
    let rewritten = rewrite_non_finite(text);
    let json: serde_json::Value = serde_json::from_str(&rewritten)?;
    Ok(restore(json))
}

fn rewrite_non_finite(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            rest = &rest[c.len_utf8()..];
            continue;
        }

        let replacement = if rest.starts_with("NaN") {
            Some(("NaN".len(), NAN_SENTINEL))
        } else if rest.starts_with("Infinity") {
            Some(("Infinity".len(), INF_SENTINEL))
        } else if rest.starts_with("-Infinity") {
            Some(("-Infinity".len(), NEG_INF_SENTINEL))
        } else {
            None
        };

        match replacement {
            Some((len, sentinel)) => {
                out.push('"');
                out.push_str(&sentinel.replace('\u{1}', "\\u0001"));
                out.push('"');
                rest = &rest[len..];
            }
            None => {
                if c == '"' {
                    in_string = true;
                }
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out
}

fn restore(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::String(s) => match s.as_str() {
            NAN_SENTINEL => Value::Number(f64::NAN),
            INF_SENTINEL => Value::Number(f64::INFINITY),
            NEG_INF_SENTINEL => Value::Number(f64::NEG_INFINITY),
            _ => Value::String(s),
        },
        serde_json::Value::Array(items) => Value::Array(items.into_iter().map(restore).collect()),
        serde_json::Value::Object(map) => {
            Value::Object(map.into_iter().map(|(k, v)| (k, restore(v))).collect())
        }
        other => Value::from_json(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(value: &Value, key: &str) -> Value {
        match value {
            Value::Object(map) => map.get(key).cloned().unwrap_or(Value::Null),
            _ => panic!("Expected Object"),
        }
    }

    #[test]
    fn test_parse_standard_json() {
        let value = parse(r#"{"acc": 0.14, "name": "x"}"#).unwrap();
        assert_eq!(field(&value, "acc"), Value::Number(0.14));
        assert_eq!(field(&value, "name"), Value::from("x"));
    }

    #[test]
    fn test_parse_non_finite_literals() {
        let value = parse(r#"{"a": NaN, "b": Infinity, "c": -Infinity, "d": [NaN]}"#).unwrap();
        assert!(field(&value, "a").as_number().unwrap().is_nan());
        assert_eq!(field(&value, "b"), Value::Number(f64::INFINITY));
        assert_eq!(field(&value, "c"), Value::Number(f64::NEG_INFINITY));
        match field(&value, "d") {
            Value::Array(items) => assert!(items[0].as_number().unwrap().is_nan()),
            other => panic!("Expected Array, got {:?}", other),
        }
    }

    #[test]
    fn test_literals_inside_strings_are_untouched() {
        let value = parse(r#"{"note": "NaN loss at \"Infinity\" step"}"#).unwrap();
        assert_eq!(field(&value, "note"), Value::from("NaN loss at \"Infinity\" step"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(parse("{acc: 1").is_err());
    }
}
