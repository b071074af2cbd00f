//! Built-in converters, one per [`Shape`](super::Shape).
//!
//! Each converter accepts a raw value and returns the canonical value of its
//! shape. None of them converts lossily: a float is never turned into an
//! integer, and unknown boolean spellings are rejected.

use std::time::Duration;

use crate::value::Value;

type Converted = Result<Value, String>;

/// Text rendering of scalars, durations and lists. Maps are rejected.
pub fn to_string(value: &Value) -> Converted {
    match value {
        Value::Map(_) => Err("a map cannot be converted to a string".into()),
        Value::String(s) => Ok(Value::String(s.clone())),
        other => Ok(Value::String(other.to_string())),
    }
}

/// Decimal integers, with optional sign and surrounding whitespace.
pub fn to_integer(value: &Value) -> Converted {
    match value {
        Value::Integer(n) => Ok(Value::Integer(*n)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| e.to_string()),
        other => Err(format!("cannot read an integer from a {}", other.kind())),
    }
}

/// Floats, integers and numeric text.
pub fn to_float(value: &Value) -> Converted {
    match value {
        Value::Float(n) => Ok(Value::Float(*n)),
        #[allow(clippy::cast_precision_loss)]
        Value::Integer(n) => Ok(Value::Float(*n as f64)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| e.to_string()),
        other => Err(format!("cannot read a float from a {}", other.kind())),
    }
}

/// Accepts true/yes/on/1 and false/no/off/0 (case-insensitive).
pub fn to_bool(value: &Value) -> Converted {
    match value {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::Integer(1) => Ok(Value::Bool(true)),
        Value::Integer(0) => Ok(Value::Bool(false)),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
            _ => Err("expected true/false/yes/no/on/off/1/0".into()),
        },
        other => Err(format!("cannot read a boolean from a {}", other.kind())),
    }
}

/// Bare integers are milliseconds; anything else uses humantime syntax
/// (`30s`, `1h 30m`, `250ms`).
pub fn to_duration(value: &Value) -> Converted {
    match value {
        Value::Duration(d) => Ok(Value::Duration(*d)),
        Value::Integer(n) => u64::try_from(*n)
            .map(|ms| Value::Duration(Duration::from_millis(ms)))
            .map_err(|_| "durations cannot be negative".to_string()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(ms) = s.parse::<u64>() {
                return Ok(Value::Duration(Duration::from_millis(ms)));
            }
            humantime::parse_duration(s)
                .map(Value::Duration)
                .map_err(|e| e.to_string())
        }
        other => Err(format!("cannot read a duration from a {}", other.kind())),
    }
}

/// Comma-separated text is split and trimmed, empty entries dropped. Lists
/// are rendered element-wise; other scalars become one-element lists.
pub fn to_string_list(value: &Value) -> Converted {
    match value {
        Value::String(s) => Ok(Value::List(
            s.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(Value::from)
                .collect(),
        )),
        Value::List(items) => items
            .iter()
            .map(|item| match to_string(item)? {
                Value::String(s) => Ok(Value::String(s)),
                _ => Err("list entries must be scalars".to_string()),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Value::Map(_) => Err("a map cannot be converted to a list".into()),
        other => Ok(Value::List(vec![Value::String(other.to_string())])),
    }
}

/// Nested maps are flattened to dotted keys with string values.
pub fn to_map(value: &Value) -> Converted {
    match value {
        Value::Map(_) => Ok(Value::Map(
            value
                .flatten()
                .into_iter()
                .map(|(k, v)| (k, Value::String(v.to_string())))
                .collect(),
        )),
        other => Err(format!("cannot read a map from a {}", other.kind())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_to_string() {
        assert_eq!(to_string(&Value::Integer(5)).unwrap(), Value::from("5"));
        assert_eq!(
            to_string(&Value::List(vec![Value::from("a"), Value::Integer(1)])).unwrap(),
            Value::from("a,1")
        );
        assert!(to_string(&Value::Map(BTreeMap::new())).is_err());
    }

    #[test]
    fn test_to_integer() {
        assert_eq!(to_integer(&Value::from(" -42 ")).unwrap(), Value::Integer(-42));
        assert_eq!(to_integer(&Value::from("+7")).unwrap(), Value::Integer(7));
        assert!(to_integer(&Value::from("4.2")).is_err());
        assert!(to_integer(&Value::Float(4.0)).is_err());
        assert!(to_integer(&Value::from("")).is_err());
    }

    #[test]
    fn test_to_float() {
        assert_eq!(to_float(&Value::from("2.5")).unwrap(), Value::Float(2.5));
        assert_eq!(to_float(&Value::Integer(3)).unwrap(), Value::Float(3.0));
        assert!(to_float(&Value::Bool(true)).is_err());
    }

    #[test]
    fn test_to_bool_literals() {
        for truthy in ["true", "YES", "On", "1"] {
            assert_eq!(to_bool(&Value::from(truthy)).unwrap(), Value::Bool(true));
        }
        for falsy in ["false", "no", "OFF", "0"] {
            assert_eq!(to_bool(&Value::from(falsy)).unwrap(), Value::Bool(false));
        }
        assert!(to_bool(&Value::from("maybe")).is_err());
        assert!(to_bool(&Value::Integer(2)).is_err());
        assert_eq!(to_bool(&Value::Integer(0)).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_to_duration() {
        assert_eq!(
            to_duration(&Value::from("250")).unwrap(),
            Value::Duration(Duration::from_millis(250))
        );
        assert_eq!(
            to_duration(&Value::from("2m")).unwrap(),
            Value::Duration(Duration::from_secs(120))
        );
        assert_eq!(
            to_duration(&Value::Integer(1500)).unwrap(),
            Value::Duration(Duration::from_millis(1500))
        );
        assert!(to_duration(&Value::Integer(-1)).is_err());
        assert!(to_duration(&Value::from("soon")).is_err());
    }

    #[test]
    fn test_to_string_list() {
        assert_eq!(
            to_string_list(&Value::from(" a ,b, ,c")).unwrap(),
            Value::List(vec![Value::from("a"), Value::from("b"), Value::from("c")])
        );
        assert_eq!(
            to_string_list(&Value::from("")).unwrap(),
            Value::List(vec![])
        );
        assert_eq!(
            to_string_list(&Value::Integer(3)).unwrap(),
            Value::List(vec![Value::from("3")])
        );
        assert!(to_string_list(&Value::List(vec![Value::Map(BTreeMap::new())])).is_err());
    }

    #[test]
    fn test_to_map_flattens() {
        let mut inner = BTreeMap::new();
        inner.insert("b".to_string(), Value::Bool(true));
        let mut outer = BTreeMap::new();
        outer.insert("a".to_string(), Value::Map(inner));
        let Value::Map(flat) = to_map(&Value::Map(outer)).unwrap() else {
            panic!("expected a map");
        };
        assert_eq!(flat["a.b"], Value::from("true"));
        assert!(to_map(&Value::from("a=b")).is_err());
    }
}
