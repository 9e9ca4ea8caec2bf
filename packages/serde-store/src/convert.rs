//! Conversions between Value and serde types.

use serde::de::DeserializeOwned;
use serde::Serialize;

use recstore_core::Value;

use crate::error::{PayloadError, Result};

/// Convert a Value to a Rust type via serde.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    // Convert Value to serde_json::Value first, then deserialize
    let json = value_to_json(value)?;
    Ok(serde_json::from_value(json)?)
}

/// Convert a Rust type to a Value via serde.
pub fn to_value<T: Serialize>(data: &T) -> Result<Value> {
    let json = serde_json::to_value(data)?;
    Ok(json_to_value(json))
}

/// Convert our Value to serde_json::Value.
///
/// Fails with `Unserializable` on computed values, naming where in the
/// tree the hook was found.
pub fn value_to_json(value: Value) -> Result<serde_json::Value> {
    to_json_at(value, &mut String::new())
}

fn to_json_at(value: Value, at: &mut String) -> Result<serde_json::Value> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(b),
        Value::Integer(i) => serde_json::Value::Number(i.into()),
        Value::Float(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s),
        Value::Array(arr) => {
            let mut out = Vec::with_capacity(arr.len());
            for (i, item) in arr.into_iter().enumerate() {
                let len = at.len();
                at.push_str(&format!("[{}]", i));
                out.push(to_json_at(item, at)?);
                at.truncate(len);
            }
            serde_json::Value::Array(out)
        }
        Value::Map(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                let len = at.len();
                if !at.is_empty() {
                    at.push('.');
                }
                at.push_str(&k);
                let json = to_json_at(v, at)?;
                at.truncate(len);
                out.insert(k, json);
            }
            serde_json::Value::Object(out)
        }
        Value::Computed(computed) => {
            return Err(PayloadError::Unserializable {
                key: at.clone(),
                hook: computed.hook().describe(),
            })
        }
    })
}

/// Convert serde_json::Value to our Value.
pub fn json_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                // Fallback for very large numbers
                Value::String(n.to_string())
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(map) => Value::Map(
            map.into_iter()
                .map(|(k, v)| (k, json_to_value(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collection_literals::btree;
    use recstore_core::cycle;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Motor {
        name: String,
        speed: u32,
        enabled: bool,
    }

    #[test]
    fn struct_through_value() {
        let original = Motor {
            name: "m1".to_string(),
            speed: 30,
            enabled: true,
        };

        let value = to_value(&original).unwrap();
        assert!(value.is_map());
        let recovered: Motor = from_value(value).unwrap();
        assert_eq!(original, recovered);
    }

    #[test]
    fn json_to_value_numbers() {
        let json = serde_json::json!({
            "integer": 42,
            "float": 2.75,
            "negative": -100
        });

        let value = json_to_value(json);
        let map = value.as_map().unwrap();
        assert_eq!(map.get("integer"), Some(&Value::Integer(42)));
        assert_eq!(map.get("negative"), Some(&Value::Integer(-100)));
        if let Some(Value::Float(f)) = map.get("float") {
            assert!((f - 2.75).abs() < 0.001);
        } else {
            panic!("expected float");
        }
    }

    #[test]
    fn nan_becomes_null() {
        assert_eq!(
            value_to_json(Value::Float(f64::NAN)).unwrap(),
            serde_json::Value::Null
        );
    }

    #[test]
    fn computed_value_is_unserializable() {
        let value = Value::Map(btree! {
            "axis".to_string() => Value::Map(btree! {
                "pos".to_string() => Value::Array(vec![
                    Value::from(1),
                    cycle(vec![Value::from(1)]).unwrap(),
                ]),
            }),
        });

        match value_to_json(value) {
            Err(PayloadError::Unserializable { key, hook }) => {
                assert_eq!(key, "axis.pos[1]");
                assert_eq!(hook, "cycle of 1");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn type_mismatch_is_a_json_error() {
        let result: Result<Motor> = from_value(Value::from(3));
        assert!(matches!(result, Err(PayloadError::Json(_))));
    }
}
