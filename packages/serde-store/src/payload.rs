//! Nested payloads built from flat dotted-key mappings.
//!
//! A flat payload mixes plain keys, which set values on the container it is
//! applied to, with keys starting with `.`, which address child containers:
//!
//! ```text
//! { "speed": 3,
//!   ".motor": { "gain": 2 },
//!   ".motor.encoder[resolution]": 4096 }
//! ```

use std::collections::BTreeMap;
use std::io::Read;
use std::str::FromStr;

use recstore_core::{Key, Value};

use crate::convert::{json_to_value, value_to_json};
use crate::error::{PayloadError, Result};
use crate::path::{NestedPath, PathError};

/// One flat entry, classified by its key and value shape.
#[derive(Clone, Debug, PartialEq)]
pub enum PayloadEntry {
    /// A plain key: set on the container itself.
    Scalar(Key, Value),
    /// `.child` with a mapping: a whole child payload.
    Mapping(String, BTreeMap<String, Value>),
    /// `.a.b` or `.a[key]`: a value addressed through one or more children.
    NestedPath(NestedPath, Value),
}

impl PayloadEntry {
    pub fn classify(key: &str, value: Value) -> Result<Self> {
        if !key.starts_with('.') {
            return Ok(PayloadEntry::Scalar(Key::from(key), value));
        }

        let path = NestedPath::parse(key)?;
        if path.children.len() == 1 && path.key.is_none() {
            return match value {
                Value::Map(map) => {
                    let child = path.children.into_iter().next().unwrap_or_default();
                    Ok(PayloadEntry::Mapping(child, map))
                }
                other => Err(PathError::InvalidPath {
                    path: key.to_string(),
                    message: format!("child payload must be a mapping, found {}", kind(&other)),
                }
                .into()),
            };
        }
        Ok(PayloadEntry::NestedPath(path, value))
    }
}

/// A payload tree: values for one container plus payloads for its children.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payload {
    pub values: BTreeMap<Key, Value>,
    pub children: BTreeMap<String, Payload>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.children.is_empty()
    }

    /// Build a tree from flat entries. Later entries win on conflicts.
    pub fn unflatten(entries: impl IntoIterator<Item = (String, Value)>) -> Result<Self> {
        let mut payload = Payload::new();
        for (key, value) in entries {
            payload.apply(PayloadEntry::classify(&key, value)?)?;
        }
        Ok(payload)
    }

    fn apply(&mut self, entry: PayloadEntry) -> Result<()> {
        match entry {
            PayloadEntry::Scalar(key, value) => {
                self.values.insert(key, value);
            }
            PayloadEntry::Mapping(child, map) => {
                let sub = Payload::unflatten(map)?;
                self.children.entry(child).or_default().merge(sub);
            }
            PayloadEntry::NestedPath(path, value) => {
                let mut target = self;
                for child in &path.children {
                    target = target.children.entry(child.clone()).or_default();
                }
                match path.key.clone() {
                    Some(key) => {
                        target.values.insert(key, value);
                    }
                    None => match value {
                        Value::Map(map) => target.merge(Payload::unflatten(map)?),
                        other => {
                            return Err(PathError::InvalidPath {
                                path: path.to_string(),
                                message: format!(
                                    "child payload must be a mapping, found {}",
                                    kind(&other)
                                ),
                            }
                            .into())
                        }
                    },
                }
            }
        }
        Ok(())
    }

    /// Build from a JSON object.
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        match json_to_value(json) {
            Value::Map(map) => Payload::unflatten(map),
            other => Err(PayloadError::NotAMapping {
                found: kind(&other).to_string(),
            }),
        }
    }

    /// Build from a JSON document read from `reader`.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let json: serde_json::Value = serde_json::from_reader(reader)?;
        Payload::from_json(json)
    }

    /// Merge `other` into `self`; values from `other` win.
    pub fn merge(&mut self, other: Payload) {
        self.values.extend(other.values);
        for (name, sub) in other.children {
            self.children.entry(name).or_default().merge(sub);
        }
    }

    /// Export as a JSON object; children become `.name` keys.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut out = serde_json::Map::new();
        for (key, value) in &self.values {
            let json = value_to_json(value.clone()).map_err(|e| match e {
                PayloadError::Unserializable { key: inner, hook } => PayloadError::Unserializable {
                    key: if inner.is_empty() {
                        key.to_string()
                    } else {
                        format!("{}.{}", key, inner)
                    },
                    hook,
                },
                other => other,
            })?;
            out.insert(key.to_string(), json);
        }
        for (name, sub) in &self.children {
            out.insert(format!(".{}", name), sub.to_json()?);
        }
        Ok(serde_json::Value::Object(out))
    }
}

impl FromStr for Payload {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self> {
        let json: serde_json::Value = serde_json::from_str(s)?;
        Payload::from_json(json)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Integer(_) => "integer",
        Value::Float(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        Value::Computed(_) => "computed value",
    }
}
