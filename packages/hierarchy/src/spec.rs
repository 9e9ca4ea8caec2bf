//! Serializable hierarchy descriptions.
//!
//! A hierarchy is a root class name followed by levels, outermost first.
//! Each level either has a single instance under its parent, or one
//! instance per id:
//!
//! ```json
//! { "root": "Machine",
//!   "levels": [ { "name": "Axis", "ids": ["x", "y"] },
//!               { "name": "Motor" },
//!               { "name": "Encoder", "ids": [1, 2] } ] }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use recstore_core::{Error, Result, Value};

/// Instance ids of a level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum LevelIds {
    Numbers(Vec<i64>),
    Names(Vec<String>),
}

impl LevelIds {
    pub fn is_empty(&self) -> bool {
        match self {
            LevelIds::Numbers(ids) => ids.is_empty(),
            LevelIds::Names(ids) => ids.is_empty(),
        }
    }
}

/// One instance id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LevelId {
    Number(i64),
    Name(String),
}

impl LevelId {
    /// Read an id back from a selector value.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Integer(i) => Ok(LevelId::Number(*i)),
            Value::String(s) => Ok(LevelId::Name(s.clone())),
            other => Err(Error::other(format!(
                "selector value {:?} is neither an integer nor a name",
                other
            ))),
        }
    }

    /// The value stored under the level key on each instance.
    pub fn to_value(&self) -> Value {
        match self {
            LevelId::Number(i) => Value::Integer(*i),
            LevelId::Name(s) => Value::String(s.clone()),
        }
    }
}

impl From<i64> for LevelId {
    fn from(i: i64) -> Self {
        LevelId::Number(i)
    }
}

impl From<i32> for LevelId {
    fn from(i: i32) -> Self {
        LevelId::Number(i64::from(i))
    }
}

impl From<&str> for LevelId {
    fn from(s: &str) -> Self {
        LevelId::Name(s.to_string())
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelId::Number(i) => write!(f, "{}", i),
            LevelId::Name(s) => write!(f, "{}", s),
        }
    }
}

/// How instance attributes are named from ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdForm {
    /// Integer ids: `motor1`, `motor2`.
    Numbered,
    /// Names given with a leading `_`: `motor_left`, `motor_right`.
    Prefixed,
    /// Plain names: the id is the attribute.
    Named,
}

/// One level of a hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LevelSpec {
    /// Class name; must start with an uppercase letter.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<LevelIds>,
}

impl LevelSpec {
    /// A level with a single instance.
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ids: None,
        }
    }

    /// A level with one instance per integer id.
    pub fn numbered(name: impl Into<String>, ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            name: name.into(),
            ids: Some(LevelIds::Numbers(ids.into_iter().collect())),
        }
    }

    /// A level with one instance per name.
    pub fn named<S: Into<String>>(name: impl Into<String>, ids: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            ids: Some(LevelIds::Names(ids.into_iter().map(Into::into).collect())),
        }
    }

    /// Check the class name and the ids; returns the id form and the ids.
    pub(crate) fn resolve_ids(&self) -> Result<Option<(IdForm, Vec<LevelId>)>> {
        validate_class_name(&self.name)?;
        match &self.ids {
            None => Ok(None),
            Some(ids) if ids.is_empty() => Ok(None),
            Some(LevelIds::Numbers(ids)) => Ok(Some((
                IdForm::Numbered,
                ids.iter().copied().map(LevelId::Number).collect(),
            ))),
            Some(LevelIds::Names(names)) => {
                if let Some(empty) = names.iter().position(|n| n.trim_start_matches('_').is_empty()) {
                    return Err(Error::configuration(format!(
                        "id #{} of '{}' is not a valid attribute name",
                        empty, self.name
                    )));
                }
                let prefixed = names.first().is_some_and(|n| n.starts_with('_'));
                if prefixed {
                    let ids = names
                        .iter()
                        .map(|n| LevelId::Name(n.trim_start_matches('_').to_string()))
                        .collect();
                    Ok(Some((IdForm::Prefixed, ids)))
                } else {
                    let ids = names.iter().cloned().map(LevelId::Name).collect();
                    Ok(Some((IdForm::Named, ids)))
                }
            }
        }
    }
}

/// A whole hierarchy description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HierarchySpec {
    pub root: String,
    #[serde(default)]
    pub levels: Vec<LevelSpec>,
}

impl HierarchySpec {
    /// Parse a JSON description.
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s)
            .map_err(|e| Error::configuration(format!("invalid hierarchy description: {}", e)))
    }
}

/// Class names must start with an uppercase letter.
pub(crate) fn validate_class_name(name: &str) -> Result<()> {
    match name.chars().next() {
        Some(c) if c.is_uppercase() => Ok(()),
        _ => Err(Error::configuration(format!(
            "class name must be capitalized, got '{}'",
            name
        ))),
    }
}

/// The attribute key a level's instances carry their id under: the class
/// name with its first letter lowercased.
pub(crate) fn level_key(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_json_description() {
        let spec = HierarchySpec::from_json_str(
            r#"{ "root": "Machine",
                 "levels": [ { "name": "Axis", "ids": ["x", "y"] },
                             { "name": "Motor" },
                             { "name": "Encoder", "ids": [1, 2] } ] }"#,
        )
        .unwrap();
        assert_eq!(spec.root, "Machine");
        assert_eq!(spec.levels[0], LevelSpec::named("Axis", ["x", "y"]));
        assert_eq!(spec.levels[1], LevelSpec::single("Motor"));
        assert_eq!(spec.levels[2], LevelSpec::numbered("Encoder", [1, 2]));
    }

    #[test]
    fn invalid_json_is_a_configuration_error() {
        let err = HierarchySpec::from_json_str(r#"{ "levels": [] }"#).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn id_forms() {
        let (form, ids) = LevelSpec::named("Axis", ["_left", "_right"])
            .resolve_ids()
            .unwrap()
            .unwrap();
        assert_eq!(form, IdForm::Prefixed);
        assert_eq!(ids, vec![LevelId::from("left"), LevelId::from("right")]);

        let (form, _) = LevelSpec::numbered("Motor", [1]).resolve_ids().unwrap().unwrap();
        assert_eq!(form, IdForm::Numbered);

        assert_eq!(LevelSpec::numbered("Motor", []).resolve_ids().unwrap(), None);
    }

    #[test]
    fn bad_names_are_rejected() {
        assert!(LevelSpec::single("motor").resolve_ids().is_err());
        assert!(LevelSpec::single("").resolve_ids().is_err());
        assert!(LevelSpec::named("Axis", ["x", ""]).resolve_ids().is_err());
        assert!(LevelSpec::named("Axis", ["_"]).resolve_ids().is_err());
    }

    #[test]
    fn level_keys() {
        assert_eq!(level_key("Motor"), "motor");
        assert_eq!(level_key("XAxis"), "xAxis");
    }

    #[test]
    fn selector_values() {
        assert_eq!(LevelId::from_value(&Value::from(3)).unwrap(), LevelId::Number(3));
        assert_eq!(LevelId::from_value(&Value::from("x")).unwrap(), LevelId::from("x"));
        assert!(LevelId::from_value(&Value::from(1.5)).is_err());
        assert_eq!(LevelId::from(2).to_value(), Value::from(2));
    }
}
