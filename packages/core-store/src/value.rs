//! The Value type - what a store entry holds.
//!
//! A dynamically-typed tree, like JSON, with one extra variant: a computed
//! value whose reads (and optionally writes) are intercepted by a hook.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::hooks::ComputedValue;

/// A value stored in a container, function override store or payload.
///
/// # Design Notes
///
/// - Uses `BTreeMap` for deterministic ordering of nested maps
/// - `Computed` compares by identity: two handles are equal only when they
///   point at the same hook object
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// A computed-value hook. Returned verbatim only by raw reads.
    Computed(Computed),
}

/// Shared handle to a computed-value hook.
#[derive(Clone)]
pub struct Computed(Rc<dyn ComputedValue>);

impl Computed {
    pub fn new<H: ComputedValue + 'static>(hook: H) -> Self {
        Self(Rc::new(hook))
    }

    /// Access the hook.
    pub fn hook(&self) -> &dyn ComputedValue {
        self.0.as_ref()
    }
}

impl PartialEq for Computed {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Computed({})", self.0.describe())
    }
}

impl Value {
    /// Create an empty map.
    pub fn map() -> Self {
        Value::Map(BTreeMap::new())
    }

    /// Wrap a hook as a value.
    pub fn computed<H: ComputedValue + 'static>(hook: H) -> Self {
        Value::Computed(Computed::new(hook))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Check if reads of this value are intercepted.
    pub fn is_computed(&self) -> bool {
        matches!(self, Value::Computed(_))
    }

    pub fn as_computed(&self) -> Option<&Computed> {
        match self {
            Value::Computed(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view; integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}
