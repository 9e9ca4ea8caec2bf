//! The Key type - what a store entry is addressed by.

use std::fmt;

/// A hashable scalar key: either a name or an integer index.
///
/// Keys order names before indices so aggregate views come out
/// deterministic regardless of insertion order.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Key {
    /// A string key, the common case (parameter names, attribute names).
    Name(String),
    /// An integer key.
    Index(i64),
}

impl Key {
    /// Create a name key.
    pub fn name(name: impl Into<String>) -> Self {
        Key::Name(name.into())
    }

    /// The name, if this is a name key.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Name(name) => Some(name),
            Key::Index(_) => None,
        }
    }

    /// The index, if this is an integer key.
    pub fn as_index(&self) -> Option<i64> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Name(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => write!(f, "{}", name),
            Key::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Name(v.to_string())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Key::Name(v)
    }
}

impl From<&String> for Key {
    fn from(v: &String) -> Self {
        Key::Name(v.clone())
    }
}

impl From<&Key> for Key {
    fn from(v: &Key) -> Self {
        v.clone()
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Index(v)
    }
}

impl From<i32> for Key {
    fn from(v: i32) -> Self {
        Key::Index(v as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_sort_before_indices() {
        let mut keys = vec![Key::from(3), Key::from("b"), Key::from(1), Key::from("a")];
        keys.sort();
        assert_eq!(
            keys,
            vec![Key::from("a"), Key::from("b"), Key::from(1), Key::from(3)]
        );
    }

    #[test]
    fn display() {
        assert_eq!(Key::from("width").to_string(), "width");
        assert_eq!(Key::from(-4).to_string(), "-4");
    }

    #[test]
    fn accessors() {
        assert_eq!(Key::from("x").as_name(), Some("x"));
        assert_eq!(Key::from("x").as_index(), None);
        assert_eq!(Key::from(7).as_index(), Some(7));
        assert_eq!(Key::from(7).as_name(), None);
    }
}
