//! Error types for the core layer.

use thiserror::Error;

use crate::key::Key;

/// Errors raised by resolution, specialization and argument substitution.
#[derive(Debug, Error)]
pub enum Error {
    /// No store in the (possibly reduced) chain contains the key.
    #[error("key not found: {0}")]
    KeyNotFound(Key),

    /// A mandatory positional parameter could not be resolved.
    ///
    /// `index` is the position of the parameter in the declared name list.
    #[error("cannot substitute positional argument #{index} with key '{name}'")]
    Substitution { index: usize, name: String },

    /// A mandatory keyword is absent after substitution.
    #[error("missing mandatory keyword '{name}'")]
    MissingKeyword { name: String },

    /// A definition is malformed. Raised at definition time.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// The owner of a specialized container has been dropped.
    #[error("owner is no longer alive")]
    NoParent,

    /// Specializing would make a definition own itself.
    #[error("cyclic ownership: {message}")]
    CyclicOwnership { message: String },

    /// A class has no child definition or function with this name.
    #[error("'{class}' has no attribute '{name}'")]
    NoAttribute { class: String, name: String },

    /// The value at this key cannot be written through.
    #[error("value at key '{0}' is read-only")]
    ReadOnly(Key),

    /// Generic error with message, typically raised by a callable.
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Build a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Build a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        Error::Other {
            message: message.into(),
        }
    }

    /// True for the "missing key" signal used as control flow.
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound(_))
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_not_found_display() {
        let e = Error::KeyNotFound(Key::from("width"));
        assert_eq!(e.to_string(), "key not found: width");
        assert!(e.is_key_not_found());
    }

    #[test]
    fn substitution_display() {
        let e = Error::Substitution {
            index: 0,
            name: "a".to_string(),
        };
        let display = e.to_string();
        assert!(display.contains("#0"));
        assert!(display.contains("'a'"));
        assert!(!e.is_key_not_found());
    }

    #[test]
    fn configuration_display() {
        let e = Error::configuration("no names allowed after the keyword marker");
        assert!(e.to_string().starts_with("configuration error"));
    }

    #[test]
    fn no_attribute_display() {
        let e = Error::NoAttribute {
            class: "Axis".to_string(),
            name: "motor".to_string(),
        };
        assert_eq!(e.to_string(), "'Axis' has no attribute 'motor'");
    }

    #[test]
    fn other_display() {
        assert_eq!(Error::other("boom").to_string(), "boom");
    }
}
