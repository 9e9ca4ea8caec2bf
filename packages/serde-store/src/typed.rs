//! Typed access extension trait.

use serde::de::DeserializeOwned;
use serde::Serialize;

use recstore_core::{Key, Resolver};

use crate::convert::{from_value, to_value};
use crate::error::Result;

/// Extension trait for typed reads and writes.
///
/// This trait is automatically implemented for all `Resolver`
/// implementations: containers, functions and bound functions.
///
/// # Example
///
/// ```rust
/// use recstore_core::{ClassBuilder, Container};
/// use recstore_payload::TypedResolver;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Limits {
///     low: i32,
///     high: i32,
/// }
///
/// let class = ClassBuilder::new("Axis").build().unwrap();
/// let axis = Container::new(&class);
/// axis.set_from("limits", &Limits { low: -5, high: 5 }).unwrap();
///
/// let limits: Limits = axis.get_as("limits").unwrap();
/// assert_eq!(limits, Limits { low: -5, high: 5 });
/// ```
pub trait TypedResolver: Resolver {
    /// Resolve a key and deserialize it into a Rust type.
    ///
    /// Hooks are applied before deserializing.
    fn get_as<T: DeserializeOwned>(&self, key: impl Into<Key>) -> Result<T> {
        let value = self.resolve(&key.into())?;
        from_value(value)
    }

    /// Serialize a Rust type and write it through the normal write path.
    fn set_from<T: Serialize>(&self, key: impl Into<Key>, data: &T) -> Result<()> {
        let value = to_value(data)?;
        self.assign(&key.into(), value)?;
        Ok(())
    }

    /// Resolve a key as a serde_json::Value.
    ///
    /// Convenience method when you don't know the exact type.
    fn get_json(&self, key: impl Into<Key>) -> Result<serde_json::Value> {
        self.get_as(key)
    }
}

// Blanket implementation for all Resolvers
impl<R: Resolver + ?Sized> TypedResolver for R {}
