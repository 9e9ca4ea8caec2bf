//! Core trait: Resolver.

use std::collections::BTreeMap;

use crate::{Error, Key, Result, Value};

/// Something keys can be resolved against.
///
/// Implemented by containers, function definitions and bound functions; it
/// is what computed-value hooks see as "the reading object" and what
/// argument substitution pulls missing arguments from.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `&dyn Resolver`.
pub trait Resolver {
    /// Resolve a key, running computed-value hooks.
    ///
    /// # Returns
    ///
    /// * `Ok(value)` - The resolved value.
    /// * `Err(Error::KeyNotFound)` - No layer holds the key.
    /// * `Err(_)` - Resolution failed for another reason.
    fn resolve(&self, key: &Key) -> Result<Value>;

    /// Resolve a key, returning the stored value verbatim.
    fn resolve_raw(&self, key: &Key) -> Result<Value>;

    /// Write a value through the object's normal write path.
    fn assign(&self, key: &Key, value: Value) -> Result<()>;

    /// Every key the object can resolve, with hooks applied.
    fn resolved_items(&self) -> Result<BTreeMap<Key, Value>>;
}

/// A plain map as a read-only resolution source.
impl Resolver for BTreeMap<Key, Value> {
    fn resolve(&self, key: &Key) -> Result<Value> {
        let value = self.resolve_raw(key)?;
        crate::hooks::resolve_computed(value, self, None, key)
    }

    fn resolve_raw(&self, key: &Key) -> Result<Value> {
        self.get(key)
            .cloned()
            .ok_or_else(|| Error::KeyNotFound(key.clone()))
    }

    fn assign(&self, key: &Key, _value: Value) -> Result<()> {
        Err(Error::ReadOnly(key.clone()))
    }

    fn resolved_items(&self) -> Result<BTreeMap<Key, Value>> {
        self.keys()
            .map(|key| Ok((key.clone(), self.resolve(key)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collection_literals::btree;

    #[test]
    fn plain_map_resolves() {
        let map: BTreeMap<Key, Value> = btree! {
            Key::from("b") => Value::from(5),
        };

        assert_eq!(map.resolve(&Key::from("b")).unwrap(), Value::from(5));
        assert!(map.resolve(&Key::from("a")).unwrap_err().is_key_not_found());
        assert_eq!(map.resolved_items().unwrap().len(), 1);
    }

    #[test]
    fn plain_map_is_read_only() {
        let map: BTreeMap<Key, Value> = BTreeMap::new();
        let err = map.assign(&Key::from("a"), Value::Null).unwrap_err();
        assert!(matches!(err, Error::ReadOnly(_)));
    }

    #[test]
    fn object_safety_works() {
        let mut map = BTreeMap::new();
        map.insert(Key::from("x"), Value::from(1));
        let dynamic: &dyn Resolver = &map;
        assert_eq!(dynamic.resolve(&Key::from("x")).unwrap(), Value::from(1));
    }
}
