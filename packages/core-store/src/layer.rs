//! Layers: the stores a resolution chain is made of.
//!
//! A chain is mostly made of [`LocalStore`]s, each owned (written) by exactly
//! one container but readable by every chain that includes it. The tail of a
//! chain may also hold an arbitrary external mapping through [`Lookup`].

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::{Key, Value};

/// Plain key/value entries.
pub type Entries = HashMap<Key, Value>;

/// Read-only mapping-like object usable at the tail of a chain.
///
/// # Object Safety
///
/// This trait is object-safe: chains hold it as `Rc<dyn Lookup>`.
pub trait Lookup {
    /// The raw value stored under `key`, if any.
    fn lookup(&self, key: &Key) -> Option<Value>;

    /// Every entry of the mapping, in no particular order.
    fn entries(&self) -> Vec<(Key, Value)>;
}

impl Lookup for Entries {
    fn lookup(&self, key: &Key) -> Option<Value> {
        self.get(key).cloned()
    }

    fn entries(&self) -> Vec<(Key, Value)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl Lookup for BTreeMap<Key, Value> {
    fn lookup(&self, key: &Key) -> Option<Value> {
        self.get(key).cloned()
    }

    fn entries(&self) -> Vec<(Key, Value)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl Lookup for BTreeMap<String, Value> {
    fn lookup(&self, key: &Key) -> Option<Value> {
        key.as_name().and_then(|name| self.get(name)).cloned()
    }

    fn entries(&self) -> Vec<(Key, Value)> {
        self.iter()
            .map(|(k, v)| (Key::from(k), v.clone()))
            .collect()
    }
}

/// Shared handle to a mutable key/value store.
///
/// Cloning the handle aliases the store: this is how a child's chain sees
/// writes made later to its owner's local store.
#[derive(Clone, Default)]
pub struct LocalStore(Rc<RefCell<Entries>>);

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Entries) -> Self {
        Self(Rc::new(RefCell::new(entries)))
    }

    /// A new, unaliased store holding a copy of this store's entries.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        Self::from_entries(self.0.borrow().clone())
    }

    pub fn get(&self, key: &Key) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.0.borrow().contains_key(key)
    }

    /// Insert a value, returning the previous one.
    pub fn insert(&self, key: Key, value: Value) -> Option<Value> {
        self.0.borrow_mut().insert(key, value)
    }

    pub fn remove(&self, key: &Key) -> Option<Value> {
        self.0.borrow_mut().remove(key)
    }

    pub fn extend(&self, entries: impl IntoIterator<Item = (Key, Value)>) {
        self.0.borrow_mut().extend(entries);
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Snapshot of the entries.
    pub fn entries(&self) -> Vec<(Key, Value)> {
        Lookup::entries(&*self.0.borrow())
    }

    /// True if both handles alias the same store.
    pub fn ptr_eq(&self, other: &LocalStore) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.borrow().iter()).finish()
    }
}

/// One entry of a resolution chain.
#[derive(Clone)]
pub enum Layer {
    /// A container-owned store.
    Local(LocalStore),
    /// An external read-only mapping.
    External(Rc<dyn Lookup>),
}

impl Layer {
    pub fn lookup(&self, key: &Key) -> Option<Value> {
        match self {
            Layer::Local(store) => store.get(key),
            Layer::External(mapping) => mapping.lookup(key),
        }
    }

    pub fn entries(&self) -> Vec<(Key, Value)> {
        match self {
            Layer::Local(store) => store.entries(),
            Layer::External(mapping) => mapping.entries(),
        }
    }

    pub fn as_local(&self) -> Option<&LocalStore> {
        match self {
            Layer::Local(store) => Some(store),
            Layer::External(_) => None,
        }
    }

    /// True if both layers alias the same underlying store or mapping.
    pub fn ptr_eq(&self, other: &Layer) -> bool {
        match (self, other) {
            (Layer::Local(a), Layer::Local(b)) => a.ptr_eq(b),
            (Layer::External(a), Layer::External(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<LocalStore> for Layer {
    fn from(store: LocalStore) -> Self {
        Layer::Local(store)
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Local(store) => write!(f, "Local({:?})", store),
            Layer::External(_) => write!(f, "External(..)"),
        }
    }
}
