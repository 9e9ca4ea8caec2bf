//! Container: a local store plus a three-segment resolution chain.
//!
//! Reads walk the chain front to back; writes land in the local store
//! unless the existing value carries a write hook. Owner-scoped children
//! and bound functions are produced by [`Container::child`] and
//! [`Container::function`], see the `specialize` module.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::chain::{ResolutionChain, Segment};
use crate::class::{Class, Transformer};
use crate::function::OverrideChain;
use crate::hooks::resolve_computed;
use crate::identity::{DefinitionId, TieredCache};
use crate::layer::{Layer, LocalStore, Lookup};
use crate::{BoundFunc, Error, Key, Resolver, Result, Value};

pub(crate) struct ContainerState {
    pub(crate) id: DefinitionId,
    pub(crate) class: Rc<Class>,
    pub(crate) chain: ResolutionChain,
    pub(crate) blocked: HashSet<Key>,
    pub(crate) prototypes: HashMap<Key, Transformer>,
    pub(crate) owner: Option<Weak<RefCell<ContainerState>>>,
    pub(crate) children: TieredCache<Container>,
    pub(crate) functions: TieredCache<OverrideChain>,
}

/// Shared handle to a container.
///
/// Cloning the handle aliases the container (use [`clone_with`] or
/// [`clone_detached`] for an independent copy).
///
/// [`clone_with`]: Container::clone_with
/// [`clone_detached`]: Container::clone_detached
#[derive(Clone)]
pub struct Container {
    inner: Rc<RefCell<ContainerState>>,
}

impl Container {
    /// Build a prototype instance of `class`.
    pub fn new(class: &Rc<Class>) -> Self {
        let shared = LocalStore::from_entries(class.shared().clone());
        let class_layers = class
            .parameter_stores()
            .iter()
            .map(|entries| Layer::Local(LocalStore::from_entries(entries.clone())))
            .collect();

        Self::from_state(ContainerState {
            id: DefinitionId::new(),
            class: Rc::clone(class),
            chain: ResolutionChain::new(shared, Vec::new(), class_layers, Vec::new()),
            blocked: class.blocked().clone(),
            prototypes: class.prototypes().clone(),
            owner: None,
            children: TieredCache::new(),
            functions: TieredCache::new(),
        })
    }

    /// [`new`](Container::new) followed by a [`set`](Container::set) per value.
    pub fn with_values<K: Into<Key>, V: Into<Value>>(
        class: &Rc<Class>,
        values: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self> {
        let container = Self::new(class);
        container.update(values)?;
        Ok(container)
    }

    pub(crate) fn from_state(state: ContainerState) -> Self {
        Self {
            inner: Rc::new(RefCell::new(state)),
        }
    }

    pub(crate) fn state(&self) -> Ref<'_, ContainerState> {
        self.inner.borrow()
    }

    pub(crate) fn state_mut(&self) -> RefMut<'_, ContainerState> {
        self.inner.borrow_mut()
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<ContainerState>> {
        Rc::downgrade(&self.inner)
    }

    /// Identity of the class-level definition this container derives from.
    pub fn id(&self) -> DefinitionId {
        self.state().id
    }

    pub fn class(&self) -> Rc<Class> {
        Rc::clone(&self.state().class)
    }

    /// True if both handles point to the same container.
    pub fn ptr_eq(&self, other: &Container) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The store writes land in.
    pub fn local(&self) -> LocalStore {
        self.state().chain.local().clone()
    }

    /// Snapshot of the resolution chain.
    pub fn chain(&self) -> ResolutionChain {
        self.state().chain.clone()
    }

    /// True once the container carries stores of its own beyond its
    /// bootstrap store, i.e. it is a specialization or a clone.
    pub fn is_instantiated(&self) -> bool {
        self.state().chain.segment(Segment::Instance).len() > 1
    }

    /// The owner this container was specialized through.
    pub fn owner(&self) -> Result<Container> {
        self.state()
            .owner
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Container { inner })
            .ok_or(Error::NoParent)
    }

    /// Find the stored value for `key` and the layer holding it.
    pub fn find(&self, key: &Key) -> Result<(Layer, Value)> {
        let state = self.state();
        if let Some(found) = state.chain.find_own(key) {
            return Ok(found);
        }
        if state.blocked.contains(key) || state.chain.segment(Segment::Inherited).is_empty() {
            return Err(Error::KeyNotFound(key.clone()));
        }
        if let Some(owner) = &state.owner {
            if owner.strong_count() == 0 {
                return Err(Error::NoParent);
            }
        }
        state
            .chain
            .find_inherited(key)
            .ok_or_else(|| Error::KeyNotFound(key.clone()))
    }

    /// Resolve `key`, running computed-value hooks.
    pub fn get(&self, key: impl Into<Key>) -> Result<Value> {
        let key = key.into();
        let (layer, value) = self.find(&key)?;
        resolve_computed(value, self, Some(&layer), &key)
    }

    /// Resolve `key` and return the stored value verbatim.
    pub fn get_raw(&self, key: impl Into<Key>) -> Result<Value> {
        let key = key.into();
        self.find(&key).map(|(_, value)| value)
    }

    pub fn contains(&self, key: impl Into<Key>) -> bool {
        self.find(&key.into()).is_ok()
    }

    /// Write `key` through hooks and prototype transformers.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        let value = value.into();

        match self.find(&key) {
            Ok((layer, Value::Computed(computed))) if computed.hook().accepts_writes() => {
                return computed.hook().write(self, Some(&layer), &key, value);
            }
            Ok(_) | Err(Error::KeyNotFound(_)) | Err(Error::NoParent) => {}
            Err(e) => return Err(e),
        }

        let transformer = self.state().prototypes.get(&key).cloned();
        let value = match transformer {
            Some(transform) => transform(value)?,
            None => value,
        };
        self.local().insert(key, value);
        Ok(())
    }

    /// Write directly into the local store.
    pub fn set_raw(&self, key: impl Into<Key>, value: impl Into<Value>) {
        self.local().insert(key.into(), value.into());
    }

    /// Remove `key` from the local store. Ancestor stores are never touched.
    pub fn delete(&self, key: impl Into<Key>) -> Result<Value> {
        let key = key.into();
        self.local()
            .remove(&key)
            .ok_or(Error::KeyNotFound(key))
    }

    /// Stop taking these keys from the inherited segment.
    pub fn block<K: Into<Key>>(&self, keys: impl IntoIterator<Item = K>) {
        self.state_mut()
            .blocked
            .extend(keys.into_iter().map(Into::into));
    }

    /// Undo [`block`](Container::block). Unknown keys are ignored.
    pub fn release<K: Into<Key>>(&self, keys: impl IntoIterator<Item = K>) {
        let mut state = self.state_mut();
        for key in keys {
            state.blocked.remove(&key.into());
        }
    }

    pub fn is_blocked(&self, key: impl Into<Key>) -> bool {
        self.state().blocked.contains(&key.into())
    }

    pub fn setdefault(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<Value> {
        let key = key.into();
        match self.get(key.clone()) {
            Err(Error::KeyNotFound(_)) => {
                let value = value.into();
                self.set(key, value.clone())?;
                Ok(value)
            }
            other => other,
        }
    }

    /// Route every entry through [`set`](Container::set).
    pub fn update<K: Into<Key>, V: Into<Value>>(
        &self,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Flattened snapshot of the whole chain; more specific stores win.
    pub fn items(&self) -> BTreeMap<Key, Value> {
        self.state().chain.merged()
    }

    pub fn keys(&self) -> Vec<Key> {
        self.items().into_keys().collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.items().into_values().collect()
    }

    /// Every entry of every store, most specific store first, duplicates kept.
    pub fn iter_all_items(&self) -> impl Iterator<Item = (Key, Value)> {
        self.state().chain.all_entries().into_iter()
    }

    /// Append a read-only mapping at the tail of the inherited segment.
    pub fn with_fallback(&self, mapping: impl Lookup + 'static) {
        self.state_mut()
            .chain
            .push_inherited(Layer::External(Rc::new(mapping)));
    }

    /// The class-level child `name`, specialized through this container.
    pub fn child(&self, name: &str) -> Result<Container> {
        let class = self.class();
        let definition = class.child(name).ok_or_else(|| Error::NoAttribute {
            class: class.name().to_string(),
            name: name.to_string(),
        })?;
        definition.specialize(self)
    }

    /// The class-level function `name`, bound to this container.
    pub fn function(&self, name: &str) -> Result<BoundFunc> {
        let class = self.class();
        let function = class.function(name).ok_or_else(|| Error::NoAttribute {
            class: class.name().to_string(),
            name: name.to_string(),
        })?;
        Ok(function.bind(self))
    }
}

impl Resolver for Container {
    fn resolve(&self, key: &Key) -> Result<Value> {
        self.get(key)
    }

    fn resolve_raw(&self, key: &Key) -> Result<Value> {
        self.get_raw(key)
    }

    fn assign(&self, key: &Key, value: Value) -> Result<()> {
        self.set(key, value)
    }

    fn resolved_items(&self) -> Result<BTreeMap<Key, Value>> {
        let mut resolved = BTreeMap::new();
        for key in self.keys() {
            match self.get(&key) {
                Ok(value) => {
                    resolved.insert(key, value);
                }
                Err(Error::KeyNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(resolved)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Container")
            .field("class", &state.class.name())
            .field("id", &state.id)
            .field("local", state.chain.local())
            .field("layers", &state.chain.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{alias, cycle, Alias};
    use crate::ClassBuilder;

    fn point() -> Rc<Class> {
        ClassBuilder::new("Point")
            .parameter("x", 0)
            .parameter("y", 0)
            .prototype("label", |v| {
                Ok(Value::from(v.as_str().unwrap_or_default().to_uppercase()))
            })
            .build()
            .unwrap()
    }

    #[test]
    fn local_shadows_class() {
        let p = Container::new(&point());
        assert_eq!(p.get("x").unwrap(), Value::from(0));
        p.set("x", 3).unwrap();
        assert_eq!(p.get("x").unwrap(), Value::from(3));
        assert_eq!(p.delete("x").unwrap(), Value::from(3));
        assert_eq!(p.get("x").unwrap(), Value::from(0));
    }

    #[test]
    fn delete_never_touches_class_stores() {
        let p = Container::new(&point());
        assert!(p.delete("x").unwrap_err().is_key_not_found());
        assert_eq!(p.get("x").unwrap(), Value::from(0));
    }

    #[test]
    fn missing_key() {
        let p = Container::new(&point());
        assert!(matches!(p.get("z"), Err(Error::KeyNotFound(_))));
        assert!(!p.contains("z"));
    }

    #[test]
    fn transformer_applies_on_set_but_not_raw() {
        let p = Container::new(&point());
        p.set("label", "north").unwrap();
        assert_eq!(p.get("label").unwrap(), Value::from("NORTH"));
        p.set("label", "south").unwrap();
        assert_eq!(p.get("label").unwrap(), Value::from("SOUTH"));
        p.set_raw("label", "raw");
        assert_eq!(p.get("label").unwrap(), Value::from("raw"));
    }

    #[test]
    fn with_values_routes_through_set() {
        let p = Container::with_values(&point(), [("label", "a"), ("x", "b")]).unwrap();
        assert_eq!(p.get("label").unwrap(), Value::from("A"));
        assert_eq!(p.get("x").unwrap(), Value::from("b"));
    }

    #[test]
    fn setdefault_keeps_existing() {
        let p = Container::new(&point());
        assert_eq!(p.setdefault("x", 9).unwrap(), Value::from(0));
        assert_eq!(p.setdefault("z", 9).unwrap(), Value::from(9));
        assert_eq!(p.get("z").unwrap(), Value::from(9));
    }

    #[test]
    fn hooks_resolve_unless_raw() {
        let p = Container::new(&point());
        p.set("c", cycle(vec![1.into(), 2.into()]).unwrap()).unwrap();
        assert_eq!(p.get("c").unwrap(), Value::from(1));
        assert_eq!(p.get("c").unwrap(), Value::from(2));
        assert!(p.get_raw("c").unwrap().is_computed());
    }

    #[test]
    fn read_only_alias_rejects_writes() {
        let p = Container::new(&point());
        p.set("w", alias("x")).unwrap();
        assert_eq!(p.get("w").unwrap(), Value::from(0));
        // a read-only alias is replaced by the write
        p.set("w", 5).unwrap();
        assert_eq!(p.get("w").unwrap(), Value::from(5));
        assert_eq!(p.get("x").unwrap(), Value::from(0));
    }

    #[test]
    fn writable_alias_writes_through() {
        let p = Container::new(&point());
        p.set("w", Alias::key("x").writable().unwrap().into_value())
            .unwrap();
        p.set("w", 4).unwrap();
        assert_eq!(p.get("x").unwrap(), Value::from(4));
        assert_eq!(p.get("w").unwrap(), Value::from(4));
    }

    #[test]
    fn aggregates() {
        let p = Container::new(&point());
        p.set("x", 1).unwrap();
        let items = p.items();
        assert_eq!(items[&Key::from("x")], Value::from(1));
        assert_eq!(items[&Key::from("y")], Value::from(0));
        assert_eq!(p.keys(), vec![Key::from("x"), Key::from("y")]);
        assert_eq!(p.values().len(), 2);

        let raw: Vec<(Key, Value)> = p.iter_all_items().collect();
        assert_eq!(raw.len(), 3);
        assert_eq!(raw[0], (Key::from("x"), Value::from(1)));
    }

    #[test]
    fn fallback_mapping_answers_last() {
        let p = Container::new(&point());
        let mut fallback = BTreeMap::new();
        fallback.insert(Key::from("x"), Value::from(100));
        fallback.insert(Key::from("z"), Value::from(26));
        p.with_fallback(fallback);
        assert_eq!(p.get("x").unwrap(), Value::from(0));
        assert_eq!(p.get("z").unwrap(), Value::from(26));

        p.block(["z"]);
        assert!(p.get("z").unwrap_err().is_key_not_found());
        p.release(["z"]);
        assert_eq!(p.get("z").unwrap(), Value::from(26));
    }

    #[test]
    fn unknown_child_and_function() {
        let p = Container::new(&point());
        assert!(matches!(p.child("nope"), Err(Error::NoAttribute { .. })));
        assert!(matches!(p.function("nope"), Err(Error::NoAttribute { .. })));
    }

    #[test]
    fn top_level_container_has_no_owner() {
        let p = Container::new(&point());
        assert!(matches!(p.owner(), Err(Error::NoParent)));
        assert!(!p.is_instantiated());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::ClassBuilder;
    use proptest::prelude::*;

    proptest! {
        /// The most specific store holding a key wins, whatever the values.
        #[test]
        fn prop_most_specific_wins(local in any::<i64>(), class in any::<i64>(), owner in any::<i64>()) {
            let leaf = ClassBuilder::new("Leaf").parameter("k", class).build().unwrap();
            let root = ClassBuilder::new("Root")
                .child("leaf", Container::new(&leaf))
                .build()
                .unwrap();
            let r = Container::new(&root);
            r.set("k", owner).unwrap();
            let c = r.child("leaf").unwrap();

            prop_assert_eq!(c.get("k").unwrap(), Value::from(class));
            c.set("k", local).unwrap();
            prop_assert_eq!(c.get("k").unwrap(), Value::from(local));
            c.delete("k").unwrap();
            prop_assert_eq!(c.get("k").unwrap(), Value::from(class));
        }

        /// Blocking then releasing an inherited key restores its value.
        #[test]
        fn prop_block_release_roundtrip(name in "[a-z]{1,8}", value in any::<i64>()) {
            let leaf = ClassBuilder::new("Leaf").build().unwrap();
            let root = ClassBuilder::new("Root")
                .child("leaf", Container::new(&leaf))
                .build()
                .unwrap();
            let r = Container::new(&root);
            r.set(name.as_str(), value).unwrap();
            let c = r.child("leaf").unwrap();

            prop_assert_eq!(c.get(name.as_str()).unwrap(), Value::from(value));
            c.block([name.as_str()]);
            prop_assert!(c.get(name.as_str()).unwrap_err().is_key_not_found());
            c.release([name.as_str()]);
            prop_assert_eq!(c.get(name.as_str()).unwrap(), Value::from(value));
        }
    }
}
