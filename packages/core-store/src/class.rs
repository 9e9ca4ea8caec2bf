//! Class-level definitions.
//!
//! A [`Class`] describes what every container built from it starts with:
//! parameter stores for the class segment, shared parameters seeding the
//! instance segment, prototype transformers, default blocked keys, and the
//! named child definitions and functions that owners specialize on access.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use crate::layer::Entries;
use crate::{Container, Error, Key, RecFunc, Result, Value};

/// Converts a value before it is stored under a given key.
pub type Transformer = Rc<dyn Fn(Value) -> Result<Value>>;

/// An immutable class definition. Build with [`ClassBuilder`].
pub struct Class {
    name: String,
    parameters: Vec<Entries>,
    shared: Entries,
    prototypes: HashMap<Key, Transformer>,
    blocked: HashSet<Key>,
    children: BTreeMap<String, Container>,
    functions: BTreeMap<String, RecFunc>,
    recursive: bool,
}

impl Class {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter stores, own first then bases in resolution order.
    pub fn parameter_stores(&self) -> &[Entries] {
        &self.parameters
    }

    pub fn shared(&self) -> &Entries {
        &self.shared
    }

    pub fn prototypes(&self) -> &HashMap<Key, Transformer> {
        &self.prototypes
    }

    pub fn blocked(&self) -> &HashSet<Key> {
        &self.blocked
    }

    /// The class-level child definition named `name`.
    pub fn child(&self, name: &str) -> Option<&Container> {
        self.children.get(name)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &Container)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn function(&self, name: &str) -> Option<&RecFunc> {
        self.functions.get(name)
    }

    pub fn functions(&self) -> impl Iterator<Item = (&str, &RecFunc)> {
        self.functions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Non-recursive classes are never specialized through an owner.
    pub fn is_recursive(&self) -> bool {
        self.recursive
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`Class`]. Validation happens in [`build`](ClassBuilder::build).
///
/// # Example
///
/// ```rust
/// use recstore_core::{ClassBuilder, Container, Value};
///
/// let motor = ClassBuilder::new("Motor").parameter("speed", 10).build().unwrap();
/// let axis = ClassBuilder::new("Axis")
///     .child("motor", Container::new(&motor))
///     .build()
///     .unwrap();
///
/// let x = Container::new(&axis);
/// x.set("speed", 20).unwrap();
/// let m = x.child("motor").unwrap();
/// assert_eq!(m.get("speed").unwrap(), Value::from(10));
/// ```
pub struct ClassBuilder {
    name: String,
    parameters: Entries,
    shared: Entries,
    prototypes: HashMap<Key, Transformer>,
    blocked: HashSet<Key>,
    children: Vec<(String, Container)>,
    functions: Vec<(String, RecFunc)>,
    bases: Vec<Rc<Class>>,
    recursive: bool,
}

impl ClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Entries::new(),
            shared: Entries::new(),
            prototypes: HashMap::new(),
            blocked: HashSet::new(),
            children: Vec::new(),
            functions: Vec::new(),
            bases: Vec::new(),
            recursive: true,
        }
    }

    /// Add a class-segment default.
    pub fn parameter(mut self, key: impl Into<Key>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn parameters<K: Into<Key>, V: Into<Value>>(
        mut self,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.parameters
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add a shared parameter, copied into each new instance's own store.
    pub fn shared(mut self, key: impl Into<Key>, value: impl Into<Value>) -> Self {
        self.shared.insert(key.into(), value.into());
        self
    }

    /// Register a transformer applied to values written under `key`.
    pub fn prototype(
        mut self,
        key: impl Into<Key>,
        f: impl Fn(Value) -> Result<Value> + 'static,
    ) -> Self {
        self.prototypes.insert(key.into(), Rc::new(f));
        self
    }

    /// Block a key from being taken from owners by default.
    pub fn block(mut self, key: impl Into<Key>) -> Self {
        self.blocked.insert(key.into());
        self
    }

    /// Attach a class-level child definition.
    pub fn child(mut self, name: impl Into<String>, definition: Container) -> Self {
        self.children.push((name.into(), definition));
        self
    }

    /// Attach a class-level function.
    pub fn function(mut self, name: impl Into<String>, function: RecFunc) -> Self {
        self.functions.push((name.into(), function));
        self
    }

    /// Inherit from a base class. Earlier bases take precedence.
    pub fn extends(mut self, base: &Rc<Class>) -> Self {
        self.bases.push(Rc::clone(base));
        self
    }

    pub fn non_recursive(mut self) -> Self {
        self.recursive = false;
        self
    }

    pub fn build(self) -> Result<Rc<Class>> {
        if self.name.is_empty() {
            return Err(Error::configuration("class name must not be empty"));
        }

        let mut children = BTreeMap::new();
        for (name, definition) in self.children {
            validate_attribute(&self.name, &name)?;
            if children.insert(name.clone(), definition).is_some() {
                return Err(Error::configuration(format!(
                    "child '{}' already exists on '{}'",
                    name, self.name
                )));
            }
        }

        let mut functions = BTreeMap::new();
        for (name, function) in self.functions {
            validate_attribute(&self.name, &name)?;
            if children.contains_key(&name) || functions.insert(name.clone(), function).is_some()
            {
                return Err(Error::configuration(format!(
                    "attribute '{}' already exists on '{}'",
                    name, self.name
                )));
            }
        }

        let mut parameters = vec![self.parameters];
        let mut shared = self.shared;
        let mut prototypes = self.prototypes;
        let mut blocked = self.blocked;

        for base in &self.bases {
            parameters.extend(base.parameters.iter().cloned());
            for (k, v) in &base.shared {
                shared.entry(k.clone()).or_insert_with(|| v.clone());
            }
            for (k, f) in &base.prototypes {
                prototypes.entry(k.clone()).or_insert_with(|| Rc::clone(f));
            }
            blocked.extend(base.blocked.iter().cloned());
            for (name, definition) in &base.children {
                if !functions.contains_key(name) {
                    children
                        .entry(name.clone())
                        .or_insert_with(|| definition.clone());
                }
            }
            for (name, function) in &base.functions {
                if !children.contains_key(name) {
                    functions
                        .entry(name.clone())
                        .or_insert_with(|| function.clone());
                }
            }
        }

        Ok(Rc::new(Class {
            name: self.name,
            parameters,
            shared,
            prototypes,
            blocked,
            children,
            functions,
            recursive: self.recursive,
        }))
    }
}

/// Attribute names must be identifiers: XID_Start or `_` first, then XID_Continue.
fn validate_attribute(class: &str, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c == '_' || unicode_ident::is_xid_start(c));
    if !valid_start || !chars.all(unicode_ident::is_xid_continue) {
        return Err(Error::configuration(format!(
            "'{}' is not a valid attribute name on '{}'",
            name, class
        )));
    }
    Ok(())
}
