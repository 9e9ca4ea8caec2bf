//! Callables whose missing arguments are resolved through a chain.
//!
//! A [`RecFunc`] is a class-level definition: an implementation, an
//! [`ArgSpec`] and a chain of capture stores holding defaults. Binding it to
//! a container yields a [`BoundFunc`] whose own override store is searched
//! first, then the captures, then the owner.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use log::trace;

use crate::argspec::Kwargs;
use crate::hooks::resolve_computed;
use crate::identity::{DefinitionId, Tier};
use crate::layer::{Layer, LocalStore};
use crate::{ArgSpec, Container, Error, Key, Resolver, Result, Value};

/// What an implementation receives once substitution is done.
#[derive(Debug)]
pub struct Invocation {
    /// The container a method-convention function is bound to.
    pub owner: Option<Container>,
    pub args: Vec<Value>,
    pub kwargs: Kwargs,
}

impl Invocation {
    /// Positional argument `index`.
    pub fn arg(&self, index: usize) -> Result<&Value> {
        self.args
            .get(index)
            .ok_or_else(|| Error::other(format!("missing positional argument #{}", index)))
    }

    pub fn kwarg(&self, name: &str) -> Option<&Value> {
        self.kwargs.get(name)
    }

    /// The bound owner. Fails with `NoParent` for unbound or static calls.
    pub fn owner(&self) -> Result<&Container> {
        self.owner.as_ref().ok_or(Error::NoParent)
    }
}

/// The body of a callable.
pub type Implementation = Rc<dyn Fn(Invocation) -> Result<Value>>;

/// Whether the owner is passed to the implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CallingConvention {
    /// The first parameter name is reserved for the owner.
    #[default]
    Method,
    /// No implicit owner argument.
    Static,
}

impl CallingConvention {
    fn offset(self) -> usize {
        match self {
            CallingConvention::Method => 1,
            CallingConvention::Static => 0,
        }
    }
}

/// Chain of override stores, most specific first. Never empty.
#[derive(Clone)]
pub(crate) struct OverrideChain(Vec<LocalStore>);

impl OverrideChain {
    fn new() -> Self {
        Self(vec![LocalStore::new()])
    }

    /// A fresh leading store in front of this chain.
    pub(crate) fn fork(&self) -> Self {
        let mut stores = Vec::with_capacity(self.0.len() + 1);
        stores.push(LocalStore::new());
        stores.extend(self.0.iter().cloned());
        Self(stores)
    }

    fn leading(&self) -> &LocalStore {
        &self.0[0]
    }

    fn find(&self, key: &Key) -> Option<(Layer, Value)> {
        self.0
            .iter()
            .find_map(|store| store.get(key).map(|v| (Layer::Local(store.clone()), v)))
    }

    fn merged(&self) -> BTreeMap<Key, Value> {
        let mut merged = BTreeMap::new();
        for store in self.0.iter().rev() {
            merged.extend(store.entries());
        }
        merged
    }

    /// Raw lookup, write-hook delegation, else write the leading store.
    fn write(&self, target: &dyn Resolver, key: Key, value: Value) -> Result<()> {
        if let Some((_, Value::Computed(computed))) = self.find(&key) {
            if computed.hook().accepts_writes() {
                let leading = Layer::Local(self.leading().clone());
                return computed.hook().write(target, Some(&leading), &key, value);
            }
        }
        self.leading().insert(key, value);
        Ok(())
    }

    fn remove(&self, key: &Key) -> Result<Value> {
        self.leading()
            .remove(key)
            .ok_or_else(|| Error::KeyNotFound(key.clone()))
    }
}

struct FuncDef {
    id: DefinitionId,
    argspec: ArgSpec,
    implementation: Implementation,
    captures: OverrideChain,
    convention: CallingConvention,
    doc: Option<String>,
}

/// A class-level callable definition.
///
/// ```rust
/// use recstore_core::{ArgSpec, ClassBuilder, Container, Invocation, RecFunc, Value};
///
/// let area = RecFunc::new(ArgSpec::new(3, ["self", "w", "h"]).unwrap(), |call: Invocation| {
///     let w = call.arg(0)?.as_i64().unwrap_or(0);
///     let h = call.arg(1)?.as_i64().unwrap_or(0);
///     Ok(Value::from(w * h))
/// });
/// let rect = ClassBuilder::new("Rect")
///     .parameter("w", 2)
///     .parameter("h", 3)
///     .function("area", area)
///     .build()
///     .unwrap();
///
/// let r = Container::new(&rect);
/// let bound = r.function("area").unwrap();
/// assert_eq!(bound.call(vec![], Default::default()).unwrap(), Value::from(6));
/// assert_eq!(bound.call(vec![Value::from(10)], Default::default()).unwrap(), Value::from(30));
/// ```
#[derive(Clone)]
pub struct RecFunc {
    inner: Rc<FuncDef>,
}

impl RecFunc {
    /// A method-convention function with no captured defaults.
    pub fn new(argspec: ArgSpec, f: impl Fn(Invocation) -> Result<Value> + 'static) -> Self {
        Self::with_convention(argspec, CallingConvention::Method, f)
    }

    /// A static-convention function: no owner, substitution from offset 0.
    pub fn new_static(argspec: ArgSpec, f: impl Fn(Invocation) -> Result<Value> + 'static) -> Self {
        Self::with_convention(argspec, CallingConvention::Static, f)
    }

    pub fn with_convention(
        argspec: ArgSpec,
        convention: CallingConvention,
        f: impl Fn(Invocation) -> Result<Value> + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(FuncDef {
                id: DefinitionId::new(),
                argspec,
                implementation: Rc::new(f),
                captures: OverrideChain::new(),
                convention,
                doc: None,
            }),
        }
    }

    /// Capture a default, builder style.
    pub fn default_value(self, key: impl Into<Key>, value: impl Into<Value>) -> Self {
        self.inner
            .captures
            .leading()
            .insert(key.into(), value.into());
        self
    }

    /// Attach documentation. Only possible before the definition is shared.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Result<Self> {
        match Rc::get_mut(&mut self.inner) {
            Some(def) => {
                def.doc = Some(doc.into());
                Ok(self)
            }
            None => Err(Error::configuration(
                "documentation must be set before the function is shared",
            )),
        }
    }

    pub fn id(&self) -> DefinitionId {
        self.inner.id
    }

    pub fn argspec(&self) -> &ArgSpec {
        &self.inner.argspec
    }

    pub fn convention(&self) -> CallingConvention {
        self.inner.convention
    }

    pub fn doc(&self) -> Option<&str> {
        self.inner.doc.as_deref()
    }

    pub fn get(&self, key: impl Into<Key>) -> Result<Value> {
        let key = key.into();
        let (layer, value) = self
            .inner
            .captures
            .find(&key)
            .ok_or_else(|| Error::KeyNotFound(key.clone()))?;
        resolve_computed(value, self, Some(&layer), &key)
    }

    pub fn get_raw(&self, key: impl Into<Key>) -> Result<Value> {
        let key = key.into();
        self.inner
            .captures
            .find(&key)
            .map(|(_, value)| value)
            .ok_or(Error::KeyNotFound(key))
    }

    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<()> {
        self.inner.captures.write(self, key.into(), value.into())
    }

    pub fn delete(&self, key: impl Into<Key>) -> Result<Value> {
        self.inner.captures.remove(&key.into())
    }

    /// Call without an owner: substitution reads the captures only.
    pub fn call(&self, args: Vec<Value>, kwargs: Kwargs) -> Result<Value> {
        let (args, kwargs) = self.inner.argspec.substitute(self, args, kwargs, 0)?;
        (self.inner.implementation)(Invocation {
            owner: None,
            args,
            kwargs,
        })
    }

    /// Bind to `owner`, reusing the override chain cached on it.
    pub fn bind(&self, owner: &Container) -> BoundFunc {
        let id = self.id();
        let tier = if owner.is_instantiated() {
            Tier::Hard
        } else {
            Tier::Soft
        };

        let cached = owner.state().functions.get(tier, &id);
        let overrides = match cached {
            Some(overrides) => overrides,
            None => {
                let origin = match tier {
                    Tier::Hard => owner.state().functions.get(Tier::Soft, &id),
                    Tier::Soft => None,
                };
                trace!("binding function {} ({:?}, origin: {})", id, tier, origin.is_some());
                let overrides = origin.as_ref().unwrap_or(&self.inner.captures).fork();
                owner
                    .state_mut()
                    .functions
                    .insert(tier, id, overrides.clone());
                overrides
            }
        };

        BoundFunc {
            func: self.clone(),
            overrides,
            owner: owner.clone(),
        }
    }
}

impl Resolver for RecFunc {
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
        self.inner
            .captures
            .merged()
            .into_keys()
            .map(|key| Ok((key.clone(), self.get(key)?)))
            .collect()
    }
}

impl fmt::Debug for RecFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecFunc")
            .field("id", &self.inner.id)
            .field("argspec", &self.inner.argspec)
            .field("convention", &self.inner.convention)
            .finish()
    }
}

/// A [`RecFunc`] bound to an owner container.
///
/// Handles obtained for the same owner share the same override store.
#[derive(Clone)]
pub struct BoundFunc {
    func: RecFunc,
    overrides: OverrideChain,
    owner: Container,
}

impl BoundFunc {
    pub fn func(&self) -> &RecFunc {
        &self.func
    }

    pub fn owner(&self) -> &Container {
        &self.owner
    }

    /// The leading store writes land in.
    pub fn overrides(&self) -> LocalStore {
        self.overrides.leading().clone()
    }

    /// Resolve from the override chain, then from the owner.
    pub fn get(&self, key: impl Into<Key>) -> Result<Value> {
        let key = key.into();
        match self.overrides.find(&key) {
            Some((layer, value)) => resolve_computed(value, self, Some(&layer), &key),
            None => self.owner.get(key),
        }
    }

    pub fn get_raw(&self, key: impl Into<Key>) -> Result<Value> {
        let key = key.into();
        match self.overrides.find(&key) {
            Some((_, value)) => Ok(value),
            None => self.owner.get_raw(key),
        }
    }

    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<()> {
        self.overrides.write(self, key.into(), value.into())
    }

    pub fn delete(&self, key: impl Into<Key>) -> Result<Value> {
        self.overrides.remove(&key.into())
    }

    /// Substitute missing arguments from `self`, then run the implementation.
    pub fn call(&self, args: Vec<Value>, kwargs: Kwargs) -> Result<Value> {
        let convention = self.func.convention();
        let (args, kwargs) =
            self.func
                .argspec()
                .substitute(self, args, kwargs, convention.offset())?;
        let owner = match convention {
            CallingConvention::Method => Some(self.owner.clone()),
            CallingConvention::Static => None,
        };
        (self.func.inner.implementation)(Invocation {
            owner,
            args,
            kwargs,
        })
    }
}

impl Resolver for BoundFunc {
    fn resolve(&self, key: &Key) -> Result<Value> {
        self.get(key)
    }

    fn resolve_raw(&self, key: &Key) -> Result<Value> {
        self.get_raw(key)
    }

    fn assign(&self, key: &Key, value: Value) -> Result<()> {
        self.set(key.clone(), value)
    }

    fn resolved_items(&self) -> Result<BTreeMap<Key, Value>> {
        let mut items = self.owner.resolved_items()?;
        for key in self.overrides.merged().into_keys() {
            let value = self.get(&key)?;
            items.insert(key, value);
        }
        Ok(items)
    }
}

impl fmt::Debug for BoundFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundFunc")
            .field("func", &self.func)
            .field("owner", &self.owner)
            .finish()
    }
}
