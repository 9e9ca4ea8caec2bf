//! Computed-value hooks: stored values that intercept reads and writes.
//!
//! Two hooks ship with the crate:
//! - [`Cycle`]: rotates through a fixed sequence, one step per read
//! - [`Alias`]: recomputes from the reading object on every read, either by
//!   looking up another key or by applying a function

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::layer::Layer;
use crate::{Error, Key, Resolver, Result, Value};

/// A value that computes its result when read.
///
/// `target` is the object being read (a container, function or bound
/// function), `source` the layer the hook was found in (`None` when the
/// source is not a chain, e.g. a plain map) and `key` the key it was found
/// under.
pub trait ComputedValue {
    /// Produce the value for a read. May itself return a computed value.
    fn read(&self, target: &dyn Resolver, source: Option<&Layer>, key: &Key) -> Result<Value>;

    /// Whether writes to a key holding this hook are routed to [`write`].
    ///
    /// [`write`]: ComputedValue::write
    fn accepts_writes(&self) -> bool {
        false
    }

    /// Handle a write to a key holding this hook.
    fn write(
        &self,
        _target: &dyn Resolver,
        _source: Option<&Layer>,
        key: &Key,
        _value: Value,
    ) -> Result<()> {
        Err(Error::ReadOnly(key.clone()))
    }

    /// Short human-readable description.
    fn describe(&self) -> String;
}

/// Run hooks until a plain value comes out.
pub fn resolve_computed(
    mut value: Value,
    target: &dyn Resolver,
    source: Option<&Layer>,
    key: &Key,
) -> Result<Value> {
    while let Value::Computed(computed) = value {
        value = computed.hook().read(target, source, key)?;
    }
    Ok(value)
}

/// Rotates through a sequence, one element per read.
///
/// The cursor belongs to the hook object, not to the reader: every container
/// reading the same stored cycle advances the same rotation.
pub struct Cycle {
    items: Vec<Value>,
    cursor: Cell<usize>,
}

impl Cycle {
    pub fn new(items: Vec<Value>) -> Result<Self> {
        if items.is_empty() {
            return Err(Error::configuration("cycle needs at least one element"));
        }
        Ok(Self {
            items,
            cursor: Cell::new(0),
        })
    }

    /// Advance the rotation and return the element under the cursor.
    pub fn next_item(&self) -> Value {
        let i = self.cursor.get();
        self.cursor.set((i + 1) % self.items.len());
        self.items[i].clone()
    }
}

impl ComputedValue for Cycle {
    fn read(&self, _target: &dyn Resolver, _source: Option<&Layer>, _key: &Key) -> Result<Value> {
        Ok(self.next_item())
    }

    fn describe(&self) -> String {
        format!("cycle of {}", self.items.len())
    }
}

/// Store a [`Cycle`] over `items` as a value.
pub fn cycle(items: Vec<Value>) -> Result<Value> {
    Ok(Value::computed(Cycle::new(items)?))
}

/// Function form of an alias.
pub type AliasFn = Rc<dyn Fn(&dyn Resolver) -> Result<Value>>;

enum AliasSource {
    Key(Key),
    Function(AliasFn),
}

/// Recomputes its value from the reading object on every read.
pub struct Alias {
    source: AliasSource,
    writable: bool,
    doc: Option<String>,
}

impl Alias {
    /// Read-only alias of another key.
    pub fn key(key: impl Into<Key>) -> Self {
        Self {
            source: AliasSource::Key(key.into()),
            writable: false,
            doc: None,
        }
    }

    /// Read-only alias computed by a function of the reading object.
    pub fn function(f: impl Fn(&dyn Resolver) -> Result<Value> + 'static) -> Self {
        Self {
            source: AliasSource::Function(Rc::new(f)),
            writable: false,
            doc: None,
        }
    }

    /// Route writes to the aliased key. Only key aliases can be writable.
    pub fn writable(mut self) -> Result<Self> {
        if let AliasSource::Function(_) = self.source {
            return Err(Error::configuration("a function alias cannot be writable"));
        }
        self.writable = true;
        Ok(self)
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn into_value(self) -> Value {
        Value::computed(self)
    }
}

impl ComputedValue for Alias {
    fn read(&self, target: &dyn Resolver, _source: Option<&Layer>, _key: &Key) -> Result<Value> {
        match &self.source {
            AliasSource::Key(key) => target.resolve(key),
            AliasSource::Function(f) => f(target),
        }
    }

    fn accepts_writes(&self) -> bool {
        self.writable
    }

    fn write(
        &self,
        target: &dyn Resolver,
        _source: Option<&Layer>,
        key: &Key,
        value: Value,
    ) -> Result<()> {
        match &self.source {
            AliasSource::Key(aliased) if self.writable => target.assign(aliased, value),
            _ => Err(Error::ReadOnly(key.clone())),
        }
    }

    fn describe(&self) -> String {
        match (&self.doc, &self.source) {
            (Some(doc), _) => format!("alias: {}", doc),
            (None, AliasSource::Key(key)) => format!("alias: -> o[{}]", key),
            (None, AliasSource::Function(_)) => "alias: <function>".to_string(),
        }
    }
}

impl fmt::Debug for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Store a read-only alias of `key` as a value.
pub fn alias(key: impl Into<Key>) -> Value {
    Alias::key(key).into_value()
}

/// Store a read-only function alias as a value.
pub fn alias_fn(f: impl Fn(&dyn Resolver) -> Result<Value> + 'static) -> Value {
    Alias::function(f).into_value()
}
