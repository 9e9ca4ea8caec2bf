//! Core recstore: hierarchical attribute resolution
//!
//! This layer holds the resolution engine:
//! - `ResolutionChain`: ordered stores split into instance, class and
//!   inherited segments, searched front to back
//! - `Container`: a local store, a chain, blocked keys and a weak owner
//! - Specialization: owner-scoped copies of class-level child definitions,
//!   cached per owner in a soft (prototype) and hard (instantiated) tier
//! - `RecFunc` / `BoundFunc`: callables whose missing arguments are
//!   resolved through the object they are bound to
//! - Computed-value hooks (`cycle`, `alias`)
//!
//! # Example
//!
//! ```rust
//! use recstore_core::{ClassBuilder, Container, Value};
//!
//! let motor = ClassBuilder::new("Motor").parameter("speed", 10).build().unwrap();
//! let axis = ClassBuilder::new("Axis")
//!     .child("motor", Container::new(&motor))
//!     .build()
//!     .unwrap();
//!
//! let x = Container::new(&axis);
//! x.set("port", 4).unwrap();
//!
//! let m = x.child("motor").unwrap();
//! assert_eq!(m.get("speed").unwrap(), Value::from(10));
//! assert_eq!(m.get("port").unwrap(), Value::from(4));
//! ```

mod argspec;
mod chain;
mod class;
mod container;
mod error;
mod function;
pub mod hooks;
mod identity;
mod key;
mod layer;
mod specialize;
mod traits;
mod value;

pub use argspec::{ArgSpec, Kwargs, Signature, SignatureItem};
pub use chain::{ResolutionChain, Segment, Segments};
pub use class::{Class, ClassBuilder, Transformer};
pub use container::Container;
pub use error::{Error, Result};
pub use function::{BoundFunc, CallingConvention, Implementation, Invocation, RecFunc};
pub use hooks::{alias, alias_fn, cycle, Alias, ComputedValue, Cycle};
pub use identity::{DefinitionId, Tier};
pub use key::Key;
pub use layer::{Entries, Layer, LocalStore, Lookup};
pub use traits::Resolver;
pub use value::{Computed, Value};
