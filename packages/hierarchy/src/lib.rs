//! Declarative class hierarchies for recstore
//!
//! A hierarchy description names a root class and a list of levels. Each
//! level becomes a class whose instances hang off the class of the level
//! above, either once or once per id. Instances of id levels carry their id
//! under the level key (`Motor` → `motor`), so everything below them can
//! read which branch it lives in.
//!
//! - [`HierarchySpec`] / [`LevelSpec`]: serde descriptions
//! - [`HierarchyBuilder`]: class generation, with per-class customization
//! - [`Hierarchy`]: selection, iteration and multi-level bridges

mod builder;
mod navigate;
mod spec;

pub use builder::HierarchyBuilder;
pub use navigate::{Hierarchy, Level};
pub use spec::{HierarchySpec, IdForm, LevelId, LevelIds, LevelSpec};
