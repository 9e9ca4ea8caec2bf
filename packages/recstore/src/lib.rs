//! recstore: hierarchical attribute resolution with owner-scoped specialization.
//!
//! Containers resolve keys through their own values, their class defaults
//! and the values of the containers that own them. Class-level child
//! definitions become per-owner copies on first access, shared while the
//! owner is a bare prototype and private once it carries values of its own.
//! Functions bound to a container fill their missing arguments the same way.
//!
//! This crate gathers the layers:
//! - [`core`]: containers, classes, specialization, hooks, callables
//! - [`payload`]: serde conversions and dotted-path payloads
//! - [`hierarchy`]: generated class hierarchies

pub use recstore_core as core;
pub use recstore_hierarchy as hierarchy;
pub use recstore_payload as payload;

pub use recstore_core::{
    alias, cycle, ArgSpec, BoundFunc, Class, ClassBuilder, Container, Error, Key, RecFunc,
    Resolver, Result, Value,
};
pub use recstore_hierarchy::{Hierarchy, HierarchyBuilder, HierarchySpec, LevelId, LevelSpec};
pub use recstore_payload::{deploy, propagate, Payload, PayloadError, TypedResolver};
