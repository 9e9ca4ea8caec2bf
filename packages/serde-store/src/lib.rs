//! Serde Integration for recstore
//!
//! This layer moves data in and out of container trees. It adds:
//! - `TypedResolver`: read and write Rust types through any `Resolver`
//! - Value <-> serde conversions
//! - `Payload`: nested payloads built from flat dotted-key mappings
//!   (`".motor.encoder[resolution]": 4096`), loaded from JSON
//! - `propagate` / `deploy`: apply a payload to a tree, export a tree
//!
//! # Example
//!
//! ```rust
//! use std::str::FromStr;
//!
//! use recstore_core::{ClassBuilder, Container, Value};
//! use recstore_payload::{propagate, Payload};
//!
//! let motor = ClassBuilder::new("Motor").parameter("gain", 1).build().unwrap();
//! let machine = ClassBuilder::new("Machine")
//!     .child("motor", Container::new(&motor))
//!     .build()
//!     .unwrap();
//!
//! let m = Container::new(&machine);
//! let payload = Payload::from_str(r#"{ "site": "lab", ".motor[gain]": 4 }"#).unwrap();
//! propagate(&m, payload).unwrap();
//!
//! assert_eq!(m.child("motor").unwrap().get("gain").unwrap(), Value::from(4));
//! ```

mod convert;
mod error;
mod path;
mod payload;
mod propagate;
mod typed;

pub use convert::{from_value, json_to_value, to_value, value_to_json};
pub use error::{PayloadError, Result};
pub use path::{NestedPath, PathError};
pub use payload::{Payload, PayloadEntry};
pub use propagate::{deploy, propagate};
pub use typed::TypedResolver;

// Re-export core types for convenience
pub use recstore_core::{Container, Key, Resolver, Value};
