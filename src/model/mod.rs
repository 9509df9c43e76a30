// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Collection result model
//!
//! Collector logic builds a snapshot of monitored objects through this model
//! and writes it to the result channel exactly once.
//!
//! # Identity
//!
//! - **Identifier**: key/value pair, optionally part of uniqueness
//! - **Key**: adapter kind, object kind, name and identifiers
//! - **Identity**: the unique identifiers of a key, or its name when it has none
//!
//! # Example
//!
//! ```
//! use adapterlib::model::{CollectResult, Criticality, Identifier};
//!
//! # fn main() -> adapterlib::Result<()> {
//! let mut result = CollectResult::new();
//! let host = result.object("MyAdapter", "host", "web-1", vec![Identifier::new("ip", "10.0.0.5")])?;
//! let disk = result.object("MyAdapter", "disk", "sda", vec![])?;
//!
//! host.with_metric("cpu|usage", 42.0)
//!     .with_property("os", "linux")
//!     .with_event("disk nearly full", Criticality::Warning);
//! host.add_child(&disk);
//!
//! let wire = result.to_wire();
//! assert_eq!(wire["relationships"].as_array().map(Vec::len), Some(1));
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod event;
pub mod identifier;
pub mod key;
pub mod object;
pub mod result;

pub use data::{now_millis, Metric, Property, PropertyValue};
pub use event::{Criticality, Event};
pub use identifier::{Identifier, IdentifierKey};
pub use key::{IdentityBasis, Key, ObjectIdentity};
pub use object::Object;
pub use result::{CollectResult, EndpointResult, TestResult};
