// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! # Adapter Bridge
//!
//! Runs monitoring data collectors ("adapters") as short-lived, isolated
//! subprocesses and models the results they hand back.
//!
//! ## Components
//!
//! - [`model`]: identity-keyed objects, metrics, properties, events and the
//!   deduplicating [`CollectResult`](model::CollectResult)
//! - [`pipe`] and [`adapter_instance`]: the adapter side of the protocol
//! - [`bridge`]: the front-end side: command resolution, environment, named
//!   pipe result channel, subprocess supervision and cleanup
//! - [`handler`] and [`http_server`]: the HTTP boundary
//!
//! ## Writing an adapter
//!
//! ```no_run
//! use adapterlib::adapter_instance::AdapterInstance;
//! use adapterlib::model::CollectResult;
//! use adapterlib::pipe::OutputPipe;
//!
//! fn main() -> adapterlib::Result<()> {
//!     let mut pipe = OutputPipe::from_args()?;
//!     let instance = AdapterInstance::from_env(&["host"])?;
//!     let host = instance.get_identifier_value("host").unwrap_or("localhost").to_string();
//!
//!     let mut result = CollectResult::new();
//!     result
//!         .object(instance.key().adapter_kind(), "server", host, vec![])?
//!         .with_metric("cpu|usage", 12.5);
//!     result.send(&mut pipe)
//! }
//! ```

pub mod adapter_instance;
pub mod bridge;
pub mod error;
#[cfg(unix)]
pub mod handler;
#[cfg(all(unix, feature = "cli"))]
pub mod http_server;
pub mod model;
pub mod pipe;
pub mod request;

pub use error::{AdapterError, Result};
pub use model::{CollectResult, EndpointResult, Key, Object, TestResult};

#[cfg(unix)]
pub use bridge::ExecutionBridge;
pub use bridge::{Operation, ServiceConfig};
