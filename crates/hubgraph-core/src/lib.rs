#![forbid(unsafe_code)]
//! hubgraph-core library.
//!
//! Models typed many-to-many connections between content entities. Rows that
//! share a `hub` id form one logical connection; the engine in
//! [`relationships`] keeps those hubs consistent with entity metadata and
//! exposes hub-aware search over an entity's neighborhood.
//!
//! # Conventions
//!
//! - **Errors**: store helpers return `anyhow::Result`; engine operations
//!   return [`error::GraphError`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod db;
pub mod error;
pub mod hub;
pub mod ids;
pub mod model;
pub mod relationships;
pub mod services;

pub use error::{ErrorCode, GraphError};
pub use relationships::{BulkReport, BulkRequest, MetadataPropagation, Relationships};
