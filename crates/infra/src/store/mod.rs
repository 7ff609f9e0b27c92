//! Persistence boundary for clients and request counters.
//!
//! The store is the single source of truth: services keep no authoritative
//! in-memory copy and re-read on every operation.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::{InMemoryClientStore, InMemoryRequestMetricsStore};
pub use postgres::{PostgresClientStore, PostgresRequestMetricsStore};
pub use r#trait::{ClientStore, RequestMetric, RequestMetricsStore, StoreError};
