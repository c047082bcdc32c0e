//! Freightline Registry - Persistence boundary for Freight, Stages and Warehouses
//!
//! This crate provides the store traits the engine reads from and the
//! reconciliation loop writes through:
//!
//! - **FreightStore**: Freight records, listable by indexed predicates
//! - **StageStore**: Stage records and their history stacks
//! - **WarehouseStore**: Warehouse records
//!
//! ## Optimistic Concurrency
//!
//! Every record carries `metadata.resource_version`. Status writes name the
//! version they were computed from and fail with
//! [`RegistryError::VersionConflict`] if another writer got there first.
//! [`retry_on_conflict`] re-runs a whole read-mutate-write cycle on conflict.
//!
//! ## In-Memory vs Persistent
//!
//! The in-memory implementations are suitable for development and testing.
//! Persistent backends implement the same traits.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod error;
pub mod freight;
pub mod memory;
pub mod query;
pub mod retry;
pub mod stage;
pub mod warehouse;

// Re-exports
pub use error::{RegistryError, Result};
pub use freight::FreightStore;
pub use memory::{InMemoryFreightStore, InMemoryStageStore, InMemoryWarehouseStore};
pub use query::FreightQuery;
pub use retry::{retry_on_conflict, ConflictAware, RetryPolicy};
pub use stage::StageStore;
pub use warehouse::WarehouseStore;
