//! Freightline Controller - The reconciliation side of the engine
//!
//! Controllers discover artifacts, promote Freight and run verifications.
//! This crate turns those events into record updates:
//!
//! - [`FreightPublisher`] stores newly discovered Freight under its identity
//! - [`StageReconciler`] keeps Freight lifecycle records and Stage history
//!   stacks in step with promotions, verifications and approvals, and answers
//!   which Freight a Stage may be promoted to next
//!
//! Every update is a read-mutate-write against the registry, retried from a
//! fresh read when another writer wins the race.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod config;
pub mod error;
pub mod publisher;
pub mod reconciler;
pub mod telemetry;

pub use config::{ControllerConfig, LoggingConfig, RetryConfig};
pub use error::{ControllerError, Result};
pub use publisher::FreightPublisher;
pub use reconciler::StageReconciler;
pub use telemetry::init_logging;
