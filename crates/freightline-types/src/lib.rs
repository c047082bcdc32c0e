//! Freightline Types - Core types for progressive delivery
//!
//! Freightline tracks versioned bundles of artifacts ("Freight") produced by
//! Warehouses and governs their promotion through an ordered pipeline of
//! Stages. This crate owns the data model and the pure rules applied to it.
//!
//! ## Architectural Boundaries
//!
//! - **freightline-types** owns: identity hashing, per-Stage lifecycle records,
//!   soak-time math, bounded history stacks, URL normalization
//! - **freightline-registry** owns: persistence and optimistic concurrency
//! - **freightline-availability** owns: promotion eligibility queries
//! - **freightline-controller** owns: publishing and lifecycle bookkeeping
//!
//! Nothing in this crate performs I/O or reads a global clock. Every
//! time-dependent operation takes "now" as an argument, and every mutator
//! works on an in-memory snapshot that the caller persists.
//!
//! ## Key Concepts
//!
//! - **Freight**: Content-identified bundle of commits, images, charts and artifacts
//! - **FreightStatus**: Which Stages use, verified, or approved a Freight
//! - **Stage**: A deployment target with bounded Freight and verification history
//! - **Warehouse**: The producer of Freight

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod clock;
pub mod error;
pub mod freight;
pub mod history;
pub mod identity;
pub mod ids;
pub mod stage;
pub mod urls;
pub mod warehouse;

mod duration_serde;

// Re-export main types
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::MetadataError;
pub use freight::{
    freight_has_soaked_in, ApprovedStage, ArtifactReference, Chart, CurrentStage, Freight,
    FreightContent, FreightStatus, GitCommit, Image, VerifiedStage,
};
pub use history::{
    FreightHistory, FreightReference, HistoryStack, StackEntry, VerificationHistory,
    VerificationInfo, VerificationPhase, MAX_STACK_DEPTH,
};
pub use identity::generate_freight_id;
pub use ids::{FreightOrigin, ObjectMeta, OriginKind};
pub use stage::{FreightRequest, FreightSources, Stage, StageSpec, StageStatus};
pub use urls::{normalize_chart_url, normalize_git_url, normalize_image_url};
pub use warehouse::{RepoSubscription, Warehouse};
