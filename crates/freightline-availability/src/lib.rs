//! Freightline Availability - Which Freight may be promoted into a Stage
//!
//! A Stage accepts Freight from a Warehouse either directly or once it has
//! been verified in upstream Stages. Manual approval for the Stage is an
//! alternative path that bypasses verification and soak time entirely.
//!
//! [`FreightResolver`] turns those rules into indexed [`FreightQuery`]
//! predicates against a [`FreightStore`](freightline_registry::FreightStore),
//! unions the results and applies the soak-time filter in memory.
//!
//! [`FreightQuery`]: freightline_registry::FreightQuery

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod error;
pub mod options;
pub mod resolver;

pub use error::{AvailabilityError, Result};
pub use options::{AvailabilityStrategy, ListFreightOptions};
pub use resolver::FreightResolver;
