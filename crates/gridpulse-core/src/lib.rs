//! GridPulse Core - grid schema and service collaborators
//!
//! The pieces of the dashboard the provisioning pipeline hands off to:
//! - Grid schema with its uniqueness keys and an in-memory catalog
//! - Development seed data for five balancing authorities
//! - The `/health` status document with a time-boxed database probe
//!
//! # Example
//!
//! ```rust,ignore
//! use gridpulse_core::prelude::*;
//!
//! let mut catalog = Catalog::new();
//! let summary = seed_catalog(&mut catalog, chrono::Utc::now(), &mut rand::rng())?;
//! println!("seeded {} series", summary.series);
//! ```

pub mod error;
pub mod health;
pub mod schema;
pub mod seed;

pub use error::{CatalogError, ProbeError};
pub use health::{ComponentStatus, DatabaseProbe, HealthChecker, HealthReport, ServiceStatus};
pub use schema::{
    BalancingAuthority, Catalog, Id, NewBalancingAuthority, NewSeries, Observation, QualityFlag,
    Series, SeriesKind, Upsert,
};
pub use seed::{seed_catalog, SeedSummary};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the grid catalog
    pub use crate::{
        seed_catalog, Catalog, HealthChecker, HealthReport, Observation, Series, SeriesKind,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
