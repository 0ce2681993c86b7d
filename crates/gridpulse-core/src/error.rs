//! Error types for the grid catalog and health checks

use crate::schema::Id;

/// Catalog write errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// Series refers to a balancing authority that does not exist
    #[error("unknown balancing authority id {0}")]
    UnknownAuthority(Id),

    /// Observation refers to a series that does not exist
    #[error("unknown series id {0}")]
    UnknownSeries(Id),

    /// A required text field was empty
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

/// Database probe failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("database probe failed: {0}")]
pub struct ProbeError(pub String);
