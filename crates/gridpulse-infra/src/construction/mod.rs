//! Construction Phase
//!
//! `EnvironmentConfig` → [`validator::validate`] → `ValidatedConfig` →
//! [`EnvironmentBuilder`] → [`EnvironmentGraph`]. Each step consumes the
//! previous one; there is no way back and no partial result on failure.

pub mod builder;
pub mod validator;

pub use builder::{DatabaseHandles, EnvironmentBuilder, ServiceHandles};
pub use validator::{validate, DatabaseBackend, DomainConfig, ValidatedConfig};

use crate::config::{DataServiceConfig, EnvironmentConfig};
use crate::error::Result;
use crate::validated_graph::EnvironmentGraph;

/// Validate `config` and build its graph, optionally with the data service
pub fn build_environment(
    config: EnvironmentConfig,
    data_service: Option<DataServiceConfig>,
) -> Result<EnvironmentGraph> {
    let validated = validate(config)?;
    let mut builder = EnvironmentBuilder::new(validated)?;
    if let Some(data_service) = data_service {
        builder.add_data_service(data_service)?;
    }
    Ok(builder.finish()?)
}
