//! GridPulse Infra - environment provisioning
//!
//! Resolves stack parameters, validates them into exactly one database
//! backend, and builds the dependency-ordered resource graph the
//! infrastructure engine reconciles:
//! - Parameter resolution from files and `TF_VAR_*` environment variables
//! - Backend selection (managed Postgres or Supabase) and input validation
//! - Connection-string derivation with single percent-encoding
//! - Resource graph construction with a stable topological order
//! - Output projection and synthesis of the engine document
//!
//! No network I/O happens here; the engine applies the document later.
//!
//! # Example
//!
//! ```rust,ignore
//! use gridpulse_infra::prelude::*;
//!
//! let config = EnvironmentConfig::new("project", "prod", "token", "secret")
//!     .with_postgres_password("abc123");
//! let graph = build_environment(config, None)?;
//! let document = synthesize(&graph, "gridpulse-prod");
//! ```

pub mod config;
pub mod construction;
pub mod dag;
pub mod derive;
pub mod error;
pub mod outputs;
pub mod params;
pub mod stacks;
pub mod synth;
pub mod types;
pub mod validated_graph;

pub use config::{
    DataServiceConfig, DockerImage, EnvironmentConfig, PasswordEncoding, Secret, SupabaseConfig,
};
pub use construction::{
    build_environment, validate, DatabaseBackend, EnvironmentBuilder, ValidatedConfig,
};
pub use error::{ConfigurationError, GraphError, ParameterError, ProvisionError, Result};
pub use outputs::Output;
pub use stacks::{build_stack, parameter_specs, StackKind, StackOptions};
pub use synth::synthesize;
pub use types::{AttributeValue, Descriptor, DescriptorId, Reference, ResourceType};
pub use validated_graph::EnvironmentGraph;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building GridPulse environments
    pub use crate::params::{EnvSource, FileSource, LayeredSource, MapSource, ResolvedParameters};
    pub use crate::{
        build_environment, build_stack, synthesize, DataServiceConfig, EnvironmentBuilder,
        EnvironmentConfig, EnvironmentGraph, ProvisionError, StackKind, StackOptions,
        SupabaseConfig,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
