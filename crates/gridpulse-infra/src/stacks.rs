//! Stack entry points
//!
//! A stack is a parameter table plus an environment name. Production requires
//! every secret; the test stack ships development defaults for the database
//! password and session secret.

use crate::config::{DataServiceConfig, EnvironmentConfig, DEFAULT_SUPABASE_REGION};
use crate::construction::build_environment;
use crate::error::Result;
use crate::params::{ParameterSource, ParameterSpec, ResolvedParameters};
use crate::validated_graph::EnvironmentGraph;
use std::fmt;
use std::str::FromStr;

/// Deployable stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackKind {
    /// Production environment
    Production,
    /// Shared test environment
    Test,
}

impl StackKind {
    /// Every stack
    pub const ALL: [Self; 2] = [Self::Production, Self::Test];

    /// Short name used on the command line
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "prod",
            Self::Test => "test",
        }
    }

    /// Hosting environment the stack deploys into
    #[must_use]
    pub const fn environment_name(self) -> &'static str {
        match self {
            Self::Production => "prod",
            Self::Test => "test2",
        }
    }

    /// Stack directory name in the synthesized output
    #[must_use]
    pub const fn stack_name(self) -> &'static str {
        match self {
            Self::Production => "gridpulse-prod",
            Self::Test => "gridpulse-test",
        }
    }
}

impl fmt::Display for StackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StackKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(format!("unknown stack '{other}' (expected prod or test)")),
        }
    }
}

const PARAMETERS: [ParameterSpec; 15] = [
    ParameterSpec::required("railway_token", "Railway API token").sensitive(),
    ParameterSpec::required("project_id", "Railway project ID"),
    ParameterSpec::with_default("postgres_password", "PostgreSQL password (Railway Postgres)", "")
        .sensitive(),
    ParameterSpec::required("session_secret", "Session secret for authentication").sensitive(),
    ParameterSpec::with_default("eia_api_key", "EIA API key for data ingestion", "").sensitive(),
    ParameterSpec::with_default("supabase_access_token", "Supabase access token", "")
        .sensitive(),
    ParameterSpec::with_default("supabase_organization_id", "Supabase organization ID", ""),
    ParameterSpec::with_default("supabase_project_name", "Supabase project name", ""),
    ParameterSpec::with_default(
        "supabase_database_password",
        "Supabase database password",
        "",
    )
    .sensitive(),
    ParameterSpec::with_default(
        "supabase_region",
        "Supabase region",
        DEFAULT_SUPABASE_REGION,
    ),
    ParameterSpec::with_default("docker_image", "Docker image for the web service", ""),
    ParameterSpec::with_default("docker_username", "Registry username", ""),
    ParameterSpec::with_default("docker_password", "Registry password or token", "").sensitive(),
    ParameterSpec::with_default("railway_subdomain", "Railway subdomain for the web service", ""),
    ParameterSpec::with_default("custom_domain", "Custom domain for the web service", ""),
];

/// Parameter table for a stack
#[must_use]
pub fn parameter_specs(kind: StackKind) -> Vec<ParameterSpec> {
    PARAMETERS
        .iter()
        .map(|spec| match (kind, spec.name) {
            (StackKind::Test, "postgres_password") => {
                spec.defaulting_to("test-development-password")
            }
            (StackKind::Test, "session_secret") => {
                spec.defaulting_to("test-32-character-session-secret")
            }
            _ => *spec,
        })
        .collect()
}

/// Resolve a stack's parameters from `source`
pub fn resolve_parameters(
    kind: StackKind,
    source: &dyn ParameterSource,
) -> Result<ResolvedParameters> {
    Ok(ResolvedParameters::resolve(&parameter_specs(kind), source)?)
}

/// Per-run options on top of the parameter table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackOptions {
    /// Add the batch data service with these settings
    pub data_service: Option<DataServiceConfig>,
}

impl StackOptions {
    /// Options that add the data service
    #[must_use]
    pub fn with_data_service(mut self, config: DataServiceConfig) -> Self {
        self.data_service = Some(config);
        self
    }
}

/// Build the graph for a stack from resolved parameters
pub fn build_stack(
    kind: StackKind,
    params: &ResolvedParameters,
    options: &StackOptions,
) -> Result<EnvironmentGraph> {
    let _span = tracing::info_span!("stack", stack = kind.stack_name()).entered();
    let config = EnvironmentConfig::from_parameters(params, kind.environment_name())?;
    build_environment(config, options.data_service.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::MapSource;

    #[test]
    fn stack_names() {
        assert_eq!("prod".parse::<StackKind>(), Ok(StackKind::Production));
        assert_eq!(" Test ".parse::<StackKind>(), Ok(StackKind::Test));
        assert!("staging".parse::<StackKind>().is_err());
        assert_eq!(StackKind::Test.environment_name(), "test2");
        assert_eq!(StackKind::Production.stack_name(), "gridpulse-prod");
    }

    #[test]
    fn production_requires_project_and_secrets() {
        let err = resolve_parameters(StackKind::Production, &MapSource::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "parameter error: missing required parameters: railway_token, project_id, session_secret"
        );
    }

    #[test]
    fn test_stack_defaults() {
        let source = MapSource::new()
            .with("railway_token", "t")
            .with("project_id", "p");
        let params = resolve_parameters(StackKind::Test, &source).unwrap();

        assert_eq!(params.get("postgres_password"), Some("test-development-password"));
        assert_eq!(
            params.get("session_secret"),
            Some("test-32-character-session-secret")
        );
        assert_eq!(params.get("supabase_region"), Some("us-east-1"));
        assert!(params.is_sensitive("postgres_password"));
        assert!(!params.is_sensitive("project_id"));
    }

    #[test]
    fn project_id_has_no_default_anywhere() {
        for kind in StackKind::ALL {
            let spec = parameter_specs(kind)
                .into_iter()
                .find(|s| s.name == "project_id")
                .unwrap();
            assert!(spec.is_required());
        }
    }
}
