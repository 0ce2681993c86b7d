//! Configuration records for one provisioning run
//!
//! [`EnvironmentConfig`] is the unvalidated input: both database branches are
//! optional here and the validator decides which one (if any) is usable.

use crate::error::ConfigurationError;
use crate::params::ResolvedParameters;
use serde::{Serialize, Serializer};
use std::fmt;

/// Default Supabase region when the group omits one
pub const DEFAULT_SUPABASE_REGION: &str = "us-east-1";

/// Default database name inside the managed Postgres container
pub const DEFAULT_DATABASE_NAME: &str = "gridpulse";

/// Default schedule for the batch data service (hourly at :15)
pub const DEFAULT_DATA_CRON: &str = "15 * * * *";

/// A sensitive string value
///
/// Formatting never reveals the value; use [`Secret::expose`] where the raw
/// string has to be handed on.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Secret(String);

impl Secret {
    /// Wrap a value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw value
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the value is empty after trimming
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([redacted])")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[redacted]")
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// How the managed Postgres password should be percent-encoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PasswordEncoding {
    /// Decode-then-compare heuristic: encode unless the value already decodes
    /// to something different
    #[default]
    Detect,
    /// Always encode
    Plain,
    /// Never encode; the caller supplies an already-encoded value
    PreEncoded,
}

/// Externally managed database (Supabase) parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Management API access token
    pub access_token: Secret,
    /// Organization that owns the project
    pub organization_id: String,
    /// Project display name
    pub project_name: String,
    /// Database password for the `postgres` role
    pub database_password: Secret,
    /// Hosting region
    pub region: String,
}

impl SupabaseConfig {
    /// Create a config in the default region
    pub fn new(
        access_token: impl Into<Secret>,
        organization_id: impl Into<String>,
        project_name: impl Into<String>,
        database_password: impl Into<Secret>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            organization_id: organization_id.into(),
            project_name: project_name.into(),
            database_password: database_password.into(),
            region: DEFAULT_SUPABASE_REGION.to_string(),
        }
    }

    /// With a specific region
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }
}

/// Registry image the web service is deployed from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerImage {
    /// Fully qualified image, e.g. `ghcr.io/owner/repo:tag`
    pub image: String,
    /// Registry username for private images
    pub username: Option<String>,
    /// Registry token/password for private images
    pub password: Option<Secret>,
}

impl DockerImage {
    /// Public image without credentials
    pub fn public(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            username: None,
            password: None,
        }
    }
}

/// Settings for the optional batch data service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataServiceConfig {
    /// Cron schedule
    pub cron_schedule: String,
}

impl DataServiceConfig {
    /// Use a specific schedule
    pub fn with_schedule(cron_schedule: impl Into<String>) -> Self {
        Self {
            cron_schedule: cron_schedule.into(),
        }
    }
}

impl Default for DataServiceConfig {
    fn default() -> Self {
        Self::with_schedule(DEFAULT_DATA_CRON)
    }
}

/// Everything needed to describe one deployment environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentConfig {
    /// Hosting project the environment lives in
    pub project_id: String,
    /// Environment name (`prod`, `test2`, ...)
    pub environment_name: String,
    /// Hosting provider API token
    pub railway_token: Secret,
    /// Web session signing secret
    pub session_secret: Secret,
    /// Ingestion API key, passed through to services
    pub eia_api_key: Option<Secret>,
    /// Managed Postgres branch
    pub postgres_password: Option<Secret>,
    /// External managed database branch
    pub supabase: Option<SupabaseConfig>,
    /// Deploy the web service from an image instead of the connected repo
    pub web_image: Option<DockerImage>,
    /// Provider-assigned subdomain for the web service
    pub railway_subdomain: Option<String>,
    /// Caller-owned domain for the web service
    pub custom_domain: Option<String>,
    /// Database name inside the managed Postgres container
    pub database_name: String,
    /// Password encoding policy for the managed branch
    pub password_encoding: PasswordEncoding,
}

impl EnvironmentConfig {
    /// Minimal config; pick a database branch with the `with_*` methods
    pub fn new(
        project_id: impl Into<String>,
        environment_name: impl Into<String>,
        railway_token: impl Into<Secret>,
        session_secret: impl Into<Secret>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            environment_name: environment_name.into(),
            railway_token: railway_token.into(),
            session_secret: session_secret.into(),
            eia_api_key: None,
            postgres_password: None,
            supabase: None,
            web_image: None,
            railway_subdomain: None,
            custom_domain: None,
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            password_encoding: PasswordEncoding::default(),
        }
    }

    /// With the managed Postgres branch
    #[must_use]
    pub fn with_postgres_password(mut self, password: impl Into<Secret>) -> Self {
        self.postgres_password = Some(password.into());
        self
    }

    /// With the Supabase branch
    #[must_use]
    pub fn with_supabase(mut self, supabase: SupabaseConfig) -> Self {
        self.supabase = Some(supabase);
        self
    }

    /// With an ingestion API key
    #[must_use]
    pub fn with_eia_api_key(mut self, key: impl Into<Secret>) -> Self {
        self.eia_api_key = Some(key.into());
        self
    }

    /// Deploy the web service from a registry image
    #[must_use]
    pub fn with_web_image(mut self, image: DockerImage) -> Self {
        self.web_image = Some(image);
        self
    }

    /// Attach a provider-assigned subdomain
    #[must_use]
    pub fn with_railway_subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.railway_subdomain = Some(subdomain.into());
        self
    }

    /// Attach a custom domain
    #[must_use]
    pub fn with_custom_domain(mut self, domain: impl Into<String>) -> Self {
        self.custom_domain = Some(domain.into());
        self
    }

    /// Override the password encoding policy
    #[must_use]
    pub fn with_password_encoding(mut self, encoding: PasswordEncoding) -> Self {
        self.password_encoding = encoding;
        self
    }

    /// Map resolved stack parameters onto a config
    ///
    /// Empty strings mean "not set". The Supabase group is all-or-nothing:
    /// supplying some of its required members but not others is an error.
    pub fn from_parameters(
        params: &ResolvedParameters,
        environment_name: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        let text = |name: &str| params.optional(name).unwrap_or_default().to_string();
        let secret = |name: &str| params.secret(name).unwrap_or_else(|| Secret::new(""));

        let mut config = Self::new(
            text("project_id"),
            environment_name,
            secret("railway_token"),
            secret("session_secret"),
        );
        config.postgres_password = params.secret("postgres_password");
        config.eia_api_key = params.secret("eia_api_key");
        config.supabase = supabase_from_parameters(params)?;
        config.web_image = params.optional("docker_image").map(|image| DockerImage {
            image: image.to_string(),
            username: params.optional("docker_username").map(str::to_string),
            password: params.secret("docker_password"),
        });
        config.railway_subdomain = params.get("railway_subdomain").map(str::to_string);
        config.custom_domain = params.get("custom_domain").map(str::to_string);
        Ok(config)
    }
}

const SUPABASE_MEMBERS: [&str; 4] = [
    "supabase_access_token",
    "supabase_organization_id",
    "supabase_project_name",
    "supabase_database_password",
];

fn supabase_from_parameters(
    params: &ResolvedParameters,
) -> Result<Option<SupabaseConfig>, ConfigurationError> {
    let missing: Vec<&'static str> = SUPABASE_MEMBERS
        .iter()
        .copied()
        .filter(|name| params.optional(name).is_none())
        .collect();

    if missing.len() == SUPABASE_MEMBERS.len() {
        return Ok(None);
    }
    if !missing.is_empty() {
        return Err(ConfigurationError::IncompleteGroup {
            group: "supabase",
            missing,
        });
    }

    let value = |name: &str| params.optional(name).unwrap_or_default().to_string();
    let region = params
        .optional("supabase_region")
        .map_or_else(|| DEFAULT_SUPABASE_REGION.to_string(), |r| r.trim().to_string());

    Ok(Some(
        SupabaseConfig::new(
            Secret::new(value("supabase_access_token")),
            value("supabase_organization_id"),
            value("supabase_project_name"),
            Secret::new(value("supabase_database_password")),
        )
        .with_region(region),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{MapSource, ParameterSpec};

    fn specs() -> Vec<ParameterSpec> {
        [
            "project_id",
            "railway_token",
            "session_secret",
            "postgres_password",
            "eia_api_key",
            "supabase_access_token",
            "supabase_organization_id",
            "supabase_project_name",
            "supabase_database_password",
            "docker_image",
            "docker_username",
            "docker_password",
            "railway_subdomain",
            "custom_domain",
        ]
        .into_iter()
        .map(|name| ParameterSpec::with_default(name, "", ""))
        .chain([ParameterSpec::with_default(
            "supabase_region",
            "",
            DEFAULT_SUPABASE_REGION,
        )])
        .collect()
    }

    fn resolve(source: &MapSource) -> ResolvedParameters {
        ResolvedParameters::resolve(&specs(), source).unwrap()
    }

    #[test]
    fn secret_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{secret}"), "[redacted]");
        assert!(!format!("{secret:?}").contains("hunter2"));
        assert_eq!(secret.expose(), "hunter2");
        assert_eq!(serde_json::to_string(&secret).unwrap(), "\"hunter2\"");
    }

    #[test]
    fn maps_managed_branch_and_docker_image() {
        let params = resolve(
            &MapSource::new()
                .with("project_id", "p")
                .with("railway_token", "t")
                .with("session_secret", "s")
                .with("postgres_password", "abc123")
                .with("docker_image", "ghcr.io/awynne/grid:v1")
                .with("docker_password", "reg"),
        );
        let config = EnvironmentConfig::from_parameters(&params, "prod").unwrap();

        assert_eq!(config.environment_name, "prod");
        assert_eq!(config.postgres_password, Some(Secret::new("abc123")));
        assert!(config.supabase.is_none());
        assert!(config.eia_api_key.is_none());
        let image = config.web_image.unwrap();
        assert_eq!(image.image, "ghcr.io/awynne/grid:v1");
        assert_eq!(image.username, None);
        assert_eq!(image.password, Some(Secret::new("reg")));
    }

    #[test]
    fn maps_complete_supabase_group() {
        let params = resolve(
            &MapSource::new()
                .with("supabase_access_token", "x")
                .with("supabase_organization_id", "o")
                .with("supabase_project_name", "n")
                .with("supabase_database_password", "pw"),
        );
        let config = EnvironmentConfig::from_parameters(&params, "prod").unwrap();
        let supabase = config.supabase.unwrap();
        assert_eq!(supabase.region, "us-east-1");
        assert_eq!(supabase.project_name, "n");
    }

    #[test]
    fn rejects_partial_supabase_group() {
        let params = resolve(
            &MapSource::new()
                .with("supabase_access_token", "x")
                .with("supabase_project_name", "n"),
        );
        let err = EnvironmentConfig::from_parameters(&params, "prod").unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::IncompleteGroup {
                group: "supabase",
                missing: vec!["supabase_organization_id", "supabase_database_password"],
            }
        );
    }
}
