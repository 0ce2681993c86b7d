//! Input Validator
//!
//! Turns an [`EnvironmentConfig`] into a [`ValidatedConfig`]. Every check
//! runs before any descriptor exists; a failure aborts the run.

use crate::config::{
    DockerImage, EnvironmentConfig, PasswordEncoding, Secret, SupabaseConfig,
};
use crate::error::ConfigurationError;
use once_cell::sync::Lazy;
use regex::Regex;

static DNS_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$").expect("static DNS label pattern")
});

const MAX_HOSTNAME_LEN: usize = 253;

/// The one database backend a run provisions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseBackend {
    /// Postgres container managed by the hosting provider
    ManagedPostgres(Secret),
    /// Externally managed database project
    Supabase(SupabaseConfig),
}

impl DatabaseBackend {
    /// Short name for logs and metadata
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ManagedPostgres(_) => "managed-postgres",
            Self::Supabase(_) => "supabase",
        }
    }
}

/// Domains attached to the web service, already trimmed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainConfig {
    /// Provider-assigned subdomain label
    pub railway_subdomain: Option<String>,
    /// Caller-owned hostname
    pub custom_domain: Option<String>,
}

impl DomainConfig {
    /// Number of domains that will be attached
    #[must_use]
    pub fn count(&self) -> usize {
        usize::from(self.railway_subdomain.is_some()) + usize::from(self.custom_domain.is_some())
    }
}

/// Configuration that passed validation
///
/// Only [`validate`] constructs this type, so holding one proves the backend
/// choice and field checks already succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    project_id: String,
    environment_name: String,
    railway_token: Secret,
    session_secret: Secret,
    eia_api_key: Option<Secret>,
    backend: DatabaseBackend,
    web_image: Option<DockerImage>,
    domains: DomainConfig,
    database_name: String,
    password_encoding: PasswordEncoding,
}

impl ValidatedConfig {
    /// Hosting project ID
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Environment name
    #[must_use]
    pub fn environment_name(&self) -> &str {
        &self.environment_name
    }

    /// Hosting provider token
    #[must_use]
    pub fn railway_token(&self) -> &Secret {
        &self.railway_token
    }

    /// Session secret
    #[must_use]
    pub fn session_secret(&self) -> &Secret {
        &self.session_secret
    }

    /// Ingestion API key
    #[must_use]
    pub fn eia_api_key(&self) -> Option<&Secret> {
        self.eia_api_key.as_ref()
    }

    /// Selected database backend
    #[must_use]
    pub fn backend(&self) -> &DatabaseBackend {
        &self.backend
    }

    /// Registry image for the web service
    #[must_use]
    pub fn web_image(&self) -> Option<&DockerImage> {
        self.web_image.as_ref()
    }

    /// Domains to attach
    #[must_use]
    pub fn domains(&self) -> &DomainConfig {
        &self.domains
    }

    /// Managed Postgres database name
    #[must_use]
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Password encoding policy
    #[must_use]
    pub fn password_encoding(&self) -> PasswordEncoding {
        self.password_encoding
    }
}

/// Select exactly one database backend
///
/// Blank passwords count as absent.
pub fn select_backend(
    postgres_password: Option<Secret>,
    supabase: Option<SupabaseConfig>,
) -> Result<DatabaseBackend, ConfigurationError> {
    let postgres_password = postgres_password.filter(|p| !p.is_blank());
    match (postgres_password, supabase) {
        (Some(password), None) => Ok(DatabaseBackend::ManagedPostgres(password)),
        (None, Some(supabase)) => Ok(DatabaseBackend::Supabase(supabase)),
        (None, None) => Err(ConfigurationError::MissingBackend),
        (Some(_), Some(_)) => Err(ConfigurationError::AmbiguousBackend),
    }
}

/// Validate a config
///
/// All field errors are collected and reported together.
pub fn validate(config: EnvironmentConfig) -> Result<ValidatedConfig, ConfigurationError> {
    let mut errors = Vec::new();

    check_not_empty("project_id", &config.project_id, &mut errors);
    check_not_empty("environment_name", &config.environment_name, &mut errors);
    check_not_empty("railway_token", config.railway_token.expose(), &mut errors);
    check_not_empty("session_secret", config.session_secret.expose(), &mut errors);
    check_not_empty("database_name", &config.database_name, &mut errors);

    let supabase = config
        .supabase
        .map(|supabase| normalize_supabase(supabase, &mut errors));

    let backend = match select_backend(config.postgres_password, supabase) {
        Ok(backend) => Some(backend),
        Err(e) => {
            errors.push(e);
            None
        }
    };

    let domains = DomainConfig {
        railway_subdomain: normalize_subdomain(config.railway_subdomain.as_deref(), &mut errors),
        custom_domain: normalize_custom_domain(config.custom_domain.as_deref(), &mut errors),
    };

    let web_image = config
        .web_image
        .filter(|image| !image.image.trim().is_empty())
        .map(|image| DockerImage {
            image: image.image.trim().to_string(),
            username: image.username.filter(|u| !u.trim().is_empty()),
            password: image.password.filter(|p| !p.is_blank()),
        });

    match backend {
        Some(backend) if errors.is_empty() => Ok(ValidatedConfig {
            project_id: config.project_id.trim().to_string(),
            environment_name: config.environment_name.trim().to_string(),
            railway_token: config.railway_token,
            session_secret: config.session_secret,
            eia_api_key: config.eia_api_key.filter(|k| !k.is_blank()),
            backend,
            web_image,
            domains,
            database_name: config.database_name.trim().to_string(),
            password_encoding: config.password_encoding,
        }),
        _ if errors.len() == 1 => Err(errors.remove(0)),
        _ => Err(ConfigurationError::Multiple(errors)),
    }
}

fn check_not_empty(field: &'static str, value: &str, errors: &mut Vec<ConfigurationError>) {
    if value.trim().is_empty() {
        errors.push(ConfigurationError::EmptyField(field));
    }
}

fn normalize_supabase(
    supabase: SupabaseConfig,
    errors: &mut Vec<ConfigurationError>,
) -> SupabaseConfig {
    let members = [
        ("supabase_access_token", supabase.access_token.is_blank()),
        ("supabase_organization_id", supabase.organization_id.trim().is_empty()),
        ("supabase_project_name", supabase.project_name.trim().is_empty()),
        ("supabase_database_password", supabase.database_password.is_blank()),
    ];
    let missing: Vec<&'static str> = members
        .iter()
        .filter(|(_, blank)| *blank)
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        errors.push(ConfigurationError::IncompleteGroup {
            group: "supabase",
            missing,
        });
    }

    let region = supabase.region.trim().to_ascii_lowercase();
    if region.is_empty() {
        errors.push(ConfigurationError::EmptyField("supabase_region"));
    } else if !DNS_LABEL.is_match(&region) {
        errors.push(ConfigurationError::InvalidField {
            field: "supabase_region",
            value: region.clone(),
            reason: "must be a region slug such as us-east-1",
        });
    }

    SupabaseConfig {
        organization_id: supabase.organization_id.trim().to_string(),
        project_name: supabase.project_name.trim().to_string(),
        region,
        ..supabase
    }
}

fn normalize_subdomain(
    value: Option<&str>,
    errors: &mut Vec<ConfigurationError>,
) -> Option<String> {
    let label = value.map(str::trim).filter(|v| !v.is_empty())?;
    let label = label.to_ascii_lowercase();
    if DNS_LABEL.is_match(&label) {
        Some(label)
    } else {
        errors.push(ConfigurationError::InvalidDomain {
            field: "railway_subdomain",
            value: label,
            reason: "must be a single DNS label",
        });
        None
    }
}

fn normalize_custom_domain(
    value: Option<&str>,
    errors: &mut Vec<ConfigurationError>,
) -> Option<String> {
    let host = value.map(str::trim).filter(|v| !v.is_empty())?;
    let host = host.trim_end_matches('.').to_ascii_lowercase();

    let reason = if host.len() > MAX_HOSTNAME_LEN {
        Some("longer than 253 characters")
    } else if !host.contains('.') {
        Some("must contain at least two labels")
    } else if !host.split('.').all(|label| DNS_LABEL.is_match(label)) {
        Some("labels must be alphanumeric with inner hyphens")
    } else {
        None
    };

    match reason {
        None => Some(host),
        Some(reason) => {
            errors.push(ConfigurationError::InvalidDomain {
                field: "custom_domain",
                value: host,
                reason,
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> EnvironmentConfig {
        EnvironmentConfig::new("p", "prod", "t", "s")
    }

    fn supabase() -> SupabaseConfig {
        SupabaseConfig::new("x", "o", "n", "pw")
    }

    #[test]
    fn select_managed_postgres() {
        let backend = select_backend(Some(Secret::new("abc123")), None).unwrap();
        assert_eq!(backend.kind(), "managed-postgres");
    }

    #[test]
    fn select_supabase() {
        let backend = select_backend(None, Some(supabase())).unwrap();
        assert!(matches!(backend, DatabaseBackend::Supabase(_)));
    }

    #[test]
    fn neither_backend_is_rejected() {
        assert_eq!(
            select_backend(None, None),
            Err(ConfigurationError::MissingBackend)
        );
        assert_eq!(
            select_backend(Some(Secret::new("  ")), None),
            Err(ConfigurationError::MissingBackend)
        );
    }

    #[test]
    fn both_backends_are_rejected() {
        assert_eq!(
            select_backend(Some(Secret::new("abc")), Some(supabase())),
            Err(ConfigurationError::AmbiguousBackend)
        );
    }

    #[test]
    fn validate_reports_backend_error_alone() {
        assert_eq!(validate(base()), Err(ConfigurationError::MissingBackend));
    }

    #[test]
    fn validate_collects_errors() {
        let config = EnvironmentConfig::new("", "prod", "t", "")
            .with_postgres_password("pw")
            .with_custom_domain("not a domain");
        let Err(ConfigurationError::Multiple(errors)) = validate(config) else {
            panic!("expected multiple errors");
        };
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ConfigurationError::EmptyField("project_id")));
        assert!(errors.contains(&ConfigurationError::EmptyField("session_secret")));
    }

    #[test]
    fn whitespace_domains_are_absent() {
        let config = base()
            .with_postgres_password("pw")
            .with_railway_subdomain("   ")
            .with_custom_domain("\t");
        let validated = validate(config).unwrap();
        assert_eq!(validated.domains(), &DomainConfig::default());
        assert_eq!(validated.domains().count(), 0);
    }

    #[test]
    fn domains_are_trimmed_and_lowercased() {
        let config = base()
            .with_postgres_password("pw")
            .with_railway_subdomain("  GridPulse ")
            .with_custom_domain(" Grid.Example.com. ");
        let validated = validate(config).unwrap();
        assert_eq!(
            validated.domains().railway_subdomain.as_deref(),
            Some("gridpulse")
        );
        assert_eq!(
            validated.domains().custom_domain.as_deref(),
            Some("grid.example.com")
        );
    }

    #[test]
    fn invalid_domains_are_rejected() {
        let config = base()
            .with_postgres_password("pw")
            .with_railway_subdomain("a.b");
        assert!(matches!(
            validate(config),
            Err(ConfigurationError::InvalidDomain {
                field: "railway_subdomain",
                ..
            })
        ));

        let config = base()
            .with_postgres_password("pw")
            .with_custom_domain("-bad.example.com");
        assert!(matches!(
            validate(config),
            Err(ConfigurationError::InvalidDomain {
                field: "custom_domain",
                ..
            })
        ));
    }

    #[test]
    fn blank_supabase_members_are_rejected() {
        let config = base().with_supabase(SupabaseConfig::new("x", " ", "n", "pw"));
        assert_eq!(
            validate(config),
            Err(ConfigurationError::IncompleteGroup {
                group: "supabase",
                missing: vec!["supabase_organization_id"],
            })
        );
    }

    #[test]
    fn supabase_members_are_normalized() {
        let config = base().with_supabase(
            SupabaseConfig::new("x", "  org-1 ", " GridPulse ", "pw").with_region(" EU-West-2 "),
        );
        let validated = validate(config).unwrap();
        let DatabaseBackend::Supabase(supabase) = validated.backend() else {
            panic!("expected supabase backend");
        };
        assert_eq!(supabase.organization_id, "org-1");
        assert_eq!(supabase.project_name, "GridPulse");
        assert_eq!(supabase.region, "eu-west-2");
    }

    #[test]
    fn malformed_region_names_the_value() {
        let config =
            base().with_supabase(SupabaseConfig::new("x", "o", "n", "pw").with_region("us_east_1"));
        let err = validate(config).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::InvalidField {
                field: "supabase_region",
                value: "us_east_1".into(),
                reason: "must be a region slug such as us-east-1",
            }
        );
        assert!(err.to_string().contains("invalid supabase_region 'us_east_1'"));

        let config =
            base().with_supabase(SupabaseConfig::new("x", "o", "n", "pw").with_region("  "));
        assert_eq!(
            validate(config),
            Err(ConfigurationError::EmptyField("supabase_region"))
        );
    }

    #[test]
    fn blank_image_means_connected_repo() {
        let config = base()
            .with_postgres_password("pw")
            .with_web_image(DockerImage::public("  "));
        assert!(validate(config).unwrap().web_image().is_none());
    }
}
