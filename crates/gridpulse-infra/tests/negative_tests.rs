//! Negative tests - rejected configurations and graph conflicts

use gridpulse_infra::config::{DataServiceConfig, SupabaseConfig};
use gridpulse_infra::construction::{validate, EnvironmentBuilder};
use gridpulse_infra::{build_environment, ConfigurationError, EnvironmentConfig, GraphError, ProvisionError};
use gridpulse_test_utils::{ambiguous_config, managed_config};

#[test]
fn test_rejects_both_backends() {
    let err = build_environment(ambiguous_config(), None).unwrap_err();

    assert!(err.is_configuration_error());
    assert!(matches!(
        err,
        ProvisionError::Configuration(ConfigurationError::AmbiguousBackend)
    ));
    assert!(err.to_string().contains("ambiguous backend"));
}

#[test]
fn test_rejects_neither_backend() {
    let err = validate(EnvironmentConfig::new("p", "prod", "t", "s")).unwrap_err();
    assert_eq!(err, ConfigurationError::MissingBackend);
    assert!(err.to_string().contains("database backend required"));
}

#[test]
fn test_blank_password_is_no_backend() {
    let err = validate(EnvironmentConfig::new("p", "prod", "t", "s").with_postgres_password("  "))
        .unwrap_err();
    assert_eq!(err, ConfigurationError::MissingBackend);
}

#[test]
fn test_backend_error_reported_with_other_errors() {
    let err = validate(
        EnvironmentConfig::new("", "prod", "t", "s")
            .with_postgres_password("pw")
            .with_supabase(SupabaseConfig::new("x", "o", "n", "pw")),
    )
    .unwrap_err();

    let ConfigurationError::Multiple(errors) = err else {
        panic!("expected collected errors, got {err:?}");
    };
    assert!(errors.contains(&ConfigurationError::EmptyField("project_id")));
    assert!(errors.contains(&ConfigurationError::AmbiguousBackend));
}

#[test]
fn test_rejects_invalid_custom_domain() {
    let err = validate(managed_config().with_custom_domain("grid_pulse.example.com")).unwrap_err();
    assert!(matches!(
        err,
        ConfigurationError::InvalidDomain {
            field: "custom_domain",
            ..
        }
    ));

    let long = format!("{}com", "a.".repeat(130));
    assert!(validate(managed_config().with_custom_domain(long)).is_err());
}

#[test]
fn test_rejects_multi_label_subdomain() {
    let err = validate(managed_config().with_railway_subdomain("grid.pulse")).unwrap_err();
    assert!(matches!(
        err,
        ConfigurationError::InvalidDomain {
            field: "railway_subdomain",
            ..
        }
    ));
}

#[test]
fn test_rejects_conflicting_data_service() {
    let mut builder = EnvironmentBuilder::new(validate(managed_config()).unwrap()).unwrap();
    builder.add_data_service(DataServiceConfig::default()).unwrap();

    let err = builder
        .add_data_service(DataServiceConfig::with_schedule("*/5 * * * *"))
        .unwrap_err();
    assert!(matches!(err, GraphError::ConflictingDataService { .. }));

    // The builder is still usable after the rejected call
    let graph = builder.finish().unwrap();
    assert!(graph.output("data_service_id").is_some());
}

#[test]
fn test_rejects_malformed_supabase_region() {
    let config = EnvironmentConfig::new("p", "prod", "t", "s")
        .with_supabase(SupabaseConfig::new("x", "o", "n", "pw").with_region("us_east_1"));
    let err = build_environment(config, None).unwrap_err();

    assert!(matches!(
        err,
        ProvisionError::Configuration(ConfigurationError::InvalidField {
            field: "supabase_region",
            ..
        })
    ));
    assert_eq!(
        err.to_string(),
        "configuration error: invalid supabase_region 'us_east_1': must be a region slug such as us-east-1"
    );
}
