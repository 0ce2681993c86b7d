//! Output projection
//!
//! Picks the identifiers and URLs exposed to the operator once the graph is
//! built. Which database identifier appears depends on the backend branch.

use crate::construction::validator::ValidatedConfig;
use crate::construction::{DatabaseHandles, ServiceHandles};
use crate::derive::DerivedValues;
use crate::types::AttributeValue;

/// One exported value
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    /// Output name
    pub name: &'static str,
    /// Operator-facing description
    pub description: &'static str,
    /// Value, usually a reference into the graph
    pub value: AttributeValue,
    /// Whether the engine must hide the value
    pub sensitive: bool,
}

impl Output {
    fn new(name: &'static str, description: &'static str, value: impl Into<AttributeValue>) -> Self {
        let value = value.into();
        Self {
            name,
            description,
            sensitive: value.is_sensitive(),
            value,
        }
    }

    /// Value safe for display
    #[must_use]
    pub fn display_value(&self) -> String {
        self.value.redacted()
    }
}

/// Project the outputs for a built graph
#[must_use]
pub fn project(
    config: &ValidatedConfig,
    handles: &ServiceHandles,
    derived: &DerivedValues,
) -> Vec<Output> {
    let mut outputs = vec![
        Output::new("web_service_id", "Web service ID", handles.web.id_ref()),
        Output::new("redis_service_id", "Redis service ID", handles.redis.id_ref()),
        Output::new(
            "database_url",
            "Database connection URL",
            derived.database_url.clone(),
        ),
    ];

    match &handles.database {
        DatabaseHandles::ManagedPostgres { service, .. } => outputs.push(Output::new(
            "postgres_service_id",
            "PostgreSQL service ID",
            service.id_ref(),
        )),
        DatabaseHandles::Supabase { project, .. } => outputs.push(Output::new(
            "supabase_project_id",
            "Supabase project ID",
            project.id_ref(),
        )),
    }

    if let Some(data) = &handles.data {
        outputs.push(Output::new("data_service_id", "Data service ID", data.id_ref()));
    }

    if let Some(domain) = &handles.service_domain {
        outputs.push(Output::new(
            "web_service_url",
            "Web service URL",
            format!("https://{}", domain.attr("domain")),
        ));
    }

    if let Some(domain) = &config.domains().custom_domain {
        if handles.custom_domain.is_some() {
            outputs.push(Output::new(
                "custom_domain_url",
                "Custom domain URL",
                format!("https://{domain}"),
            ));
        }
    }

    outputs
}
