//! Resource Graph Builder
//!
//! Describes one GridPulse environment: the environment itself, exactly one
//! database branch, the cache, the web service with its variables and
//! domains, and on request the batch data service. Construction performs no
//! I/O; the result is handed to the infrastructure engine.

use crate::config::{DataServiceConfig, Secret};
use crate::construction::validator::{DatabaseBackend, ValidatedConfig};
use crate::dag::DependencyGraph;
use crate::derive::DerivedValues;
use crate::error::GraphError;
use crate::outputs;
use crate::types::{
    AttributeValue, Descriptor, DescriptorId, Provider, ResourceType, ServiceSource,
};
use crate::validated_graph::{EnvironmentGraph, ProviderConfig};
use indexmap::IndexMap;

/// TimescaleDB image for the managed Postgres service
pub const POSTGRES_IMAGE: &str = "timescale/timescaledb:latest-pg15";

/// Cache image
pub const REDIS_IMAGE: &str = "redis:7-alpine";

/// Repository the data service is built from
pub const DATA_SERVICE_REPO: &str = "awynne/grid";

/// Branch the data service is built from
pub const DATA_SERVICE_BRANCH: &str = "main";

/// Subdirectory holding the data service
pub const DATA_SERVICE_ROOT: &str = "worker";

/// Native schema engine shipped in the web image
pub const PRISMA_SCHEMA_ENGINE_BINARY: &str =
    "/app/node_modules/@prisma/engines/schema-engine-debian-openssl-1.1.x";

/// Native query engine shipped in the web image
pub const PRISMA_QUERY_ENGINE_LIBRARY: &str =
    "/app/node_modules/.prisma/client/libquery_engine-debian-openssl-1.1.x.so.node";

/// Descriptors making up the chosen database branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseHandles {
    /// Managed Postgres container
    ManagedPostgres {
        /// Shared variable carrying the password, created before the service
        password_propagation: DescriptorId,
        /// Postgres service
        service: DescriptorId,
    },
    /// External managed database
    Supabase {
        /// Database project
        project: DescriptorId,
        /// Project settings
        settings: DescriptorId,
    },
}

impl DatabaseHandles {
    /// Descriptor whose creation means the database is ready for clients
    #[must_use]
    pub fn ready(&self) -> &DescriptorId {
        match self {
            Self::ManagedPostgres { service, .. } => service,
            Self::Supabase { settings, .. } => settings,
        }
    }
}

/// IDs of the descriptors callers and outputs care about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHandles {
    /// Environment (graph root)
    pub environment: DescriptorId,
    /// Database branch
    pub database: DatabaseHandles,
    /// Cache service
    pub redis: DescriptorId,
    /// Web service
    pub web: DescriptorId,
    /// Provider-assigned subdomain, when configured
    pub service_domain: Option<DescriptorId>,
    /// Custom domain, when configured
    pub custom_domain: Option<DescriptorId>,
    /// Batch data service, when added
    pub data: Option<DescriptorId>,
}

/// Builder for one environment's resource graph
///
/// Usage:
/// ```rust,ignore
/// let validated = validator::validate(config)?;
/// let mut builder = EnvironmentBuilder::new(validated)?;
/// builder.add_data_service(DataServiceConfig::default())?;
/// let graph: EnvironmentGraph = builder.finish()?;
/// ```
#[derive(Debug)]
pub struct EnvironmentBuilder {
    config: ValidatedConfig,
    derived: DerivedValues,
    descriptors: IndexMap<DescriptorId, Descriptor>,
    handles: ServiceHandles,
    data_service: Option<DataServiceConfig>,
}

impl EnvironmentBuilder {
    /// Describe the environment for a validated config
    pub fn new(config: ValidatedConfig) -> Result<Self, GraphError> {
        let span = tracing::info_span!(
            "build_environment",
            environment = config.environment_name(),
            backend = config.backend().kind(),
        );
        let _guard = span.enter();

        let supabase_project = DescriptorId::new(ResourceType::SupabaseProject, "database");
        let derived = DerivedValues::compute(&config, &supabase_project.id_ref());
        let mut descriptors = IndexMap::new();
        let project_id = config.project_id();

        let environment = insert(
            &mut descriptors,
            Descriptor::new(ResourceType::Environment, "environment")
                .attr("name", config.environment_name())
                .attr("project_id", project_id),
        )?;

        let database = match config.backend() {
            DatabaseBackend::ManagedPostgres(raw) => {
                let password = derived
                    .container_password
                    .clone()
                    .unwrap_or_else(|| raw.clone());
                add_managed_postgres(&mut descriptors, &config, password, &environment)?
            }
            DatabaseBackend::Supabase(supabase) => {
                let project = insert(
                    &mut descriptors,
                    Descriptor::new(ResourceType::SupabaseProject, supabase_project.name())
                        .attr("organization_id", supabase.organization_id.as_str())
                        .attr("name", supabase.project_name.as_str())
                        .attr("database_password", supabase.database_password.clone())
                        .attr("region", supabase.region.as_str()),
                )?;
                let settings = insert(
                    &mut descriptors,
                    Descriptor::new(ResourceType::SupabaseSettings, "database")
                        .attr("project_ref", project.id_ref())
                        .attr("api", AttributeValue::Json(supabase_api_settings()))
                        .attr("pooler", AttributeValue::Json(supabase_pooler_settings())),
                )?;
                DatabaseHandles::Supabase { project, settings }
            }
        };

        let redis = insert(
            &mut descriptors,
            Descriptor::service("redis", project_id, ServiceSource::image(REDIS_IMAGE), None)
                .depends_on(&environment),
        )?;

        let web_source = config
            .web_image()
            .map_or(ServiceSource::Connected, |image| ServiceSource::Image {
                image: image.image.clone(),
                username: image.username.clone(),
                password: image.password.clone(),
            });
        let web = insert(
            &mut descriptors,
            Descriptor::service("web", project_id, web_source, None)
                .depends_on(&environment)
                .depends_on(database.ready()),
        )?;

        let service_domain = match &config.domains().railway_subdomain {
            Some(subdomain) => Some(insert(
                &mut descriptors,
                Descriptor::new(ResourceType::ServiceDomain, "web")
                    .attr("environment_id", environment.id_ref())
                    .attr("service_id", web.id_ref())
                    .attr("subdomain", subdomain.as_str()),
            )?),
            None => None,
        };
        let custom_domain = match &config.domains().custom_domain {
            Some(domain) => Some(insert(
                &mut descriptors,
                Descriptor::new(ResourceType::CustomDomain, "web")
                    .attr("domain", domain.as_str())
                    .attr("environment_id", environment.id_ref())
                    .attr("service_id", web.id_ref()),
            )?),
            None => None,
        };

        for (name, value) in web_variables(&config, &derived) {
            let mut variable = Descriptor::variable(
                format!("web_{}", name.to_ascii_lowercase()),
                &environment,
                &web,
                name,
                value,
            );
            if name == "DATABASE_URL" {
                for reference in &derived.database_url_refs {
                    variable = variable.depends_on(reference.target());
                }
            }
            insert(&mut descriptors, variable)?;
        }

        Ok(Self {
            config,
            derived,
            descriptors,
            handles: ServiceHandles {
                environment,
                database,
                redis,
                web,
                service_domain,
                custom_domain,
                data: None,
            },
            data_service: None,
        })
    }

    /// Add the batch data service
    ///
    /// Calling this again with the same settings returns the ID created the
    /// first time. Different settings are a caller bug and fail.
    pub fn add_data_service(
        &mut self,
        service_config: DataServiceConfig,
    ) -> Result<DescriptorId, GraphError> {
        if let (Some(existing), Some(id)) = (&self.data_service, &self.handles.data) {
            if *existing == service_config {
                tracing::debug!(id = %id, "Data service already present");
                return Ok(id.clone());
            }
            return Err(GraphError::ConflictingDataService {
                existing: existing.cron_schedule.clone(),
                requested: service_config.cron_schedule,
            });
        }

        let environment = self.handles.environment.clone();
        let source = ServiceSource::Repo {
            repo: DATA_SERVICE_REPO.to_string(),
            branch: DATA_SERVICE_BRANCH.to_string(),
            root_directory: DATA_SERVICE_ROOT.to_string(),
        };
        let data = insert(
            &mut self.descriptors,
            Descriptor::service(
                "data",
                self.config.project_id(),
                source,
                Some(service_config.cron_schedule.as_str()),
            )
            .depends_on(&environment)
            .depends_on(self.handles.database.ready()),
        )?;

        let mut variables: Vec<(&'static str, AttributeValue)> =
            vec![("NODE_ENV", "production".into())];
        if let Some(key) = self.config.eia_api_key() {
            variables.push(("EIA_API_KEY", key.clone().into()));
        }
        variables.push(("DATABASE_URL", self.derived.database_url.clone().into()));
        variables.push(("REDIS_URL", self.derived.redis_url.clone().into()));

        for (name, value) in variables {
            let mut variable = Descriptor::variable(
                format!("data_{}", name.to_ascii_lowercase()),
                &environment,
                &data,
                name,
                value,
            );
            if name == "DATABASE_URL" {
                for reference in &self.derived.database_url_refs {
                    variable = variable.depends_on(reference.target());
                }
            }
            insert(&mut self.descriptors, variable)?;
        }

        tracing::info!(cron = %service_config.cron_schedule, "Added data service");
        self.handles.data = Some(data.clone());
        self.data_service = Some(service_config);
        Ok(data)
    }

    /// Handles of the descriptors built so far
    #[must_use]
    pub fn handles(&self) -> &ServiceHandles {
        &self.handles
    }

    /// Derived values shared by services
    #[must_use]
    pub fn derived(&self) -> &DerivedValues {
        &self.derived
    }

    /// Number of descriptors so far
    #[must_use]
    pub fn descriptor_count(&self) -> usize {
        self.descriptors.len()
    }

    /// Check the graph and produce an [`EnvironmentGraph`]
    ///
    /// Every dependency must exist in the graph and the edges must be
    /// acyclic. Once finished, the graph cannot be modified.
    pub fn finish(self) -> Result<EnvironmentGraph, GraphError> {
        let dag = DependencyGraph::from_descriptors(self.descriptors.values())?;
        let order = dag.topological_order()?;
        let outputs = outputs::project(&self.config, &self.handles, &self.derived);

        let mut providers = vec![ProviderConfig::new(Provider::Railway)
            .attr("token", self.config.railway_token().clone())];
        if let DatabaseBackend::Supabase(supabase) = self.config.backend() {
            providers.push(
                ProviderConfig::new(Provider::Supabase)
                    .attr("access_token", supabase.access_token.clone()),
            );
        }

        tracing::info!(
            environment = self.config.environment_name(),
            backend = self.config.backend().kind(),
            descriptors = dag.node_count(),
            edges = dag.edge_count(),
            "Built environment graph"
        );

        Ok(EnvironmentGraph::new(
            self.config.environment_name().to_string(),
            self.config.backend().kind(),
            providers,
            self.descriptors,
            order,
            self.handles,
            outputs,
        ))
    }
}

fn insert(
    descriptors: &mut IndexMap<DescriptorId, Descriptor>,
    descriptor: Descriptor,
) -> Result<DescriptorId, GraphError> {
    let id = descriptor.id().clone();
    if descriptors.contains_key(&id) {
        return Err(GraphError::DuplicateDescriptor(id.to_string()));
    }
    tracing::debug!(id = %id, deps = descriptor.dependencies().len(), "Describing resource");
    descriptors.insert(id.clone(), descriptor);
    Ok(id)
}

fn add_managed_postgres(
    descriptors: &mut IndexMap<DescriptorId, Descriptor>,
    config: &ValidatedConfig,
    password: Secret,
    environment: &DescriptorId,
) -> Result<DatabaseHandles, GraphError> {
    // Must exist before the container's first boot so it initializes with
    // the right credential.
    let password_propagation = insert(
        descriptors,
        Descriptor::new(ResourceType::SharedVariable, "postgres_password")
            .attr("environment_id", environment.id_ref())
            .attr("project_id", config.project_id())
            .attr("name", "POSTGRES_PASSWORD")
            .attr("value", password.clone()),
    )?;

    let service = insert(
        descriptors,
        Descriptor::service(
            "postgres",
            config.project_id(),
            ServiceSource::image(POSTGRES_IMAGE),
            None,
        )
        .depends_on(environment)
        .depends_on(&password_propagation),
    )?;

    let variables: [(&str, AttributeValue); 3] = [
        ("POSTGRES_DB", config.database_name().into()),
        ("POSTGRES_USER", "postgres".into()),
        ("POSTGRES_PASSWORD", password.into()),
    ];
    for (name, value) in variables {
        insert(
            descriptors,
            Descriptor::variable(name.to_ascii_lowercase(), environment, &service, name, value),
        )?;
    }

    Ok(DatabaseHandles::ManagedPostgres {
        password_propagation,
        service,
    })
}

fn web_variables(
    config: &ValidatedConfig,
    derived: &DerivedValues,
) -> Vec<(&'static str, AttributeValue)> {
    let mut variables: Vec<(&'static str, AttributeValue)> = vec![
        ("NODE_ENV", "production".into()),
        ("RAILWAY_ENVIRONMENT_NAME", config.environment_name().into()),
        ("PORT", "3000".into()),
        ("SESSION_SECRET", config.session_secret().clone().into()),
        ("DATABASE_URL", derived.database_url.clone().into()),
    ];
    if let Some(password) = &derived.container_password {
        variables.push(("POSTGRES_PASSWORD", password.clone().into()));
    }
    variables.extend([
        ("REDIS_URL", derived.redis_url.clone().into()),
        ("PRISMA_SCHEMA_ENGINE_BINARY", PRISMA_SCHEMA_ENGINE_BINARY.into()),
        ("PRISMA_QUERY_ENGINE_LIBRARY", PRISMA_QUERY_ENGINE_LIBRARY.into()),
    ]);
    if let Some(image) = &derived.deployed_image {
        variables.push(("DEPLOYED_IMAGE", image.clone().into()));
    }
    variables.push(("DEPLOYMENT_METHOD", "docker".into()));
    if let Some(key) = config.eia_api_key() {
        variables.push(("EIA_API_KEY", key.clone().into()));
    }
    variables
}

fn supabase_api_settings() -> serde_json::Value {
    serde_json::json!({
        "db_schema": "public,storage,graphql_public",
        "db_extra_search_path": "public,extensions",
        "max_rows": 1000,
    })
}

fn supabase_pooler_settings() -> serde_json::Value {
    serde_json::json!({
        "default_pool_size": 15,
        "max_client_conn": 200,
        "pool_mode": "transaction",
    })
}
