//! Descriptor types
//!
//! Resource descriptors are engine-agnostic: a resource type, a stable name,
//! an ordered attribute map and explicit dependency edges. References to other
//! descriptors' computed attributes render as `${type.name.attribute}` and
//! count as dependencies.

use crate::config::Secret;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Provider a resource type belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Hosting provider (compute, variables, domains)
    Railway,
    /// Managed database provider
    Supabase,
}

impl Provider {
    /// Provider key used by the engine
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Railway => "railway",
            Self::Supabase => "supabase",
        }
    }

    /// Registry source address
    #[must_use]
    pub const fn source(self) -> &'static str {
        match self {
            Self::Railway => "terraform-community-providers/railway",
            Self::Supabase => "supabase/supabase",
        }
    }
}

/// Kind of declarative resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "&'static str")]
pub enum ResourceType {
    /// Deployment environment inside a project
    Environment,
    /// Compute service
    Service,
    /// Service-scoped environment variable
    Variable,
    /// Environment-scoped variable shared by all services
    SharedVariable,
    /// Provider-assigned subdomain
    ServiceDomain,
    /// Caller-owned domain
    CustomDomain,
    /// External managed database project
    SupabaseProject,
    /// External managed database settings
    SupabaseSettings,
}

impl ResourceType {
    /// Engine resource type name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Environment => "railway_environment",
            Self::Service => "railway_service",
            Self::Variable => "railway_variable",
            Self::SharedVariable => "railway_shared_variable",
            Self::ServiceDomain => "railway_service_domain",
            Self::CustomDomain => "railway_custom_domain",
            Self::SupabaseProject => "supabase_project",
            Self::SupabaseSettings => "supabase_settings",
        }
    }

    /// Provider that owns this resource type
    #[must_use]
    pub const fn provider(self) -> Provider {
        match self {
            Self::SupabaseProject | Self::SupabaseSettings => Provider::Supabase,
            _ => Provider::Railway,
        }
    }
}

impl From<ResourceType> for &'static str {
    fn from(value: ResourceType) -> Self {
        value.as_str()
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable descriptor identity: `<resource type>.<name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorId {
    resource_type: ResourceType,
    name: String,
}

impl DescriptorId {
    /// Create an ID
    pub fn new(resource_type: ResourceType, name: impl Into<String>) -> Self {
        Self {
            resource_type,
            name: name.into(),
        }
    }

    /// Resource type
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Name within the resource type
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reference one of this descriptor's attributes
    #[must_use]
    pub fn attr(&self, attribute: &'static str) -> Reference {
        Reference {
            target: self.clone(),
            attribute,
        }
    }

    /// Reference this descriptor's `id`
    #[must_use]
    pub fn id_ref(&self) -> Reference {
        self.attr("id")
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

impl Serialize for DescriptorId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Reference to a computed attribute of another descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    target: DescriptorId,
    attribute: &'static str,
}

impl Reference {
    /// Referenced descriptor
    #[must_use]
    pub fn target(&self) -> &DescriptorId {
        &self.target
    }

    /// Referenced attribute
    #[must_use]
    pub fn attribute(&self) -> &'static str {
        self.attribute
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}.{}}}", self.target, self.attribute)
    }
}

/// Attribute value on a descriptor
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Plain string
    Text(String),
    /// Secret string
    Sensitive(Secret),
    /// Integer
    Number(i64),
    /// Computed attribute of another descriptor
    Reference(Reference),
    /// Structured settings, handed on as serialized JSON
    Json(serde_json::Value),
}

impl AttributeValue {
    /// Whether the value must not be shown to operators
    #[must_use]
    pub fn is_sensitive(&self) -> bool {
        matches!(self, Self::Sensitive(_))
    }

    /// Render the value as the engine sees it
    #[must_use]
    pub fn render(&self) -> serde_json::Value {
        match self {
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Sensitive(s) => serde_json::Value::String(s.expose().to_string()),
            Self::Number(n) => serde_json::Value::from(*n),
            Self::Reference(r) => serde_json::Value::String(r.to_string()),
            Self::Json(v) => serde_json::Value::String(v.to_string()),
        }
    }

    /// String form, exposing secrets
    #[must_use]
    pub fn expose(&self) -> String {
        match self.render() {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        }
    }

    /// String form safe for display
    #[must_use]
    pub fn redacted(&self) -> String {
        if self.is_sensitive() {
            "[redacted]".to_string()
        } else {
            self.expose()
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Secret> for AttributeValue {
    fn from(value: Secret) -> Self {
        Self::Sensitive(value)
    }
}

impl From<Reference> for AttributeValue {
    fn from(value: Reference) -> Self {
        Self::Reference(value)
    }
}

/// Where a service's code comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceSource {
    /// Registry image, optionally with pull credentials
    Image {
        /// Image reference
        image: String,
        /// Registry username
        username: Option<String>,
        /// Registry password or token
        password: Option<Secret>,
    },
    /// Source repository
    Repo {
        /// `owner/name`
        repo: String,
        /// Branch to deploy
        branch: String,
        /// Subdirectory holding the service
        root_directory: String,
    },
    /// Built by the provider from the project's connected repository
    Connected,
}

impl ServiceSource {
    /// Public image
    pub fn image(image: impl Into<String>) -> Self {
        Self::Image {
            image: image.into(),
            username: None,
            password: None,
        }
    }
}

/// One declarative resource
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    id: DescriptorId,
    attributes: IndexMap<&'static str, AttributeValue>,
    depends_on: Vec<DescriptorId>,
}

impl Descriptor {
    /// Empty descriptor
    pub fn new(resource_type: ResourceType, name: impl Into<String>) -> Self {
        Self {
            id: DescriptorId::new(resource_type, name),
            attributes: IndexMap::new(),
            depends_on: Vec::new(),
        }
    }

    /// Compute service descriptor
    pub fn service(
        name: &str,
        project_id: &str,
        source: ServiceSource,
        cron_schedule: Option<&str>,
    ) -> Self {
        let mut descriptor = Self::new(ResourceType::Service, name)
            .attr("name", name)
            .attr("project_id", project_id);
        match source {
            ServiceSource::Image {
                image,
                username,
                password,
            } => {
                descriptor = descriptor.attr("source_image", image);
                if let Some(username) = username {
                    descriptor = descriptor.attr("source_image_registry_username", username);
                }
                if let Some(password) = password {
                    descriptor = descriptor.attr("source_image_registry_password", password);
                }
            }
            ServiceSource::Repo {
                repo,
                branch,
                root_directory,
            } => {
                descriptor = descriptor
                    .attr("source_repo", repo)
                    .attr("source_repo_branch", branch)
                    .attr("root_directory", root_directory);
            }
            ServiceSource::Connected => {}
        }
        if let Some(cron) = cron_schedule {
            descriptor = descriptor.attr("cron_schedule", cron);
        }
        descriptor
    }

    /// Service-scoped variable descriptor
    pub fn variable(
        descriptor_name: impl Into<String>,
        environment: &DescriptorId,
        service: &DescriptorId,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> Self {
        Self::new(ResourceType::Variable, descriptor_name)
            .attr("environment_id", environment.id_ref())
            .attr("service_id", service.id_ref())
            .attr("name", name)
            .attr("value", value)
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, key: &'static str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key, value.into());
        self
    }

    /// Add an explicit dependency edge
    #[must_use]
    pub fn depends_on(mut self, id: &DescriptorId) -> Self {
        if !self.depends_on.contains(id) {
            self.depends_on.push(id.clone());
        }
        self
    }

    /// Descriptor ID
    #[must_use]
    pub fn id(&self) -> &DescriptorId {
        &self.id
    }

    /// Resource type
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        self.id.resource_type()
    }

    /// Attribute lookup
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Attributes in insertion order
    pub fn attributes(&self) -> impl Iterator<Item = (&'static str, &AttributeValue)> {
        self.attributes.iter().map(|(k, v)| (*k, v))
    }

    /// Explicit dependency edges
    #[must_use]
    pub fn explicit_dependencies(&self) -> &[DescriptorId] {
        &self.depends_on
    }

    /// Explicit dependencies followed by referenced descriptors, deduplicated
    #[must_use]
    pub fn dependencies(&self) -> Vec<&DescriptorId> {
        let mut deps: Vec<&DescriptorId> = Vec::new();
        let referenced = self.attributes.values().filter_map(|value| match value {
            AttributeValue::Reference(r) => Some(r.target()),
            _ => None,
        });
        for dep in self.depends_on.iter().chain(referenced) {
            if !deps.contains(&dep) {
                deps.push(dep);
            }
        }
        deps
    }
}
