//! Environment Graph - sealed build result
//!
//! An [`EnvironmentGraph`] can only come out of
//! [`EnvironmentBuilder::finish`](crate::construction::EnvironmentBuilder::finish),
//! so every graph handed to synthesis has passed input validation, the
//! dangling-reference check and the cycle check.

use crate::construction::ServiceHandles;
use crate::outputs::Output;
use crate::types::{AttributeValue, Descriptor, DescriptorId, Provider, ResourceType};
use indexmap::IndexMap;
use sha2::{Digest, Sha256};

/// Provider block with its credentials
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Provider
    pub provider: Provider,
    /// Provider settings
    pub attributes: IndexMap<&'static str, AttributeValue>,
}

impl ProviderConfig {
    /// Provider block without settings
    #[must_use]
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            attributes: IndexMap::new(),
        }
    }

    /// Set a provider attribute
    #[inline]
    #[must_use]
    pub fn attr(mut self, key: &'static str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key, value.into());
        self
    }
}

/// Validated, immutable resource graph for one environment
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentGraph {
    environment_name: String,
    backend: &'static str,
    providers: Vec<ProviderConfig>,
    descriptors: IndexMap<DescriptorId, Descriptor>,
    creation_order: Vec<DescriptorId>,
    handles: ServiceHandles,
    outputs: Vec<Output>,
}

impl EnvironmentGraph {
    pub(crate) fn new(
        environment_name: String,
        backend: &'static str,
        providers: Vec<ProviderConfig>,
        descriptors: IndexMap<DescriptorId, Descriptor>,
        creation_order: Vec<DescriptorId>,
        handles: ServiceHandles,
        outputs: Vec<Output>,
    ) -> Self {
        Self {
            environment_name,
            backend,
            providers,
            descriptors,
            creation_order,
            handles,
            outputs,
        }
    }

    /// Environment name
    #[must_use]
    pub fn environment_name(&self) -> &str {
        &self.environment_name
    }

    /// Backend kind (`managed-postgres` or `supabase`)
    #[must_use]
    pub fn backend(&self) -> &'static str {
        self.backend
    }

    /// Providers the graph needs
    #[must_use]
    pub fn providers(&self) -> &[ProviderConfig] {
        &self.providers
    }

    /// Descriptors in build order
    pub fn descriptors(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.values()
    }

    /// Number of descriptors
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the graph is empty (never true for a built graph)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptor lookup
    #[must_use]
    pub fn get(&self, id: &DescriptorId) -> Option<&Descriptor> {
        self.descriptors.get(id)
    }

    /// Descriptors of one resource type
    pub fn of_type(&self, resource_type: ResourceType) -> impl Iterator<Item = &Descriptor> {
        self.descriptors
            .values()
            .filter(move |d| d.resource_type() == resource_type)
    }

    /// Valid creation order
    #[must_use]
    pub fn creation_order(&self) -> &[DescriptorId] {
        &self.creation_order
    }

    /// Handles of the main descriptors
    #[must_use]
    pub fn handles(&self) -> &ServiceHandles {
        &self.handles
    }

    /// Exported outputs
    #[must_use]
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Output lookup
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.name == name)
    }

    /// Variable `name` attached to `service`
    #[must_use]
    pub fn variable(&self, service: &DescriptorId, name: &str) -> Option<&AttributeValue> {
        let service_ref = AttributeValue::Reference(service.id_ref());
        self.of_type(ResourceType::Variable)
            .find(|d| {
                d.attribute("service_id") == Some(&service_ref)
                    && d.attribute("name").map(AttributeValue::expose).as_deref() == Some(name)
            })
            .and_then(|d| d.attribute("value"))
    }

    /// Content hash over descriptor IDs, attributes and edges
    ///
    /// Two builds from the same input produce the same fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.environment_name.as_bytes());
        for id in &self.creation_order {
            hasher.update(b"\0node:");
            hasher.update(id.to_string().as_bytes());
            let Some(descriptor) = self.descriptors.get(id) else {
                continue;
            };
            for (key, value) in descriptor.attributes() {
                hasher.update(b"\0attr:");
                hasher.update(key.as_bytes());
                hasher.update(b"=");
                hasher.update(value.expose().as_bytes());
            }
            for dep in descriptor.dependencies() {
                hasher.update(b"\0dep:");
                hasher.update(dep.to_string().as_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }
}
