//! Synthesis
//!
//! Renders an [`EnvironmentGraph`] as the JSON document the infrastructure
//! engine consumes. Rendering is deterministic: the same graph always yields
//! the same bytes.

use crate::error::{ProvisionError, Result};
use crate::validated_graph::EnvironmentGraph;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

/// File name of the synthesized document inside a stack directory
pub const DOCUMENT_NAME: &str = "cdk.tf.json";

/// Render the engine document for `graph` under `stack_name`
#[must_use]
pub fn synthesize(graph: &EnvironmentGraph, stack_name: &str) -> Value {
    let mut required_providers = Map::new();
    let mut providers = Map::new();
    for provider in graph.providers() {
        let name = provider.provider.as_str();
        required_providers.insert(
            name.to_string(),
            json!({ "source": provider.provider.source() }),
        );
        let settings: Map<String, Value> = provider
            .attributes
            .iter()
            .map(|(key, value)| ((*key).to_string(), value.render()))
            .collect();
        providers.insert(name.to_string(), Value::Array(vec![Value::Object(settings)]));
    }

    let mut resources: Map<String, Value> = Map::new();
    for descriptor in graph.descriptors() {
        let mut block: Map<String, Value> = descriptor
            .attributes()
            .map(|(key, value)| (key.to_string(), value.render()))
            .collect();
        if !descriptor.explicit_dependencies().is_empty() {
            block.insert(
                "depends_on".to_string(),
                descriptor
                    .explicit_dependencies()
                    .iter()
                    .map(|id| Value::String(id.to_string()))
                    .collect(),
            );
        }

        let by_type = resources
            .entry(descriptor.resource_type().as_str())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(by_name) = by_type {
            by_name.insert(descriptor.id().name().to_string(), Value::Object(block));
        }
    }

    let outputs: Map<String, Value> = graph
        .outputs()
        .iter()
        .map(|output| {
            let mut block = json!({
                "description": output.description,
                "value": output.value.render(),
            });
            if output.sensitive {
                block["sensitive"] = Value::Bool(true);
            }
            (output.name.to_string(), block)
        })
        .collect();

    json!({
        "//": {
            "metadata": {
                "stack": stack_name,
                "environment": graph.environment_name(),
                "backend": graph.backend(),
                "creation_order": graph.creation_order(),
                "fingerprint": graph.fingerprint(),
                "version": crate::VERSION,
            }
        },
        "terraform": { "required_providers": required_providers },
        "provider": providers,
        "resource": resources,
        "output": outputs,
    })
}

/// Path of a stack's document under `out_dir`
#[must_use]
pub fn document_path(out_dir: &Path, stack_name: &str) -> PathBuf {
    out_dir.join("stacks").join(stack_name).join(DOCUMENT_NAME)
}

/// Write a synthesized document, creating parent directories
pub fn write_document(document: &Value, out_dir: &Path, stack_name: &str) -> Result<PathBuf> {
    let path = document_path(out_dir, stack_name);
    let io_error = |source: std::io::Error| ProvisionError::Output {
        path: path.clone(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    let mut bytes = serde_json::to_vec_pretty(document)
        .map_err(|e| io_error(std::io::Error::from(e)))?;
    bytes.push(b'\n');
    std::fs::write(&path, bytes).map_err(io_error)?;

    tracing::info!(path = %path.display(), "Wrote synthesized stack");
    Ok(path)
}
