//! Input Resolution
//!
//! Named, typed, optionally-sensitive input parameters are read from a
//! [`ParameterSource`] and resolved against a table of [`ParameterSpec`]s.
//! Defaults apply only when the source has no (or an empty) value.
//!
//! Sources mirror how the infrastructure engine itself receives variables:
//! `TF_VAR_<name>` environment variables, optionally layered over a flat
//! parameter file.

use crate::config::Secret;
use crate::error::ParameterError;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Environment variable prefix used by the infrastructure engine
pub const ENV_PREFIX: &str = "TF_VAR_";

/// Declaration of one input parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSpec {
    /// Parameter name (snake case)
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Whether the value must be treated as a secret
    pub sensitive: bool,
    /// Default value; `None` makes the parameter required
    pub default: Option<&'static str>,
}

impl ParameterSpec {
    /// Declare a required parameter
    #[must_use]
    pub const fn required(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            sensitive: false,
            default: None,
        }
    }

    /// Declare a parameter with a default
    #[must_use]
    pub const fn with_default(
        name: &'static str,
        description: &'static str,
        default: &'static str,
    ) -> Self {
        Self {
            name,
            description,
            sensitive: false,
            default: Some(default),
        }
    }

    /// Mark the parameter sensitive
    #[must_use]
    pub const fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Replace the default
    #[must_use]
    pub const fn defaulting_to(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    /// Whether resolution fails when no value is supplied
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Somewhere parameter values can be looked up by name
pub trait ParameterSource {
    /// Look up a raw value
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Reads `TF_VAR_<name>` from the process environment
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
}

impl EnvSource {
    /// Source using a custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for EnvSource {
    fn default() -> Self {
        Self::with_prefix(ENV_PREFIX)
    }
}

impl ParameterSource for EnvSource {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(format!("{}{name}", self.prefix)).ok()
    }
}

/// In-memory parameter values
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    values: HashMap<String, String>,
}

impl MapSource {
    /// Create an empty source
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Insert a value in place
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ParameterSource for MapSource {
    fn lookup(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// Scalar accepted in a parameter file
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Self::Str(s) => s,
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

/// Flat parameter file (`.toml`, `.yaml`/`.yml` or `.json`)
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    inner: MapSource,
}

impl FileSource {
    /// Load and parse a parameter file, choosing the format by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParameterError> {
        let path = path.as_ref().to_path_buf();
        let contents = std::fs::read_to_string(&path).map_err(|e| ParameterError::File {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let parsed = match extension.as_deref() {
            Some("toml") => Self::parse_toml(&contents),
            Some("yaml" | "yml") => Self::parse_yaml(&contents),
            Some("json") => Self::parse_json(&contents),
            _ => return Err(ParameterError::UnsupportedFormat(path)),
        };
        let values = parsed.map_err(|message| ParameterError::File {
            path: path.clone(),
            message,
        })?;

        tracing::debug!(path = %path.display(), count = values.len(), "Loaded parameter file");
        Ok(Self {
            path,
            inner: values
                .into_iter()
                .map(|(k, v)| (k, v.into_string()))
                .collect(),
        })
    }

    /// Path the values were loaded from
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse_toml(contents: &str) -> Result<BTreeMap<String, Scalar>, String> {
        toml::from_str(contents).map_err(|e| e.to_string())
    }

    fn parse_yaml(contents: &str) -> Result<BTreeMap<String, Scalar>, String> {
        serde_yaml::from_str(contents).map_err(|e| e.to_string())
    }

    fn parse_json(contents: &str) -> Result<BTreeMap<String, Scalar>, String> {
        serde_json::from_str(contents).map_err(|e| e.to_string())
    }
}

impl ParameterSource for FileSource {
    fn lookup(&self, name: &str) -> Option<String> {
        self.inner.lookup(name)
    }
}

/// Ordered list of sources; the first one with a value wins
#[derive(Default)]
pub struct LayeredSource {
    layers: Vec<Box<dyn ParameterSource>>,
}

impl LayeredSource {
    /// Create an empty stack of sources
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a lower-priority source
    #[must_use]
    pub fn with(mut self, source: impl ParameterSource + 'static) -> Self {
        self.layers.push(Box::new(source));
        self
    }
}

impl ParameterSource for LayeredSource {
    fn lookup(&self, name: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.lookup(name))
    }
}

/// Parameter values after defaults were applied
#[derive(Debug, Clone, Default)]
pub struct ResolvedParameters {
    values: IndexMap<String, String>,
    sensitive: HashSet<String>,
}

impl ResolvedParameters {
    /// Resolve every declared parameter against a source
    ///
    /// Values are trimmed; an empty or whitespace-only value counts as "not
    /// supplied". All missing required parameters are reported together.
    pub fn resolve(
        specs: &[ParameterSpec],
        source: &dyn ParameterSource,
    ) -> Result<Self, ParameterError> {
        let mut resolved = Self::default();
        let mut missing = Vec::new();

        for spec in specs {
            let supplied = source
                .lookup(spec.name)
                .filter(|value| !value.trim().is_empty());
            let value = match (supplied, spec.default) {
                (Some(value), _) => value.trim().to_string(),
                (None, Some(default)) => default.to_string(),
                (None, None) => {
                    missing.push(spec.name.to_string());
                    continue;
                }
            };
            if spec.sensitive {
                resolved.sensitive.insert(spec.name.to_string());
            }
            resolved.values.insert(spec.name.to_string(), value);
        }

        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(ParameterError::Missing(missing))
        }
    }

    /// Raw value, including empty defaults
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Value, treating empty and whitespace-only strings as absent
    #[must_use]
    pub fn optional(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|value| !value.trim().is_empty())
    }

    /// Value wrapped as a secret, absent when empty
    #[must_use]
    pub fn secret(&self, name: &str) -> Option<Secret> {
        self.optional(name).map(Secret::new)
    }

    /// Whether the parameter was declared sensitive
    #[must_use]
    pub fn is_sensitive(&self, name: &str) -> bool {
        self.sensitive.contains(name)
    }

    /// Number of resolved parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was resolved
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
