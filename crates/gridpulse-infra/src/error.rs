//! Error types for GridPulse provisioning
//!
//! Provides error handling for:
//! - Parameter resolution failures (missing inputs, unreadable files)
//! - Configuration validation (backend choice, incomplete groups, domains)
//! - Resource graph construction (dangling references, cycles, conflicts)

use std::path::PathBuf;

/// Main provisioning error type
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// Input parameters could not be resolved
    #[error("parameter error: {0}")]
    Parameters(#[from] ParameterError),

    /// The resolved configuration is invalid
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The resource graph is not self-consistent
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// The synthesized document could not be written
    #[error("failed to write {path}: {source}")]
    Output {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
}

impl ProvisionError {
    /// Check if the run was rejected before any descriptor was built
    #[inline]
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Parameters(_) | Self::Configuration(_))
    }
}

/// Parameter resolution errors
#[derive(Debug, thiserror::Error)]
pub enum ParameterError {
    /// One or more required parameters had no value and no default
    #[error("missing required parameters: {}", .0.join(", "))]
    Missing(Vec<String>),

    /// The parameter file could not be read or parsed
    #[error("{path}: {message}")]
    File {
        /// Parameter file path
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// The parameter file has an extension we cannot parse
    #[error("{0}: unsupported parameter file format (expected .toml, .yaml, .yml or .json)")]
    UnsupportedFormat(PathBuf),
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// Neither database backend was configured
    #[error("database backend required: set postgres_password or the supabase parameter group")]
    MissingBackend,

    /// Both database backends were configured
    #[error("ambiguous backend: postgres_password and the supabase parameter group are mutually exclusive")]
    AmbiguousBackend,

    /// A parameter group was only partially supplied
    #[error("incomplete {group} configuration: missing {}", .missing.join(", "))]
    IncompleteGroup {
        /// Group name
        group: &'static str,
        /// Members that were not supplied
        missing: Vec<&'static str>,
    },

    /// A required field was empty
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// A domain or subdomain is not a valid hostname
    #[error("invalid {field} '{value}': {reason}")]
    InvalidDomain {
        /// Field that carried the domain
        field: &'static str,
        /// Offending value
        value: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// A field is present but malformed
    #[error("invalid {field} '{value}': {reason}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// Offending value
        value: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Multiple errors collected during validation
    #[error("{}", display_multiple(.0))]
    Multiple(Vec<ConfigurationError>),
}

fn display_multiple(errors: &[ConfigurationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
}

/// Resource graph errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Two descriptors were registered under the same ID
    #[error("duplicate descriptor: {0}")]
    DuplicateDescriptor(String),

    /// A dependency edge or reference points outside the graph
    #[error("{from} references unknown descriptor {to}")]
    DanglingReference {
        /// Referencing descriptor
        from: String,
        /// Missing target
        to: String,
    },

    /// A descriptor depends on itself
    #[error("{0} depends on itself")]
    SelfLoop(String),

    /// The dependency edges contain a cycle
    #[error("dependency cycle through {0}")]
    CycleDetected(String),

    /// The data service was requested twice with different settings
    #[error("data service already added with cron '{existing}', refusing '{requested}'")]
    ConflictingDataService {
        /// Schedule of the first request
        existing: String,
        /// Schedule of the conflicting request
        requested: String,
    },
}

/// Result alias for provisioning operations
pub type Result<T> = std::result::Result<T, ProvisionError>;
