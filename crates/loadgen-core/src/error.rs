//! Error types for loadgen core.

use thiserror::Error;

/// Errors raised while reading or validating a load schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Error reading the schema file
    #[error("Failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Structural problem with a sample definition
    #[error("Sample '{name}': {reason}")]
    Invalid { name: String, reason: String },

    /// Two samples share a name
    #[error("Duplicate sample name '{0}'")]
    Duplicate(String),
}

/// Errors raised while loading a sample's candidate pool.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Candidate file could not be read
    #[error("Failed to read sample file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Candidate file content is not usable
    #[error("Malformed sample file '{path}': {reason}")]
    Format { path: String, reason: String },
}

/// Errors raised while parsing relative time offsets such as `-2h`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeMathError {
    /// Empty offset string
    #[error("Empty time offset")]
    Empty,

    /// The numeric part is missing or does not parse
    #[error("Invalid number in time offset '{0}'")]
    Number(String),

    /// The unit suffix is missing or unknown
    #[error("Unknown time unit '{unit}' in offset '{offset}'")]
    Unit { offset: String, unit: String },
}

/// Errors raised while building a runtime sample from its spec.
#[derive(Debug, Error)]
pub enum SampleError {
    /// Candidate pool load failure
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Bad relative-time offset in the sample definition
    #[error("Sample '{sample}': bad {field} offset: {source}")]
    Offset {
        sample: String,
        field: &'static str,
        #[source]
        source: TimeMathError,
    },
}
