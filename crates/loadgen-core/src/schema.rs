//! Sample configuration schema.
//!
//! A load schema is a YAML document listing the samples to generate. Each
//! sample names its candidate source, scheduling interval, end condition,
//! backfill window, sizing policy, and token sequence.

use crate::error::SchemaError;
use crate::token::Token;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level load schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSchema {
    /// Schema version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Samples to run, one governor each.
    pub samples: Vec<SampleSpec>,
}

fn default_version() -> u32 {
    1
}

impl LoadSchema {
    /// Load a schema from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load a schema from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SchemaError> {
        let schema: Self = serde_yaml::from_str(yaml)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Structural validation of all sample definitions.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut seen = std::collections::HashSet::new();
        for sample in &self.samples {
            if sample.name.is_empty() {
                return Err(SchemaError::Invalid {
                    name: "<unnamed>".to_string(),
                    reason: "sample name must not be empty".to_string(),
                });
            }
            if !seen.insert(sample.name.clone()) {
                return Err(SchemaError::Duplicate(sample.name.clone()));
            }
            if sample.interval == 0 {
                return Err(SchemaError::Invalid {
                    name: sample.name.clone(),
                    reason: "interval must be greater than zero".to_string(),
                });
            }
            if sample.file.is_none() && sample.lines.is_empty() {
                return Err(SchemaError::Invalid {
                    name: sample.name.clone(),
                    reason: "sample needs a candidate source (`file` or `lines`)".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Configuration for one sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleSpec {
    /// Sample name, unique within a schema.
    pub name: String,

    /// Interval between live rounds, in seconds.
    pub interval: u64,

    /// Startup delay before the first round, in seconds.
    #[serde(default)]
    pub delay: u64,

    /// Stop after this many rounds.
    #[serde(default)]
    pub end_after_executions: Option<u64>,

    /// Stop once a round's window reaches this RFC 3339 timestamp.
    /// Takes precedence over `end_after_executions` when both are set.
    #[serde(default)]
    pub end_at: Option<String>,

    /// Historical window to cover before live generation, e.g. `-2h`.
    #[serde(default)]
    pub backfill: Option<String>,

    /// Sizing policy name, resolved through the plugin registry.
    #[serde(default = "default_policy")]
    pub policy: String,

    /// Whether a round's budget counts records or bytes.
    #[serde(default)]
    pub mode: GenerationMode,

    /// Work items fanned out per live round.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Rate-computation plugin for the round budget.
    #[serde(default)]
    pub rater: RaterSpec,

    /// Output sink for this sample's batches.
    #[serde(default)]
    pub output: OutputSpec,

    /// Live-window start offset relative to now (default `-<interval>s`).
    #[serde(default)]
    pub earliest: Option<String>,

    /// Live-window end offset relative to now (default `+0s`).
    #[serde(default)]
    pub latest: Option<String>,

    /// Candidate file, one record per line.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Inline candidate records, used when no file is given.
    #[serde(default)]
    pub lines: Vec<String>,

    /// Ordered token sequence applied when rendering batches.
    #[serde(default)]
    pub tokens: Vec<Token>,
}

fn default_policy() -> String {
    "sequential".to_string()
}

fn default_workers() -> usize {
    1
}

/// Batch sizing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizingPolicy {
    /// Uniform random draws with replacement until the budget is met.
    Random,
    /// Whole-pool copies until the budget is exceeded.
    Bundle,
    /// Cyclic in-order fill with the 90% overshoot tolerance.
    #[default]
    Sequential,
}

impl std::fmt::Display for SizingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizingPolicy::Random => write!(f, "random"),
            SizingPolicy::Bundle => write!(f, "bundle"),
            SizingPolicy::Sequential => write!(f, "sequential"),
        }
    }
}

impl std::str::FromStr for SizingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(SizingPolicy::Random),
            "bundle" => Ok(SizingPolicy::Bundle),
            "sequential" => Ok(SizingPolicy::Sequential),
            _ => Err(format!("Unknown sizing policy: {s}")),
        }
    }
}

/// Whether a round budget is a record count or a byte allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Budget is a number of records.
    #[default]
    Count,
    /// Budget is a byte allowance; enables leftover carry.
    Volume,
}

impl std::fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationMode::Count => write!(f, "count"),
            GenerationMode::Volume => write!(f, "volume"),
        }
    }
}

/// Rate-computation plugin selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaterSpec {
    /// Plugin name, e.g. `constant` or `perturbed`.
    #[serde(default = "default_rater")]
    pub name: String,

    /// Base budget per round (records or bytes depending on the mode).
    #[serde(default = "default_count")]
    pub count: i64,

    /// Jitter fraction for the `perturbed` rater (0.2 = +/-20%).
    #[serde(default)]
    pub spread: f64,
}

fn default_rater() -> String {
    "constant".to_string()
}

fn default_count() -> i64 {
    10
}

impl Default for RaterSpec {
    fn default() -> Self {
        Self {
            name: default_rater(),
            count: default_count(),
            spread: 0.0,
        }
    }
}

/// Output sink plugin selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSpec {
    /// Sink name, e.g. `devnull`, `stdout`, or `file`.
    #[serde(default = "default_sink")]
    pub name: String,

    /// Target path for the `file` sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_sink() -> String {
    "devnull".to_string()
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            name: default_sink(),
            path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_SCHEMA: &str = r#"
version: 1
samples:
  - name: weblog
    interval: 10
    workers: 4
    mode: volume
    backfill: "-2h"
    rater:
      name: constant
      count: 4096
    lines:
      - "GET /index.html 200"
      - "POST /api/login 401"
    tokens:
      - pattern: "@@seq"
        type: counter
"#;

    #[test]
    fn test_schema_from_yaml() {
        let schema = LoadSchema::from_yaml(SAMPLE_SCHEMA).unwrap();
        assert_eq!(schema.version, 1);
        assert_eq!(schema.samples.len(), 1);

        let sample = &schema.samples[0];
        assert_eq!(sample.name, "weblog");
        assert_eq!(sample.interval, 10);
        assert_eq!(sample.workers, 4);
        assert_eq!(sample.mode, GenerationMode::Volume);
        assert_eq!(sample.backfill.as_deref(), Some("-2h"));
        assert_eq!(sample.rater.count, 4096);
        assert_eq!(sample.lines.len(), 2);
        assert_eq!(sample.tokens.len(), 1);
    }

    #[test]
    fn test_schema_defaults() {
        let yaml = r#"
samples:
  - name: minimal
    interval: 5
    lines: ["a"]
"#;
        let schema = LoadSchema::from_yaml(yaml).unwrap();
        let sample = &schema.samples[0];
        assert_eq!(sample.policy, "sequential");
        assert_eq!(sample.mode, GenerationMode::Count);
        assert_eq!(sample.workers, 1);
        assert_eq!(sample.delay, 0);
        assert_eq!(sample.rater.name, "constant");
        assert_eq!(sample.output.name, "devnull");
        assert!(sample.backfill.is_none());
        assert!(sample.end_at.is_none());
    }

    #[test]
    fn test_schema_rejects_zero_interval() {
        let yaml = r#"
samples:
  - name: broken
    interval: 0
    lines: ["a"]
"#;
        assert!(matches!(
            LoadSchema::from_yaml(yaml),
            Err(SchemaError::Invalid { .. })
        ));
    }

    #[test]
    fn test_schema_rejects_missing_source() {
        let yaml = r#"
samples:
  - name: empty
    interval: 5
"#;
        assert!(matches!(
            LoadSchema::from_yaml(yaml),
            Err(SchemaError::Invalid { .. })
        ));
    }

    #[test]
    fn test_schema_rejects_duplicate_names() {
        let yaml = r#"
samples:
  - name: twin
    interval: 5
    lines: ["a"]
  - name: twin
    interval: 5
    lines: ["b"]
"#;
        assert!(matches!(
            LoadSchema::from_yaml(yaml),
            Err(SchemaError::Duplicate(_))
        ));
    }

    #[test]
    fn test_sizing_policy_from_str() {
        assert_eq!("random".parse(), Ok(SizingPolicy::Random));
        assert_eq!("BUNDLE".parse(), Ok(SizingPolicy::Bundle));
        assert_eq!("sequential".parse(), Ok(SizingPolicy::Sequential));
        assert!("roundrobin".parse::<SizingPolicy>().is_err());
    }
}
