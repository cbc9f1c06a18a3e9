//! Token replacement model.
//!
//! A token is an ordered substitution rule applied to a raw candidate record
//! when a batch is rendered. Replacement state (the counter cursor) lives in
//! the token itself, so cloning a token sequence yields a fully independent
//! generation stream.

use serde::{Deserialize, Serialize};

/// One substitution rule in a sample's token sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    /// Literal marker replaced in the raw record text.
    pub pattern: String,

    /// Replacement rule for each occurrence of the marker.
    #[serde(flatten)]
    pub replacement: Replacement,
}

/// Replacement kinds available to sample tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Replacement {
    /// Fixed string.
    Static { value: String },

    /// Monotonically increasing integer; `next` is the mutable cursor.
    Counter {
        #[serde(default)]
        next: u64,
    },

    /// Uniform random integer in `[min, max]`.
    RandomInt { min: i64, max: i64 },

    /// Random UUID v4.
    Guid,

    /// Timestamp drawn uniformly from the work item's time window,
    /// rendered with a chrono format string.
    Timestamp { format: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_yaml_roundtrip() {
        let yaml = r#"
- pattern: "@@seq"
  type: counter
- pattern: "@@host"
  type: static
  value: web-01
- pattern: "@@code"
  type: random_int
  min: 100
  max: 599
- pattern: "@@id"
  type: guid
- pattern: "@@ts"
  type: timestamp
  format: "%Y-%m-%dT%H:%M:%S"
"#;
        let tokens: Vec<Token> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[0].replacement, Replacement::Counter { next: 0 });
        assert_eq!(
            tokens[1].replacement,
            Replacement::Static {
                value: "web-01".to_string()
            }
        );
        assert!(matches!(
            tokens[2].replacement,
            Replacement::RandomInt { min: 100, max: 599 }
        ));
        assert_eq!(tokens[3].replacement, Replacement::Guid);
    }

    #[test]
    fn test_counter_clone_is_independent() {
        let original = Token {
            pattern: "@@seq".to_string(),
            replacement: Replacement::Counter { next: 7 },
        };
        let mut copy = original.clone();
        if let Replacement::Counter { next } = &mut copy.replacement {
            *next = 100;
        }
        assert_eq!(original.replacement, Replacement::Counter { next: 7 });
    }
}
