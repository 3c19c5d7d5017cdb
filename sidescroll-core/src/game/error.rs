//! Configuration Errors
//!
//! Everything that can go wrong in this crate goes wrong at load time.
//! The tick itself is infallible; runtime edge cases degrade in place.

use thiserror::Error;

/// Errors raised while loading configuration, archetype tables or spawn lists.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A spawn descriptor names an archetype the catalog does not know.
    #[error("unknown archetype: {0}")]
    UnknownArchetype(String),

    /// The level was built without a world collision probe.
    #[error("no world collision probe supplied")]
    MissingCollisionProbe,

    /// A spawn descriptor carries a non-positive health override.
    #[error("invalid health override {value} for archetype {archetype}")]
    InvalidHealthOverride {
        /// Archetype id of the offending descriptor
        archetype: String,
        /// The rejected value
        value: i32,
    },

    /// JSON could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of its valid range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ConfigError::UnknownArchetype("slime".into());
        assert_eq!(err.to_string(), "unknown archetype: slime");

        let err = ConfigError::InvalidHealthOverride { archetype: "grunt".into(), value: -1 };
        assert_eq!(err.to_string(), "invalid health override -1 for archetype grunt");
    }

    #[test]
    fn test_parse_error_conversion() {
        let parse = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: ConfigError = parse.into();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
