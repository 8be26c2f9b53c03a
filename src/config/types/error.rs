//! Configuration error types.

use super::ValueType;
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// ConfigError
// ============================================================================

/// Configuration-related errors.
///
/// These are raised while a `Configuration` (or the engine built from it) is
/// constructed and indicate a mistake in the caller's setup, never in the
/// document being optimized.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("unknown configuration key `{0}`")]
    UnknownConfigurationKey(String),

    #[error("invalid value {value} for `{key}`: expected {expected}, found {actual}")]
    InvalidConfigurationValue {
        key: String,
        value: String,
        expected: ValueType,
        actual: &'static str,
    },

    #[error("unknown transformer `{0}`")]
    UnknownTransformer(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::ScalarType;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("amp.toml"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        let display = format!("{io_err}");
        assert!(display.contains("IO error"));
        assert!(display.contains("amp.toml"));

        let invalid = ConfigError::InvalidConfigurationValue {
            key: "transformers".into(),
            value: "3".into(),
            expected: ValueType::List(ScalarType::String),
            actual: "integer",
        };
        assert_eq!(
            invalid.to_string(),
            "invalid value 3 for `transformers`: expected list of string, found integer"
        );
    }
}
