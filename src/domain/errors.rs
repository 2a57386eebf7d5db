// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the configuration crate.
//!
//! Two kinds of error reach callers of the typed [`Reader`](crate::service::Reader)
//! accessors: [`ConfigError::KeyNotFound`] and [`ConfigError::MalformedValue`]. The
//! remaining variants describe load-time failures (bad JSON, a missing required
//! directory, an unreachable secret store) which surface from source construction or
//! `initialize` instead of from individual lookups.

use std::num::{ParseFloatError, ParseIntError};
use std::str::ParseBoolError;
use thiserror::Error;

/// The main error type for configuration operations.
///
/// # Examples
///
/// ```
/// use layercfg::domain::errors::ConfigError;
///
/// fn get_config_value() -> Result<String, ConfigError> {
///     Err(ConfigError::KeyNotFound {
///         key: "database-host".to_string(),
///     })
/// }
///
/// assert!(get_config_value().unwrap_err().is_key_not_found());
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The requested key was not found in any source under any of its aliases.
    #[error("the specified key was not found: {key}")]
    KeyNotFound {
        /// The key that was not found
        key: String,
    },

    /// The key was found but its value could not be parsed as the requested type.
    #[error("the value for key '{key}' could not be parsed as {target_type}: {source}")]
    MalformedValue {
        /// The key being converted
        key: String,
        /// The target type name
        target_type: String,
        /// The underlying conversion error
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A configuration source failed while loading.
    #[error("configuration source '{source_name}' error: {message}")]
    SourceError {
        /// The name of the source that encountered the error
        source_name: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration content could not be parsed.
    #[error("failed to parse configuration: {message}")]
    ParseError {
        /// The error message
        message: String,
        /// The underlying parsing error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A template could not be parsed, scanned or rendered.
    #[error("template error: {message}")]
    TemplateError {
        /// The error message
        message: String,
    },

    /// An alias was registered against two different canonical keys.
    #[error(
        "alias '{alias}' is already registered for key '{existing}', \
         cannot register it for '{requested}'"
    )]
    AliasConflict {
        /// The alias being registered
        alias: String,
        /// The canonical key the alias already belongs to
        existing: String,
        /// The canonical key the caller tried to attach the alias to
        requested: String,
    },

    /// Command-line arguments could not be parsed.
    #[error("command line error: {message}")]
    CommandLine {
        /// The rendered parser error
        message: String,
    },

    /// Help output was requested on the command line.
    #[error("command line help requested")]
    HelpRequested,

    /// An I/O error occurred while reading configuration.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ConfigError {
    /// Creates a `MalformedValue` error from a `ParseIntError`.
    pub fn from_parse_int_error(key: String, err: ParseIntError) -> Self {
        ConfigError::MalformedValue {
            key,
            target_type: "integer".to_string(),
            source: Box::new(err),
        }
    }

    /// Creates a `MalformedValue` error from a `ParseFloatError`.
    pub fn from_parse_float_error(key: String, err: ParseFloatError) -> Self {
        ConfigError::MalformedValue {
            key,
            target_type: "float".to_string(),
            source: Box::new(err),
        }
    }

    /// Creates a `MalformedValue` error from a `ParseBoolError`.
    pub fn from_parse_bool_error(key: String, err: ParseBoolError) -> Self {
        ConfigError::MalformedValue {
            key,
            target_type: "boolean".to_string(),
            source: Box::new(err),
        }
    }

    /// Shorthand for a `SourceError` without an underlying cause.
    pub(crate) fn source_error(source_name: &str, message: impl Into<String>) -> Self {
        ConfigError::SourceError {
            source_name: source_name.to_string(),
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` if the key was absent from every source.
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, ConfigError::KeyNotFound { .. })
    }

    /// Returns `true` if the key was present but its value failed to parse.
    pub fn is_malformed(&self) -> bool {
        matches!(self, ConfigError::MalformedValue { .. })
    }
}

/// A specialized Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_not_found_error() {
        let error = ConfigError::KeyNotFound {
            key: "test-key".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "the specified key was not found: test-key"
        );
        assert!(error.is_key_not_found());
        assert!(!error.is_malformed());
    }

    #[test]
    fn test_malformed_value_error() {
        let source_error = "invalid value".parse::<i32>().unwrap_err();
        let error = ConfigError::MalformedValue {
            key: "test-key".to_string(),
            target_type: "i32".to_string(),
            source: Box::new(source_error),
        };
        assert!(error.to_string().contains("test-key"));
        assert!(error.to_string().contains("i32"));
        assert!(error.is_malformed());
    }

    #[test]
    fn test_source_error() {
        let error = ConfigError::source_error("directory", "directory must exist");
        assert_eq!(
            error.to_string(),
            "configuration source 'directory' error: directory must exist"
        );
    }

    #[test]
    fn test_parse_error() {
        let error = ConfigError::ParseError {
            message: "Invalid JSON".to_string(),
            source: None,
        };
        assert_eq!(
            error.to_string(),
            "failed to parse configuration: Invalid JSON"
        );
    }

    #[test]
    fn test_alias_conflict_error() {
        let error = ConfigError::AliasConflict {
            alias: "string2".to_string(),
            existing: "string".to_string(),
            requested: "other".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("string2"));
        assert!(message.contains("other"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = ConfigError::from(io_error);
        assert!(matches!(error, ConfigError::IoError(_)));
    }

    #[test]
    fn test_from_parse_int_error() {
        let parse_err = "not_a_number".parse::<i32>().unwrap_err();
        let error = ConfigError::from_parse_int_error("test-key".to_string(), parse_err);
        assert!(error.is_malformed());
        assert!(error.to_string().contains("integer"));
    }

    #[test]
    fn test_from_parse_float_error() {
        let parse_err = "not_a_float".parse::<f64>().unwrap_err();
        let error = ConfigError::from_parse_float_error("test-key".to_string(), parse_err);
        assert!(error.is_malformed());
        assert!(error.to_string().contains("float"));
    }

    #[test]
    fn test_from_parse_bool_error() {
        let parse_err = "not_a_bool".parse::<bool>().unwrap_err();
        let error = ConfigError::from_parse_bool_error("test-key".to_string(), parse_err);
        assert!(error.is_malformed());
        assert!(error.to_string().contains("boolean"));
    }
}
