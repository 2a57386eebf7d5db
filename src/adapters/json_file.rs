// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON configuration source adapter.
//!
//! This module provides a parser and a source for flat JSON objects. Each member
//! may be a scalar or an array of scalars; arrays become multi-valued keys.

use crate::domain::{ConfigError, ConfigKey, Result};
use crate::ports::{ConfigParser, ConfigSource};
use directories::ProjectDirs;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum allowed file size for JSON configuration files (10MB)
/// This prevents denial of service attacks via extremely large files
const MAX_JSON_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// File name read by [`JsonSource::from_configurable_file`] when no flag is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// JSON parser implementation.
///
/// The document must be a JSON object. Its members are converted as follows:
///
/// - strings are used as-is
/// - numbers are written without exponent notation at full precision
/// - booleans become `true` or `false`
/// - arrays become one value per element (nested arrays and objects become `""`)
/// - anything else (objects, `null`) is present with no values
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::JsonParser;
/// use layercfg::ports::ConfigParser;
///
/// let parser = JsonParser::new();
/// let result = parser.parse(r#"{"ports": [80, 443], "ratio": 1234.5678}"#).unwrap();
/// assert_eq!(result["ports"], vec!["80", "443"]);
/// assert_eq!(result["ratio"], vec!["1234.5678"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonParser;

impl JsonParser {
    /// Creates a new JSON parser.
    pub fn new() -> Self {
        JsonParser
    }

    /// Converts the members of a JSON object into multi-valued entries.
    pub fn flatten_object(object: &Map<String, Value>) -> HashMap<String, Vec<String>> {
        object
            .iter()
            .map(|(key, value)| (key.clone(), Self::to_strings(value)))
            .collect()
    }

    fn to_strings(value: &Value) -> Vec<String> {
        match value {
            Value::Array(items) => items.iter().map(Self::scalar_to_string).collect(),
            Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                vec![Self::scalar_to_string(value)]
            }
            Value::Object(_) | Value::Null => Vec::new(),
        }
    }

    fn scalar_to_string(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i.to_string()
                } else if let Some(u) = n.as_u64() {
                    u.to_string()
                } else {
                    // f64's Display never uses exponent notation
                    n.as_f64().map(|f| f.to_string()).unwrap_or_default()
                }
            }
            _ => String::new(),
        }
    }
}

impl ConfigParser for JsonParser {
    fn parse(&self, content: &str) -> Result<HashMap<String, Vec<String>>> {
        let object: Map<String, Value> =
            serde_json::from_str(content).map_err(|e| ConfigError::ParseError {
                message: format!("Failed to parse JSON: {}", e),
                source: Some(Box::new(e)),
            })?;

        Ok(Self::flatten_object(&object))
    }
}

/// Reads a configuration file, refusing anything over the size limit.
pub(crate) fn read_config_file(path: &Path, source_name: &str) -> Result<String> {
    let display_name = || {
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("<unknown>")
            .to_string()
    };

    let metadata = fs::metadata(path).map_err(|e| ConfigError::SourceError {
        source_name: source_name.to_string(),
        message: format!("Failed to read file metadata: {}", display_name()),
        source: Some(Box::new(e)),
    })?;

    if metadata.len() > MAX_JSON_FILE_SIZE {
        return Err(ConfigError::source_error(
            source_name,
            format!(
                "Configuration file too large: {} bytes (max {} bytes)",
                metadata.len(),
                MAX_JSON_FILE_SIZE
            ),
        ));
    }

    fs::read_to_string(path).map_err(|e| ConfigError::SourceError {
        source_name: source_name.to_string(),
        message: format!("Failed to read configuration file: {}", display_name()),
        source: Some(Box::new(e)),
    })
}

/// Configuration source backed by a flat JSON object.
///
/// Keys are matched exactly (case-sensitive). Construction fails on malformed JSON
/// so a corrupt file stops the application at startup rather than at first lookup.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::JsonSource;
/// use layercfg::ports::ConfigSource;
///
/// let source = JsonSource::from_content(r#"{"key": "value"}"#).unwrap();
/// assert_eq!(source.lookup_str("key"), Some(vec!["value".to_string()]));
/// assert_eq!(source.lookup_str("missing"), None);
/// ```
#[derive(Debug, Clone)]
pub struct JsonSource {
    /// Path the values were loaded from, if any
    file_path: Option<PathBuf>,
    /// Parsed configuration values
    values: HashMap<String, Vec<String>>,
}

impl JsonSource {
    /// Parses JSON content into a source.
    pub fn from_content(content: &str) -> Result<Self> {
        let values = JsonParser::new().parse(content)?;
        tracing::debug!("Loaded {} keys from JSON content", values.len());
        Ok(Self {
            file_path: None,
            values,
        })
    }

    /// Builds a source from an already decoded JSON object.
    pub fn from_object(object: Map<String, Value>) -> Self {
        Self {
            file_path: None,
            values: JsonParser::flatten_object(&object),
        }
    }

    /// Reads and parses a required JSON file.
    ///
    /// ```rust,no_run
    /// use layercfg::adapters::JsonSource;
    ///
    /// let source = JsonSource::from_file("/etc/myapp/config.json").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file_path = path.as_ref().to_path_buf();

        // Canonicalize path to prevent directory traversal attacks
        let canonical_path = file_path.canonicalize().map_err(|e| ConfigError::SourceError {
            source_name: "json".to_string(),
            message: format!(
                "Invalid or inaccessible path: {}",
                file_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("<unknown>")
            ),
            source: Some(Box::new(e)),
        })?;

        let content = read_config_file(&canonical_path, "json")?;
        let values = JsonParser::new().parse(&content)?;
        tracing::debug!(
            "Loaded {} keys from JSON file {}",
            values.len(),
            canonical_path.display()
        );

        Ok(Self {
            file_path: Some(canonical_path),
            values,
        })
    }

    /// Reads an optional JSON file.
    ///
    /// Returns `Ok(None)` if the file cannot be read or is empty. A file that exists
    /// but holds malformed JSON is still an error.
    pub fn from_optional_file<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) if !content.trim().is_empty() => {
                let mut source = Self::from_content(&content)?;
                source.file_path = Some(path.to_path_buf());
                Ok(Some(source))
            }
            Ok(_) => {
                tracing::debug!("Optional JSON file {} is empty", path.display());
                Ok(None)
            }
            Err(e) => {
                tracing::debug!("Optional JSON file {} not loaded: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// Reads a JSON file that is required when `condition` holds and optional otherwise.
    pub fn from_conditional_file<P, F>(path: P, condition: F) -> Result<Option<Self>>
    where
        P: AsRef<Path>,
        F: FnOnce() -> bool,
    {
        if condition() {
            Self::from_file(path).map(Some)
        } else {
            Self::from_optional_file(path)
        }
    }

    /// Reads the JSON file named by the `--config` command-line flag, falling back
    /// to `config.json` in the working directory.
    #[cfg(feature = "cli")]
    pub fn from_configurable_file() -> Result<Self> {
        Self::from_configurable_file_args(std::env::args())
    }

    /// Like [`from_configurable_file`](Self::from_configurable_file) with explicit
    /// arguments (the first one is the program name).
    #[cfg(feature = "cli")]
    pub fn from_configurable_file_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let path = crate::adapters::cli_config_file::config_path_from_args(
            crate::adapters::cli_config_file::DEFAULT_CONFIG_FLAG,
            args,
        )?
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
        Self::from_file(path)
    }

    /// Reads `config.json` from the OS-appropriate configuration directory.
    ///
    /// This method uses the `directories` crate to determine the appropriate
    /// configuration directory for the current operating system.
    pub fn from_default_location(app_name: &str, qualifier: &str) -> Result<Self> {
        Self::with_filename(app_name, qualifier, DEFAULT_CONFIG_FILE)
    }

    /// Reads a custom file name from the OS-appropriate configuration directory.
    pub fn with_filename(app_name: &str, qualifier: &str, filename: &str) -> Result<Self> {
        let proj_dirs = ProjectDirs::from(qualifier, "", app_name).ok_or_else(|| {
            ConfigError::source_error("json", "Failed to determine project directories")
        })?;

        Self::from_file(proj_dirs.config_dir().join(filename))
    }

    /// Renders a template and parses its output as JSON.
    #[cfg(feature = "template")]
    pub fn from_template(template: &crate::service::Template) -> Result<Self> {
        let rendered = template.run()?;
        Self::from_content(&rendered)
    }

    /// Renders the template at `template_path` with values from the environment,
    /// the optional `directories` and the optional JSON file `json_path`, then parses
    /// the result as JSON.
    ///
    /// Returns `Ok(None)` if the template file cannot be read.
    #[cfg(feature = "template")]
    pub fn from_template_file_with_sources<P, Q, D>(
        template_path: P,
        json_path: Q,
        directories: &[D],
    ) -> Result<Option<Self>>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        D: AsRef<Path>,
    {
        let content = match fs::read_to_string(template_path.as_ref()) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(
                    "Template {} not loaded: {}",
                    template_path.as_ref().display(),
                    e
                );
                return Ok(None);
            }
        };

        let reader = crate::service::Reader::builder()
            .with_source(crate::adapters::EnvironmentSource::new())
            .with_source(crate::adapters::DirectorySource::from_optional_directories(
                directories,
            ))
            .with_optional_source(Self::from_optional_file(json_path)?)
            .build()?;

        let template = crate::service::Template::new(content, reader);
        Self::from_template(&template).map(Some)
    }

    /// Returns the path the values were loaded from, if they came from a file.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }
}

impl ConfigSource for JsonSource {
    fn name(&self) -> &str {
        "json"
    }

    fn lookup(&self, key: &ConfigKey) -> Option<Vec<String>> {
        self.values.get(key.as_str()).cloned()
    }
}
