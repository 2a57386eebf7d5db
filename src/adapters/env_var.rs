// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment variable configuration source adapter.
//!
//! This module provides a source that answers lookups from the process environment.

use crate::domain::config_key::sanitize;
use crate::domain::{ConfigKey, Result};
use crate::ports::ConfigSource;
use std::collections::HashMap;
use std::env;
use std::sync::RwLock;

/// Maximum length for environment variable keys (prevents DoS)
const MAX_ENV_KEY_LEN: usize = 512;

/// Maximum length for environment variable values (prevents DoS)
const MAX_ENV_VALUE_LEN: usize = 1048576; // 1MB

/// Separator used to split multi-valued variables unless another one is configured.
pub const DEFAULT_SEPARATOR: &str = "|";

/// Configuration source for environment variables.
///
/// A lookup key is stripped of any `env:` redirection prefix, sanitized (every
/// character that is not a letter or digit becomes `_`) and prefixed with the
/// configured prefix. Three variable names are then tried in order: the name as
/// built, its upper-cased form and its lower-cased form. The first name with a
/// non-empty value wins and the value is split on the separator.
///
/// The environment is captured when the source is initialized (or on first lookup,
/// whichever comes first); later changes to the process environment are not seen.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::EnvironmentSource;
/// use layercfg::ports::ConfigSource;
/// use std::collections::HashMap;
///
/// let mut values = HashMap::new();
/// values.insert("APP_DATABASE_HOSTS".to_string(), "db1|db2".to_string());
///
/// let source = EnvironmentSource::with_values(values).prefix("APP_");
/// assert_eq!(
///     source.lookup_str("database-hosts"),
///     Some(vec!["db1".to_string(), "db2".to_string()])
/// );
/// ```
#[derive(Debug)]
pub struct EnvironmentSource {
    /// Prefix prepended to every sanitized key
    prefix: String,
    /// Separator for multi-valued variables
    separator: String,
    /// Captured environment with interior mutability for thread-safe lazy loading
    cache: RwLock<Option<HashMap<String, String>>>,
}

impl EnvironmentSource {
    /// Creates an environment source without a prefix, splitting values on `|`.
    pub fn new() -> Self {
        Self::with_separator("", DEFAULT_SEPARATOR)
    }

    /// Creates an environment source that prepends `prefix` to every key.
    ///
    /// ```rust
    /// use layercfg::adapters::EnvironmentSource;
    ///
    /// let source = EnvironmentSource::with_prefix("MYAPP_");
    /// ```
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::with_separator(prefix, DEFAULT_SEPARATOR)
    }

    /// Creates an environment source with a prefix and a custom value separator.
    pub fn with_separator(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: separator.into(),
            cache: RwLock::new(None),
        }
    }

    /// Creates a source with pre-populated values instead of the process environment.
    ///
    /// **Note**: This method is primarily intended for testing. Keys are variable
    /// names exactly as they would appear in the environment.
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self {
            prefix: String::new(),
            separator: DEFAULT_SEPARATOR.to_string(),
            cache: RwLock::new(Some(values)),
        }
    }

    /// Replaces the prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Replaces the value separator.
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Loads environment variables into a new HashMap.
    fn load(&self) -> HashMap<String, String> {
        let mut cache = HashMap::new();

        for (key, value) in env::vars() {
            if key.len() > MAX_ENV_KEY_LEN || value.len() > MAX_ENV_VALUE_LEN {
                tracing::debug!(
                    "Skipping oversized environment variable: key_len={}, value_len={} \
                     (max key={}, max value={})",
                    key.len(),
                    value.len(),
                    MAX_ENV_KEY_LEN,
                    MAX_ENV_VALUE_LEN
                );
                continue;
            }
            cache.insert(key, value);
        }

        tracing::debug!(
            "Loaded {} environment variables (prefix={:?}, separator={:?})",
            cache.len(),
            self.prefix,
            self.separator
        );

        cache
    }

    /// Fills the cache if it is empty.
    fn ensure_loaded(&self) {
        let loaded = self
            .cache
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or_else(|poisoned| poisoned.into_inner().is_some());
        if loaded {
            return;
        }

        let values = self.load();
        let mut guard = self
            .cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if guard.is_none() {
            *guard = Some(values);
        }
    }

    /// Builds the three variable names tried for `key`.
    fn candidates(&self, key: &ConfigKey) -> [String; 3] {
        let name = format!("{}{}", self.prefix, sanitize(key.without_redirect()));
        let upper = name.to_uppercase();
        let lower = name.to_lowercase();
        [name, upper, lower]
    }
}

impl Default for EnvironmentSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSource for EnvironmentSource {
    fn name(&self) -> &str {
        "env"
    }

    fn initialize(&mut self) -> Result<()> {
        self.ensure_loaded();
        Ok(())
    }

    fn lookup(&self, key: &ConfigKey) -> Option<Vec<String>> {
        self.ensure_loaded();
        let names = self.candidates(key);
        let guard = self
            .cache
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let cache = guard.as_ref()?;

        let value = names
            .iter()
            .filter_map(|name| cache.get(name))
            .find(|value| !value.is_empty())?;
        Some(value.split(self.separator.as_str()).map(String::from).collect())
    }
}
