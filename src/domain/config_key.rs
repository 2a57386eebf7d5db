// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration key newtype for type-safe key handling.
//!
//! Keys are case-sensitive strings. Individual sources may normalize them before
//! looking them up; the normalizations shared between sources live here.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Prefix marking a value as a redirection to an environment variable.
///
/// When a source answers a lookup with a value starting with this prefix, the
/// [`Reader`](crate::service::Reader) uses the value itself as the key for the
/// remaining sources, and the environment source strips the prefix before probing.
pub const ENV_REDIRECT_PREFIX: &str = "env:";

/// A type-safe wrapper for configuration keys.
///
/// # Examples
///
/// ```
/// use layercfg::domain::config_key::ConfigKey;
///
/// let key = ConfigKey::from("database-host");
/// assert_eq!(key.as_str(), "database-host");
/// assert_eq!(key.sanitized(), "database_host");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigKey(String);

impl ConfigKey {
    /// Creates a new `ConfigKey` from a `String`.
    pub fn new(key: String) -> Self {
        ConfigKey(key)
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts the `ConfigKey` into its inner `String`.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Returns `true` if this key carries the `env:` redirection prefix.
    ///
    /// ```
    /// use layercfg::domain::config_key::ConfigKey;
    ///
    /// assert!(ConfigKey::from("env:DATABASE_URL").is_redirect());
    /// assert!(!ConfigKey::from("database-url").is_redirect());
    /// ```
    pub fn is_redirect(&self) -> bool {
        self.0.starts_with(ENV_REDIRECT_PREFIX)
    }

    /// Returns the key with any `env:` redirection prefix removed.
    pub fn without_redirect(&self) -> &str {
        self.0
            .strip_prefix(ENV_REDIRECT_PREFIX)
            .unwrap_or(&self.0)
    }

    /// Replaces every character that is not a letter or digit with `_`.
    ///
    /// ```
    /// use layercfg::domain::config_key::ConfigKey;
    ///
    /// let key = ConfigKey::from("A-name_with&Symbols");
    /// assert_eq!(key.sanitized(), "A_name_with_Symbols");
    /// ```
    pub fn sanitized(&self) -> String {
        sanitize(&self.0)
    }

    /// Lower-cases and sanitizes the key, the form used to match file names.
    ///
    /// ```
    /// use layercfg::domain::config_key::ConfigKey;
    ///
    /// assert_eq!(ConfigKey::from("File1").file_key(), "file1");
    /// assert_eq!(ConfigKey::from("my.secret-file").file_key(), "my_secret_file");
    /// ```
    pub fn file_key(&self) -> String {
        sanitize(&self.0.to_lowercase())
    }
}

/// Replaces non-alphanumeric characters with underscores.
pub(crate) fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

impl From<String> for ConfigKey {
    fn from(s: String) -> Self {
        ConfigKey(s)
    }
}

impl From<&str> for ConfigKey {
    fn from(s: &str) -> Self {
        ConfigKey(s.to_string())
    }
}

impl From<ConfigKey> for String {
    fn from(key: ConfigKey) -> Self {
        key.0
    }
}

impl AsRef<str> for ConfigKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Hash for ConfigKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_key_from_str() {
        let key = ConfigKey::from("test-key");
        assert_eq!(key.as_str(), "test-key");
        assert_eq!(key.into_string(), "test-key");
    }

    #[test]
    fn test_config_key_display() {
        let key = ConfigKey::from("test-key");
        assert_eq!(format!("{}", key), "test-key");
    }

    #[test]
    fn test_config_key_hash() {
        let key1 = ConfigKey::from("test-key");
        let key2 = ConfigKey::from("test-key");
        let key3 = ConfigKey::from("other-key");

        let mut map = HashMap::new();
        map.insert(key1.clone(), "value1");

        assert_eq!(map.get(&key2), Some(&"value1"));
        assert_eq!(map.get(&key3), None);
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        assert_ne!(ConfigKey::from("Key"), ConfigKey::from("key"));
    }

    #[test]
    fn test_redirect_prefix() {
        let key = ConfigKey::from("env:FOO");
        assert!(key.is_redirect());
        assert_eq!(key.without_redirect(), "FOO");

        let key = ConfigKey::from("FOO");
        assert!(!key.is_redirect());
        assert_eq!(key.without_redirect(), "FOO");
    }

    #[test]
    fn test_sanitized_replaces_each_symbol() {
        assert_eq!(ConfigKey::from("a--b").sanitized(), "a__b");
        assert_eq!(ConfigKey::from("a.b/c d").sanitized(), "a_b_c_d");
        assert_eq!(ConfigKey::from("").sanitized(), "");
    }

    #[test]
    fn test_file_key() {
        assert_eq!(
            ConfigKey::from("A-name_withMixed&Casing").file_key(),
            "a_name_withmixed_casing"
        );
    }
}
