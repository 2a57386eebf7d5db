// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration source trait definition.
//!
//! This module defines the `ConfigSource` trait, the port every configuration source
//! (command line, environment, JSON, defaults, directories, secret stores) implements.
//! The [`Reader`](crate::service::Reader) only ever talks to sources through it.

use crate::domain::{ConfigKey, Result};

/// A trait for configuration sources.
///
/// A source is initialized once, then answers lookups from memory. A lookup returns
/// `None` when the key is absent and `Some(values)` when it is present; a present key
/// may carry zero, one or many values.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so that a built reader can be shared
/// between threads.
///
/// # Ordering
///
/// Sources have no priority of their own. The reader queries them in the order they
/// were registered and the first one that finds a key wins.
///
/// # Examples
///
/// ```rust
/// use layercfg::ports::ConfigSource;
/// use layercfg::domain::ConfigKey;
///
/// struct MySource;
///
/// impl ConfigSource for MySource {
///     fn name(&self) -> &str {
///         "my-source"
///     }
///
///     fn lookup(&self, key: &ConfigKey) -> Option<Vec<String>> {
///         (key.as_str() == "app.name").then(|| vec!["MyApp".to_string()])
///     }
/// }
///
/// let source = MySource;
/// assert_eq!(source.lookup_str("app.name"), Some(vec!["MyApp".to_string()]));
/// assert_eq!(source.lookup_str("missing"), None);
/// ```
pub trait ConfigSource: Send + Sync {
    /// Returns the name of this configuration source.
    ///
    /// This name is used for logging and error messages. It should be a short,
    /// descriptive identifier like "env", "json", "vault", etc.
    fn name(&self) -> &str;

    /// Performs one-time setup such as parsing flags or reading files.
    ///
    /// Load-time failures (malformed JSON, a missing required directory, an
    /// unreachable secret store) are returned here rather than from `lookup`.
    /// Sources whose setup has side effects must treat a second call as a no-op.
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Looks up the values for a key.
    ///
    /// Returns `None` if the key does not exist in this source. Lookups never
    /// perform I/O.
    fn lookup(&self, key: &ConfigKey) -> Option<Vec<String>>;

    /// Looks up the values for a key given as a string slice.
    ///
    /// Equivalent to calling `lookup(&ConfigKey::from(key))`.
    fn lookup_str(&self, key: &str) -> Option<Vec<String>> {
        self.lookup(&ConfigKey::from(key))
    }
}

impl<S: ConfigSource + ?Sized> ConfigSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn initialize(&mut self) -> Result<()> {
        (**self).initialize()
    }

    fn lookup(&self, key: &ConfigKey) -> Option<Vec<String>> {
        (**self).lookup(key)
    }
}
