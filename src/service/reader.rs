// SPDX-License-Identifier: MIT OR Apache-2.0

//! The configuration reader.
//!
//! A [`Reader`] owns an ordered list of initialized sources and resolves a key by
//! asking each source in registration order. The first source that finds the key
//! wins.
//!
//! Two indirections apply on top of plain fallback:
//!
//! - **Aliases**: a key and its aliases are tried in turn, canonical key first.
//!   Registration is symmetric, so an alias also resolves the canonical key's values
//!   and the other way round.
//! - **Environment redirection**: when a source answers with a first value starting
//!   with `env:`, that value becomes the key for the remaining sources. The
//!   environment source strips the prefix and looks up the named variable.
//!
//! Every typed accessor comes in five flavours:
//!
//! | method            | on error                                     |
//! |-------------------|----------------------------------------------|
//! | `int(key)`        | returns the zero value                       |
//! | `int_error(key)`  | returns the error                            |
//! | `int_panic(key)`  | panics                                       |
//! | `int_fatal(key)`  | calls the failure handler, then zero value   |
//! | `int_default(..)` | returns the given default                    |

use crate::adapters::{EnvironmentSource, JsonSource};
use crate::domain::config_key::ENV_REDIRECT_PREFIX;
use crate::domain::{ConfigError, ConfigKey, ConfigValue, Result};
use crate::ports::{ConfigSource, ExitProcess, FailureHandler};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Generates the zero-value, panic, fatal and default variants of an accessor from
/// its `_error` variant.
macro_rules! accessor_policies {
    (
        $ty:ty,
        $zero:expr,
        $error:ident,
        $plain:ident,
        $panic:ident,
        $fatal:ident,
        $default:ident
    ) => {
        #[doc = concat!(
            "Like [`Reader::",
            stringify!($error),
            "`], returning the zero value on error."
        )]
        pub fn $plain(&self, key: &str) -> $ty {
            self.$error(key).unwrap_or_else(|_| $zero)
        }

        #[doc = concat!("Like [`Reader::", stringify!($error), "`], panicking on error.")]
        pub fn $panic(&self, key: &str) -> $ty {
            match self.$error(key) {
                Ok(value) => value,
                Err(e) => panic!("[{}] {}", key, e),
            }
        }

        #[doc = concat!(
            "Like [`Reader::", stringify!($error), "`], handing errors to the failure handler.\n\n",
            "Returns the zero value if the handler returns."
        )]
        pub fn $fatal(&self, key: &str) -> $ty {
            match self.$error(key) {
                Ok(value) => value,
                Err(e) => {
                    self.failure.fail(key, &e);
                    $zero
                }
            }
        }

        #[doc = concat!("Like [`Reader::", stringify!($error), "`], returning `default` on error.")]
        pub fn $default(&self, key: &str, default: $ty) -> $ty {
            self.$error(key).unwrap_or(default)
        }
    };
}

/// Resolves keys against an ordered list of configuration sources.
///
/// A reader is built once at startup with [`Reader::builder`] or [`Reader::new`].
/// Lookups take `&self` and never lock, so a built reader can be shared between
/// threads.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::{DefaultSource, JsonSource};
/// use layercfg::service::Reader;
///
/// # fn main() -> layercfg::domain::Result<()> {
/// let reader = Reader::builder()
///     .with_source(JsonSource::from_content(r#"{"port": 8080}"#)?)
///     .with_source(DefaultSource::new().with("port", 80).with("host", "localhost"))
///     .with_alias("host", "hostname")
///     .build()?;
///
/// assert_eq!(reader.int("port"), 8080);
/// assert_eq!(reader.string("hostname"), "localhost");
/// assert!(reader.int_error("missing").unwrap_err().is_key_not_found());
/// # Ok(())
/// # }
/// ```
pub struct Reader {
    sources: Vec<Box<dyn ConfigSource>>,
    /// Every key mapped to its aliases, in both directions.
    aliases: HashMap<String, Vec<String>>,
    /// Every alias mapped to the canonical key it was registered under.
    canonical: HashMap<String, String>,
    failure: Arc<dyn FailureHandler>,
}

impl Reader {
    /// Creates a reader over `sources`, initializing each in order.
    pub fn new(sources: Vec<Box<dyn ConfigSource>>) -> Result<Self> {
        sources
            .into_iter()
            .fold(ReaderBuilder::new(), |builder, source| builder.with_source(source))
            .build()
    }

    /// Creates a reader builder.
    pub fn builder() -> ReaderBuilder {
        ReaderBuilder::new()
    }

    /// Returns the number of sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` if the reader has no sources.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Registers `alias` as another name for `key`.
    ///
    /// # Panics
    ///
    /// Panics if `alias` is already registered under a different key.
    pub fn register_alias(&mut self, key: &str, alias: &str) -> &mut Self {
        if let Err(e) = self.try_register_alias(key, alias) {
            panic!("{}", e);
        }
        self
    }

    /// Registers `alias` as another name for `key`, failing with
    /// [`ConfigError::AliasConflict`] if `alias` already belongs to a different key.
    ///
    /// Registering the same pair twice has no effect.
    pub fn try_register_alias(&mut self, key: &str, alias: &str) -> Result<()> {
        if let Some(existing) = self.canonical.get(alias) {
            if existing == key {
                return Ok(());
            }
            return Err(ConfigError::AliasConflict {
                alias: alias.to_string(),
                existing: existing.clone(),
                requested: key.to_string(),
            });
        }

        self.canonical.insert(alias.to_string(), key.to_string());
        self.aliases
            .entry(key.to_string())
            .or_default()
            .push(alias.to_string());
        self.aliases
            .entry(alias.to_string())
            .or_default()
            .push(key.to_string());
        Ok(())
    }

    fn candidates<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        std::iter::once(key).chain(
            self.aliases
                .get(key)
                .into_iter()
                .flatten()
                .map(String::as_str),
        )
    }

    fn resolve(&self, key: &str) -> Option<Vec<String>> {
        let mut key = ConfigKey::from(key);
        for source in &self.sources {
            let Some(values) = source.lookup(&key) else {
                continue;
            };
            let redirect = values
                .first()
                .filter(|first| first.starts_with(ENV_REDIRECT_PREFIX))
                .cloned();
            match redirect {
                Some(next) => {
                    tracing::debug!(
                        "source '{}' redirected '{}' to '{}'",
                        source.name(),
                        key,
                        next
                    );
                    key = ConfigKey::from(next);
                }
                None => return Some(values),
            }
        }
        None
    }

    /// Returns every value of `key`, trying its aliases when the key itself is not
    /// found.
    pub fn strings_error(&self, key: &str) -> Result<Vec<String>> {
        self.candidates(key)
            .find_map(|candidate| self.resolve(candidate))
            .ok_or_else(|| ConfigError::KeyNotFound {
                key: key.to_string(),
            })
    }

    accessor_policies!(
        Vec<String>,
        Vec::new(),
        strings_error,
        strings,
        strings_panic,
        strings_fatal,
        strings_default
    );

    /// Returns the first value of `key`.
    ///
    /// A key found with no values yields an empty string, not an error.
    pub fn string_error(&self, key: &str) -> Result<String> {
        Ok(self.strings_error(key)?.into_iter().next().unwrap_or_default())
    }

    accessor_policies!(
        String,
        String::new(),
        string_error,
        string,
        string_panic,
        string_fatal,
        string_default
    );

    /// Returns every value of `key` parsed as an integer.
    pub fn ints_error(&self, key: &str) -> Result<Vec<i64>> {
        self.strings_error(key)?
            .into_iter()
            .map(|raw| ConfigValue::from(raw).as_int(key))
            .collect()
    }

    accessor_policies!(
        Vec<i64>,
        Vec::new(),
        ints_error,
        ints,
        ints_panic,
        ints_fatal,
        ints_default
    );

    /// Returns the first value of `key` parsed as an integer.
    pub fn int_error(&self, key: &str) -> Result<i64> {
        ConfigValue::from(self.string_error(key)?).as_int(key)
    }

    accessor_policies!(i64, 0, int_error, int, int_panic, int_fatal, int_default);

    /// Returns the first value of `key` parsed as a boolean.
    ///
    /// Accepts `1`, `t`, `T`, `true`, `TRUE`, `True` and their `false` counterparts;
    /// words like `yes` or `on` are malformed.
    pub fn bool_error(&self, key: &str) -> Result<bool> {
        ConfigValue::from(self.string_error(key)?).as_bool(key)
    }

    accessor_policies!(
        bool,
        false,
        bool_error,
        bool,
        bool_panic,
        bool_fatal,
        bool_default
    );

    /// Returns every value of `key` parsed as a URL.
    pub fn urls_error(&self, key: &str) -> Result<Vec<Url>> {
        self.strings_error(key)?
            .into_iter()
            .map(|raw| ConfigValue::from(raw).as_url(key))
            .collect()
    }

    accessor_policies!(
        Vec<Url>,
        Vec::new(),
        urls_error,
        urls,
        urls_panic,
        urls_fatal,
        urls_default
    );

    /// Returns the first value of `key` parsed as a URL.
    pub fn url_error(&self, key: &str) -> Result<Url> {
        ConfigValue::from(self.string_error(key)?).as_url(key)
    }

    /// Like [`Reader::url_error`], returning `None` on error.
    pub fn url(&self, key: &str) -> Option<Url> {
        self.url_error(key).ok()
    }

    /// Like [`Reader::url_error`], panicking on error.
    pub fn url_panic(&self, key: &str) -> Url {
        match self.url_error(key) {
            Ok(value) => value,
            Err(e) => panic!("[{}] {}", key, e),
        }
    }

    /// Like [`Reader::url_error`], handing errors to the failure handler.
    ///
    /// Returns `None` if the handler returns.
    pub fn url_fatal(&self, key: &str) -> Option<Url> {
        match self.url_error(key) {
            Ok(value) => Some(value),
            Err(e) => {
                self.failure.fail(key, &e);
                None
            }
        }
    }

    /// Like [`Reader::url_error`], returning `default` on error.
    pub fn url_default(&self, key: &str, default: Url) -> Url {
        self.url_error(key).unwrap_or(default)
    }

    /// Returns the first value of `key` parsed as a duration such as `1h 30m` or
    /// `250ms`.
    pub fn duration_error(&self, key: &str) -> Result<Duration> {
        ConfigValue::from(self.string_error(key)?).as_duration(key)
    }

    accessor_policies!(
        Duration,
        Duration::ZERO,
        duration_error,
        duration,
        duration_panic,
        duration_fatal,
        duration_default
    );

    /// Returns the first value of `key` parsed as a time with the chrono `format`.
    pub fn time_error(&self, key: &str, format: &str) -> Result<DateTime<Utc>> {
        ConfigValue::from(self.string_error(key)?).as_time(key, format)
    }

    /// Like [`Reader::time_error`], returning the Unix epoch on error.
    pub fn time(&self, key: &str, format: &str) -> DateTime<Utc> {
        self.time_error(key, format).unwrap_or_default()
    }

    /// Like [`Reader::time_error`], panicking on error.
    pub fn time_panic(&self, key: &str, format: &str) -> DateTime<Utc> {
        match self.time_error(key, format) {
            Ok(value) => value,
            Err(e) => panic!("[{}] {}", key, e),
        }
    }

    /// Like [`Reader::time_error`], handing errors to the failure handler.
    ///
    /// Returns the Unix epoch if the handler returns.
    pub fn time_fatal(&self, key: &str, format: &str) -> DateTime<Utc> {
        match self.time_error(key, format) {
            Ok(value) => value,
            Err(e) => {
                self.failure.fail(key, &e);
                DateTime::default()
            }
        }
    }

    /// Like [`Reader::time_error`], returning `default` on error.
    pub fn time_default(&self, key: &str, format: &str, default: DateTime<Utc>) -> DateTime<Utc> {
        self.time_error(key, format).unwrap_or(default)
    }
}

impl fmt::Debug for Reader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|s| s.name()).collect();
        f.debug_struct("Reader")
            .field("sources", &names)
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

/// Builder for constructing a [`Reader`].
///
/// Sources are queried in the order they are added.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::DefaultSource;
/// use layercfg::service::ReaderBuilder;
///
/// # fn main() -> layercfg::domain::Result<()> {
/// let reader = ReaderBuilder::new()
///     .with_env_prefix("MYAPP_")
///     .with_source(DefaultSource::new().with("workers", 4))
///     .build()?;
/// assert_eq!(reader.len(), 2);
/// # Ok(())
/// # }
/// ```
pub struct ReaderBuilder {
    sources: Vec<Box<dyn ConfigSource>>,
    aliases: Vec<(String, String)>,
    failure: Option<Arc<dyn FailureHandler>>,
}

impl ReaderBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            aliases: Vec::new(),
            failure: None,
        }
    }

    /// Adds a configuration source.
    pub fn with_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Adds a source if present.
    pub fn with_optional_source<S: ConfigSource + 'static>(self, source: Option<S>) -> Self {
        match source {
            Some(source) => self.with_source(source),
            None => {
                tracing::debug!("skipping absent configuration source");
                self
            }
        }
    }

    /// Adds the process environment as a source.
    pub fn with_env_vars(self) -> Self {
        self.with_source(EnvironmentSource::new())
    }

    /// Adds environment variables starting with `prefix` as a source.
    pub fn with_env_prefix(self, prefix: impl Into<String>) -> Self {
        self.with_source(EnvironmentSource::with_prefix(prefix))
    }

    /// Adds a required JSON file as a source.
    ///
    /// ```rust,no_run
    /// use layercfg::service::ReaderBuilder;
    ///
    /// # fn main() -> layercfg::domain::Result<()> {
    /// let reader = ReaderBuilder::new()
    ///     .with_json_file("/etc/myapp/config.json")?
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_json_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let source = JsonSource::from_file(path)?;
        Ok(self.with_source(source))
    }

    /// Registers `alias` as another name for `key` once the reader is built.
    pub fn with_alias(mut self, key: impl Into<String>, alias: impl Into<String>) -> Self {
        self.aliases.push((key.into(), alias.into()));
        self
    }

    /// Replaces the failure handler used by the `_fatal` accessors.
    ///
    /// The default handler logs and exits the process.
    pub fn with_failure_handler(mut self, handler: Arc<dyn FailureHandler>) -> Self {
        self.failure = Some(handler);
        self
    }

    /// Initializes every source in order and builds the reader.
    ///
    /// Fails on the first source that cannot initialize, or on conflicting aliases.
    pub fn build(self) -> Result<Reader> {
        let mut sources = self.sources;
        for source in &mut sources {
            source.initialize()?;
            tracing::debug!("initialized configuration source '{}'", source.name());
        }

        let mut reader = Reader {
            sources,
            aliases: HashMap::new(),
            canonical: HashMap::new(),
            failure: self.failure.unwrap_or_else(|| Arc::new(ExitProcess)),
        };
        for (key, alias) in &self.aliases {
            reader.try_register_alias(key, alias)?;
        }
        Ok(reader)
    }
}

impl Default for ReaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
