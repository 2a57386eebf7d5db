// SPDX-License-Identifier: MIT OR Apache-2.0

//! Composite sources.

use crate::adapters::NoopSource;
use crate::domain::{ConfigKey, Result};
use crate::ports::ConfigSource;

/// An ordered list of sources presented as a single source.
///
/// Lookups return the answer of the first inner source that finds the key.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::{DefaultSource, MultiSource};
/// use layercfg::ports::ConfigSource;
///
/// let multi = MultiSource::new()
///     .with_source(DefaultSource::new().with("a", "first"))
///     .with_source(DefaultSource::new().with("a", "second").with("b", "second"));
///
/// assert_eq!(multi.lookup_str("a"), Some(vec!["first".to_string()]));
/// assert_eq!(multi.lookup_str("b"), Some(vec!["second".to_string()]));
/// ```
#[derive(Default)]
pub struct MultiSource {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl MultiSource {
    /// Creates an empty multi-source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a source.
    pub fn with_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Appends a source if one is given.
    pub fn with_optional_source<S: ConfigSource + 'static>(self, source: Option<S>) -> Self {
        match source {
            Some(source) => self.with_source(source),
            None => self,
        }
    }

    /// Returns the number of inner sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` if there are no inner sources.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl From<Vec<Box<dyn ConfigSource>>> for MultiSource {
    fn from(sources: Vec<Box<dyn ConfigSource>>) -> Self {
        Self { sources }
    }
}

impl ConfigSource for MultiSource {
    fn name(&self) -> &str {
        "multi"
    }

    fn initialize(&mut self) -> Result<()> {
        for source in &mut self.sources {
            source.initialize()?;
        }
        Ok(())
    }

    fn lookup(&self, key: &ConfigKey) -> Option<Vec<String>> {
        self.sources.iter().find_map(|source| source.lookup(key))
    }
}

/// Returns the first present source, or a [`NoopSource`] if every entry is `None`.
///
/// ```rust
/// use layercfg::adapters::{first_or_nop, JsonSource};
/// use layercfg::ports::ConfigSource;
///
/// let source = first_or_nop(vec![
///     JsonSource::from_optional_file("/nonexistent/override.json").unwrap(),
///     JsonSource::from_content(r#"{"key": "fallback"}"#).ok(),
/// ]);
/// assert_eq!(source.lookup_str("key"), Some(vec!["fallback".to_string()]));
/// ```
pub fn first_or_nop<S, I>(sources: I) -> Box<dyn ConfigSource>
where
    S: ConfigSource + 'static,
    I: IntoIterator<Item = Option<S>>,
{
    match sources.into_iter().flatten().next() {
        Some(source) => Box::new(source),
        None => Box::new(NoopSource),
    }
}
