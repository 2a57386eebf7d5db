// SPDX-License-Identifier: MIT OR Apache-2.0

//! Defaults that only apply while a condition holds.

use crate::adapters::DefaultSource;
use crate::domain::ConfigKey;
use crate::ports::ConfigSource;
use std::fmt;

/// A [`DefaultSource`] gated by a condition callback.
///
/// The condition is evaluated on every lookup. While it returns `false` the source
/// finds nothing, whatever its defaults hold.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::{ConditionalSource, DefaultSource};
/// use layercfg::ports::ConfigSource;
///
/// let source = ConditionalSource::new(|| false, DefaultSource::new().with("key", "value"));
/// assert_eq!(source.lookup_str("key"), None);
/// ```
pub struct ConditionalSource {
    condition: Box<dyn Fn() -> bool + Send + Sync>,
    inner: DefaultSource,
}

impl ConditionalSource {
    /// Creates a conditional source over `defaults`.
    pub fn new<F>(condition: F, defaults: DefaultSource) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            condition: Box::new(condition),
            inner: defaults,
        }
    }
}

impl fmt::Debug for ConditionalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalSource")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl ConfigSource for ConditionalSource {
    fn name(&self) -> &str {
        "conditional"
    }

    fn lookup(&self, key: &ConfigKey) -> Option<Vec<String>> {
        if !(self.condition)() {
            return None;
        }
        self.inner.lookup(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn defaults() -> DefaultSource {
        DefaultSource::new().with("key", "value")
    }

    #[test]
    fn test_true_condition_yields_values() {
        let source = ConditionalSource::new(|| true, defaults());
        assert_eq!(source.lookup_str("key"), Some(vec!["value".to_string()]));
        assert_eq!(source.lookup_str("missing"), None);
    }

    #[test]
    fn test_false_condition_yields_nothing() {
        let source = ConditionalSource::new(|| false, defaults());
        assert_eq!(source.lookup_str("key"), None);
    }

    #[test]
    fn test_condition_checked_on_every_lookup() {
        let flag = Arc::new(AtomicBool::new(false));
        let observed = Arc::clone(&flag);
        let source = ConditionalSource::new(move || observed.load(Ordering::SeqCst), defaults());

        assert_eq!(source.lookup_str("key"), None);
        flag.store(true, Ordering::SeqCst);
        assert_eq!(source.lookup_str("key"), Some(vec!["value".to_string()]));
    }
}
