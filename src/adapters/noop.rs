// SPDX-License-Identifier: MIT OR Apache-2.0

//! A source with no values.

use crate::domain::ConfigKey;
use crate::ports::ConfigSource;

/// A source that never finds anything.
///
/// Stands in for a source that could not be built, see
/// [`first_or_nop`](crate::adapters::first_or_nop).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSource;

impl ConfigSource for NoopSource {
    fn name(&self) -> &str {
        "noop"
    }

    fn lookup(&self, _key: &ConfigKey) -> Option<Vec<String>> {
        None
    }
}
