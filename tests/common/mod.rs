// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities shared by the integration tests.

#![allow(dead_code)]

use layercfg::domain::{ConfigKey, Result};
use layercfg::ports::ConfigSource;
use std::collections::HashMap;
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A configuration source with fixed values that counts its initializations.
#[derive(Debug, Clone)]
pub struct MockSource {
    name: String,
    values: HashMap<String, Vec<String>>,
    initializations: Arc<AtomicUsize>,
}

impl MockSource {
    /// Creates an empty mock source.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: HashMap::new(),
            initializations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Adds a single value for `key`.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Sets every value for `key`, possibly none.
    pub fn with_values(mut self, key: impl Into<String>, values: &[&str]) -> Self {
        self.values
            .insert(key.into(), values.iter().map(|v| v.to_string()).collect());
        self
    }

    /// Returns a handle on the initialization counter.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.initializations)
    }
}

impl ConfigSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self) -> Result<()> {
        self.initializations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn lookup(&self, key: &ConfigKey) -> Option<Vec<String>> {
        self.values.get(key.as_str()).cloned()
    }
}

/// Sets environment variables and removes them when dropped.
pub struct EnvGuard {
    keys: Vec<String>,
}

impl EnvGuard {
    pub fn new() -> Self {
        EnvGuard { keys: Vec::new() }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        env::set_var(key, value);
        self.keys.push(key.to_string());
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for key in &self.keys {
            env::remove_var(key);
        }
    }
}
