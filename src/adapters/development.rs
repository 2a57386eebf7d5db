// SPDX-License-Identifier: MIT OR Apache-2.0

//! Development and production environment detection.
//!
//! A machine counts as a development machine when it runs macOS, when its host name
//! is `vagrant`, or when a `vagrant` user exists. Anything else is production.

use crate::adapters::{ConditionalSource, DefaultSource, JsonSource};
use crate::domain::Result;
use once_cell::sync::Lazy;
use std::path::Path;

static DEVELOPMENT: Lazy<bool> = Lazy::new(|| {
    let development =
        cfg!(target_os = "macos") || host_name() == "vagrant" || has_vagrant_user();
    tracing::debug!("development environment detected: {}", development);
    development
});

/// Returns `true` when running on a development machine.
///
/// The check runs once per process.
pub fn is_development() -> bool {
    *DEVELOPMENT
}

/// Returns `true` when not running on a development machine.
pub fn is_production() -> bool {
    !is_development()
}

/// Wraps `defaults` in a source that only answers on development machines.
///
/// ```rust
/// use layercfg::adapters::{development_only_defaults, DefaultSource};
/// use layercfg::ports::ConfigSource;
///
/// let source = development_only_defaults(DefaultSource::new().with("db-host", "localhost"));
/// assert_eq!(source.name(), "conditional");
/// ```
pub fn development_only_defaults(defaults: DefaultSource) -> ConditionalSource {
    ConditionalSource::new(is_development, defaults)
}

/// Reads a JSON file that is required in production and optional in development.
pub fn required_in_production_json_file(path: impl AsRef<Path>) -> Result<Option<JsonSource>> {
    JsonSource::from_conditional_file(path, is_production)
}

/// The kernel's host name, or `""` when it cannot be read.
fn host_name() -> String {
    match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => {
            tracing::debug!("failed to read host name: {}", e);
            String::new()
        }
    }
}

fn has_vagrant_user() -> bool {
    match std::fs::read_to_string("/etc/passwd") {
        Ok(passwd) => passwd.lines().any(|line| line.split(':').next() == Some("vagrant")),
        Err(_) => Path::new("/home/vagrant").is_dir(),
    }
}
