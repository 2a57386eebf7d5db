// SPDX-License-Identifier: MIT OR Apache-2.0

//! A layered configuration crate.
//!
//! An application lists its configuration sources in priority order: command-line
//! flags, environment variables, JSON files, directories of files, in-code defaults
//! and documents from a Vault secret store. A [`Reader`](service::Reader) resolves a
//! key by asking each source in turn and falling through on a miss.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: Core types (`ConfigKey`, `ConfigValue`, `DefaultValue`, errors)
//! - **Ports**: Trait definitions (`ConfigSource`, `FailureHandler`, `SecretFetcher`)
//! - **Adapters**: Implementations for specific sources (env vars, JSON, CLI, Vault, ...)
//! - **Service**: The reader and the template preprocessor
//!
//! # Features
//!
//! - **Ordered fallback**: the first source that knows a key wins
//! - **Aliases**: several names for one setting
//! - **Redirection**: a value of `env:NAME` defers to the environment variable `NAME`
//! - **Typed accessors**: integers, booleans, URLs, durations and times, each with
//!   error, panic, fatal, default and zero-value variants
//! - **Templates**: render Go-style templates with configuration values and secrets
//!
//! # Feature Flags
//!
//! - `cli`: command-line flag sources (default)
//! - `vault`: Vault secret store client and source (default)
//! - `template`: template preprocessor, implies `vault` (default)
//! - `full`: Enable all features
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use layercfg::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let reader = Reader::builder()
//!     .with_source(CliSource::new().flag("port", "Port to listen on"))
//!     .with_env_prefix("MYAPP_")
//!     .with_optional_source(JsonSource::from_optional_file("/etc/myapp/config.json")?)
//!     .with_source(DefaultSource::new().with("port", 8080))
//!     .build()?;
//!
//! let port = reader.int_fatal("port");
//! let timeout = reader.duration_default("timeout", std::time::Duration::from_secs(5));
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::domain::{ConfigError, ConfigKey, ConfigValue, DefaultValue, Result};
    pub use crate::ports::{ConfigParser, ConfigSource, FailureHandler, SecretFetcher};
    pub use crate::service::{Reader, ReaderBuilder};

    pub use crate::adapters::{
        ConditionalSource, DefaultSource, DirectorySource, EnvironmentSource, JsonSource,
        MultiSource, NoopSource,
    };

    // Re-export adapters based on feature flags
    #[cfg(feature = "cli")]
    pub use crate::adapters::{CliConfigFileSource, CliSource, ErrorMode};
    #[cfg(feature = "vault")]
    pub use crate::adapters::{VaultClient, VaultSource};
    #[cfg(feature = "template")]
    pub use crate::service::Template;
}
