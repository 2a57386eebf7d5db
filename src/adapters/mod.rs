// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing configuration source implementations.
//!
//! Each adapter implements the [`ConfigSource`](crate::ports::ConfigSource) trait to
//! provide configuration from one place: the command line, the environment, JSON
//! files, directories of files, in-code defaults or a secret store.

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
pub mod cli_config_file;
pub mod conditional;
pub mod default;
pub mod development;
pub mod directory;
pub mod env_var;
pub mod json_file;
pub mod multi;
pub mod noop;
#[cfg(feature = "vault")]
pub mod vault;

#[cfg(feature = "cli")]
pub use cli::{CliSource, ErrorMode};
#[cfg(feature = "cli")]
pub use cli_config_file::{CliConfigFileSource, DEFAULT_CONFIG_FLAG};
pub use conditional::ConditionalSource;
pub use default::DefaultSource;
pub use development::{
    development_only_defaults, is_development, is_production, required_in_production_json_file,
};
pub use directory::DirectorySource;
pub use env_var::EnvironmentSource;
pub use json_file::{JsonParser, JsonSource, DEFAULT_CONFIG_FILE};
pub use multi::{first_or_nop, MultiSource};
pub use noop::NoopSource;
#[cfg(feature = "vault")]
pub use vault::{VaultClient, VaultSource};
