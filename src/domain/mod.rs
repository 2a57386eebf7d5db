// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing core types.
//!
//! This module contains the keys, values, default values and errors shared by every
//! source and by the reader. It has no knowledge of where configuration comes from.

pub mod config_key;
pub mod config_value;
pub mod default_value;
pub mod errors;

// Re-export commonly used types
pub use config_key::ConfigKey;
pub use config_value::ConfigValue;
pub use default_value::DefaultValue;
pub use errors::{ConfigError, Result};
