// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! This module contains the trait definitions (ports) that define the interfaces
//! between the reader and the outside world. These traits are implemented by
//! adapters in the adapters layer.

pub mod failure;
pub mod parser;
pub mod secret;
pub mod source;

// Re-export commonly used types
pub use failure::{ExitProcess, FailureHandler};
pub use parser::ConfigParser;
pub use secret::{SecretAuth, SecretDocument, SecretFetcher};
pub use source::ConfigSource;
