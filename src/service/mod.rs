// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer containing the reader and the template preprocessor.
//!
//! The [`Reader`] resolves keys against the configured sources. A [`Template`] uses
//! a reader to fill in Go-style template text, typically to produce JSON for a
//! [`JsonSource`](crate::adapters::JsonSource).

pub mod reader;
#[cfg(feature = "template")]
pub mod template;

// Re-export commonly used types
pub use reader::{Reader, ReaderBuilder};
#[cfg(feature = "template")]
pub use template::Template;
