// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret store port.
//!
//! A `SecretFetcher` retrieves a single secret document from a remote key-value
//! store. The template `secret` function and the vault source go through this trait,
//! so tests and alternative stores can stand in for the HTTP client.

use crate::domain::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The JSON envelope returned by the secret store.
///
/// Only `data` carries configuration; the remaining fields are lease and
/// authentication metadata and default to empty when absent.
///
/// ```rust
/// use layercfg::ports::SecretDocument;
///
/// let doc: SecretDocument = serde_json::from_str(
///     r#"{"lease_id": "abc", "lease_duration": 60, "data": {"password": "hunter2"}}"#,
/// ).unwrap();
/// assert_eq!(doc.lease_duration, 60);
/// assert_eq!(doc.data["password"], "hunter2");
/// assert!(doc.auth.is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretDocument {
    /// Lease identifier for the secret.
    pub lease_id: String,
    /// Lease length in seconds.
    pub lease_duration: u64,
    /// Whether the lease can be renewed.
    pub renewable: bool,
    /// The secret payload.
    pub data: serde_json::Map<String, serde_json::Value>,
    /// Non-fatal warnings attached to the response.
    pub warnings: Option<Vec<String>>,
    /// Authentication information, if the response carried any.
    pub auth: Option<SecretAuth>,
}

/// Authentication block of a [`SecretDocument`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretAuth {
    /// Token issued to the client.
    pub client_token: String,
    /// Accessor for the issued token.
    pub accessor: String,
    /// Policies attached to the token.
    pub policies: Vec<String>,
    /// Free-form metadata attached to the token.
    pub metadata: HashMap<String, String>,
    /// Token lease length in seconds.
    pub lease_duration: u64,
    /// Whether the token can be renewed.
    pub renewable: bool,
}

/// Fetches secret documents from a remote store.
///
/// `token` and `address` may be empty, in which case implementations fall back to
/// their own defaults (for the vault client, the `VAULT_TOKEN` and `VAULT_ADDR`
/// environment variables).
pub trait SecretFetcher: Send + Sync {
    /// Fetches the document stored at `path`.
    fn fetch(&self, token: &str, address: &str, path: &str) -> Result<SecretDocument>;
}
