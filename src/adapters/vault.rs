// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault secret store client and source.
//!
//! The client resolves the store's host name to every address it has, then tries
//! each address in resolver order until one returns a decodable secret document.
//! Every request goes to the resolved address while TLS still verifies the original
//! host name. Requests use a short timeout and a small fixed number of retries.
//!
//! Fetching blocks the caller. It is meant to run once at startup, from
//! [`ConfigSource::initialize`] or from a template's `secret` function.

use crate::adapters::JsonSource;
use crate::domain::{ConfigError, ConfigKey, Result};
use crate::ports::{ConfigSource, SecretDocument, SecretFetcher};
use reqwest::StatusCode;
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::{Jitter, RetryTransientMiddleware};
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use url::{Host, Url};

/// Environment variable holding the token used when none is given.
pub const VAULT_TOKEN_ENV: &str = "VAULT_TOKEN";
/// Environment variable holding the address used when none is given.
pub const VAULT_ADDR_ENV: &str = "VAULT_ADDR";
/// Environment variable that disables TLS certificate verification when set.
pub const VAULT_SKIP_VERIFY_ENV: &str = "VAULT_SKIP_VERIFY";
/// Port used when the address does not name one.
pub const DEFAULT_VAULT_PORT: u16 = 8200;

const DNS_ATTEMPTS: usize = 3;
const DNS_RETRY_DELAY: Duration = Duration::from_millis(250);
const HTTP_RETRIES: u32 = 3;
const HTTP_RETRY_DELAY: Duration = Duration::from_millis(100);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Returns `token`, or the `VAULT_TOKEN` environment variable when it is empty.
///
/// A missing token is logged and the empty token is used anyway.
pub fn normalize_token(token: &str) -> String {
    if !token.is_empty() {
        return token.to_string();
    }
    let token = std::env::var(VAULT_TOKEN_ENV).unwrap_or_default();
    if token.is_empty() {
        tracing::warn!(
            "no vault token given and {} is not set, continuing without one",
            VAULT_TOKEN_ENV
        );
    }
    token
}

/// Builds the store's base URL from `address`, or from `VAULT_ADDR` when it is empty.
///
/// The scheme defaults to `https` and the port to 8200.
///
/// ```rust
/// use layercfg::adapters::vault::normalize_address;
///
/// let url = normalize_address("[::1]").unwrap();
/// assert_eq!(url.as_str(), "https://[::1]:8200/");
///
/// let url = normalize_address("http://169.254.0.1:1111").unwrap();
/// assert_eq!(url.as_str(), "http://169.254.0.1:1111/");
/// ```
pub fn normalize_address(address: &str) -> Result<Url> {
    let address = if address.is_empty() {
        std::env::var(VAULT_ADDR_ENV).unwrap_or_default()
    } else {
        address.to_string()
    };
    if address.is_empty() {
        return Err(ConfigError::source_error(
            "vault",
            format!("no vault address given and {} is not set", VAULT_ADDR_ENV),
        ));
    }

    let with_scheme = if address.contains("://") {
        address
    } else {
        format!("https://{}", address)
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| ConfigError::SourceError {
        source_name: "vault".to_string(),
        message: format!("invalid vault address: {}", with_scheme),
        source: Some(Box::new(e)),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::source_error(
            "vault",
            format!("unsupported vault address scheme: {}", url.scheme()),
        ));
    }
    if url.port().is_none() {
        url.set_port(Some(DEFAULT_VAULT_PORT)).map_err(|_| {
            ConfigError::source_error("vault", format!("cannot set port on {}", url))
        })?;
    }
    Ok(url)
}

fn skip_verify_from_env() -> bool {
    match std::env::var(VAULT_SKIP_VERIFY_ENV) {
        Ok(value) => {
            let value = value.trim().to_lowercase();
            !value.is_empty() && value != "0" && value != "false"
        }
        Err(_) => false,
    }
}

fn log_status(status: StatusCode, addr: &SocketAddr) {
    match status.as_u16() {
        200 => tracing::info!("vault {}: success with data", addr),
        204 => tracing::info!("vault {}: success, no data", addr),
        400 => tracing::info!("vault {}: invalid request, missing or invalid data", addr),
        403 => tracing::info!(
            "vault {}: forbidden, authentication details are incorrect or lack access",
            addr
        ),
        404 => tracing::info!("vault {}: invalid path", addr),
        429 => tracing::info!("vault {}: rate limit exceeded", addr),
        500 => tracing::info!("vault {}: internal server error", addr),
        503 => tracing::info!("vault {}: down for maintenance or sealed", addr),
        other => tracing::info!("vault {}: unexpected status {}", addr, other),
    }
}

/// Runs `future` to completion on a dedicated current-thread runtime.
fn block_on<F, T>(future: F) -> Result<T>
where
    F: Future<Output = Result<T>> + Send,
    T: Send,
{
    let run = move || -> Result<T> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(future)
    };

    // A runtime cannot be started from inside another one.
    if tokio::runtime::Handle::try_current().is_ok() {
        std::thread::scope(|scope| scope.spawn(run).join()).unwrap_or_else(|_| {
            Err(ConfigError::source_error("vault", "secret fetch thread panicked"))
        })
    } else {
        run()
    }
}

/// Looks `domain` up with `lookup`, retrying failures and empty answers up to
/// `DNS_ATTEMPTS` times with a fixed delay.
async fn lookup_with_retries<F, Fut>(
    domain: &str,
    port: u16,
    mut lookup: F,
) -> Result<Vec<SocketAddr>>
where
    F: FnMut(String, u16) -> Fut,
    Fut: Future<Output = std::io::Result<Vec<SocketAddr>>>,
{
    let mut last_error = None;
    for attempt in 1..=DNS_ATTEMPTS {
        match lookup(domain.to_string(), port).await {
            Ok(addrs) if !addrs.is_empty() => {
                tracing::debug!("resolved {} to {:?}", domain, addrs);
                return Ok(addrs);
            }
            Ok(_) => tracing::warn!(
                "lookup of {} returned no addresses (attempt {})",
                domain,
                attempt
            ),
            Err(e) => {
                tracing::warn!("lookup of {} failed (attempt {}): {}", domain, attempt, e);
                last_error = Some(e);
            }
        }
        if attempt < DNS_ATTEMPTS {
            tokio::time::sleep(DNS_RETRY_DELAY).await;
        }
    }

    Err(ConfigError::SourceError {
        source_name: "vault".to_string(),
        message: format!("could not resolve vault host {}", domain),
        source: last_error.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
    })
}

/// HTTP client for a Vault-compatible secret store.
///
/// # Examples
///
/// ```rust,no_run
/// use layercfg::adapters::VaultClient;
/// use layercfg::ports::SecretFetcher;
///
/// let document = VaultClient::new()
///     .fetch("s.token", "vault.service.consul", "secret/operations/email")
///     .unwrap();
/// println!("{} keys", document.data.len());
/// ```
#[derive(Debug, Clone, Default)]
pub struct VaultClient {
    skip_verify: Option<bool>,
}

impl VaultClient {
    /// Creates a client. TLS verification follows `VAULT_SKIP_VERIFY`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides `VAULT_SKIP_VERIFY`.
    pub fn skip_verify(mut self, skip: bool) -> Self {
        self.skip_verify = Some(skip);
        self
    }

    async fn resolve(&self, url: &Url) -> Result<Vec<SocketAddr>> {
        let port = url.port_or_known_default().unwrap_or(DEFAULT_VAULT_PORT);
        let domain = match url.host() {
            Some(Host::Ipv4(ip)) => return Ok(vec![SocketAddr::from((ip, port))]),
            Some(Host::Ipv6(ip)) => return Ok(vec![SocketAddr::from((ip, port))]),
            Some(Host::Domain(domain)) => domain,
            None => {
                return Err(ConfigError::source_error(
                    "vault",
                    format!("vault address has no host: {}", url),
                ))
            }
        };

        lookup_with_retries(domain, port, |host, port| async move {
            tokio::net::lookup_host((host.as_str(), port))
                .await
                .map(|addrs| addrs.collect::<Vec<_>>())
        })
        .await
    }

    async fn request_document(
        &self,
        base: &Url,
        addr: SocketAddr,
        token: &str,
        path: &str,
    ) -> Result<SecretDocument> {
        let skip_verify = self.skip_verify.unwrap_or_else(skip_verify_from_env);
        let mut builder = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(skip_verify);
        if let Some(Host::Domain(domain)) = base.host() {
            // connect to this address while keeping the host name for TLS
            builder = builder.resolve(domain, addr);
        }
        let client = builder.build().map_err(|e| ConfigError::SourceError {
            source_name: "vault".to_string(),
            message: "failed to build HTTP client".to_string(),
            source: Some(Box::new(e)),
        })?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(HTTP_RETRY_DELAY, HTTP_RETRY_DELAY)
            .jitter(Jitter::None)
            .build_with_max_retries(HTTP_RETRIES);
        let client = reqwest_middleware::ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        let request_url = base
            .join(&format!("v1/{}", path.trim_start_matches('/')))
            .map_err(|e| ConfigError::SourceError {
                source_name: "vault".to_string(),
                message: format!("invalid secret path: {}", path),
                source: Some(Box::new(e)),
            })?;

        let response = client
            .get(request_url)
            .header("X-Vault-Token", token)
            .send()
            .await
            .map_err(|e| ConfigError::SourceError {
                source_name: "vault".to_string(),
                message: format!("request to {} failed", addr),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        log_status(status, &addr);
        if status.as_u16() >= 400 {
            return Err(ConfigError::source_error(
                "vault",
                format!("{} answered with status {}", addr, status),
            ));
        }

        let body = response.bytes().await.map_err(|e| ConfigError::SourceError {
            source_name: "vault".to_string(),
            message: format!("failed to read response from {}", addr),
            source: Some(Box::new(e)),
        })?;
        serde_json::from_slice(&body).map_err(|e| ConfigError::ParseError {
            message: format!("invalid secret document from {}: {}", addr, e),
            source: Some(Box::new(e)),
        })
    }

    async fn fetch_async(&self, token: &str, base: &Url, path: &str) -> Result<SecretDocument> {
        let candidates = self.resolve(base).await?;
        self.fetch_from(token, base, path, &candidates).await
    }

    /// Tries `candidates` in order; the first decodable document wins.
    async fn fetch_from(
        &self,
        token: &str,
        base: &Url,
        path: &str,
        candidates: &[SocketAddr],
    ) -> Result<SecretDocument> {
        for addr in candidates {
            match self.request_document(base, *addr, token, path).await {
                Ok(document) => {
                    tracing::info!("vault document {} read from {}", path, addr);
                    return Ok(document);
                }
                Err(e) => tracing::warn!("vault host {} skipped: {}", addr, e),
            }
        }

        Err(ConfigError::source_error(
            "vault",
            format!(
                "none of the {} vault hosts for {} returned document {}",
                candidates.len(),
                base,
                path
            ),
        ))
    }
}

impl SecretFetcher for VaultClient {
    fn fetch(&self, token: &str, address: &str, path: &str) -> Result<SecretDocument> {
        let token = normalize_token(token);
        let base = normalize_address(address)?;
        block_on(self.fetch_async(&token, &base, path))
    }
}

/// Configuration source exposing one secret document's data.
///
/// The document is fetched when the source is initialized; failure to fetch it
/// fails initialization.
///
/// ```rust,no_run
/// use layercfg::adapters::VaultSource;
/// use layercfg::service::Reader;
///
/// let reader = Reader::builder()
///     .with_source(VaultSource::new("", "", "secret/myapp"))
///     .build()
///     .unwrap();
/// ```
pub struct VaultSource {
    token: String,
    address: String,
    path: String,
    fetcher: Arc<dyn SecretFetcher>,
    initialized: bool,
    document: Option<JsonSource>,
}

impl VaultSource {
    /// Creates a source for the document at `path`. Empty `token` and `address`
    /// fall back to `VAULT_TOKEN` and `VAULT_ADDR`.
    pub fn new(
        token: impl Into<String>,
        address: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            address: address.into(),
            path: path.into(),
            fetcher: Arc::new(VaultClient::new()),
            initialized: false,
            document: None,
        }
    }

    /// Fetches through `fetcher` instead of the HTTP client.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn SecretFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }
}

impl fmt::Debug for VaultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultSource")
            .field("address", &self.address)
            .field("path", &self.path)
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}

impl ConfigSource for VaultSource {
    fn name(&self) -> &str {
        "vault"
    }

    fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        let document = self.fetcher.fetch(&self.token, &self.address, &self.path)?;
        tracing::debug!(
            "vault document {} holds {} keys",
            self.path,
            document.data.len()
        );
        self.document = Some(JsonSource::from_object(document.data));
        self.initialized = true;
        Ok(())
    }

    fn lookup(&self, key: &ConfigKey) -> Option<Vec<String>> {
        self.document.as_ref()?.lookup(key)
    }
}
