// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration templates.
//!
//! A [`Template`] renders Go-style template text with values from a [`Reader`].
//! Before rendering, the template is scanned for the fields it reads. Each field is
//! looked up under several spellings, so `{{ .vault_addr }}` finds `VAULT_ADDR` and
//! `{{ .dbHost }}` finds `db-host`:
//!
//! 1. the field as written
//! 2. `SCREAMING_SNAKE_CASE`
//! 3. `snake_case`
//! 4. `kebab-case`
//! 5. `SCREAMING-KEBAB-CASE`
//! 6. `lowerCamelCase`
//! 7. `UpperCamelCase`
//!
//! Fields no source knows are left out of the data, so the engine renders them as
//! missing values.
//!
//! Besides the engine's builtins, templates can call `upper`, `lower`, `trim`,
//! `quote`, `repeat`, `default`, `env` and `secret`. `secret "path"` fetches a
//! document from the secret store and yields its data map.

mod funcs;
mod scan;

use crate::adapters::VaultClient;
use crate::domain::{ConfigError, Result};
use crate::ports::SecretFetcher;
use crate::service::Reader;
use convert_case::{Case, Casing};
use funcs::{Credentials, SecretContext, SecretScope};
use gtmpl::{Context, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Looks `field` up under each supported spelling and returns the first hit.
pub(crate) fn resolve_field(reader: &Reader, field: &str) -> Option<Vec<String>> {
    let spellings = [
        field.to_string(),
        field.to_case(Case::ScreamingSnake),
        field.to_case(Case::Snake),
        field.to_case(Case::Kebab),
        field.to_case(Case::Cobol),
        field.to_case(Case::Camel),
        field.to_case(Case::Pascal),
    ];
    spellings
        .iter()
        .find_map(|spelling| reader.strings_error(spelling).ok())
}

/// A template rendered against configuration values.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::DefaultSource;
/// use layercfg::service::{Reader, Template};
///
/// # fn main() -> layercfg::domain::Result<()> {
/// let reader = Reader::builder()
///     .with_source(DefaultSource::new().with("DB_HOST", "db.internal"))
///     .build()?;
///
/// let template = Template::new(r#"{"host": "{{ .db_host }}"}"#, reader);
/// assert_eq!(template.run()?, r#"{"host": "db.internal"}"#);
/// # Ok(())
/// # }
/// ```
pub struct Template {
    content: String,
    reader: Arc<Reader>,
    fetcher: Arc<dyn SecretFetcher>,
    credentials: Arc<Mutex<Credentials>>,
}

impl Template {
    /// Creates a template over `content`, reading values from `reader`.
    pub fn new(content: impl Into<String>, reader: Reader) -> Self {
        Self {
            content: content.into(),
            reader: Arc::new(reader),
            fetcher: Arc::new(VaultClient::new()),
            credentials: Arc::new(Mutex::new(Credentials::default())),
        }
    }

    /// Fetches secrets through `fetcher` instead of the Vault HTTP client.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn SecretFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Replaces the template text.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Returns the template text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the reader values come from.
    pub fn reader(&self) -> &Reader {
        &self.reader
    }

    /// Returns the top-level fields the template reads, in order of appearance.
    pub fn fields(&self) -> Result<Vec<String>> {
        scan::fields(&self.content)
    }

    fn data(&self, fields: Vec<String>) -> HashMap<String, Value> {
        fields
            .into_iter()
            .filter_map(|field| {
                let values = resolve_field(&self.reader, &field)?;
                let value = values.into_iter().next().unwrap_or_default();
                Some((field, Value::String(value)))
            })
            .collect()
    }

    /// Scans, resolves and renders the template.
    ///
    /// Every call looks values up again; nothing is cached between runs except the
    /// secret store credentials.
    pub fn run(&self) -> Result<String> {
        let fields = self.fields()?;
        tracing::debug!("template references fields {:?}", fields);
        let data = self.data(fields);

        let mut template = gtmpl::Template::default();
        for (name, func) in funcs::library() {
            template.add_func(name, func);
        }
        template
            .parse(self.content.as_str())
            .map_err(|e| ConfigError::TemplateError {
                message: e.to_string(),
            })?;

        let _scope = SecretScope::enter(SecretContext {
            reader: Arc::clone(&self.reader),
            fetcher: Arc::clone(&self.fetcher),
            credentials: Arc::clone(&self.credentials),
        });
        template
            .render(&Context::from(Value::Map(data)))
            .map_err(|e| ConfigError::TemplateError {
                message: e.to_string(),
            })
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("content", &self.content)
            .field("reader", &self.reader)
            .finish_non_exhaustive()
    }
}
