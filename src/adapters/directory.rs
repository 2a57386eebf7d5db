// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory configuration source adapter.
//!
//! Each regular file in a directory becomes one key: the file name, lower-cased
//! with every non-alphanumeric character replaced by `_`. The value is the file's
//! contents. This fits secrets mounted as files (Kubernetes, Docker).

use crate::adapters::json_file::read_config_file;
use crate::adapters::MultiSource;
use crate::domain::config_key::sanitize;
use crate::domain::{ConfigError, ConfigKey, Result};
use crate::ports::ConfigSource;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration source mapping file names in a directory to file contents.
///
/// Files are read when the source is initialized. A required directory that cannot
/// be read fails initialization; an optional one leaves the source empty.
///
/// # Examples
///
/// ```rust,no_run
/// use layercfg::adapters::DirectorySource;
/// use layercfg::ports::ConfigSource;
///
/// let mut source = DirectorySource::required("/run/secrets");
/// source.initialize().unwrap();
/// let password = source.lookup_str("DB-Password");
/// ```
#[derive(Debug, Clone)]
pub struct DirectorySource {
    path: PathBuf,
    must_exist: bool,
    initialized: bool,
    files: HashMap<String, String>,
}

impl DirectorySource {
    /// Creates a source over a directory that must exist.
    pub fn required(path: impl AsRef<Path>) -> Self {
        Self::new(path, true)
    }

    /// Creates a source over a directory that may be missing.
    pub fn optional(path: impl AsRef<Path>) -> Self {
        Self::new(path, false)
    }

    fn new(path: impl AsRef<Path>, must_exist: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            must_exist,
            initialized: false,
            files: HashMap::new(),
        }
    }

    /// Wraps one optional directory source per path in a [`MultiSource`].
    ///
    /// Earlier directories take precedence over later ones.
    pub fn from_optional_directories<P: AsRef<Path>>(directories: &[P]) -> MultiSource {
        directories
            .iter()
            .fold(MultiSource::new(), |multi, dir| multi.with_source(Self::optional(dir)))
    }

    /// Returns the directory this source reads.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if the directory must exist.
    pub fn must_exist(&self) -> bool {
        self.must_exist
    }

    /// Returns the number of files loaded.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if no files were loaded.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn load(&self) -> Result<HashMap<String, String>> {
        let mut files = HashMap::new();

        let entries = match fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::info!("directory not read [{}]: {}", self.path.display(), e);
                if self.must_exist {
                    return Err(ConfigError::SourceError {
                        source_name: "directory".to_string(),
                        message: format!("directory must exist: {}", self.path.display()),
                        source: Some(Box::new(e)),
                    });
                }
                return Ok(files);
            }
        };

        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().to_string();
            let key = sanitize(&file_name.to_lowercase());
            match read_config_file(&entry.path(), "directory") {
                Ok(contents) => {
                    files.insert(key, contents);
                }
                Err(e) if self.must_exist => return Err(e),
                Err(e) => tracing::warn!("skipping unreadable file {}: {}", file_name, e),
            }
        }

        tracing::debug!(
            "Loaded {} files from directory {}",
            files.len(),
            self.path.display()
        );
        Ok(files)
    }
}

impl ConfigSource for DirectorySource {
    fn name(&self) -> &str {
        "directory"
    }

    fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            tracing::debug!("directory source {} already initialized", self.path.display());
            return Ok(());
        }
        self.files = self.load()?;
        self.initialized = true;
        Ok(())
    }

    fn lookup(&self, key: &ConfigKey) -> Option<Vec<String>> {
        self.files.get(&key.file_key()).map(|contents| vec![contents.clone()])
    }
}
