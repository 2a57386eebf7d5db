// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line selected JSON override file.
//!
//! A single reserved flag (`--config` by default) names an optional JSON file. When
//! the flag is given and the file exists, its values take the position of this source
//! in the reader, usually ahead of the regular JSON files.

use crate::adapters::JsonSource;
use crate::domain::{ConfigError, ConfigKey, Result};
use crate::ports::ConfigSource;
use clap::{Arg, ArgAction, Command};

/// Flag name used by [`CliConfigFileSource::default`].
pub const DEFAULT_CONFIG_FLAG: &str = "config";

/// Extracts the value of `--<flag>` from `args`, ignoring every other argument.
///
/// Arguments unrelated to the flag are dropped before parsing, so this can run
/// alongside a [`CliSource`](crate::adapters::CliSource) that owns the remaining
/// flags.
pub(crate) fn config_path_from_args<I, T>(flag: &str, args: I) -> Result<Option<String>>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut args = args.into_iter().map(Into::into);
    let program = args.next().unwrap_or_default();

    let long = format!("--{}", flag);
    let with_value = format!("--{}=", flag);
    let mut filtered = vec![program.clone()];
    while let Some(arg) = args.next() {
        if arg == long {
            filtered.push(arg);
            if let Some(value) = args.next() {
                filtered.push(value);
            }
        } else if arg.starts_with(&with_value) {
            filtered.push(arg);
        }
    }

    let matches = Command::new(program)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .args_override_self(true)
        .arg(
            Arg::new(flag.to_string())
                .long(flag.to_string())
                .help("The path to the JSON config file.")
                .action(ArgAction::Set)
                .num_args(1),
        )
        .try_get_matches_from(filtered)
        .map_err(|e| ConfigError::CommandLine {
            message: e.to_string().trim_end().to_string(),
        })?;

    Ok(matches.get_one::<String>(flag).cloned())
}

/// Configuration source for a JSON file named on the command line.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::CliConfigFileSource;
/// use layercfg::ports::ConfigSource;
///
/// let mut source = CliConfigFileSource::default().args(["./app", "--verbose"]);
/// source.initialize().unwrap();
/// assert_eq!(source.lookup_str("anything"), None);
/// ```
#[derive(Debug, Clone)]
pub struct CliConfigFileSource {
    flag: String,
    args: Option<Vec<String>>,
    initialized: bool,
    json: Option<JsonSource>,
}

impl CliConfigFileSource {
    /// Creates a source reading the file named by `--<flag>`.
    pub fn new(flag: impl Into<String>) -> Self {
        Self {
            flag: flag.into(),
            args: None,
            initialized: false,
            json: None,
        }
    }

    /// Parses these arguments instead of the process arguments. The first one is the
    /// program name.
    pub fn args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Returns the flag this source reads.
    pub fn flag(&self) -> &str {
        &self.flag
    }
}

impl Default for CliConfigFileSource {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_FLAG)
    }
}

impl ConfigSource for CliConfigFileSource {
    fn name(&self) -> &str {
        "cli-config-file"
    }

    fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.initialized = true;

        let path = match &self.args {
            Some(args) => config_path_from_args(&self.flag, args.iter().cloned())?,
            None => config_path_from_args(&self.flag, std::env::args())?,
        };

        if let Some(path) = path.filter(|p| !p.is_empty()) {
            self.json = JsonSource::from_optional_file(&path)?;
            if self.json.is_none() {
                tracing::warn!("config file {} given with --{} was not loaded", path, self.flag);
            }
        }
        Ok(())
    }

    fn lookup(&self, key: &ConfigKey) -> Option<Vec<String>> {
        self.json.as_ref()?.lookup(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(content: &str) -> (NamedTempFile, String) {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        let path = file.path().to_string_lossy().to_string();
        (file, path)
    }

    #[test]
    fn test_path_from_args_ignores_other_flags() {
        let path = config_path_from_args(
            "config",
            ["./app", "--verbose", "--config", "a.json", "--port=1", "positional"],
        )
        .unwrap();
        assert_eq!(path, Some("a.json".to_string()));
    }

    #[test]
    fn test_path_from_args_equals_form_and_last_wins() {
        let args = ["./app", "--config=a.json", "--config=b.json"];
        let path = config_path_from_args("config", args).unwrap();
        assert_eq!(path, Some("b.json".to_string()));
    }

    #[test]
    fn test_path_from_args_missing() {
        assert_eq!(config_path_from_args("config", ["./app"]).unwrap(), None);
        assert!(config_path_from_args("config", ["./app", "--config"]).is_err());
    }

    #[test]
    fn test_values_from_named_file() {
        let (_file, path) = config_file(r#"{"database-host": "override"}"#);
        let mut source = CliConfigFileSource::default().args(["./app", "--config", path.as_str()]);
        source.initialize().unwrap();

        assert_eq!(
            source.lookup_str("database-host"),
            Some(vec!["override".to_string()])
        );
    }

    #[test]
    fn test_custom_flag_name() {
        let (_file, path) = config_file(r#"{"key": "value"}"#);
        let flag = format!("--settings={}", path);
        let mut source = CliConfigFileSource::new("settings").args(["./app", flag.as_str()]);
        source.initialize().unwrap();
        assert_eq!(source.flag(), "settings");
        assert_eq!(source.lookup_str("key"), Some(vec!["value".to_string()]));
    }

    #[test]
    fn test_missing_file_finds_nothing() {
        let mut source =
            CliConfigFileSource::default().args(["./app", "--config", "/nonexistent/file.json"]);
        source.initialize().unwrap();
        assert_eq!(source.lookup_str("key"), None);
    }

    #[test]
    fn test_malformed_file_fails() {
        let (_file, path) = config_file("not json");
        let mut source = CliConfigFileSource::default().args(["./app", "--config", path.as_str()]);
        assert!(source.initialize().is_err());
    }
}
