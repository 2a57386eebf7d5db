// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line flag configuration source adapter.
//!
//! This module provides a source over flags registered up front and parsed with
//! `clap` when the source is initialized. Only flags actually given on the command
//! line are found; a registered flag that was not passed falls through to the next
//! source.
//!
//! The reserved `--config` flag read by
//! [`CliConfigFileSource`](crate::adapters::CliConfigFileSource) is always accepted
//! and listed in help, so both sources can share one command line.

use crate::adapters::cli_config_file::DEFAULT_CONFIG_FLAG;
use crate::domain::{ConfigError, ConfigKey, Result};
use crate::ports::{ConfigSource, ExitProcess, FailureHandler};
use clap::builder::BoolishValueParser;
use clap::error::ErrorKind;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, Command};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// What to do when the command line cannot be parsed or help is requested.
///
/// Must be chosen before the source is initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Print the message and carry on with no flag values.
    Continue,
    /// Print the message and hand the error to the failure handler, which by
    /// default exits the process.
    #[default]
    Exit,
    /// Print the message and panic.
    Panic,
}

#[derive(Debug, Clone)]
enum FlagKind {
    Value,
    Bool,
}

#[derive(Debug, Clone)]
struct FlagSpec {
    name: String,
    description: String,
    kind: FlagKind,
}

/// Configuration source for command-line flags.
///
/// Flags are long options (`--name value`, `--name=value`). Boolean flags may be
/// given bare (`--verbose`) or with an explicit value (`--verbose=false`).
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::CliSource;
/// use layercfg::ports::ConfigSource;
///
/// let mut source = CliSource::new()
///     .flag("listen", "Address to listen on")
///     .bool_flag("verbose", "Log more")
///     .args(["./app", "--listen=0.0.0.0:8080", "--verbose"]);
/// source.initialize().unwrap();
///
/// assert_eq!(source.lookup_str("listen"), Some(vec!["0.0.0.0:8080".to_string()]));
/// assert_eq!(source.lookup_str("verbose"), Some(vec!["true".to_string()]));
/// ```
pub struct CliSource {
    args: Option<Vec<String>>,
    flags: Vec<FlagSpec>,
    usage: Option<String>,
    error_mode: ErrorMode,
    output: Option<Mutex<Box<dyn Write + Send>>>,
    failure: Arc<dyn FailureHandler>,
    config_flag: Option<String>,
    initialized: bool,
    values: HashMap<String, String>,
}

impl CliSource {
    /// Creates a source that will parse the process arguments.
    pub fn new() -> Self {
        Self {
            args: None,
            flags: Vec::new(),
            usage: None,
            error_mode: ErrorMode::default(),
            output: None,
            failure: Arc::new(ExitProcess),
            config_flag: Some(DEFAULT_CONFIG_FLAG.to_string()),
            initialized: false,
            values: HashMap::new(),
        }
    }

    /// Registers a string flag.
    pub fn flag(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.flags.push(FlagSpec {
            name: name.into(),
            description: description.into(),
            kind: FlagKind::Value,
        });
        self
    }

    /// Registers a boolean flag that may be given without a value.
    pub fn bool_flag(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.flags.push(FlagSpec {
            name: name.into(),
            description: description.into(),
            kind: FlagKind::Bool,
        });
        self
    }

    /// Appends free-form text after the generated flag descriptions in help output.
    pub fn usage(mut self, message: impl Into<String>) -> Self {
        self.usage = Some(message.into());
        self
    }

    /// Sets the parse-error mode.
    pub fn error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Sends help and error output to `writer` instead of the terminal.
    pub fn output<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.output = Some(Mutex::new(Box::new(writer)));
        self
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

    /// Replaces the handler used in [`ErrorMode::Exit`].
    pub fn failure_handler(mut self, handler: Arc<dyn FailureHandler>) -> Self {
        self.failure = handler;
        self
    }

    /// Renames the reserved override-file flag to match a
    /// [`CliConfigFileSource::new`](crate::adapters::CliConfigFileSource::new) flag.
    pub fn config_flag(mut self, name: impl Into<String>) -> Self {
        self.config_flag = Some(name.into());
        self
    }

    /// Stops accepting the reserved override-file flag.
    pub fn without_config_flag(mut self) -> Self {
        self.config_flag = None;
        self
    }

    fn command(&self, program: String) -> Command {
        let mut command = Command::new(program)
            .disable_version_flag(true)
            .args_override_self(true);
        if let Some(usage) = &self.usage {
            command = command.after_help(usage.clone());
        }

        for spec in &self.flags {
            let arg = Arg::new(spec.name.clone())
                .long(spec.name.clone())
                .help(spec.description.clone());
            let arg = match spec.kind {
                FlagKind::Value => arg.action(ArgAction::Set).num_args(1),
                FlagKind::Bool => arg
                    .action(ArgAction::Set)
                    .num_args(0..=1)
                    .require_equals(true)
                    .default_missing_value("true")
                    .value_parser(BoolishValueParser::new()),
            };
            command = command.arg(arg);
        }

        if let Some(flag) = &self.config_flag {
            if !self.flags.iter().any(|spec| &spec.name == flag) {
                command = command.arg(
                    Arg::new(flag.clone())
                        .long(flag.clone())
                        .help("The path to the JSON config file.")
                        .action(ArgAction::Set)
                        .num_args(1),
                );
            }
        }
        command
    }

    fn report(&self, error: &clap::Error) {
        match &self.output {
            Some(output) => {
                let mut writer = output.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                if let Err(e) = write!(writer, "{}", error.render()) {
                    tracing::warn!("failed to write command line usage: {}", e);
                }
            }
            None => {
                if let Err(e) = error.print() {
                    tracing::warn!("failed to print command line usage: {}", e);
                }
            }
        }
    }

    fn handle_error(&self, error: clap::Error) {
        self.report(&error);

        let help = matches!(
            error.kind(),
            ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        );
        let config_error = if help {
            ConfigError::HelpRequested
        } else {
            ConfigError::CommandLine {
                message: error.to_string().trim_end().to_string(),
            }
        };

        match self.error_mode {
            ErrorMode::Continue => {
                if !help {
                    tracing::warn!("ignoring command line error: {}", config_error);
                }
            }
            ErrorMode::Exit => self.failure.fail(self.name(), &config_error),
            ErrorMode::Panic => panic!("{}", config_error),
        }
    }
}

impl Default for CliSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CliSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliSource")
            .field("args", &self.args)
            .field("flags", &self.flags)
            .field("error_mode", &self.error_mode)
            .field("config_flag", &self.config_flag)
            .field("initialized", &self.initialized)
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}

impl ConfigSource for CliSource {
    fn name(&self) -> &str {
        "cli"
    }

    fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            tracing::debug!("command line already parsed, skipping");
            return Ok(());
        }
        self.initialized = true;

        let args: Vec<String> = match &self.args {
            Some(args) => args.clone(),
            None => std::env::args().collect(),
        };
        let program = args.first().cloned().unwrap_or_default();

        let matches = match self.command(program).try_get_matches_from(args) {
            Ok(matches) => matches,
            Err(e) => {
                self.handle_error(e);
                return Ok(());
            }
        };

        for spec in &self.flags {
            if matches.value_source(&spec.name) != Some(ValueSource::CommandLine) {
                continue;
            }
            let value = match spec.kind {
                FlagKind::Value => matches.get_one::<String>(&spec.name).cloned(),
                FlagKind::Bool => matches.get_one::<bool>(&spec.name).map(|b| b.to_string()),
            };
            if let Some(value) = value {
                self.values.insert(spec.name.clone(), value);
            }
        }

        tracing::debug!("Parsed {} command line flags", self.values.len());
        Ok(())
    }

    fn lookup(&self, key: &ConfigKey) -> Option<Vec<String>> {
        self.values.get(key.as_str()).map(|value| vec![value.clone()])
    }
}
