// SPDX-License-Identifier: MIT OR Apache-2.0

//! Failure handler trait definition.
//!
//! The `*_fatal` reader accessors and the command-line source in exit mode hand
//! unrecoverable errors to a `FailureHandler`. The default handler logs and
//! terminates the process; tests install one that records the failure instead.

use crate::domain::ConfigError;

/// Receives errors that the caller asked to be treated as fatal.
///
/// Implementations are expected not to return, but callers tolerate a handler that
/// does: the reader then hands back the zero value for the requested type.
///
/// # Examples
///
/// ```rust
/// use layercfg::domain::ConfigError;
/// use layercfg::ports::FailureHandler;
/// use std::sync::Mutex;
///
/// #[derive(Default)]
/// struct Recorder(Mutex<Vec<String>>);
///
/// impl FailureHandler for Recorder {
///     fn fail(&self, key: &str, error: &ConfigError) {
///         self.0.lock().unwrap().push(format!("{}: {}", key, error));
///     }
/// }
///
/// let recorder = Recorder::default();
/// recorder.fail("port", &ConfigError::KeyNotFound { key: "port".to_string() });
/// assert_eq!(recorder.0.lock().unwrap().len(), 1);
/// ```
pub trait FailureHandler: Send + Sync {
    /// Handles a fatal error for `key`.
    fn fail(&self, key: &str, error: &ConfigError);
}

/// The default failure handler: logs the key and error, then exits the process.
///
/// A request for help on the command line exits with status 0; every other failure
/// exits with status 1.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExitProcess;

impl FailureHandler for ExitProcess {
    fn fail(&self, key: &str, error: &ConfigError) {
        if matches!(error, ConfigError::HelpRequested) {
            std::process::exit(0);
        }
        tracing::error!("[{}] {}", key, error);
        std::process::exit(1);
    }
}
