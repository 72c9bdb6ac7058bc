//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// The suite ran but not every scenario passed
    #[error("{failed} scenario(s) failed, {errored} errored")]
    ScenariosFailed {
        /// Failed scenarios
        failed: usize,
        /// Errored scenarios
        errored: usize,
    },

    /// The diagnostic could not find every element
    #[error("{missing} element(s) not found")]
    DiagnosticIncomplete {
        /// Checks that failed
        missing: usize,
    },

    /// The binary cannot drive a browser
    #[error("Browser support not compiled in: {message}")]
    BrowserUnavailable {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Regression library error
    #[error(transparent)]
    Regression(#[from] inventory_regression::RegressionError),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a browser-unavailable error
    #[must_use]
    pub fn browser_unavailable(message: impl Into<String>) -> Self {
        Self::BrowserUnavailable {
            message: message.into(),
        }
    }
}
