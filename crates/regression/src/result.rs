//! Result and error types for the regression suite.

use thiserror::Error;

/// Result type for suite operations
pub type RegressionResult<T> = Result<T, RegressionError>;

/// Errors that can occur while driving the application under test
#[derive(Debug, Error)]
pub enum RegressionError {
    /// Locator did not resolve (within the wait ceiling, where one applies)
    #[error("Element not found: {locator}")]
    ElementNotFound {
        /// Locator description
        locator: String,
    },

    /// Native click landed on another element
    #[error("Click on {locator} intercepted: {message}")]
    ClickIntercepted {
        /// Locator description
        locator: String,
        /// What occupied the click point
        message: String,
    },

    /// No browser dialog is open
    #[error("No dialog is open")]
    DialogAbsent,

    /// None of the save/update candidates is rendered
    #[error("Save control not found (tried {tried})")]
    SaveControlNotFound {
        /// Candidates tried, in priority order
        tried: String,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Poll-until wait exhausted its ceiling
    #[error("Timed out after {ms}ms waiting for {what}")]
    Timeout {
        /// What was being waited for
        what: String,
        /// Ceiling in milliseconds
        ms: u64,
    },

    /// Browser launch or attach error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Script evaluation or protocol command error
    #[error("Browser command failed: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Application reset error
    #[error("Application reset failed: {message}")]
    Reset {
        /// Error message
        message: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl RegressionError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a script/protocol error
    #[must_use]
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }

    /// Create an element-not-found error
    #[must_use]
    pub fn not_found(locator: impl Into<String>) -> Self {
        Self::ElementNotFound {
            locator: locator.into(),
        }
    }

    /// Whether this error is a failed check rather than a harness/driver error
    #[must_use]
    pub const fn is_assertion(&self) -> bool {
        matches!(self, Self::AssertionFailed { .. })
    }

    /// Whether this error means a locator did not resolve
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ElementNotFound { .. })
    }
}

/// Fail with an assertion error unless `condition` holds
///
/// # Errors
///
/// Returns [`RegressionError::AssertionFailed`] carrying `message`.
pub fn ensure(condition: bool, message: impl FnOnce() -> String) -> RegressionResult<()> {
    if condition {
        Ok(())
    } else {
        Err(RegressionError::assertion(message()))
    }
}
