//! Suite configuration: target URL, browser launch settings and timeouts.
//!
//! Read once at start. Defaults match the application's local dev server.

use crate::result::{RegressionError, RegressionResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default base URL of the application under test
pub const DEFAULT_BASE_URL: &str = "http://localhost:5173";

/// Browser kind the suite drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    /// Launch a local Chrome/Chromium
    #[default]
    Chrome,
    /// Attach to a running DevTools endpoint
    Remote,
}

/// Browser launch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Browser kind
    pub kind: BrowserKind,
    /// Run without a window
    pub headless: bool,
    /// Maximize the window after launch
    pub maximize: bool,
    /// Capture screenshots (success and failure)
    pub screenshot_on_error: bool,
    /// Screenshot directory
    pub screenshot_dir: PathBuf,
    /// Path to the Chrome binary (None = auto-detect)
    pub chromium_path: Option<PathBuf>,
    /// DevTools endpoint for [`BrowserKind::Remote`]
    pub remote_url: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Window size used when not maximized
    pub window_width: u32,
    /// Window height used when not maximized
    pub window_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            kind: BrowserKind::Chrome,
            headless: false,
            maximize: true,
            screenshot_on_error: true,
            screenshot_dir: PathBuf::from("./screenshots"),
            chromium_path: None,
            remote_url: None,
            sandbox: true,
            window_width: 1366,
            window_height: 768,
        }
    }
}

impl BrowserConfig {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the browser kind
    #[must_use]
    pub const fn with_kind(mut self, kind: BrowserKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attach to a running browser
    #[must_use]
    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.kind = BrowserKind::Remote;
        self.remote_url = Some(url.into());
        self
    }

    /// Enable or disable screenshots
    #[must_use]
    pub const fn with_screenshots(mut self, enabled: bool) -> Self {
        self.screenshot_on_error = enabled;
        self
    }

    /// Set the screenshot directory
    #[must_use]
    pub fn with_screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = dir.into();
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Timeout profile, all in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Ceiling for a single element lookup
    pub implicit_wait_ms: u64,
    /// Ceiling for a page load
    pub page_load_ms: u64,
    /// Ceiling for explicit poll-until waits
    pub element_wait_ms: u64,
    /// Short pause between actions
    pub short_wait_ms: u64,
    /// Interval between poll-until probes
    pub poll_interval_ms: u64,
    /// Settle pause after scrolling an element into view
    pub settle_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            implicit_wait_ms: 10_000,
            page_load_ms: 30_000,
            element_wait_ms: 10_000,
            short_wait_ms: 2_000,
            poll_interval_ms: 250,
            settle_ms: 500,
        }
    }
}

impl Timeouts {
    /// Implicit wait as Duration
    #[must_use]
    pub const fn implicit_wait(&self) -> Duration {
        Duration::from_millis(self.implicit_wait_ms)
    }

    /// Page load ceiling as Duration
    #[must_use]
    pub const fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load_ms)
    }

    /// Element wait ceiling as Duration
    #[must_use]
    pub const fn element_wait(&self) -> Duration {
        Duration::from_millis(self.element_wait_ms)
    }

    /// Short pause as Duration
    #[must_use]
    pub const fn short_wait(&self) -> Duration {
        Duration::from_millis(self.short_wait_ms)
    }

    /// Poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Settle pause as Duration
    #[must_use]
    pub const fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Application reset between scenarios
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetConfig {
    /// REST API root (e.g. `http://localhost:3000/api`); None keeps state
    pub api_url: Option<String>,
}

/// Complete suite configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Base URL of the application
    pub base_url: String,
    /// Browser settings
    pub browser: BrowserConfig,
    /// Timeout profile
    pub timeouts: Timeouts,
    /// Reset collaborator settings
    pub reset: ResetConfig,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            browser: BrowserConfig::default(),
            timeouts: Timeouts::default(),
            reset: ResetConfig::default(),
        }
    }
}

impl SuiteConfig {
    /// Create a config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a YAML file; missing keys keep their defaults
    pub fn from_yaml_file(path: &Path) -> RegressionResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Parse from YAML text
    pub fn from_yaml(text: &str) -> RegressionResult<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set browser settings
    #[must_use]
    pub fn with_browser(mut self, browser: BrowserConfig) -> Self {
        self.browser = browser;
        self
    }

    /// Set the timeout profile
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Reset the application through its REST API before each scenario
    #[must_use]
    pub fn with_reset_api(mut self, api_url: impl Into<String>) -> Self {
        self.reset.api_url = Some(api_url.into());
        self
    }

    /// Check cross-field consistency
    pub fn validate(&self) -> RegressionResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(RegressionError::Config {
                message: format!("base_url must be http(s): {}", self.base_url),
            });
        }
        if self.browser.kind == BrowserKind::Remote && self.browser.remote_url.is_none() {
            return Err(RegressionError::Config {
                message: "remote browser requires remote_url".to_string(),
            });
        }
        if self.timeouts.poll_interval_ms == 0 {
            return Err(RegressionError::Config {
                message: "poll_interval_ms must be positive".to_string(),
            });
        }
        Ok(())
    }
}
