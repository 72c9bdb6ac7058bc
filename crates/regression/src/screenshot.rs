//! Best-effort viewport screenshots.
//!
//! Scenario files are named `screenshot_{name}_{YYYYmmdd_HHMMSS}.png`; the
//! diagnostic writes fixed names. A screenshot that cannot be taken or written
//! is logged and skipped, never an error.

use crate::config::BrowserConfig;
use crate::driver::Driver;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Timestamp format used in file names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Screenshot writer gated by the screenshot flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotCapture {
    enabled: bool,
    dir: PathBuf,
}

impl ScreenshotCapture {
    /// Create a capture writing into `dir`
    #[must_use]
    pub fn new(enabled: bool, dir: impl Into<PathBuf>) -> Self {
        Self {
            enabled,
            dir: dir.into(),
        }
    }

    /// Capture settings from the browser configuration
    #[must_use]
    pub fn from_config(config: &BrowserConfig) -> Self {
        Self::new(config.screenshot_on_error, config.screenshot_dir.clone())
    }

    /// A capture that never writes
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(false, PathBuf::new())
    }

    /// Whether screenshots are taken
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Target directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for `name` taken at `at`
    #[must_use]
    pub fn file_name(name: &str, at: &DateTime<Local>) -> String {
        format!("screenshot_{name}_{}.png", at.format(TIMESTAMP_FORMAT))
    }

    /// Full path for `name` taken at `at`
    #[must_use]
    pub fn path_for(&self, name: &str, at: &DateTime<Local>) -> PathBuf {
        self.dir.join(Self::file_name(name, at))
    }

    /// Capture the current viewport as `name`
    ///
    /// Returns the written path, or `None` when disabled or on any failure.
    pub async fn capture<D: Driver + ?Sized>(&self, driver: &D, name: &str) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        self.write(driver, name, self.path_for(name, &Local::now())).await
    }

    /// Capture as `{dir}/{name}.png`, replacing any earlier file
    ///
    /// Ignores the on-error flag; only a capture without a directory skips.
    pub async fn capture_fixed<D: Driver + ?Sized>(&self, driver: &D, name: &str) -> Option<PathBuf> {
        if self.dir.as_os_str().is_empty() {
            return None;
        }
        self.write(driver, name, self.dir.join(format!("{name}.png"))).await
    }

    async fn write<D: Driver + ?Sized>(&self, driver: &D, name: &str, path: PathBuf) -> Option<PathBuf> {
        let png = match driver.screenshot_png().await {
            Ok(png) => png,
            Err(e) => {
                warn!(screenshot = name, error = %e, "screenshot failed");
                return None;
            }
        };
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!(dir = %self.dir.display(), error = %e, "cannot create screenshot directory");
            return None;
        }
        match tokio::fs::write(&path, png).await {
            Ok(()) => {
                info!(path = %path.display(), "screenshot saved");
                Some(path)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot write screenshot");
                None
            }
        }
    }
}
