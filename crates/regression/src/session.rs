//! Session - the explicitly passed suite context.
//!
//! Owns the driver for the whole run. Every scenario and helper receives
//! `&Session<D>`; nothing reaches the browser through global state.

use crate::clock::{Clock, SystemClock};
use crate::config::{SuiteConfig, Timeouts};
use crate::driver::{Driver, ElementRef};
use crate::locator::form;
use crate::result::{RegressionError, RegressionResult};
use crate::screenshot::ScreenshotCapture;
use crate::wait::{poll_until, WaitOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Browser session plus the configuration and clock it runs under
pub struct Session<D: Driver> {
    driver: D,
    clock: Arc<dyn Clock>,
    config: SuiteConfig,
    screenshots: ScreenshotCapture,
}

impl<D: Driver> std::fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.config.base_url)
            .field("screenshots", &self.screenshots)
            .finish_non_exhaustive()
    }
}

impl<D: Driver> Session<D> {
    /// Wrap an acquired driver
    ///
    /// # Errors
    ///
    /// Returns [`RegressionError::Config`] when the configuration is inconsistent.
    pub fn open(driver: D, config: SuiteConfig) -> RegressionResult<Self> {
        config.validate()?;
        let screenshots = ScreenshotCapture::from_config(&config.browser);
        Ok(Self {
            driver,
            clock: Arc::new(SystemClock::new()),
            config,
            screenshots,
        })
    }

    /// Replace the clock (tests use a fake one)
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the screenshot writer
    #[must_use]
    pub fn with_screenshots(mut self, screenshots: ScreenshotCapture) -> Self {
        self.screenshots = screenshots;
        self
    }

    /// The driver
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// The clock every wait and pause goes through
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Suite configuration
    #[must_use]
    pub const fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Timeout profile
    #[must_use]
    pub const fn timeouts(&self) -> &Timeouts {
        &self.config.timeouts
    }

    /// Base URL of the application
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Screenshot writer
    #[must_use]
    pub const fn screenshots(&self) -> &ScreenshotCapture {
        &self.screenshots
    }

    /// Best-effort screenshot named `name`
    pub async fn screenshot(&self, name: &str) -> Option<PathBuf> {
        self.screenshots.capture(&self.driver, name).await
    }

    /// Best-effort screenshot at the fixed path `{dir}/{name}.png`
    pub async fn screenshot_fixed(&self, name: &str) -> Option<PathBuf> {
        self.screenshots.capture_fixed(&self.driver, name).await
    }

    /// Load the application and wait until the product form is present
    ///
    /// # Errors
    ///
    /// Navigation errors, or [`RegressionError::ElementNotFound`] when the form
    /// does not render within the element wait.
    pub async fn open_app(&self) -> RegressionResult<ElementRef> {
        debug!(url = %self.config.base_url, "loading application");
        self.driver.navigate(&self.config.base_url).await?;
        let driver = &self.driver;
        poll_until(
            self.clock(),
            WaitOptions::element(self.timeouts()),
            "product form",
            || async move {
                Ok(driver
                    .find_all(None, &form::NAME_INPUT)
                    .await?
                    .into_iter()
                    .next())
            },
        )
        .await
        .map_err(|e| match e {
            RegressionError::Timeout { .. } => RegressionError::not_found(form::NAME_INPUT.to_string()),
            other => other,
        })
    }

    /// Release the browser
    ///
    /// # Errors
    ///
    /// Propagates the driver's close error.
    pub async fn close(self) -> RegressionResult<()> {
        self.driver.close().await
    }
}

#[cfg(feature = "browser")]
impl Session<crate::browser::ChromiumDriver> {
    /// Launch (or attach to) a Chromium browser and open a session on it
    ///
    /// # Errors
    ///
    /// Returns [`RegressionError::BrowserLaunch`] when the browser cannot be started.
    pub async fn launch(config: SuiteConfig) -> RegressionResult<Self> {
        config.validate()?;
        let driver = crate::browser::ChromiumDriver::launch(&config.browser, &config.timeouts).await?;
        Self::open(driver, config)
    }
}
