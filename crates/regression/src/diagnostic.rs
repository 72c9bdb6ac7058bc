//! Selector diagnostic.
//!
//! Checks, one by one, that every control the suite relies on is rendered,
//! then tries one live create. Meant to be run by hand before the suite when
//! the application's markup may have changed.

use crate::driver::{Driver, ElementRef};
use crate::fixture::DIAGNOSTIC;
use crate::interact::{fill_product_form, find, item_heading, product_items, safe_click};
use crate::locator::{form, list, Locator};
use crate::result::{RegressionError, RegressionResult};
use crate::session::Session;
use crate::wait::{wait_until, WaitOptions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// One diagnostic probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    /// What was looked for
    pub label: String,
    /// Whether it was there
    pub found: bool,
    /// Extra detail (text read, counts, error message)
    pub detail: String,
}

impl Check {
    fn new(label: impl Into<String>, found: bool, detail: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            found,
            detail: detail.into(),
        }
    }
}

/// Every check in the order it ran
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    /// Checks in order
    pub checks: Vec<Check>,
    /// Screenshot taken after the live create
    pub screenshot: Option<PathBuf>,
}

impl DiagnosticReport {
    /// Whether every check found its target
    #[must_use]
    pub fn all_found(&self) -> bool {
        self.checks.iter().all(|c| c.found)
    }

    /// Checks that did not find their target
    #[must_use]
    pub fn missing(&self) -> Vec<&Check> {
        self.checks.iter().filter(|c| !c.found).collect()
    }

    /// Check with `label`
    #[must_use]
    pub fn check(&self, label: &str) -> Option<&Check> {
        self.checks.iter().find(|c| c.label == label)
    }
}

/// Receives diagnostic progress as it happens
pub trait DiagnosticObserver: Send + Sync {
    /// A new group of checks starts
    fn on_section(&self, _title: &str) {}

    /// A check finished
    fn on_check(&self, _check: &Check) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentDiagnostic;

impl DiagnosticObserver for SilentDiagnostic {}

struct Recorder<'a> {
    observer: &'a dyn DiagnosticObserver,
    report: DiagnosticReport,
}

impl Recorder<'_> {
    fn section(&self, title: &str) {
        info!(section = title, "diagnostic");
        self.observer.on_section(title);
    }

    fn record(&mut self, check: Check) {
        self.observer.on_check(&check);
        self.report.checks.push(check);
    }
}

/// Element matching `locator`, `None` when it does not render in time
async fn probe<D: Driver>(
    session: &Session<D>,
    scope: Option<&ElementRef>,
    locator: &Locator,
) -> RegressionResult<Option<ElementRef>> {
    match find(session, scope, locator).await {
        Ok(element) => Ok(Some(element)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Run every check and one live create
///
/// Missing elements are recorded, not raised.
///
/// # Errors
///
/// Driver failures other than a missing element abort the diagnostic.
pub async fn run_diagnostic<D: Driver>(
    session: &Session<D>,
    observer: &dyn DiagnosticObserver,
) -> RegressionResult<DiagnosticReport> {
    let mut rec = Recorder {
        observer,
        report: DiagnosticReport::default(),
    };

    rec.section("Loading application");
    match session.open_app().await {
        Ok(_) => rec.record(Check::new("application", true, session.base_url())),
        Err(e) if e.is_not_found() => rec.record(Check::new("application", false, e.to_string())),
        Err(e) => return Err(e),
    }

    rec.section("Form inputs");
    let mut inputs = Vec::new();
    for locator in [
        form::NAME_INPUT,
        form::PRICE_INPUT,
        form::STOCK_INPUT,
        form::STOCK_MINIMO_INPUT,
    ] {
        let element = probe(session, None, &locator).await?;
        rec.record(Check::new(locator.name, element.is_some(), locator.to_css()));
        inputs.push(element);
    }

    rec.section("Buttons");
    for locator in [form::NEW_BUTTON, form::SAVE_BUTTON] {
        let element = probe(session, None, &locator).await?;
        rec.record(Check::new(locator.name, element.is_some(), locator.to_css()));
    }

    rec.section("Product list");
    let items = product_items(session).await?;
    rec.record(Check::new(
        list::ITEM.name,
        true,
        format!("{} product(s)", items.len()),
    ));

    if let Some(first) = items.first() {
        rec.section("First product");
        for locator in [list::EDIT_BUTTON, list::DELETE_BUTTON] {
            let element = probe(session, Some(first), &locator).await?;
            rec.record(Check::new(locator.name, element.is_some(), locator.to_css()));
        }
        match item_heading(session, first).await {
            Ok(name) => rec.record(Check::new(list::ITEM_NAME.name, true, name)),
            Err(e) if e.is_not_found() => {
                rec.record(Check::new(list::ITEM_NAME.name, false, e.to_string()));
            }
            Err(e) => return Err(e),
        }
    }

    rec.section("Live create");
    let before = items.len();
    match live_create(session, before).await {
        Ok(after) => {
            rec.report.screenshot = session.screenshot_fixed("diagnostico_success").await;
            rec.record(Check::new(
                "create",
                true,
                format!("{} created, {after} product(s)", DIAGNOSTIC.name),
            ));
        }
        Err(e) => {
            warn!(error = %e, "diagnostic create failed");
            rec.report.screenshot = session.screenshot_fixed("diagnostico_error").await;
            rec.record(Check::new("create", false, e.to_string()));
        }
    }

    Ok(rec.report)
}

/// Fill the form with the diagnostic product, save, and wait for one more item
async fn live_create<D: Driver>(session: &Session<D>, before: usize) -> RegressionResult<usize> {
    fill_product_form(session, &DIAGNOSTIC).await?;
    let save = find(session, None, &form::SAVE_BUTTON).await?;
    let _ = safe_click(session, &save).await?;

    let grew = wait_until(
        session.clock(),
        WaitOptions::element(session.timeouts()),
        "diagnostic product",
        || async move { Ok(product_items(session).await?.len() > before) },
    )
    .await;
    match grew {
        Ok(()) => Ok(product_items(session).await?.len()),
        Err(RegressionError::Timeout { ms, .. }) => Err(RegressionError::assertion(format!(
            "product count stayed at {before} for {ms}ms"
        ))),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::config::SuiteConfig;
    use crate::fixture::LAPTOP;
    use crate::screenshot::ScreenshotCapture;
    use crate::stub::StubDriver;
    use std::sync::{Arc, Mutex};

    fn session(driver: StubDriver) -> Session<StubDriver> {
        Session::open(driver, SuiteConfig::default())
            .unwrap()
            .with_clock(Arc::new(FakeClock::new()))
            .with_screenshots(ScreenshotCapture::disabled())
    }

    #[derive(Default)]
    struct Collect {
        sections: Mutex<Vec<String>>,
        labels: Mutex<Vec<String>>,
    }

    impl DiagnosticObserver for Collect {
        fn on_section(&self, title: &str) {
            self.sections.lock().unwrap().push(title.to_string());
        }

        fn on_check(&self, check: &Check) {
            self.labels.lock().unwrap().push(check.label.clone());
        }
    }

    #[tokio::test]
    async fn test_empty_application() {
        let driver = StubDriver::new();
        let collect = Collect::default();
        let report = run_diagnostic(&session(driver.clone()), &collect).await.unwrap();

        assert!(report.all_found(), "{:?}", report.missing());
        assert_eq!(report.check("product_item").unwrap().detail, "0 product(s)");
        assert!(report.check("edit_button").is_none());
        assert!(!collect.sections.lock().unwrap().contains(&"First product".to_string()));
        assert_eq!(driver.product_names(), vec![DIAGNOSTIC.name.to_string()]);
        assert_eq!(*collect.labels.lock().unwrap(), report.checks.iter().map(|c| c.label.clone()).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_first_product_checked() {
        let driver = StubDriver::new().with_product(&LAPTOP);
        let report = run_diagnostic(&session(driver), &SilentDiagnostic).await.unwrap();

        assert!(report.all_found());
        assert_eq!(report.check("product_name").unwrap().detail, LAPTOP.name);
        assert!(report.check("create").unwrap().detail.contains("2 product(s)"));
    }

    #[tokio::test]
    async fn test_missing_controls_are_recorded() {
        let driver = StubDriver::new()
            .with_product(&LAPTOP)
            .without(form::NEW_BUTTON)
            .without(list::DELETE_BUTTON);
        let report = run_diagnostic(&session(driver), &SilentDiagnostic).await.unwrap();

        let missing: Vec<_> = report.missing().iter().map(|c| c.label.as_str()).collect();
        assert_eq!(missing, vec!["new_button", "delete_button"]);
    }

    #[tokio::test]
    async fn test_create_failure_takes_error_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let driver = StubDriver::new().without(form::SAVE_BUTTON);
        let session = session(driver).with_screenshots(ScreenshotCapture::new(true, dir.path()));
        let report = run_diagnostic(&session, &SilentDiagnostic).await.unwrap();

        let create = report.check("create").unwrap();
        assert!(!create.found);
        assert!(create.detail.contains("save_button"));
        assert_eq!(report.screenshot.unwrap(), dir.path().join("diagnostico_error.png"));
    }

    #[tokio::test]
    async fn test_success_screenshot_taken_with_flag_off() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(StubDriver::new())
            .with_screenshots(ScreenshotCapture::new(false, dir.path()));
        let report = run_diagnostic(&session, &SilentDiagnostic).await.unwrap();

        assert!(report.all_found());
        assert_eq!(report.screenshot.unwrap(), dir.path().join("diagnostico_success.png"));
    }
}
