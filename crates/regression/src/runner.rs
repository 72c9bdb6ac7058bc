//! Sequential suite runner and its report.
//!
//! Scenarios run one after another over a single session. A failing scenario
//! is recorded (with a failure screenshot) and the next one still runs.

use crate::driver::Driver;
use crate::reset::{AppReset, NoReset};
use crate::result::RegressionResult;
use crate::scenario::ScenarioId;
use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

/// Scenario verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Every check held
    Passed,
    /// A check did not hold
    Failed,
    /// The scenario could not be carried out
    Errored,
}

/// Result of one scenario execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    /// Scenario
    pub id: ScenarioId,
    /// Test-case code
    pub code: String,
    /// Description
    pub description: String,
    /// Verdict
    pub status: Status,
    /// Pass detail or failure message
    pub detail: String,
    /// Screenshot taken after the scenario, if any
    pub screenshot: Option<PathBuf>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl ScenarioOutcome {
    /// Whether the scenario passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == Status::Passed
    }
}

/// Tally of a suite run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Outcomes in execution order
    pub outcomes: Vec<ScenarioOutcome>,
    /// Scenarios executed
    pub executed: usize,
    /// Scenarios passed
    pub passed: usize,
    /// Scenarios failed
    pub failed: usize,
    /// Scenarios errored
    pub errored: usize,
    /// Passed over executed, in percent (0 when nothing ran)
    pub success_rate: f64,
    /// Total wall time in milliseconds
    pub duration_ms: u64,
}

impl SuiteReport {
    /// Build the tally from outcomes
    #[must_use]
    pub fn from_outcomes(outcomes: Vec<ScenarioOutcome>, duration: Duration) -> Self {
        let count = |status| outcomes.iter().filter(|o| o.status == status).count();
        let executed = outcomes.len();
        let passed = count(Status::Passed);
        let failed = count(Status::Failed);
        let errored = count(Status::Errored);
        let success_rate = if executed == 0 {
            0.0
        } else {
            passed as f64 / executed as f64 * 100.0
        };
        Self {
            outcomes,
            executed,
            passed,
            failed,
            errored,
            success_rate,
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Whether nothing failed or errored
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    /// Outcomes that did not pass
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioOutcome> {
        self.outcomes.iter().filter(|o| !o.passed()).collect()
    }

    /// Verdicts in execution order
    #[must_use]
    pub fn statuses(&self) -> Vec<(ScenarioId, Status)> {
        self.outcomes.iter().map(|o| (o.id, o.status)).collect()
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> RegressionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON report to `path`
    pub fn write_json(&self, path: &Path) -> RegressionResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Progress callbacks for a running suite
pub trait RunObserver: Send + Sync {
    /// Called before scenario `index` (0-based) of `total` starts
    fn on_start(&self, _index: usize, _total: usize, _id: ScenarioId) {}

    /// Called when a scenario finished
    fn on_finish(&self, _outcome: &ScenarioOutcome) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Runs the selected scenarios over one session
pub struct SuiteRunner {
    scenarios: Vec<ScenarioId>,
    reset: Box<dyn AppReset>,
}

impl std::fmt::Debug for SuiteRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteRunner")
            .field("scenarios", &self.scenarios)
            .field("reset", &self.reset.name())
            .finish()
    }
}

impl Default for SuiteRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl SuiteRunner {
    /// All scenarios, no reset
    #[must_use]
    pub fn new() -> Self {
        Self {
            scenarios: ScenarioId::ALL.to_vec(),
            reset: Box::new(NoReset),
        }
    }

    /// Run only `scenarios`
    #[must_use]
    pub fn with_scenarios(mut self, scenarios: Vec<ScenarioId>) -> Self {
        self.scenarios = scenarios;
        self
    }

    /// Run only scenarios whose code or slug contains `filter`
    #[must_use]
    pub fn with_filter(self, filter: &str) -> Self {
        self.with_scenarios(ScenarioId::select(Some(filter)))
    }

    /// Reset the application before each scenario
    #[must_use]
    pub fn with_reset(mut self, reset: Box<dyn AppReset>) -> Self {
        self.reset = reset;
        self
    }

    /// Selected scenarios
    #[must_use]
    pub fn scenarios(&self) -> &[ScenarioId] {
        &self.scenarios
    }

    /// Run every selected scenario and tally the results
    pub async fn run<D: Driver>(&self, session: &Session<D>, observer: &dyn RunObserver) -> SuiteReport {
        let start = session.clock().now();
        let total = self.scenarios.len();
        info!(total, reset = self.reset.name(), "suite started");

        let mut outcomes = Vec::with_capacity(total);
        for (index, id) in self.scenarios.iter().copied().enumerate() {
            observer.on_start(index, total, id);
            let outcome = self.run_one(session, id).await;
            observer.on_finish(&outcome);
            outcomes.push(outcome);
        }

        let report = SuiteReport::from_outcomes(outcomes, session.clock().now().saturating_sub(start));
        info!(
            executed = report.executed,
            passed = report.passed,
            failed = report.failed,
            errored = report.errored,
            "suite finished"
        );
        report
    }

    /// Run the suite, then close the session whatever the outcome
    pub async fn run_and_close<D: Driver>(
        &self,
        session: Session<D>,
        observer: &dyn RunObserver,
    ) -> SuiteReport {
        let report = self.run(&session, observer).await;
        if let Err(e) = session.close().await {
            warn!(error = %e, "closing the browser failed");
        }
        report
    }

    /// Reset, load the page, run one scenario and capture a screenshot
    pub async fn run_one<D: Driver>(&self, session: &Session<D>, id: ScenarioId) -> ScenarioOutcome {
        info!(code = id.code(), "{}", id.description());
        let start = session.clock().now();

        let result = async {
            self.reset.reset().await?;
            let _ = session.open_app().await?;
            id.run(session).await
        }
        .await;

        let stem = id.screenshot_stem();
        let (status, detail, screenshot) = match result {
            Ok(detail) => {
                let shot = session.screenshot(&format!("{stem}_success")).await;
                info!(code = id.code(), "✓ PASS: {detail}");
                (Status::Passed, detail, shot)
            }
            Err(e) => {
                let shot = session.screenshot(&format!("{stem}_error")).await;
                let status = if e.is_assertion() {
                    Status::Failed
                } else {
                    Status::Errored
                };
                error!(code = id.code(), ?status, "✗ FAIL: {e}");
                (status, e.to_string(), shot)
            }
        };

        ScenarioOutcome {
            id,
            code: id.code().to_string(),
            description: id.description().to_string(),
            status,
            detail,
            screenshot,
            duration_ms: session.clock().now().saturating_sub(start).as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::config::SuiteConfig;
    use crate::locator::form;
    use crate::result::RegressionError;
    use crate::screenshot::ScreenshotCapture;
    use crate::stub::{DashboardMode, StockSignal, StubDriver};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn session(driver: StubDriver) -> Session<StubDriver> {
        Session::open(driver, SuiteConfig::default())
            .unwrap()
            .with_clock(Arc::new(FakeClock::new()))
            .with_screenshots(ScreenshotCapture::disabled())
    }

    fn outcome(id: ScenarioId, status: Status) -> ScenarioOutcome {
        ScenarioOutcome {
            id,
            code: id.code().to_string(),
            description: id.description().to_string(),
            status,
            detail: String::new(),
            screenshot: None,
            duration_ms: 0,
        }
    }

    #[derive(Default)]
    struct Recorder {
        started: Mutex<Vec<ScenarioId>>,
        finished: AtomicUsize,
    }

    impl RunObserver for Recorder {
        fn on_start(&self, _index: usize, _total: usize, id: ScenarioId) {
            self.started.lock().unwrap().push(id);
        }

        fn on_finish(&self, _outcome: &ScenarioOutcome) {
            let _ = self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FailingReset;

    #[async_trait]
    impl AppReset for FailingReset {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn reset(&self) -> RegressionResult<()> {
            Err(RegressionError::Reset {
                message: "api down".to_string(),
            })
        }
    }

    #[test]
    fn test_report_tally() {
        let report = SuiteReport::from_outcomes(
            vec![
                outcome(ScenarioId::CreateBasicProduct, Status::Passed),
                outcome(ScenarioId::ListProducts, Status::Passed),
                outcome(ScenarioId::EditProduct, Status::Failed),
                outcome(ScenarioId::DeleteProduct, Status::Errored),
            ],
            Duration::from_secs(3),
        );
        assert_eq!(report.executed, 4);
        assert_eq!(report.passed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errored, 1);
        assert!((report.success_rate - 50.0).abs() < f64::EPSILON);
        assert_eq!(report.duration_ms, 3_000);
        assert!(!report.all_passed());
        assert_eq!(report.failures().len(), 2);
    }

    #[test]
    fn test_empty_report_rate_is_zero() {
        let report = SuiteReport::from_outcomes(Vec::new(), Duration::ZERO);
        assert_eq!(report.executed, 0);
        assert!(report.success_rate.abs() < f64::EPSILON);
        assert!(report.all_passed());
    }

    #[test]
    fn test_report_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.json");
        let report = SuiteReport::from_outcomes(
            vec![outcome(ScenarioId::FullLifecycle, Status::Failed)],
            Duration::from_millis(1500),
        );
        report.write_json(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"full-lifecycle\""));
        assert!(text.contains("\"failed\""));
        let loaded: SuiteReport = serde_json::from_str(&text).unwrap();
        assert_eq!(loaded, report);
    }

    #[tokio::test]
    async fn test_full_suite_passes_against_stub() {
        let driver = StubDriver::new();
        let recorder = Recorder::default();
        let report = SuiteRunner::new().run(&session(driver), &recorder).await;

        assert_eq!(report.executed, 10);
        assert!(report.all_passed(), "{:#?}", report.failures());
        assert_eq!(*recorder.started.lock().unwrap(), ScenarioId::ALL.to_vec());
        assert_eq!(recorder.finished.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_the_suite() {
        let driver = StubDriver::new().with_stock_signal(StockSignal::Missing);
        let runner = SuiteRunner::new().with_scenarios(vec![
            ScenarioId::LowStockAlert,
            ScenarioId::DashboardMetrics,
        ]);
        let report = runner.run(&session(driver), &NoopObserver).await;

        assert_eq!(report.executed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures()[0].id, ScenarioId::LowStockAlert);
        assert_eq!(report.outcomes[1].status, Status::Passed);
    }

    #[tokio::test]
    async fn test_absent_dashboard_passes() {
        let driver = StubDriver::new().with_dashboard(DashboardMode::Absent);
        let runner = SuiteRunner::new().with_scenarios(vec![ScenarioId::DashboardMetrics]);
        let report = runner.run(&session(driver), &NoopObserver).await;

        assert!(report.all_passed(), "{:#?}", report.failures());
        assert!(report.outcomes[0].detail.contains("hidden initially"));
    }

    #[tokio::test]
    async fn test_missing_control_is_errored() {
        let driver = StubDriver::new().without(form::SAVE_BUTTON);
        let runner = SuiteRunner::new().with_filter("TC-REG-001");
        let report = runner.run(&session(driver), &NoopObserver).await;

        assert_eq!(report.executed, 1);
        assert_eq!(report.errored, 1);
        assert!(report.outcomes[0].detail.contains("save_button"));
    }

    #[tokio::test]
    async fn test_reset_failure_is_errored() {
        let runner = SuiteRunner::new()
            .with_filter("list")
            .with_reset(Box::new(FailingReset));
        let report = runner.run(&session(StubDriver::new()), &NoopObserver).await;
        assert_eq!(report.statuses(), vec![(ScenarioId::ListProducts, Status::Errored)]);
        assert!(report.outcomes[0].detail.contains("api down"));
    }

    #[tokio::test]
    async fn test_screenshots_per_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let driver = StubDriver::new().with_stock_signal(StockSignal::Missing);
        let session = session(driver).with_screenshots(ScreenshotCapture::new(true, dir.path()));
        let runner = SuiteRunner::new().with_scenarios(vec![
            ScenarioId::RequiredFieldValidation,
            ScenarioId::ZeroStockAlert,
        ]);
        let report = runner.run(&session, &NoopObserver).await;

        let names: Vec<String> = report
            .outcomes
            .iter()
            .map(|o| {
                o.screenshot
                    .as_ref()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
            .collect();
        assert!(names[0].starts_with("screenshot_test_005_success_"));
        assert!(names[1].starts_with("screenshot_test_008_error_"));
    }

    #[tokio::test]
    async fn test_run_and_close_closes() {
        let driver = StubDriver::new();
        let runner = SuiteRunner::new().with_filter("TC-REG-005");
        let report = runner.run_and_close(session(driver.clone()), &NoopObserver).await;
        assert!(report.all_passed());
        assert!(driver.was_called("close"));
    }
}
