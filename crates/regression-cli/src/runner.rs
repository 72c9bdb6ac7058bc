//! `run` and `diagnose` command execution

use crate::commands::{DiagnoseArgs, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use inventory_regression::{
    reset, run_diagnostic, DiagnosticReport, Driver, ScenarioId, Session, SuiteConfig,
    SuiteReport, SuiteRunner,
};
use std::io::BufRead;
use tokio::runtime::Runtime;
use tracing::warn;

/// Driver the binary launches
#[cfg(feature = "browser")]
pub type BrowserDriver = inventory_regression::ChromiumDriver;

/// Driver the binary launches
#[cfg(not(feature = "browser"))]
pub type BrowserDriver = inventory_regression::StubDriver;

fn runtime() -> CliResult<Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread().enable_all().build()?)
}

#[cfg(feature = "browser")]
fn launch(runtime: &Runtime, suite: SuiteConfig) -> CliResult<Session<BrowserDriver>> {
    Ok(runtime.block_on(Session::launch(suite))?)
}

#[cfg(not(feature = "browser"))]
fn launch(_runtime: &Runtime, _suite: SuiteConfig) -> CliResult<Session<BrowserDriver>> {
    Err(CliError::browser_unavailable(
        "rebuild inventory-regression-cli with the `browser` feature",
    ))
}

async fn close<D: Driver>(session: Session<D>) {
    if let Err(e) = session.close().await {
        warn!(error = %e, "closing the browser failed");
    }
}

// =============================================================================
// RUN
// =============================================================================

/// Execute the `run` command
pub fn run_suite(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let suite = args.apply(config.load_suite()?);
    suite.validate()?;

    let scenarios = ScenarioId::select(args.filter.as_deref());
    if scenarios.is_empty() {
        return Err(CliError::config(format!(
            "no scenario matches filter {:?}",
            args.filter.as_deref().unwrap_or_default()
        )));
    }
    let runner = SuiteRunner::new()
        .with_scenarios(scenarios)
        .with_reset(reset::from_config(&suite.reset)?);

    let mut reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    reporter.header("Inventory regression suite");
    reporter.info(&format!(
        "{} scenario(s) against {}",
        runner.scenarios().len(),
        suite.base_url
    ));

    let runtime = runtime()?;
    let session = launch(&runtime, suite)?;
    let reports = runtime.block_on(async {
        let reports = execute_runs(&session, &runner, &mut reporter, args.repeat).await;
        close(session).await;
        reports
    });

    if let (Some(path), Some(last)) = (args.json.as_deref(), reports.last()) {
        last.write_json(path)?;
        reporter.info(&format!("report written to {}", path.display()));
    }
    verdict(&reports)
}

/// Run the selection `repeat` times over one session, reporting as it goes
pub async fn execute_runs<D: Driver>(
    session: &Session<D>,
    runner: &SuiteRunner,
    reporter: &mut ProgressReporter,
    repeat: u32,
) -> Vec<SuiteReport> {
    let mut reports = Vec::with_capacity(repeat as usize);
    for round in 1..=repeat {
        if repeat > 1 {
            reporter.header(&format!("Run {round}/{repeat}"));
        }
        reporter.start_progress(runner.scenarios().len() as u64, "Running scenarios");
        let report = runner.run(session, &*reporter).await;
        reporter.finish();
        reporter.summary(&report);
        reports.push(report);
    }

    if let Some((first, rest)) = reports.split_first() {
        if rest.iter().any(|r| r.statuses() != first.statuses()) {
            reporter.warning("outcomes differ between runs");
        } else if !rest.is_empty() {
            reporter.info(&format!("{repeat} runs agree"));
        }
    }
    reports
}

/// Success only when every scenario of every run passed
pub fn verdict(reports: &[SuiteReport]) -> CliResult<()> {
    let failed: usize = reports.iter().map(|r| r.failed).sum();
    let errored: usize = reports.iter().map(|r| r.errored).sum();
    if failed + errored == 0 {
        Ok(())
    } else {
        Err(CliError::ScenariosFailed { failed, errored })
    }
}

// =============================================================================
// DIAGNOSE
// =============================================================================

/// Execute the `diagnose` command
pub fn run_diagnose(config: &CliConfig, args: &DiagnoseArgs) -> CliResult<()> {
    let suite = args.apply(config.load_suite()?);
    suite.validate()?;

    let reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    reporter.header("Selector diagnostic");

    let runtime = runtime()?;
    let session = launch(&runtime, suite)?;
    let report = runtime.block_on(diagnose(&session, &reporter));

    if !args.no_wait {
        wait_for_enter(&mut std::io::stdin().lock())?;
    }
    runtime.block_on(close(session));

    let report = report?;
    if report.all_found() {
        Ok(())
    } else {
        Err(CliError::DiagnosticIncomplete {
            missing: report.missing().len(),
        })
    }
}

/// Run the diagnostic and print its closing line
pub async fn diagnose<D: Driver>(
    session: &Session<D>,
    reporter: &ProgressReporter,
) -> CliResult<DiagnosticReport> {
    let report = run_diagnostic(session, reporter).await?;
    reporter.diagnostic_summary(&report);
    Ok(report)
}

/// Block until the operator presses ENTER
fn wait_for_enter(input: &mut impl BufRead) -> CliResult<()> {
    eprintln!();
    eprintln!("Press ENTER to close the browser...");
    let mut line = String::new();
    let _ = input.read_line(&mut line)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use inventory_regression::{DashboardMode, FakeClock, ScreenshotCapture, StockSignal, StubDriver};
    use std::sync::Arc;

    fn session(driver: StubDriver) -> Session<StubDriver> {
        Session::open(driver, SuiteConfig::default())
            .unwrap()
            .with_clock(Arc::new(FakeClock::new()))
            .with_screenshots(ScreenshotCapture::disabled())
    }

    #[tokio::test]
    async fn test_execute_runs_repeats() {
        let mut reporter = ProgressReporter::new(false, true);
        let runner = SuiteRunner::new().with_filter("TC-REG");
        let reports = execute_runs(&session(StubDriver::new()), &runner, &mut reporter, 2).await;

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].statuses(), reports[1].statuses());
        assert!(verdict(&reports).is_ok());
    }

    #[tokio::test]
    async fn test_verdict_counts_every_run() {
        let mut reporter = ProgressReporter::new(false, true);
        let driver = StubDriver::new().with_stock_signal(StockSignal::Missing);
        let runner = SuiteRunner::new().with_filter("zero-stock");
        let reports = execute_runs(&session(driver), &runner, &mut reporter, 3).await;

        match verdict(&reports) {
            Err(CliError::ScenariosFailed { failed, errored }) => {
                assert_eq!(failed, 3);
                assert_eq!(errored, 0);
            }
            other => panic!("unexpected verdict: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_absent_dashboard_keeps_verdict_green() {
        let mut reporter = ProgressReporter::new(false, true);
        let driver = StubDriver::new().with_dashboard(DashboardMode::Absent);
        let runner = SuiteRunner::new().with_filter("dashboard");
        let reports = execute_runs(&session(driver), &runner, &mut reporter, 1).await;
        assert!(verdict(&reports).is_ok());
    }

    #[test]
    fn test_verdict_empty_is_success() {
        assert!(verdict(&[]).is_ok());
    }

    #[tokio::test]
    async fn test_diagnose_against_stub() {
        let reporter = ProgressReporter::new(false, true);
        let report = diagnose(&session(StubDriver::new()), &reporter).await.unwrap();
        assert!(report.all_found());
    }

    #[test]
    fn test_wait_for_enter_reads_one_line() {
        let mut input = std::io::Cursor::new(b"\nrest".to_vec());
        wait_for_enter(&mut input).unwrap();
        assert_eq!(input.position(), 1);
    }
}
