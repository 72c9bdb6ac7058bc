//! Console output and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use inventory_regression::{
    Check, DiagnosticObserver, DiagnosticReport, RunObserver, ScenarioId, ScenarioOutcome, Status,
    SuiteReport,
};
use std::time::Duration;

/// Progress reporter for suite and diagnostic runs
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` scenarios
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet || !self.term.is_term() {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Update progress message
    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    /// Finish and clear the progress bar
    pub fn finish(&mut self) {
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_and_clear();
        }
    }

    /// Write a line above the progress bar, if one is drawn
    fn emit(&self, line: &str) {
        match self.progress_bar {
            Some(ref pb) if !pb.is_finished() => pb.println(line),
            _ => {
                let _ = self.term.write_line(line);
            }
        }
    }

    fn prefixed(&self, symbol: &str, plain: &str, color: Style, message: &str) {
        let prefix = if self.use_color {
            color.bold().apply_to(symbol).to_string()
        } else {
            plain.to_string()
        };
        self.emit(&format!("{prefix} {message}"));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.prefixed("✓", "PASS", Style::new().green(), message);
        }
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        self.prefixed("✗", "FAIL", Style::new().red(), message);
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        self.prefixed("⚠", "ERROR", Style::new().yellow(), message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            self.prefixed("⚠", "WARN", Style::new().yellow(), message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            self.prefixed("ℹ", "INFO", Style::new().blue(), message);
        }
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        self.emit("");
        self.emit(&styled);
    }

    /// Print one scenario outcome
    pub fn outcome(&self, outcome: &ScenarioOutcome) {
        let line = format!("{} {}: {}", outcome.code, outcome.description, outcome.detail);
        match outcome.status {
            Status::Passed => self.success(&line),
            Status::Failed => self.failure(&line),
            Status::Errored => self.error(&line),
        }
        if outcome.status != Status::Passed {
            if let Some(ref path) = outcome.screenshot {
                self.emit(&format!("    screenshot: {}", path.display()));
            }
        }
    }

    /// Print the suite tally
    pub fn summary(&self, report: &SuiteReport) {
        if self.quiet && report.all_passed() {
            return;
        }

        self.emit("");
        let duration = Duration::from_millis(report.duration_ms).as_secs_f64();
        let verdict = if report.all_passed() { "PASSED" } else { "FAILED" };
        let counts = format!(
            "{} executed, {} passed, {} failed, {} errored",
            report.executed, report.passed, report.failed, report.errored
        );
        let rate = format!("success rate {:.1}%", report.success_rate);

        if self.use_color {
            let verdict_style = if report.all_passed() {
                Style::new().green().bold()
            } else {
                Style::new().red().bold()
            };
            self.emit(&format!(
                "{} {counts} in {duration:.2}s ({})",
                verdict_style.apply_to(verdict),
                Style::new().bold().apply_to(rate)
            ));
        } else {
            self.emit(&format!("{verdict} {counts} in {duration:.2}s ({rate})"));
        }
    }

    /// Print the diagnostic closing line
    pub fn diagnostic_summary(&self, report: &DiagnosticReport) {
        self.emit("");
        if let Some(ref path) = report.screenshot {
            self.info(&format!("screenshot saved: {}", path.display()));
        }
        if report.all_found() {
            self.success("Every element found; the suite can run.");
        } else {
            let missing: Vec<&str> = report.missing().iter().map(|c| c.label.as_str()).collect();
            self.failure(&format!("Missing: {}. Check the locators.", missing.join(", ")));
        }
    }
}

impl RunObserver for ProgressReporter {
    fn on_start(&self, index: usize, total: usize, id: ScenarioId) {
        self.set_message(&format!("{} {}", id.code(), id.description()));
        if self.progress_bar.is_none() && !self.quiet {
            self.emit(&format!("[{}/{total}] {} {}", index + 1, id.code(), id.description()));
        }
    }

    fn on_finish(&self, outcome: &ScenarioOutcome) {
        self.outcome(outcome);
        self.increment(1);
    }
}

impl DiagnosticObserver for ProgressReporter {
    fn on_section(&self, title: &str) {
        self.header(title);
    }

    fn on_check(&self, check: &Check) {
        let line = if check.detail.is_empty() {
            check.label.clone()
        } else {
            format!("{}: {}", check.label, check.detail)
        };
        if check.found {
            self.success(&line);
        } else {
            self.failure(&line);
        }
    }
}
