//! Inventory Regression: browser-driven regression suite for the product
//! inventory web application.
//!
//! Ten scenarios (create, list, edit, delete, validation, stock alerts,
//! dashboard, full lifecycle) run sequentially against a live instance of the
//! application through a [`Driver`]. The browser is a collaborator: the
//! `browser` feature drives Chrome/Chromium over the DevTools protocol, and
//! [`StubDriver`] models the application's rendered contract in memory so the
//! harness itself is testable.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  Inventory Regression                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐            │
//! │  │ Scenarios  │──►│ interact   │──►│ Driver     │──► browser │
//! │  │ (runner)   │   │ safe_click │   │ (CDP/stub) │            │
//! │  └────────────┘   │ save ctrl  │   └────────────┘            │
//! │        │          └────────────┘                             │
//! │        ▼                                                     │
//! │  ┌────────────┐   ┌────────────┐                             │
//! │  │ SuiteReport│   │ Screenshots│                             │
//! │  └────────────┘   └────────────┘                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use inventory_regression::{NoopObserver, Session, StubDriver, SuiteConfig, SuiteRunner};
//!
//! # async fn demo() -> inventory_regression::RegressionResult<()> {
//! let session = Session::open(StubDriver::new(), SuiteConfig::default())?;
//! let report = SuiteRunner::new().run_and_close(session, &NoopObserver).await;
//! assert!(report.all_passed());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

#[cfg(feature = "browser")]
mod browser;
mod clock;
mod config;
mod diagnostic;
mod driver;
mod interact;
mod result;
mod runner;
mod scenario;
mod screenshot;
mod session;
mod wait;

/// Fixed product data used by the scenarios
pub mod fixture;
/// Locators for every element the suite touches
pub mod locator;
/// Application reset between scenarios
pub mod reset;
/// In-memory model of the application for harness tests
pub mod stub;

#[cfg(feature = "browser")]
pub use browser::ChromiumDriver;
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{BrowserConfig, BrowserKind, ResetConfig, SuiteConfig, Timeouts, DEFAULT_BASE_URL};
pub use diagnostic::{run_diagnostic, Check, DiagnosticObserver, DiagnosticReport, SilentDiagnostic};
pub use driver::{Driver, ElementRef};
pub use fixture::{ProductFixture, StockLevel};
pub use interact::{
    accept_confirmation, begin_edit, count_items_named, create_product, delete_item,
    fill_product_form, find, find_item_by_name, find_optional, find_save_control, first_present,
    item_heading, item_names, product_items, safe_click, stock_indicator, submit_form, type_into,
    wait_for_item, wait_for_name_count, ClickMethod, SaveControl,
};
pub use locator::{Locator, Strategy, SAVE_CONTROL_CANDIDATES};
#[cfg(feature = "reset-api")]
pub use reset::ApiReset;
pub use reset::{AppReset, NoReset};
pub use result::{ensure, RegressionError, RegressionResult};
pub use runner::{NoopObserver, RunObserver, ScenarioOutcome, Status, SuiteReport, SuiteRunner};
pub use scenario::ScenarioId;
pub use screenshot::{ScreenshotCapture, TIMESTAMP_FORMAT};
pub use session::Session;
pub use stub::{DashboardMode, StockSignal, StubDriver};
pub use wait::{poll_until, wait_until, WaitOptions};
