//! Inventory Regression CLI library
//!
//! Command-line entry points for the inventory regression suite: `run`
//! executes the scenarios and prints a tally, `diagnose` checks the
//! application's markup one selector at a time.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod config;
mod error;
mod logging;
mod output;
mod runner;

pub use commands::{BrowserArg, Cli, ColorArg, Commands, DiagnoseArgs, RunArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use logging::init_logging;
pub use output::ProgressReporter;
pub use runner::{diagnose, execute_runs, run_diagnose, run_suite, verdict, BrowserDriver};
