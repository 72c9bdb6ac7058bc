//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use inventory_regression::{BrowserKind, SuiteConfig};
use std::path::PathBuf;

/// Inventory Regression: browser-driven regression suite for the product inventory app
#[derive(Parser, Debug)]
#[command(name = "inventory-regression")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// YAML configuration file; flags override its values
    #[arg(long, global = true, env = "INVENTORY_REGRESSION_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the regression scenarios
    Run(RunArgs),

    /// Check every selector the suite relies on, then try one live create
    Diagnose(DiagnoseArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Base URL of the application
    #[arg(long, env = "INVENTORY_BASE_URL")]
    pub base_url: Option<String>,

    /// Browser to drive
    #[arg(long)]
    pub browser: Option<BrowserArg>,

    /// DevTools endpoint of a running browser (implies --browser remote)
    #[arg(long, env = "INVENTORY_REMOTE_URL")]
    pub remote_url: Option<String>,

    /// Run without a visible window
    #[arg(long)]
    pub headless: bool,

    /// Keep the default window size instead of maximizing
    #[arg(long)]
    pub no_maximize: bool,

    /// Do not capture screenshots
    #[arg(long)]
    pub no_screenshots: bool,

    /// Directory for screenshots
    #[arg(long)]
    pub screenshot_dir: Option<PathBuf>,

    /// Only run scenarios whose code or name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Empty the product table through this REST API root before each scenario
    #[arg(long, env = "INVENTORY_RESET_API")]
    pub reset_api: Option<String>,

    /// Write the JSON report of the last run here
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Run the whole selection this many times
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub repeat: u32,
}

impl RunArgs {
    /// Apply the flags over `config`
    #[must_use]
    pub fn apply(&self, mut config: SuiteConfig) -> SuiteConfig {
        if let Some(ref url) = self.base_url {
            config.base_url.clone_from(url);
        }
        if let Some(browser) = self.browser {
            config.browser.kind = browser.into();
        }
        if let Some(ref url) = self.remote_url {
            config.browser = config.browser.with_remote_url(url.clone());
        }
        if self.headless {
            config.browser.headless = true;
        }
        if self.no_maximize {
            config.browser.maximize = false;
        }
        if self.no_screenshots {
            config.browser.screenshot_on_error = false;
        }
        if let Some(ref dir) = self.screenshot_dir {
            config.browser.screenshot_dir.clone_from(dir);
        }
        if let Some(ref api) = self.reset_api {
            config = config.with_reset_api(api.clone());
        }
        config
    }
}

/// Arguments for the diagnose command
#[derive(Parser, Debug, Default)]
pub struct DiagnoseArgs {
    /// Base URL of the application
    #[arg(long, env = "INVENTORY_BASE_URL")]
    pub base_url: Option<String>,

    /// Run without a visible window
    #[arg(long)]
    pub headless: bool,

    /// Close the browser without waiting for ENTER
    #[arg(long)]
    pub no_wait: bool,
}

impl DiagnoseArgs {
    /// Apply the flags over `config`
    #[must_use]
    pub fn apply(&self, mut config: SuiteConfig) -> SuiteConfig {
        if let Some(ref url) = self.base_url {
            config.base_url.clone_from(url);
        }
        if self.headless {
            config.browser.headless = true;
        }
        config
    }
}

/// Browser kind argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrowserArg {
    /// Launch a local Chrome/Chromium
    Chrome,
    /// Attach to a running DevTools endpoint
    Remote,
}

impl From<BrowserArg> for BrowserKind {
    fn from(arg: BrowserArg) -> Self {
        match arg {
            BrowserArg::Chrome => Self::Chrome,
            BrowserArg::Remote => Self::Remote,
        }
    }
}

/// Color output argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
