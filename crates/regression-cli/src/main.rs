//! Inventory Regression CLI
//!
//! ## Usage
//!
//! ```bash
//! inventory-regression run                         # All ten scenarios
//! inventory-regression run --filter stock-alert    # Matching scenarios only
//! inventory-regression run --headless --json out.json
//! inventory-regression diagnose                    # Check selectors by hand
//! ```

use clap::Parser;
use inventory_regression_cli::{
    init_logging, run_diagnose, run_suite, Cli, CliConfig, CliResult, ColorChoice, Commands,
    Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_logging(config.verbosity, config.color.should_color());

    match cli.command {
        Commands::Run(ref args) => run_suite(&config, args),
        Commands::Diagnose(ref args) => run_diagnose(&config, args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.clone().into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
        .with_suite_file(cli.config.clone())
}
