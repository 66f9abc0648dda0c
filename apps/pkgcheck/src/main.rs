//! pkgcheck - package validation CLI
//!
//! Loads configuration, runs the check registry over a package directory and
//! renders the report. Exits 0 when no check failed, 1 when any check
//! failed, and 2 when the run itself could not complete.

mod cli;
mod display;
mod error;

use crate::cli::{Cli, Commands};
use crate::display::OutputRenderer;
use crate::error::CliError;
use clap::Parser;
use pkgcheck_config::Config;
use pkgcheck_engine::DirectoryPackage;
use pkgcheck_errors::{ConfigError, EngineError};
use pkgcheck_types::OutputFormat;
use std::process;
use tracing::{error, info};

const EXIT_PASSED: i32 = 0;
const EXIT_FAILED: i32 = 1;
const EXIT_ERROR: i32 = 2;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.json, cli.global.debug);

    let code = match run(cli) {
        Ok(true) => EXIT_PASSED,
        Ok(false) => EXIT_FAILED,
        Err(e) => {
            error!("run failed: {}", e);
            eprintln!("Error: {e}");
            EXIT_ERROR
        }
    };
    process::exit(code);
}

/// Main application logic; `Ok(false)` means at least one check failed
fn run(cli: Cli) -> Result<bool, CliError> {
    info!("Starting pkgcheck v{}", env!("CARGO_PKG_VERSION"));

    // file config (or defaults), then environment, then CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref())?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli);

    let renderer = OutputRenderer::new(
        config.general.output == OutputFormat::Json,
        config.general.color,
    );

    match cli.command {
        Commands::ListChecks => {
            renderer.render_checks(pkgcheck_checks::REGISTRY)?;
            Ok(true)
        }
        Commands::Check { dir, .. } => {
            let orchestrator = pkgcheck_checks::orchestrator()?
                .exclude(&config.checks.exclude)
                .map_err(|e| match e {
                    EngineError::InvalidCheckId { id } => CliError::Config(ConfigError::InvalidValue {
                        field: "checks.exclude".to_string(),
                        value: id,
                    }),
                    other => other.into(),
                })?;
            let package = DirectoryPackage::open(&dir)?;
            let baselines = pkgcheck_net::baselines_for(&config)?;

            let report = orchestrator.run(&package, baselines.as_ref())?;
            renderer.render_report(&report)?;
            info!(passed = report.passed(), "Command completed");
            Ok(report.passed())
        }
    }
}

fn apply_cli_config(config: &mut Config, cli: &Cli) {
    if cli.global.json {
        config.general.output = OutputFormat::Json;
    }
    if let Some(color) = cli.global.color {
        config.general.color = color;
    }
    if let Commands::Check {
        offline, exclude, ..
    } = &cli.command
    {
        if *offline {
            config.network.offline = true;
        }
        for id in exclude {
            if !config.checks.exclude.contains(id) {
                config.checks.exclude.push(id.clone());
            }
        }
    }
}

/// Logs go to stderr so stdout carries only the report
fn init_tracing(json_mode: bool, debug: bool) {
    let filter = if debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };

    if json_mode && debug {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}
