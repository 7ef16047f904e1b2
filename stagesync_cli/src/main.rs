#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod error_fmt;
mod logging;
mod sim;

use clap::Parser;
use std::fs;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{CliError, exit_code_for_error, format_error_json, humanize};

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = run(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn run(cli: Cli) -> eyre::Result<()> {
    let text = fs::read_to_string(&cli.config).map_err(|source| CliError::ConfigRead {
        path: cli.config.display().to_string(),
        source,
    })?;
    let cfg = stagesync_config::load_toml(&text).map_err(CliError::from)?;
    cfg.validate()
        .map_err(|e| CliError::InvalidConfig(e.to_string()))?;

    logging::init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), instances = cfg.stagesync.len(), "config loaded");

    match cli.cmd {
        Commands::Check => sim::check(&cfg, cli.json),
        Commands::Simulate {
            duration,
            trigger_at,
        } => sim::simulate(&cfg, duration, &trigger_at, cli.json),
    }
}
