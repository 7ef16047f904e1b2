//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(
    name = "stagesync",
    version,
    about = "Keep staged heaters at fixed ratios of a primary heater"
)]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "etc/stagesync.toml")]
    pub config: PathBuf,

    /// Emit JSON lines instead of text (output, logs and errors)
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging] level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the config and print every instance's stage table
    Check,
    /// Run all instances against the simulated host in virtual time
    Simulate {
        /// Seconds of virtual time to run (overrides sim.duration)
        #[arg(long, value_name = "SECS")]
        duration: Option<f64>,
        /// Issue STAGESYNC on every instance at this virtual time (repeatable)
        #[arg(long = "trigger-at", value_name = "SECS")]
        trigger_at: Vec<f64>,
    },
}
