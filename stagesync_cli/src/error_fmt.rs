//! CLI error types, human-readable descriptions and structured JSON error formatting.

use stagesync_core::error::{BuildError, SyncError};
use stagesync_core::HeaterRole;

/// Failures owned by the CLI itself (config file handling and the simulated run).
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("sim.target_changes names unknown heater '{0}'")]
    UnknownSimHeater(String),
    #[error("host shutdown requested: {0}")]
    HostShutdown(String),
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(ce) = err.downcast_ref::<CliError>() {
        return match ce {
            CliError::ConfigRead { path, source } => format!(
                "What happened: Could not read the config file {path} ({source}).\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Pass --config <FILE> pointing at a readable TOML file."
            ),
            CliError::ConfigParse(e) => format!(
                "What happened: The config file is not valid TOML for StageSync ({e}).\nLikely causes: Syntax error, misspelled key, or wrong value type.\nHow to fix: Compare with etc/stagesync.toml and fix the reported line."
            ),
            CliError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing [stagesync.<heater>] section, empty or mismatched lists, or out-of-range values.\nHow to fix: Edit the config file, then rerun `stagesync check`."
            ),
            CliError::UnknownSimHeater(name) => format!(
                "What happened: A simulated target change names heater '{name}', which the simulated host does not have.\nLikely causes: Typo in sim.target_changes or the heater is missing from sim.heaters.\nHow to fix: Add the heater to sim.heaters or fix the name."
            ),
            CliError::HostShutdown(msg) => format!(
                "What happened: StageSync requested a host shutdown.\nDetail: {msg}\nHow to fix: Check that every stage heater accepts SET_HEATER_TEMPERATURE; see the log for the rejected script."
            ),
        };
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: Internal wiring error ({be}).\nLikely causes: A host collaborator was not passed to the builder.\nHow to fix: This is a bug; please report it with the command you ran."
        );
    }

    if let Some(se) = err.downcast_ref::<SyncError>() {
        return match se {
            SyncError::Config(ce) => format!(
                "What happened: StageSync configuration rejected ({ce}).\nLikely causes: Ratio outside 0.0..=2.0, non-numeric ratio, or empty stage name.\nHow to fix: Fix stages/temp_ratio for {ctx}.",
                ctx = context_or(err, "the instance")
            ),
            SyncError::Lookup {
                role: HeaterRole::Stage,
                name,
            } => format!(
                "What happened: Stage heater '{name}' does not exist.\nLikely causes: Typo in stages, or the heater is not defined on the host.\nHow to fix: Use a heater name the host knows (see sim.heaters)."
            ),
            SyncError::Lookup {
                role: HeaterRole::Primary,
                name,
            } => format!(
                "What happened: Primary heater '{name}' does not exist.\nLikely causes: The [stagesync.<heater>] section names an unknown heater.\nHow to fix: Rename the section after an existing heater."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.chain().nth(1) {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

fn context_or(err: &eyre::Report, fallback: &str) -> String {
    let outer = err.to_string();
    if err.chain().count() > 1 {
        outer
    } else {
        fallback.to_string()
    }
}

/// Stable exit codes: 3 config, 4 unknown heater, 5 host shutdown, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(ce) = err.downcast_ref::<CliError>() {
        return match ce {
            CliError::ConfigRead { .. } => 1,
            CliError::ConfigParse(_) | CliError::InvalidConfig(_) => 3,
            CliError::UnknownSimHeater(_) => 4,
            CliError::HostShutdown(_) => 5,
        };
    }
    if let Some(se) = err.downcast_ref::<SyncError>() {
        return match se {
            SyncError::Config(_) => 3,
            SyncError::Lookup { .. } => 4,
            SyncError::Dispatch { .. } => 5,
            SyncError::TransientSample { .. } => 1,
        };
    }
    1
}

/// Stable reason name for JSON output.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(ce) = err.downcast_ref::<CliError>() {
        return match ce {
            CliError::ConfigRead { .. } => "ConfigRead",
            CliError::ConfigParse(_) => "ConfigParse",
            CliError::InvalidConfig(_) => "InvalidConfig",
            CliError::UnknownSimHeater(_) => "UnknownHeater",
            CliError::HostShutdown(_) => "HostShutdown",
        };
    }
    if let Some(se) = err.downcast_ref::<SyncError>() {
        return match se {
            SyncError::Config(_) => "InvalidConfig",
            SyncError::Lookup { .. } => "UnknownHeater",
            SyncError::Dispatch { .. } => "DispatchRejected",
            SyncError::TransientSample { .. } => "SampleFailed",
        };
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let chain: Vec<String> = err.chain().map(ToString::to_string).collect();
    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "error": chain.join(": "),
        "message": humanize(err),
    })
    .to_string()
}
