#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for StageSync instances.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Only structural rules live here. Ratio ranges and heater names are checked
//!   by the core when the stage table is built, because those failures are faults.
use serde::Deserialize;
use serde::de::Deserializer;
use std::collections::BTreeMap;

/// Default poll interval in seconds.
pub const DEFAULT_POLL_INTERVAL_S: f64 = 1.0;

/// Lower bound for `poll_interval`; faster polling floods the host reactor.
pub const MIN_POLL_INTERVAL_S: f64 = 0.01;

/// Upper bound for `poll_interval`; anything slower cannot track a heater.
pub const MAX_POLL_INTERVAL_S: f64 = 60.0;

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

/// One StageSync instance, keyed by its primary heater name.
#[derive(Debug, Deserialize, Clone)]
pub struct StageSyncCfg {
    /// Secondary heater names. Accepts `"a, b"` or `["a", "b"]`.
    #[serde(deserialize_with = "de_list")]
    pub stages: String,
    /// Per-stage multipliers. Accepts `"0.5, 1.2"` or `[0.5, 1.2]`.
    #[serde(deserialize_with = "de_list")]
    pub temp_ratio: String,
    /// Seconds between primary target polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: f64,
    #[serde(default)]
    pub verbosity: Verbosity,
    /// Register the STAGESYNC manual trigger command.
    #[serde(default = "default_true")]
    pub manual_trigger: bool,
}

fn default_poll_interval() -> f64 {
    DEFAULT_POLL_INTERVAL_S
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// A scheduled change of a simulated heater's target.
#[derive(Debug, Deserialize, Clone)]
pub struct TargetChange {
    /// Reactor time in seconds.
    pub at: f64,
    pub heater: String,
    /// `None` clears the target (heater reports no commanded target).
    #[serde(default)]
    pub target: Option<f64>,
}

/// Simulated host used by the CLI.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SimCfg {
    /// Heaters present in the simulated registry. Empty means every heater
    /// named by the StageSync sections.
    pub heaters: Vec<String>,
    pub target_changes: Vec<TargetChange>,
    /// Reject every dispatched script (exercises the fatal path).
    pub reject_dispatch: bool,
    /// Simulated run length in seconds.
    pub duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub stagesync: BTreeMap<String, StageSyncCfg>,
    #[serde(default)]
    pub sim: Option<SimCfg>,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListItem {
    Text(String),
    Number(f64),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListToml {
    Text(String),
    Items(Vec<ListItem>),
}

/// Normalize a list field to the comma-separated form the core parses.
fn de_list<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match ListToml::deserialize(deserializer)? {
        ListToml::Text(s) => Ok(s),
        ListToml::Items(items) => Ok(items
            .into_iter()
            .map(|item| match item {
                ListItem::Text(s) => s,
                ListItem::Number(n) => n.to_string(),
            })
            .collect::<Vec<_>>()
            .join(",")),
    }
}

/// Number of entries in a comma-separated list, as the core will split it.
pub fn list_len(s: &str) -> usize {
    s.split(',').count()
}

impl Config {
    /// Iterate instances as `(primary heater, config)` in name order.
    pub fn instances(&self) -> impl Iterator<Item = (&str, &StageSyncCfg)> {
        self.stagesync.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every heater name referenced by the StageSync sections, primaries first.
    pub fn referenced_heaters(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut push = |name: &str| {
            let name = name.trim();
            if !name.is_empty() && !out.iter().any(|n| n == name) {
                out.push(name.to_string());
            }
        };
        for primary in self.stagesync.keys() {
            push(primary);
        }
        for cfg in self.stagesync.values() {
            for stage in cfg.stages.split(',') {
                push(stage);
            }
        }
        out
    }

    pub fn validate(&self) -> eyre::Result<()> {
        if self.stagesync.is_empty() {
            eyre::bail!("at least one [stagesync.<heater>] section is required");
        }

        for (primary, cfg) in &self.stagesync {
            if primary.trim().is_empty() {
                eyre::bail!("stagesync section needs a primary heater name");
            }
            if cfg.stages.trim().is_empty() {
                eyre::bail!("stagesync.{primary}.stages must not be empty");
            }
            if cfg.temp_ratio.trim().is_empty() {
                eyre::bail!("stagesync.{primary}.temp_ratio must not be empty");
            }
            let (n_stages, n_ratios) = (list_len(&cfg.stages), list_len(&cfg.temp_ratio));
            if n_stages != n_ratios {
                eyre::bail!(
                    "stagesync.{primary}: stages and temp_ratio must have the same number of entries ({n_stages} vs {n_ratios})"
                );
            }
            if !(MIN_POLL_INTERVAL_S..=MAX_POLL_INTERVAL_S).contains(&cfg.poll_interval) {
                eyre::bail!(
                    "stagesync.{primary}.poll_interval must be in [{MIN_POLL_INTERVAL_S}, {MAX_POLL_INTERVAL_S}] seconds"
                );
            }
        }

        // Logging
        if let Some(level) = self.logging.level.as_deref()
            && !matches!(level, "error" | "warn" | "info" | "debug" | "trace")
        {
            eyre::bail!("logging.level must be one of error|warn|info|debug|trace");
        }
        if let Some(rotation) = self.logging.rotation.as_deref()
            && !matches!(rotation, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Simulation
        if let Some(sim) = &self.sim {
            if sim.heaters.iter().any(|h| h.trim().is_empty()) {
                eyre::bail!("sim.heaters entries must not be empty");
            }
            for change in &sim.target_changes {
                if !(change.at.is_finite() && change.at >= 0.0) {
                    eyre::bail!("sim.target_changes.at must be a finite time >= 0");
                }
                if change.heater.trim().is_empty() {
                    eyre::bail!("sim.target_changes.heater must not be empty");
                }
                if let Some(t) = change.target
                    && !t.is_finite()
                {
                    eyre::bail!("sim.target_changes.target must be finite");
                }
            }
            if let Some(d) = sim.duration
                && !(d.is_finite() && d > 0.0)
            {
                eyre::bail!("sim.duration must be > 0");
            }
        }

        Ok(())
    }
}
