//! Runtime configuration of one StageSync instance.
//!
//! Separate from the TOML-deserialized config in `stagesync_config`; see
//! `conversions` for the mapping.

/// Default seconds between primary target polls.
pub const DEFAULT_POLL_INTERVAL_S: f64 = 1.0;

/// Shortest accepted poll interval in seconds.
pub const MIN_POLL_INTERVAL_S: f64 = 0.01;

/// How much the instance logs during normal operation.
/// Faults and lifecycle transitions are always logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Lifecycle and faults only.
    Quiet,
    /// Plus one record per synchronization.
    #[default]
    Normal,
    /// Plus per-tick decisions and every command sent.
    Verbose,
}

impl Verbosity {
    #[inline]
    pub fn reports_syncs(self) -> bool {
        self >= Verbosity::Normal
    }

    #[inline]
    pub fn reports_ticks(self) -> bool {
        self >= Verbosity::Verbose
    }
}

#[derive(Debug, Clone)]
pub struct SyncCfg {
    /// Primary heater name, resolved on connect.
    pub primary: String,
    /// Comma-separated secondary heater names.
    pub stages: String,
    /// Comma-separated ratios, parallel to `stages`.
    pub temp_ratio: String,
    /// Seconds between polls.
    pub poll_interval_s: f64,
    pub verbosity: Verbosity,
    /// Whether the STAGESYNC command is offered.
    pub manual_trigger: bool,
}

impl SyncCfg {
    pub fn new(primary: &str, stages: &str, temp_ratio: &str) -> Self {
        Self {
            primary: primary.trim().to_string(),
            stages: stages.to_string(),
            temp_ratio: temp_ratio.to_string(),
            poll_interval_s: DEFAULT_POLL_INTERVAL_S,
            verbosity: Verbosity::default(),
            manual_trigger: true,
        }
    }

    pub fn with_poll_interval(mut self, secs: f64) -> Self {
        self.poll_interval_s = secs;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_manual_trigger(mut self, enabled: bool) -> Self {
        self.manual_trigger = enabled;
        self
    }
}
