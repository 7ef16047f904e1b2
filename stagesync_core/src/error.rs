use thiserror::Error;

/// Which configured heater a lookup was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterRole {
    Stage,
    Primary,
}

impl core::fmt::Display for HeaterRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HeaterRole::Stage => f.write_str("stage"),
            HeaterRole::Primary => f.write_str("primary heater"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("no stages configured")]
    NoStages,
    #[error("empty stage name at position {index}")]
    EmptyStageName { index: usize },
    #[error("stages and temp_ratio differ in length ({stages} stages, {ratios} ratios)")]
    LengthMismatch { stages: usize, ratios: usize },
    #[error("invalid ratio for '{stage}': '{literal}' is not a number")]
    UnparsableRatio { stage: String, literal: String },
    #[error("invalid ratio for '{stage}': {ratio} (allowed 0.0..=2.0)")]
    RatioOutOfRange { stage: String, ratio: f64 },
    #[error("poll interval must be a finite number of seconds >= 0.01, got {0}")]
    PollInterval(f64),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("unknown {role} '{name}'")]
    Lookup { role: HeaterRole, name: String },
    #[error("failed to dispatch batch for stages [{stages}] at target {target:.2}: {reason}")]
    Dispatch {
        stages: String,
        target: f64,
        reason: String,
    },
    #[error("sampling '{heater}' failed: {reason}")]
    TransientSample { heater: String, reason: String },
}

impl SyncError {
    /// Fatal errors go through the fault escalator; the rest skip one tick.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SyncError::TransientSample { .. })
    }
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing device registry")]
    MissingRegistry,
    #[error("missing command dispatch")]
    MissingDispatch,
    #[error("missing shutdown handle")]
    MissingShutdown,
    #[error("missing scheduler")]
    MissingScheduler,
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_sample_errors_are_retryable() {
        let transient = SyncError::TransientSample {
            heater: "extruder".into(),
            reason: "timeout".into(),
        };
        assert!(!transient.is_fatal());
        assert!(SyncError::from(ConfigError::NoStages).is_fatal());
        assert!(
            SyncError::Lookup {
                role: HeaterRole::Stage,
                name: "x".into()
            }
            .is_fatal()
        );
    }

    #[test]
    fn messages_name_the_offending_entry() {
        let e = SyncError::from(ConfigError::RatioOutOfRange {
            stage: "right".into(),
            ratio: 2.5,
        });
        assert_eq!(
            e.to_string(),
            "configuration error: invalid ratio for 'right': 2.5 (allowed 0.0..=2.0)"
        );
        let e = SyncError::Lookup {
            role: HeaterRole::Primary,
            name: "extruder".into(),
        };
        assert_eq!(e.to_string(), "unknown primary heater 'extruder'");
    }
}
