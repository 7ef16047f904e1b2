#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Staged heater synchronization (host-agnostic).
//!
//! Keeps a set of secondary heaters ("stages") at fixed ratios of a primary
//! heater's commanded target. All host interaction goes through the traits in
//! `stagesync_traits`.
//!
//! ## Architecture
//!
//! - **Stage table**: validated `(heater, ratio)` list built at construction (`stage_table`)
//! - **Monitor**: primary resolution and periodic target polling (`monitor`)
//! - **Engine**: one batched `SET_HEATER_TEMPERATURE` script per sync (`engine`)
//! - **Faults**: single escalation path to host shutdown (`fault`)
//! - **Plugin**: lifecycle wiring plus the `STAGESYNC` manual trigger (`plugin`, `manual`)
//!
//! Targets are plain `f64` degrees; dispatched values are rendered with two decimals.

pub mod builder;
pub mod config;
pub mod conversions;
pub mod engine;
pub mod error;
pub mod fault;
pub mod host_error;
pub mod manual;
pub mod monitor;
pub mod plugin;
pub mod stage_table;
pub mod status;

pub use builder::{Missing, Set, StageSyncBuilder};
pub use config::{SyncCfg, Verbosity};
pub use engine::{SkipReason, SyncOutcome};
pub use error::{BuildError, ConfigError, HeaterRole, Result, SyncError};
pub use manual::ManualOutcome;
pub use monitor::{Observation, Phase};
pub use plugin::StageSync;
pub use stage_table::{StageMapping, StageTable};
pub use status::{StageStatus, StageSyncStatus};
