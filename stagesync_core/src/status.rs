//! Status snapshot of one StageSync instance.

use crate::monitor::Phase;

#[derive(Debug, Clone, PartialEq)]
pub struct StageStatus {
    pub name: String,
    pub ratio: f64,
    /// Target of the last batch the host accepted for this stage, if any.
    pub target: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageSyncStatus {
    pub primary: String,
    pub phase: Phase,
    /// Last primary target the monitor observed; may not have been applied yet.
    pub last_target: Option<f64>,
    pub stages: Vec<StageStatus>,
    /// Shutdown message once a fault was escalated.
    pub fault: Option<String>,
}
