//! STAGESYNC: manual trigger command.

use stagesync_traits::Responder;

use crate::engine::{SkipReason, SyncOutcome};
use crate::plugin::StageSync;

/// Command name registered with the host.
pub const COMMAND: &str = "STAGESYNC";
pub const COMMAND_HELP: &str = "Force immediate StageSync update";

#[derive(Debug, Clone, PartialEq)]
pub enum ManualOutcome {
    Completed(SyncOutcome),
    /// Primary heater not resolved yet; nothing was done.
    PrimaryUnresolved,
    /// Disabled by configuration.
    Disabled,
    Failed(String),
}

impl StageSync {
    pub fn manual_trigger_enabled(&self) -> bool {
        self.cfg.manual_trigger
    }

    /// Force an immediate update of all stages.
    ///
    /// Uses the last observed target, or samples the primary when none is known
    /// yet (the sample does not count as an observation). Replies go to
    /// `responder`; a dispatch failure still shuts the host down.
    pub fn cmd_stagesync(&mut self, responder: &mut dyn Responder) -> ManualOutcome {
        if !self.cfg.manual_trigger {
            responder.respond_info("stagesync: manual trigger disabled");
            return ManualOutcome::Disabled;
        }
        responder.respond_info("stagesync: manual trigger...");

        if let Some(msg) = self.faults.message() {
            let msg = msg.to_string();
            responder.respond_info(&format!("stagesync: error: {msg}"));
            return ManualOutcome::Failed(msg);
        }

        let target = match self.monitor.state().last_target() {
            Some(t) => Some(t),
            None if !self.monitor.state().primary_resolved() => {
                responder.respond_info(&format!(
                    "stagesync: primary heater '{}' not connected yet",
                    self.cfg.primary
                ));
                return ManualOutcome::PrimaryUnresolved;
            }
            None => match self.monitor.sample_target(self.now()) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(error = %e, "manual trigger could not sample primary");
                    responder.respond_info(&format!("stagesync: error: {e}"));
                    return ManualOutcome::Failed(e.to_string());
                }
            },
        };

        match self.synchronize(target) {
            Ok(outcome) => {
                if outcome == SyncOutcome::Skipped(SkipReason::NoTarget) {
                    responder.respond_info("stagesync: update completed (no target set)");
                } else {
                    responder.respond_info("stagesync: update completed");
                }
                ManualOutcome::Completed(outcome)
            }
            Err(e) => {
                responder.respond_info(&format!("stagesync: error: {e}"));
                ManualOutcome::Failed(e.to_string())
            }
        }
    }
}
