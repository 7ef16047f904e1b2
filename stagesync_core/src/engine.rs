//! Sync engine: turns one primary target into one batched command script.

use stagesync_traits::CommandDispatch;

use crate::config::Verbosity;
use crate::error::SyncError;
use crate::host_error::map_dispatch_error;
use crate::monitor::SyncState;
use crate::stage_table::StageTable;

/// Host command that sets a heater target.
pub const SET_HEATER_TEMPERATURE: &str = "SET_HEATER_TEMPERATURE";

/// One stage command, target rendered with two decimals.
pub fn format_command(heater: &str, adjusted: f64) -> String {
    format!("{SET_HEATER_TEMPERATURE} HEATER=\"{heater}\" TARGET=\"{adjusted:.2}\"")
}

/// All stage commands for `target`, in table order, newline separated.
pub fn build_script(table: &StageTable, target: f64) -> String {
    table
        .iter()
        .map(|stage| format_command(stage.name(), stage.adjusted(target)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Why a synchronization request sent nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Primary heater not resolved yet (before connect).
    PrimaryUnresolved,
    /// No target known or reported.
    NoTarget,
    /// The instance already escalated a fault.
    Faulted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Skipped(SkipReason),
    Dispatched { target: f64, commands: usize },
}

pub struct SyncEngine {
    table: StageTable,
    dispatch: Box<dyn CommandDispatch>,
    verbosity: Verbosity,
    /// Primary target of the last batch the host accepted.
    last_dispatched: Option<f64>,
}

impl core::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("table", &self.table)
            .field("verbosity", &self.verbosity)
            .field("last_dispatched", &self.last_dispatched)
            .finish()
    }
}

impl SyncEngine {
    pub fn new(table: StageTable, dispatch: Box<dyn CommandDispatch>, verbosity: Verbosity) -> Self {
        Self {
            table,
            dispatch,
            verbosity,
            last_dispatched: None,
        }
    }

    #[inline]
    pub fn last_dispatched(&self) -> Option<f64> {
        self.last_dispatched
    }

    pub fn table(&self) -> &StageTable {
        &self.table
    }

    /// Push `target` to every stage as a single dispatch.
    ///
    /// Missing primary or target is a normal startup state and yields
    /// `Skipped`. A rejected dispatch is returned as a fatal `SyncError::Dispatch`
    /// and is never retried here.
    pub fn sync(&mut self, state: &SyncState, target: Option<f64>) -> Result<SyncOutcome, SyncError> {
        if !state.primary_resolved() {
            return Ok(SyncOutcome::Skipped(SkipReason::PrimaryUnresolved));
        }
        let Some(target) = target else {
            return Ok(SyncOutcome::Skipped(SkipReason::NoTarget));
        };

        if self.verbosity.reports_syncs() {
            tracing::info!(target, stages = self.table.len(), "synchronizing stages");
        }
        let script = build_script(&self.table, target);
        self.dispatch
            .run_script(&script)
            .map_err(|e| map_dispatch_error(self.table.names(), target, &*e))?;
        self.last_dispatched = Some(target);

        if self.verbosity.reports_ticks() {
            for line in script.lines() {
                tracing::debug!(command = line, "sent");
            }
        }
        Ok(SyncOutcome::Dispatched {
            target,
            commands: self.table.len(),
        })
    }
}
