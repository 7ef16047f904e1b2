//! The StageSync plugin instance.
//!
//! Wires the monitor, sync engine and fault escalator to the host lifecycle:
//! `handle_connect` → `handle_ready` → repeated `check_event` ticks.

use std::rc::Rc;

use stagesync_traits::{Clock, DeviceRegistry, Scheduler, TimerCallback, TimerHandle, Wake};

use crate::config::SyncCfg;
use crate::engine::{SkipReason, SyncEngine, SyncOutcome};
use crate::error::{Report, Result, SyncError};
use crate::fault::FaultEscalator;
use crate::monitor::{Observation, Phase, TargetMonitor};
use crate::stage_table::StageTable;
use crate::status::{StageStatus, StageSyncStatus};

pub struct StageSync {
    pub(crate) cfg: SyncCfg,
    pub(crate) monitor: TargetMonitor,
    pub(crate) engine: SyncEngine,
    pub(crate) faults: FaultEscalator,
    pub(crate) registry: Box<dyn DeviceRegistry>,
    pub(crate) scheduler: Box<dyn Scheduler>,
    pub(crate) clock: Rc<dyn Clock>,
}

impl core::fmt::Debug for StageSync {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StageSync")
            .field("primary", &self.cfg.primary)
            .field("phase", &self.monitor.phase())
            .field("last_target", &self.monitor.state().last_target())
            .field("stages", &self.engine.table().names())
            .finish()
    }
}

impl StageSync {
    pub fn primary(&self) -> &str {
        &self.cfg.primary
    }

    pub fn phase(&self) -> Phase {
        self.monitor.phase()
    }

    /// Last primary target the monitor acted on.
    pub fn last_target(&self) -> Option<f64> {
        self.monitor.state().last_target()
    }

    pub fn stage_table(&self) -> &StageTable {
        self.engine.table()
    }

    /// Poll timer registered on connect.
    pub fn timer(&self) -> Option<TimerHandle> {
        self.monitor.timer()
    }

    pub fn is_faulted(&self) -> bool {
        self.faults.is_faulted()
    }

    pub fn fault_message(&self) -> Option<&str> {
        self.faults.message()
    }

    /// Host "connect" signal: resolve the primary heater and start polling.
    pub fn handle_connect(&mut self) -> Result<()> {
        if self.faults.is_faulted() {
            return Ok(());
        }
        match self
            .monitor
            .connect(self.registry.as_ref(), self.scheduler.as_mut())
        {
            Ok(_) => Ok(()),
            Err(e) => Err(self.escalate(e)),
        }
    }

    /// Host "ready" signal: force a synchronization with whatever target is known.
    pub fn handle_ready(&mut self) -> Result<SyncOutcome> {
        tracing::info!(primary = %self.cfg.primary, "system ready; initial synchronization");
        let target = self.monitor.state().last_target();
        self.synchronize(target).map_err(Report::new)
    }

    /// One poll tick at reactor time `eventtime`; returns when to run next.
    pub fn check_event(&mut self, eventtime: f64) -> Wake {
        match self.monitor.phase() {
            Phase::Polling => {}
            Phase::Constructed => {
                tracing::warn!(primary = %self.cfg.primary, "poll tick before connect; cancelling timer");
                return Wake::Never;
            }
            Phase::Shutdown => return Wake::Never,
        }
        if let Observation::Changed { target, .. } = self.monitor.observe(eventtime) {
            // Dispatch failures are escalated inside; the tick never retries them.
            let _ = self.synchronize(Some(target));
        }
        self.monitor.next_wake(eventtime)
    }

    /// Run the sync engine, escalating fatal errors.
    pub(crate) fn synchronize(
        &mut self,
        target: Option<f64>,
    ) -> core::result::Result<SyncOutcome, SyncError> {
        if self.faults.is_faulted() {
            return Ok(SyncOutcome::Skipped(SkipReason::Faulted));
        }
        match self.engine.sync(self.monitor.state(), target) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                if e.is_fatal() {
                    self.faults.escalate(&e);
                    self.monitor.shut_down();
                }
                Err(e)
            }
        }
    }

    fn escalate(&mut self, e: SyncError) -> Report {
        self.faults.escalate(&e);
        self.monitor.shut_down();
        Report::new(e)
    }

    /// Snapshot for host status queries.
    pub fn status(&self) -> StageSyncStatus {
        let dispatched = self.engine.last_dispatched();
        StageSyncStatus {
            primary: self.cfg.primary.clone(),
            phase: self.phase(),
            last_target: self.last_target(),
            stages: self
                .engine
                .table()
                .iter()
                .map(|s| StageStatus {
                    name: s.name().to_string(),
                    ratio: s.ratio(),
                    target: dispatched.map(|t| s.adjusted(t)),
                })
                .collect(),
            fault: self.fault_message().map(str::to_string),
        }
    }

    /// Reactor time now, as seen by this instance.
    pub(crate) fn now(&self) -> f64 {
        self.clock.monotonic()
    }
}

impl TimerCallback for StageSync {
    fn on_timer(&mut self, timer: TimerHandle, eventtime: f64) -> Wake {
        if self.monitor.timer() != Some(timer) {
            tracing::warn!(timer = timer.0, "unknown timer for this instance; cancelling");
            return Wake::Never;
        }
        self.check_event(eventtime)
    }
}
