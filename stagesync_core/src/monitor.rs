//! Primary target monitor.
//!
//! `Constructed → Polling → Shutdown`. Connect resolves the primary heater and
//! registers the poll timer; every tick samples the primary's commanded target
//! and reports whether it changed since the last observation.

use stagesync_traits::{DeviceRegistry, HeaterRef, Scheduler, TimerHandle, Wake};

use crate::config::Verbosity;
use crate::error::{HeaterRole, SyncError};
use crate::host_error::map_sample_error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Built, waiting for the host connect signal.
    Constructed,
    /// Primary resolved and poll timer registered.
    Polling,
    /// A fault was escalated; nothing runs any more.
    Shutdown,
}

/// Primary heater handle and the last target seen on it.
#[derive(Default)]
pub struct SyncState {
    primary: Option<HeaterRef>,
    last_target: Option<f64>,
}

impl core::fmt::Debug for SyncState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SyncState")
            .field("primary", &self.primary.as_ref().map(|h| h.name().to_string()))
            .field("last_target", &self.last_target)
            .finish()
    }
}

impl SyncState {
    pub fn primary_resolved(&self) -> bool {
        self.primary.is_some()
    }

    pub fn primary(&self) -> Option<&HeaterRef> {
        self.primary.as_ref()
    }

    pub fn last_target(&self) -> Option<f64> {
        self.last_target
    }
}

/// Result of one poll tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// Primary reports no commanded target (or is not resolved).
    NoTarget,
    Unchanged(f64),
    Changed { previous: Option<f64>, target: f64 },
    /// Retryable; the tick is skipped.
    SampleFailed(SyncError),
}

#[allow(clippy::float_cmp)]
#[inline]
fn target_changed(previous: Option<f64>, target: f64) -> bool {
    previous != Some(target)
}

#[derive(Debug)]
pub struct TargetMonitor {
    primary_name: String,
    interval: f64,
    verbosity: Verbosity,
    phase: Phase,
    timer: Option<TimerHandle>,
    state: SyncState,
}

impl TargetMonitor {
    pub fn new(primary_name: &str, interval: f64, verbosity: Verbosity) -> Self {
        Self {
            primary_name: primary_name.to_string(),
            interval,
            verbosity,
            phase: Phase::Constructed,
            timer: None,
            state: SyncState::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn timer(&self) -> Option<TimerHandle> {
        self.timer
    }

    pub fn primary_name(&self) -> &str {
        &self.primary_name
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Resolve the primary heater and start polling immediately.
    pub fn connect(
        &mut self,
        registry: &dyn DeviceRegistry,
        scheduler: &mut dyn Scheduler,
    ) -> Result<TimerHandle, SyncError> {
        if let Some(timer) = self.timer {
            tracing::warn!(primary = %self.primary_name, "connect signalled twice; ignoring");
            return Ok(timer);
        }
        let heater = registry
            .lookup_heater(&self.primary_name)
            .ok_or_else(|| SyncError::Lookup {
                role: HeaterRole::Primary,
                name: self.primary_name.clone(),
            })?;
        self.state.primary = Some(heater);
        let timer = scheduler.register_timer(Wake::NOW);
        self.timer = Some(timer);
        self.phase = Phase::Polling;
        tracing::info!(primary = %self.primary_name, timer = timer.0, "connected to primary heater; polling started");
        Ok(timer)
    }

    /// Read the primary's current target without touching monitor state.
    pub fn sample_target(&self, eventtime: f64) -> Result<Option<f64>, SyncError> {
        let Some(primary) = self.state.primary.as_ref() else {
            return Ok(None);
        };
        primary
            .get_temp(eventtime)
            .map(|(_, target)| target)
            .map_err(|e| map_sample_error(&self.primary_name, &*e))
    }

    /// Sample the primary and record a target change.
    pub fn observe(&mut self, eventtime: f64) -> Observation {
        let target = match self.sample_target(eventtime) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(primary = %self.primary_name, error = %e, "sampling failed; retrying next tick");
                return Observation::SampleFailed(e);
            }
        };
        let Some(target) = target else {
            if self.verbosity.reports_ticks() {
                tracing::warn!(primary = %self.primary_name, "no target temperature; retrying");
            }
            return Observation::NoTarget;
        };
        if !target_changed(self.state.last_target, target) {
            if self.verbosity.reports_ticks() {
                tracing::debug!(target, "target unchanged; skipping sync");
            }
            return Observation::Unchanged(target);
        }
        let previous = self.state.last_target.replace(target);
        if self.verbosity.reports_syncs() {
            tracing::info!(previous = ?previous, target, "target change detected");
        }
        Observation::Changed { previous, target }
    }

    /// Wake time for the tick after `eventtime`.
    pub fn next_wake(&self, eventtime: f64) -> Wake {
        match self.phase {
            Phase::Polling => {
                let next = eventtime + self.interval;
                if self.verbosity.reports_ticks() {
                    tracing::debug!(next, "next check scheduled");
                }
                Wake::At(next)
            }
            Phase::Constructed | Phase::Shutdown => Wake::Never,
        }
    }

    /// Stop polling for good.
    pub fn shut_down(&mut self) {
        self.phase = Phase::Shutdown;
    }
}
