//! Type-state builder for `StageSync`.
//!
//! The builder enforces at compile time that the device registry, command
//! dispatch and shutdown handle are provided before `build()` is available.
//! `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;
use std::rc::Rc;

use stagesync_traits::{Clock, CommandDispatch, DeviceRegistry, MonotonicClock, Scheduler, Shutdown};

use crate::config::{MIN_POLL_INTERVAL_S, SyncCfg};
use crate::engine::SyncEngine;
use crate::error::{BuildError, ConfigError, Report, Result, SyncError};
use crate::fault::FaultEscalator;
use crate::monitor::TargetMonitor;
use crate::plugin::StageSync;
use crate::stage_table::StageTable;

impl StageSync {
    /// Start building an instance for the given configuration.
    pub fn builder(cfg: SyncCfg) -> StageSyncBuilder<Missing, Missing, Missing> {
        StageSyncBuilder::new(cfg)
    }
}

pub struct Missing;
pub struct Set;

/// Builder for `StageSync`. The stage table is validated on `build()`.
pub struct StageSyncBuilder<R, D, S> {
    cfg: SyncCfg,
    registry: Option<Box<dyn DeviceRegistry>>,
    dispatch: Option<Box<dyn CommandDispatch>>,
    shutdown: Option<Box<dyn Shutdown>>,
    scheduler: Option<Box<dyn Scheduler>>,
    clock: Option<Rc<dyn Clock>>,
    _r: PhantomData<R>,
    _d: PhantomData<D>,
    _s: PhantomData<S>,
}

impl StageSyncBuilder<Missing, Missing, Missing> {
    pub fn new(cfg: SyncCfg) -> Self {
        Self {
            cfg,
            registry: None,
            dispatch: None,
            shutdown: None,
            scheduler: None,
            clock: None,
            _r: PhantomData,
            _d: PhantomData,
            _s: PhantomData,
        }
    }
}

fn check_poll_interval(secs: f64) -> core::result::Result<(), SyncError> {
    if secs.is_finite() && secs >= MIN_POLL_INTERVAL_S {
        Ok(())
    } else {
        Err(ConfigError::PollInterval(secs).into())
    }
}

/// Validate the configuration and assemble the instance.
///
/// Any configuration or stage lookup error is escalated to the host before it
/// is returned; nothing is registered with the scheduler here.
fn validate_and_build(
    cfg: SyncCfg,
    registry: Box<dyn DeviceRegistry>,
    dispatch: Box<dyn CommandDispatch>,
    shutdown: Box<dyn Shutdown>,
    scheduler: Box<dyn Scheduler>,
    clock: Rc<dyn Clock>,
) -> Result<StageSync> {
    let mut faults = FaultEscalator::new(shutdown);
    let table = check_poll_interval(cfg.poll_interval_s)
        .and_then(|()| StageTable::build(&cfg.stages, &cfg.temp_ratio, registry.as_ref()));
    let table = match table {
        Ok(table) => table,
        Err(e) => {
            faults.escalate(&e);
            return Err(Report::new(e));
        }
    };

    tracing::info!(
        primary = %cfg.primary,
        stages = %table.names(),
        poll_interval_s = cfg.poll_interval_s,
        manual_trigger = cfg.manual_trigger,
        "stagesync instance configured"
    );

    Ok(StageSync {
        monitor: TargetMonitor::new(&cfg.primary, cfg.poll_interval_s, cfg.verbosity),
        engine: SyncEngine::new(table, dispatch, cfg.verbosity),
        faults,
        registry,
        scheduler,
        clock,
        cfg,
    })
}

impl<R, D, S> StageSyncBuilder<R, D, S> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<StageSync> {
        let registry = self
            .registry
            .ok_or_else(|| Report::new(BuildError::MissingRegistry))?;
        let dispatch = self
            .dispatch
            .ok_or_else(|| Report::new(BuildError::MissingDispatch))?;
        let shutdown = self
            .shutdown
            .ok_or_else(|| Report::new(BuildError::MissingShutdown))?;
        let scheduler = self
            .scheduler
            .ok_or_else(|| Report::new(BuildError::MissingScheduler))?;
        let clock = self
            .clock
            .unwrap_or_else(|| Rc::new(MonotonicClock::new()));

        validate_and_build(self.cfg, registry, dispatch, shutdown, scheduler, clock)
    }
}

/// Chainable setters that do not affect type-state.
impl<R, D, S> StageSyncBuilder<R, D, S> {
    pub fn with_scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
        self.scheduler = Some(Box::new(scheduler));
        self
    }

    /// Inject a clock for manual-trigger sampling (default: `MonotonicClock`).
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }
}

// Setters that advance type-state
impl<D, S> StageSyncBuilder<Missing, D, S> {
    pub fn with_registry(
        self,
        registry: impl DeviceRegistry + 'static,
    ) -> StageSyncBuilder<Set, D, S> {
        StageSyncBuilder {
            cfg: self.cfg,
            registry: Some(Box::new(registry)),
            dispatch: self.dispatch,
            shutdown: self.shutdown,
            scheduler: self.scheduler,
            clock: self.clock,
            _r: PhantomData,
            _d: PhantomData,
            _s: PhantomData,
        }
    }
}

impl<R, S> StageSyncBuilder<R, Missing, S> {
    pub fn with_dispatch(
        self,
        dispatch: impl CommandDispatch + 'static,
    ) -> StageSyncBuilder<R, Set, S> {
        StageSyncBuilder {
            cfg: self.cfg,
            registry: self.registry,
            dispatch: Some(Box::new(dispatch)),
            shutdown: self.shutdown,
            scheduler: self.scheduler,
            clock: self.clock,
            _r: PhantomData,
            _d: PhantomData,
            _s: PhantomData,
        }
    }
}

impl<R, D> StageSyncBuilder<R, D, Missing> {
    pub fn with_shutdown(self, shutdown: impl Shutdown + 'static) -> StageSyncBuilder<R, D, Set> {
        StageSyncBuilder {
            cfg: self.cfg,
            registry: self.registry,
            dispatch: self.dispatch,
            shutdown: Some(Box::new(shutdown)),
            scheduler: self.scheduler,
            clock: self.clock,
            _r: PhantomData,
            _d: PhantomData,
            _s: PhantomData,
        }
    }
}

impl StageSyncBuilder<Set, Set, Set> {
    /// Validate and build. Only available once registry, dispatch and shutdown are set.
    pub fn build(self) -> Result<StageSync> {
        self.try_build()
    }
}
