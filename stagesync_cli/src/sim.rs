//! Simulated host run: build instances from the config, drive them in
//! virtual time, print every dispatched batch.

use std::cell::RefCell;
use std::rc::Rc;

use eyre::WrapErr;
use serde_json::json;
use stagesync_config::{Config, TargetChange};
use stagesync_core::{StageSync, StageSyncStatus, SyncCfg};
use stagesync_host::{ReplyLog, ScriptRecorder, SimRegistry, SimShutdown, VirtualReactor};
use stagesync_traits::{CommandDispatch, HostResult, TimerCallback, TimerHandle, Wake};

use crate::error_fmt::CliError;

/// Simulated run length when neither `--duration` nor `sim.duration` is set.
pub const DEFAULT_DURATION_S: f64 = 10.0;

/// One dispatched script, stamped with reactor time.
#[derive(Debug, Clone)]
pub struct Batch {
    pub at: f64,
    pub primary: String,
    pub script: String,
}

/// Per-instance dispatch that stamps scripts before handing them to the recorder.
#[derive(Clone)]
struct TimedDispatch {
    primary: String,
    inner: ScriptRecorder,
    reactor: VirtualReactor,
    log: Rc<RefCell<Vec<Batch>>>,
}

impl CommandDispatch for TimedDispatch {
    fn run_script(&mut self, script: &str) -> HostResult<()> {
        self.inner.run_script(script)?;
        self.log.borrow_mut().push(Batch {
            at: self.reactor.now(),
            primary: self.primary.clone(),
            script: script.to_string(),
        });
        Ok(())
    }
}

pub struct SimHost {
    pub registry: SimRegistry,
    pub dispatch: ScriptRecorder,
    pub shutdown: SimShutdown,
    pub reactor: VirtualReactor,
    batches: Rc<RefCell<Vec<Batch>>>,
}

impl SimHost {
    /// Host with the heaters from `[sim] heaters`, or every referenced heater.
    pub fn from_config(cfg: &Config) -> Self {
        let names = match &cfg.sim {
            Some(sim) if !sim.heaters.is_empty() => sim.heaters.clone(),
            _ => cfg.referenced_heaters(),
        };
        let registry = SimRegistry::with_heaters(names.iter().map(String::as_str));
        let dispatch = ScriptRecorder::applying_to(registry.clone());
        if cfg.sim.as_ref().is_some_and(|s| s.reject_dispatch) {
            dispatch.reject_with("simulated host rejected the script");
        }
        Self {
            registry,
            dispatch,
            shutdown: SimShutdown::new(),
            reactor: VirtualReactor::new(),
            batches: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// One `StageSync` per `[stagesync.<heater>]` section, in name order.
    pub fn build_instances(&self, cfg: &Config) -> eyre::Result<Vec<StageSync>> {
        cfg.instances()
            .map(|(primary, section)| {
                let dispatch = TimedDispatch {
                    primary: primary.to_string(),
                    inner: self.dispatch.clone(),
                    reactor: self.reactor.clone(),
                    log: Rc::clone(&self.batches),
                };
                StageSync::builder(SyncCfg::from((primary, section)))
                    .with_registry(self.registry.clone())
                    .with_dispatch(dispatch)
                    .with_shutdown(self.shutdown.clone())
                    .with_scheduler(self.reactor.clone())
                    .with_clock(Rc::new(self.reactor.clone()))
                    .build()
                    .wrap_err_with(|| format!("stagesync.{primary}"))
            })
            .collect()
    }

    pub fn batches(&self) -> Vec<Batch> {
        self.batches.borrow().clone()
    }

    fn apply(&self, change: &TargetChange) -> eyre::Result<()> {
        let heater = self
            .registry
            .get(&change.heater)
            .ok_or_else(|| CliError::UnknownSimHeater(change.heater.clone()))?;
        tracing::info!(heater = %change.heater, target = ?change.target, at = change.at, "simulated target change");
        heater.set_target(change.target);
        Ok(())
    }
}

/// Routes reactor timers to the instance that registered them.
pub struct Fleet(pub Vec<StageSync>);

impl TimerCallback for Fleet {
    fn on_timer(&mut self, timer: TimerHandle, eventtime: f64) -> Wake {
        match self.0.iter_mut().find(|s| s.timer() == Some(timer)) {
            Some(instance) => instance.on_timer(timer, eventtime),
            None => Wake::Never,
        }
    }
}

enum Event<'a> {
    Change(&'a TargetChange),
    Trigger,
}

/// Prints batches, replies and status as text or JSON lines.
struct Printer {
    json: bool,
    printed: usize,
}

impl Printer {
    fn flush_batches(&mut self, host: &SimHost) {
        let batches = host.batches();
        for batch in batches.iter().skip(self.printed) {
            if self.json {
                let commands: Vec<&str> = batch.script.lines().collect();
                println!(
                    "{}",
                    json!({ "event": "batch", "at": batch.at, "primary": batch.primary, "commands": commands })
                );
            } else {
                for line in batch.script.lines() {
                    println!("t={:.3} {}: {line}", batch.at, batch.primary);
                }
            }
        }
        self.printed = batches.len();
    }

    fn replies(&self, at: f64, primary: &str, lines: &[String]) {
        for line in lines {
            if self.json {
                println!(
                    "{}",
                    json!({ "event": "reply", "at": at, "primary": primary, "message": line })
                );
            } else {
                println!("t={at:.3} {primary}: {line}");
            }
        }
    }

    fn status(&self, status: &StageSyncStatus) {
        print_status(status, self.json);
    }
}

fn fmt_target(t: Option<f64>) -> String {
    t.map_or_else(|| "none".to_string(), |t| format!("{t:.2}"))
}

fn phase_name(status: &StageSyncStatus) -> String {
    format!("{:?}", status.phase).to_ascii_lowercase()
}

pub fn print_status(status: &StageSyncStatus, json: bool) {
    if json {
        let stages: Vec<_> = status
            .stages
            .iter()
            .map(|s| json!({ "name": s.name, "ratio": s.ratio, "target": s.target }))
            .collect();
        println!(
            "{}",
            json!({
                "event": "status",
                "primary": status.primary,
                "phase": phase_name(status),
                "last_target": status.last_target,
                "stages": stages,
                "fault": status.fault,
            })
        );
        return;
    }
    println!(
        "{}: phase={} last_target={}",
        status.primary,
        phase_name(status),
        fmt_target(status.last_target)
    );
    for stage in &status.stages {
        println!(
            "  {} ratio={} target={}",
            stage.name,
            stage.ratio,
            fmt_target(stage.target)
        );
    }
    if let Some(fault) = &status.fault {
        println!("  fault: {fault}");
    }
}

/// `stagesync check`: build every instance against the simulated registry.
pub fn check(cfg: &Config, json: bool) -> eyre::Result<()> {
    let host = SimHost::from_config(cfg);
    for instance in host.build_instances(cfg)? {
        print_status(&instance.status(), json);
    }
    if !json {
        println!("config OK");
    }
    Ok(())
}

/// `stagesync simulate`.
///
/// Target changes take effect after any poll due at the same instant; manual
/// triggers run after target changes scheduled at the same time.
pub fn simulate(
    cfg: &Config,
    duration: Option<f64>,
    trigger_at: &[f64],
    json: bool,
) -> eyre::Result<()> {
    let end = duration
        .or_else(|| cfg.sim.as_ref().and_then(|s| s.duration))
        .unwrap_or(DEFAULT_DURATION_S);
    if !(end.is_finite() && end > 0.0) {
        return Err(CliError::InvalidConfig(format!("duration must be > 0, got {end}")).into());
    }

    let host = SimHost::from_config(cfg);
    let mut fleet = Fleet(host.build_instances(cfg)?);
    for instance in &mut fleet.0 {
        instance.handle_connect()?;
    }
    for instance in &mut fleet.0 {
        instance.handle_ready()?;
    }

    let mut events: Vec<(f64, Event<'_>)> = cfg
        .sim
        .iter()
        .flat_map(|s| s.target_changes.iter())
        .map(|c| (c.at, Event::Change(c)))
        .chain(trigger_at.iter().map(|&t| (t, Event::Trigger)))
        .filter(|(at, _)| *at <= end)
        .collect();
    events.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut out = Printer {
        json,
        printed: 0,
    };
    for (at, event) in events {
        host.reactor.run_until(&mut fleet, at);
        out.flush_batches(&host);
        if host.shutdown.count() > 0 {
            break;
        }
        match event {
            Event::Change(change) => host.apply(change)?,
            Event::Trigger => {
                for instance in &mut fleet.0 {
                    let mut replies = ReplyLog::new();
                    let outcome = instance.cmd_stagesync(&mut replies);
                    tracing::debug!(primary = instance.primary(), ?outcome, "manual trigger");
                    out.flush_batches(&host);
                    out.replies(at, instance.primary(), &replies.lines());
                }
            }
        }
    }
    if host.shutdown.count() == 0 {
        host.reactor.run_until(&mut fleet, end);
        out.flush_batches(&host);
    }

    for instance in &fleet.0 {
        out.status(&instance.status());
    }
    if let Some(msg) = host.shutdown.requested() {
        return Err(CliError::HostShutdown(msg).into());
    }
    Ok(())
}
