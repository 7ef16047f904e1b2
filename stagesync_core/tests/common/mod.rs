#![allow(dead_code)]

use std::rc::Rc;

use stagesync_core::{Result, StageSync, SyncCfg};
use stagesync_host::{ScriptRecorder, SimHeater, SimRegistry, SimShutdown, VirtualReactor};

/// Simulated host around one instance. All handles share state with the
/// copies moved into the instance.
pub struct Rig {
    pub registry: SimRegistry,
    pub dispatch: ScriptRecorder,
    pub shutdown: SimShutdown,
    pub reactor: VirtualReactor,
}

impl Rig {
    pub fn new(heaters: &[&str]) -> Self {
        let registry = SimRegistry::with_heaters(heaters.iter().copied());
        Self {
            dispatch: ScriptRecorder::applying_to(registry.clone()),
            registry,
            shutdown: SimShutdown::new(),
            reactor: VirtualReactor::new(),
        }
    }

    /// Primary `extruder` with stages `left` and `right`.
    pub fn dual() -> Self {
        Self::new(&["extruder", "left", "right"])
    }

    pub fn build(&self, cfg: SyncCfg) -> Result<StageSync> {
        StageSync::builder(cfg)
            .with_registry(self.registry.clone())
            .with_dispatch(self.dispatch.clone())
            .with_shutdown(self.shutdown.clone())
            .with_scheduler(self.reactor.clone())
            .with_clock(Rc::new(self.reactor.clone()))
            .build()
    }

    /// Built and connected instance.
    pub fn connected(&self, cfg: SyncCfg) -> StageSync {
        let mut sync = self.build(cfg).expect("build");
        sync.handle_connect().expect("connect");
        sync
    }

    pub fn heater(&self, name: &str) -> &SimHeater {
        self.registry.get(name).expect("heater registered")
    }
}

pub fn dual_cfg() -> SyncCfg {
    SyncCfg::new("extruder", "left, right", "0.5, 1.2")
}

pub fn command(heater: &str, target: &str) -> String {
    format!("SET_HEATER_TEMPERATURE HEATER=\"{heater}\" TARGET=\"{target}\"")
}
