//! Simulated machine-control host.
//!
//! Stands in for the real host's heaters, command interpreter, reactor and
//! shutdown path so the StageSync core can run (and be tested) off-machine.
//! Every handle is cheap to clone and clones share state, so a driver can keep
//! one copy while the plugin owns another.

pub mod error;
pub mod reactor;

pub use error::HostError;
pub use reactor::VirtualReactor;

use stagesync_traits::{
    CommandDispatch, DeviceRegistry, Heater, HeaterRef, HostResult, Responder, Shutdown,
};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Command name the host interprets for heater targets.
pub const SET_HEATER_TEMPERATURE: &str = "SET_HEATER_TEMPERATURE";

/// Simulated heater
#[derive(Debug, Clone)]
pub struct SimHeater {
    name: Rc<str>,
    current: Rc<Cell<f64>>,
    target: Rc<Cell<Option<f64>>>,
    failing_reads: Rc<Cell<u32>>,
    reads: Rc<Cell<u32>>,
}

impl SimHeater {
    pub fn new(name: &str) -> Self {
        SimHeater {
            name: Rc::from(name),
            current: Rc::new(Cell::new(25.0)),
            target: Rc::new(Cell::new(None)),
            failing_reads: Rc::new(Cell::new(0)),
            reads: Rc::new(Cell::new(0)),
        }
    }

    pub fn set_target(&self, target: Option<f64>) {
        self.target.set(target);
    }

    pub fn target(&self) -> Option<f64> {
        self.target.get()
    }

    pub fn set_current(&self, temp: f64) {
        self.current.set(temp);
    }

    /// Make the next `n` samples fail with a sensor error.
    pub fn fail_next_reads(&self, n: u32) {
        self.failing_reads.set(n);
    }

    /// Number of `get_temp` calls seen so far.
    pub fn reads(&self) -> u32 {
        self.reads.get()
    }
}

impl Heater for SimHeater {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_temp(&self, _eventtime: f64) -> HostResult<(f64, Option<f64>)> {
        self.reads.set(self.reads.get().saturating_add(1));
        let failing = self.failing_reads.get();
        if failing > 0 {
            self.failing_reads.set(failing - 1);
            tracing::warn!(heater = %self.name, "simulated sensor failure");
            return Err(Box::new(HostError::SensorUnavailable(self.name.to_string())));
        }
        Ok((self.current.get(), self.target.get()))
    }
}

/// Simulated device registry.
#[derive(Debug, Clone, Default)]
pub struct SimRegistry {
    heaters: BTreeMap<String, SimHeater>,
}

impl SimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_heaters<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut reg = Self::new();
        for name in names {
            reg.insert(SimHeater::new(name));
        }
        reg
    }

    pub fn insert(&mut self, heater: SimHeater) {
        self.heaters.insert(heater.name().to_string(), heater);
    }

    pub fn get(&self, name: &str) -> Option<&SimHeater> {
        self.heaters.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.heaters.keys().map(String::as_str)
    }
}

impl DeviceRegistry for SimRegistry {
    fn lookup_heater(&self, name: &str) -> Option<HeaterRef> {
        self.heaters
            .get(name)
            .map(|h| Rc::new(h.clone()) as HeaterRef)
    }
}

/// Parse one `SET_HEATER_TEMPERATURE HEATER="x" TARGET="y"` line.
pub fn parse_set_heater_temperature(line_no: usize, line: &str) -> error::Result<(String, f64)> {
    let malformed = || HostError::Malformed {
        line: line_no,
        text: line.to_string(),
    };
    let mut words = line.split_whitespace();
    if words.next() != Some(SET_HEATER_TEMPERATURE) {
        return Err(malformed());
    }
    let mut heater = None;
    let mut target = None;
    for param in words {
        let (key, value) = param.split_once('=').ok_or_else(malformed)?;
        let value = value.trim_matches('"');
        match key.to_ascii_uppercase().as_str() {
            "HEATER" => heater = Some(value.to_string()),
            "TARGET" => target = Some(value.parse::<f64>().map_err(|_| malformed())?),
            _ => return Err(malformed()),
        }
    }
    match (heater, target) {
        (Some(h), Some(t)) => Ok((h, t)),
        _ => Err(malformed()),
    }
}

/// Command interpreter stand-in that records every submitted script.
///
/// When built with [`ScriptRecorder::applying_to`], heater targets are applied
/// to the registry. A script is checked as a whole before any line takes effect.
#[derive(Debug, Clone, Default)]
pub struct ScriptRecorder {
    scripts: Rc<RefCell<Vec<String>>>,
    reject: Rc<RefCell<Option<String>>>,
    registry: Option<SimRegistry>,
}

impl ScriptRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applying_to(registry: SimRegistry) -> Self {
        Self {
            registry: Some(registry),
            ..Self::default()
        }
    }

    /// Reject every following script with `reason`.
    pub fn reject_with(&self, reason: &str) {
        *self.reject.borrow_mut() = Some(reason.to_string());
    }

    pub fn accept(&self) {
        *self.reject.borrow_mut() = None;
    }

    pub fn scripts(&self) -> Vec<String> {
        self.scripts.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.scripts.borrow().len()
    }

    pub fn last(&self) -> Option<String> {
        self.scripts.borrow().last().cloned()
    }

    fn apply(&self, registry: &SimRegistry, script: &str) -> error::Result<()> {
        let mut updates = Vec::new();
        for (idx, line) in script.lines().enumerate() {
            let (name, target) = parse_set_heater_temperature(idx + 1, line)?;
            let heater = registry
                .get(&name)
                .ok_or_else(|| HostError::UnknownHeater(name.clone()))?;
            updates.push((heater, target));
        }
        for (heater, target) in updates {
            heater.set_target(Some(target));
        }
        Ok(())
    }
}

impl CommandDispatch for ScriptRecorder {
    fn run_script(&mut self, script: &str) -> HostResult<()> {
        if let Some(reason) = self.reject.borrow().clone() {
            return Err(Box::new(HostError::Rejected(reason)));
        }
        if let Some(registry) = &self.registry {
            self.apply(registry, script)?;
        }
        tracing::debug!(lines = script.lines().count(), "script executed");
        self.scripts.borrow_mut().push(script.to_string());
        Ok(())
    }
}

/// Records shutdown requests instead of terminating the process.
#[derive(Debug, Clone, Default)]
pub struct SimShutdown {
    messages: Rc<RefCell<Vec<String>>>,
}

impl SimShutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// First shutdown message, if any was requested.
    pub fn requested(&self) -> Option<String> {
        self.messages.borrow().first().cloned()
    }

    pub fn count(&self) -> usize {
        self.messages.borrow().len()
    }
}

impl Shutdown for SimShutdown {
    fn invoke_shutdown(&mut self, message: &str) {
        tracing::error!(message, "host shutdown requested");
        self.messages.borrow_mut().push(message.to_string());
    }
}

/// Collects command replies.
#[derive(Debug, Clone, Default)]
pub struct ReplyLog {
    lines: Rc<RefCell<Vec<String>>>,
}

impl ReplyLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl Responder for ReplyLog {
    fn respond_info(&mut self, message: &str) {
        self.lines.borrow_mut().push(message.to_string());
    }
}
