//! Host collaborator contracts consumed by the StageSync core.
//!
//! The machine-control host owns heaters, command execution, the reactor and
//! process shutdown. The core only talks to them through these traits.

pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::rc::Rc;

/// Error type crossing the host boundary.
pub type HostResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// A heater exposed by the host's device registry.
pub trait Heater {
    /// Name the host knows this heater by (used in dispatched commands).
    fn name(&self) -> &str;

    /// Sample `(current, target)` at reactor time `eventtime`.
    /// `target` is `None` while the host has no commanded target.
    fn get_temp(&self, eventtime: f64) -> HostResult<(f64, Option<f64>)>;
}

/// Shared, non-owning-by-contract handle to a host heater.
///
/// The host is single threaded; heater lifetime belongs to the registry.
pub type HeaterRef = Rc<dyn Heater>;

pub trait DeviceRegistry {
    fn lookup_heater(&self, name: &str) -> Option<HeaterRef>;
}

/// Command execution channel. One call submits one (possibly multi-line) script.
pub trait CommandDispatch {
    fn run_script(&mut self, script: &str) -> HostResult<()>;
}

/// Process-wide shutdown request. Irrecoverable from the caller's point of view.
pub trait Shutdown {
    fn invoke_shutdown(&mut self, message: &str);
}

/// Synchronous reply channel of a user command.
pub trait Responder {
    fn respond_info(&mut self, message: &str);
}

/// When a timer callback wants to run next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wake {
    /// Reactor time in seconds.
    At(f64),
    /// Never run again; cancels the timer.
    Never,
}

impl Wake {
    /// Fire as soon as the reactor gets control.
    pub const NOW: Wake = Wake::At(0.0);
}

/// Opaque handle of a registered reactor timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(pub u64);

/// Cooperative reactor owned by the host.
pub trait Scheduler {
    fn register_timer(&mut self, waketime: Wake) -> TimerHandle;
}

/// Callback side of a reactor timer.
pub trait TimerCallback {
    fn on_timer(&mut self, timer: TimerHandle, eventtime: f64) -> Wake;
}
