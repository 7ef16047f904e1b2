//! Virtual-time reactor.
//!
//! Timers fire in wake-time order (ties by registration order). Time only moves
//! when the driver runs the reactor, so tests are fully deterministic.

use stagesync_traits::{Clock, Scheduler, TimerCallback, TimerHandle, Wake};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug, Default)]
struct ReactorState {
    now: f64,
    next_handle: u64,
    timers: BTreeMap<TimerHandle, f64>,
}

#[derive(Debug, Clone, Default)]
pub struct VirtualReactor {
    inner: Rc<RefCell<ReactorState>>,
}

impl VirtualReactor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> f64 {
        self.inner.borrow().now
    }

    /// Number of timers still scheduled.
    pub fn pending(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    /// Next wake time of `timer`, `None` once it was cancelled.
    pub fn waketime(&self, timer: TimerHandle) -> Option<f64> {
        self.inner.borrow().timers.get(&timer).copied()
    }

    fn earliest_due(&self, end: f64) -> Option<(TimerHandle, f64)> {
        let st = self.inner.borrow();
        st.timers
            .iter()
            .filter(|(_, w)| **w <= end)
            .min_by(|a, b| a.1.total_cmp(b.1).then(a.0.cmp(b.0)))
            .map(|(h, w)| (*h, *w))
    }

    /// Fire every timer due up to and including `end`, then park the clock at `end`.
    /// Returns the number of callbacks invoked.
    pub fn run_until(&self, callback: &mut dyn TimerCallback, end: f64) -> usize {
        let mut fired = 0;
        while let Some((timer, waketime)) = self.earliest_due(end) {
            let eventtime = {
                let mut st = self.inner.borrow_mut();
                st.now = st.now.max(waketime);
                st.now
            };
            // The callback may touch the reactor, so no borrow is held here.
            let next = callback.on_timer(timer, eventtime);
            fired += 1;
            let mut st = self.inner.borrow_mut();
            match next {
                Wake::At(t) => {
                    st.timers.insert(timer, t.max(eventtime));
                }
                Wake::Never => {
                    st.timers.remove(&timer);
                    tracing::debug!(timer = timer.0, "timer cancelled");
                }
            }
        }
        let mut st = self.inner.borrow_mut();
        st.now = st.now.max(end);
        fired
    }
}

impl Scheduler for VirtualReactor {
    fn register_timer(&mut self, waketime: Wake) -> TimerHandle {
        let mut st = self.inner.borrow_mut();
        let handle = TimerHandle(st.next_handle);
        st.next_handle += 1;
        if let Wake::At(t) = waketime {
            let now = st.now;
            st.timers.insert(handle, t.max(now));
        }
        handle
    }
}

impl Clock for VirtualReactor {
    fn monotonic(&self) -> f64 {
        self.now()
    }
}
