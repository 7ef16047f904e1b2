use std::time::Instant;

/// Reactor clock abstraction: seconds since an arbitrary, fixed origin.
pub trait Clock {
    fn monotonic(&self) -> f64;
}

/// Default real-time clock backed by std::time::Instant.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn monotonic(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_clock {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    /// Deterministic test clock whose time can be advanced manually.
    ///
    /// Clones share the same time source.
    #[derive(Debug, Clone, Default)]
    pub struct TestClock {
        now: Rc<Cell<f64>>,
    }

    impl TestClock {
        pub fn new() -> Self {
            Self::default()
        }

        /// Advance the clock by the given duration.
        pub fn advance(&self, d: Duration) {
            self.now.set(self.now.get() + d.as_secs_f64());
        }

        /// Set the absolute time in seconds.
        pub fn set(&self, secs: f64) {
            self.now.set(secs);
        }
    }

    impl Clock for TestClock {
        fn monotonic(&self) -> f64 {
            self.now.get()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_clock::TestClock;
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_clock_is_shared_between_clones() {
        let a = TestClock::new();
        let b = a.clone();
        a.advance(Duration::from_millis(1500));
        assert!((b.monotonic() - 1.5).abs() < 1e-9);
        b.set(10.0);
        assert_eq!(a.monotonic(), 10.0);
    }

    #[test]
    fn monotonic_clock_does_not_go_backwards() {
        let c = MonotonicClock::new();
        let a = c.monotonic();
        let b = c.monotonic();
        assert!(b >= a);
    }
}
