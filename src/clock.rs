//! The director's time source: a single monotonic-wall-clock reading per
//! tick, pluggable so tests can drive deterministic timestamps instead of
//! the real clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use once_cell::sync::Lazy;

static EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// Seconds elapsed since this process started, as a monotonic `f64`.
pub fn now() -> f64 {
    EPOCH.elapsed().as_secs_f64()
}

/// Supplies the `now` a director tick pins and reuses throughout the step.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> f64;
}

/// Default time source backed by the process-wide monotonic epoch.
#[derive(Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> f64 {
        now()
    }
}

/// Deterministic time source for tests: `now()` returns whatever was last
/// set via [`StubClock::set`], starting at 0.0.
#[derive(Default)]
pub struct StubClock {
    bits: AtomicU64,
}

impl StubClock {
    pub fn new(at: f64) -> Self {
        let clock = Self::default();
        clock.set(at);
        clock
    }

    pub fn set(&self, at: f64) {
        self.bits.store(at.to_bits(), Ordering::SeqCst);
    }
}

impl TimeSource for StubClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_non_negative_and_monotonic() {
        let a = now();
        let b = now();
        assert!(a >= 0.0);
        assert!(b >= a);
    }

    #[test]
    fn stub_clock_reports_set_value() {
        let clock = StubClock::new(10.0);
        assert_eq!(clock.now(), 10.0);
        clock.set(20.0);
        assert_eq!(clock.now(), 20.0);
    }
}
