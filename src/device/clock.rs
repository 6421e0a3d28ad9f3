//! Timestamp source for status payloads

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Capability: current time in epoch seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall clock that never goes backwards
///
/// NTP corrections on the Pi can step the system clock back; consecutive
/// publishes from one device must still carry non-decreasing timestamps.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicI64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn advance(&self, wall: i64) -> i64 {
        let prev = self.last.fetch_max(wall, Ordering::SeqCst);
        prev.max(wall)
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> i64 {
        self.advance(Utc::now().timestamp())
    }
}

/// Clock pinned to a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_ignores_backwards_steps() {
        let clock = MonotonicClock::new();
        assert_eq!(clock.advance(1_700_000_100), 1_700_000_100);
        assert_eq!(clock.advance(1_700_000_050), 1_700_000_100);
        assert_eq!(clock.advance(1_700_000_200), 1_700_000_200);
    }

    #[test]
    fn test_monotonic_clock_tracks_wall_time() {
        let clock = MonotonicClock::new();
        let before = Utc::now().timestamp();
        let a = clock.now();
        let b = clock.now();
        assert!(a >= before);
        assert!(b >= a);
    }

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock(42).now(), 42);
    }
}
