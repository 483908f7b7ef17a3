//! Monotonic millisecond clock for storage key derivation.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Wall-clock milliseconds, forced strictly increasing per process.
///
/// Storage keys embed this timestamp, so two uploads for the same cell must
/// never observe the same value even within one millisecond or across a
/// wall-clock step backwards.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicI64,
}

impl MonotonicClock {
    pub const fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    /// Next timestamp: the current wall clock, or one past the previously
    /// returned value when the wall clock has not advanced.
    pub fn now_millis(&self) -> i64 {
        let wall = Utc::now().timestamp_millis();
        let prev = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
                Some(if wall > prev { wall } else { prev + 1 })
            });
        match prev {
            Ok(prev) => {
                if wall > prev {
                    wall
                } else {
                    prev + 1
                }
            }
            // The closure never returns None; keep the wall clock as a fallback.
            Err(_) => wall,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_strictly_increasing() {
        let clock = MonotonicClock::new();
        let mut prev = clock.now_millis();
        for _ in 0..10_000 {
            let next = clock.now_millis();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn test_tracks_wall_clock() {
        let clock = MonotonicClock::new();
        let wall = Utc::now().timestamp_millis();
        assert!(clock.now_millis() >= wall);
    }

    #[test]
    fn test_concurrent_values_are_unique() {
        let clock = Arc::new(MonotonicClock::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let clock = Arc::clone(&clock);
            handles.push(std::thread::spawn(move || {
                (0..1000).map(|_| clock.now_millis()).collect::<Vec<_>>()
            }));
        }

        let mut all: Vec<i64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
    }
}
