//! Single-flight rate limiter for the routing provider.

use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

/// Runs one call at a time with at least `min_spacing` between the end of
/// one call and the start of the next.
#[derive(Debug)]
pub struct Throttle {
    min_spacing: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_spacing: Duration) -> Self {
        Self {
            min_spacing,
            last_call: Mutex::new(None),
        }
    }

    pub fn min_spacing(&self) -> Duration {
        self.min_spacing
    }

    pub fn run<T>(&self, call: impl FnOnce() -> T) -> T {
        // A poisoned lock only means an earlier call panicked; the timestamp is still usable.
        let mut last_call = self
            .last_call
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(last) = *last_call {
            let elapsed = last.elapsed();
            if elapsed < self.min_spacing {
                thread::sleep(self.min_spacing - elapsed);
            }
        }

        let result = call();
        *last_call = Some(Instant::now());
        result
    }
}

impl Clone for Throttle {
    /// A clone shares the spacing but starts with its own clock.
    fn clone(&self) -> Self {
        Self::new(self.min_spacing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_call_runs_immediately() {
        let throttle = Throttle::new(Duration::from_millis(500));
        let start = Instant::now();
        let value = throttle.run(|| 7);
        assert_eq!(value, 7);
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[test]
    fn test_clone_starts_with_fresh_clock() {
        let throttle = Throttle::new(Duration::from_millis(500));
        throttle.run(|| ());
        let copy = throttle.clone();
        assert_eq!(copy.min_spacing(), Duration::from_millis(500));

        let start = Instant::now();
        copy.run(|| ());
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[test]
    fn test_calls_are_spaced() {
        let throttle = Throttle::new(Duration::from_millis(50));
        let start = Instant::now();
        for _ in 0..3 {
            throttle.run(|| ());
        }
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
