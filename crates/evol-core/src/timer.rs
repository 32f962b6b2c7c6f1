use std::sync::Mutex;
use std::time::Instant;

const CAPACITY: usize = 1000;

struct Inner {
    samples: Vec<i64>,
    next: usize,
    filled: usize,
}

/// A fixed-window latency sampler for one engine's main loop. Distinct from
/// the teacher's `StepTimings` (which sums `Instant` deltas into a one-shot
/// report): this keeps the last 1000 samples in a circular buffer so
/// `stats()` can be called concurrently by an observer while the engine
/// keeps collecting (spec.md §4.8).
pub struct Timer {
    inner: Mutex<Inner>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerStats {
    pub count: usize,
    pub min_micros: i64,
    pub max_micros: i64,
    pub sum_micros: i64,
}

impl Default for Timer {
    fn default() -> Self {
        Timer::new()
    }
}

impl Timer {
    pub fn new() -> Timer {
        Timer {
            inner: Mutex::new(Inner {
                samples: Vec::with_capacity(CAPACITY),
                next: 0,
                filled: 0,
            }),
        }
    }

    pub fn start(&self) -> Instant {
        Instant::now()
    }

    /// Records `end - start` if non-negative microseconds; a negative delta
    /// (clock skew) is silently dropped, not an error.
    pub fn end(&self, start: Instant) {
        let elapsed = Instant::now().saturating_duration_since(start);
        let micros = elapsed.as_micros() as i64;
        self.record(micros);
    }

    fn record(&self, micros: i64) {
        if micros < 0 {
            return;
        }
        let mut inner = self.inner.lock().expect("timer mutex poisoned");
        if inner.samples.len() < CAPACITY {
            inner.samples.push(micros);
        } else {
            let slot = inner.next;
            inner.samples[slot] = micros;
        }
        inner.next = (inner.next + 1) % CAPACITY;
        inner.filled = (inner.filled + 1).min(CAPACITY);
    }

    /// Copies the sample window under the lock, then computes stats outside
    /// it so a concurrent observer never blocks the engine for long.
    pub fn stats(&self) -> TimerStats {
        let copy: Vec<i64> = {
            let inner = self.inner.lock().expect("timer mutex poisoned");
            inner.samples.clone()
        };
        if copy.is_empty() {
            return TimerStats {
                count: 0,
                min_micros: 0,
                max_micros: 0,
                sum_micros: 0,
            };
        }
        let min = *copy.iter().min().unwrap();
        let max = *copy.iter().max().unwrap();
        let sum: i64 = copy.iter().sum();
        TimerStats {
            count: copy.len(),
            min_micros: min,
            max_micros: max,
            sum_micros: sum,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_timer_has_empty_stats() {
        let t = Timer::new();
        let s = t.stats();
        assert_eq!(s.count, 0);
    }

    #[test]
    fn negative_interval_is_dropped_not_recorded() {
        let t = Timer::new();
        t.record(-5);
        assert_eq!(t.stats().count, 0);
    }

    #[test]
    fn samples_accumulate_min_max_sum() {
        let t = Timer::new();
        t.record(10);
        t.record(30);
        t.record(20);
        let s = t.stats();
        assert_eq!(s.count, 3);
        assert_eq!(s.min_micros, 10);
        assert_eq!(s.max_micros, 30);
        assert_eq!(s.sum_micros, 60);
    }

    #[test]
    fn buffer_wraps_after_capacity_samples() {
        let t = Timer::new();
        for i in 0..(CAPACITY + 10) {
            t.record(i as i64);
        }
        let s = t.stats();
        assert_eq!(s.count, CAPACITY);
        // the oldest 10 samples (0..10) were overwritten
        assert_eq!(s.min_micros, 10);
    }
}
