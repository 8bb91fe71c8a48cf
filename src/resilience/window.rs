use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of one guarded call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
    Timeout,
}

/// Counters summed over the live part of the window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowStats {
    pub successes: u32,
    pub failures: u32,
    pub timeouts: u32,
}

impl WindowStats {
    pub fn total(&self) -> u32 {
        self.successes + self.failures + self.timeouts
    }

    /// Failures and timeouts both count against the circuit.
    pub fn error_percentage(&self) -> u32 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        (self.failures + self.timeouts) * 100 / total
    }
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    started_at: Instant,
    stats: WindowStats,
}

/// Rolling window of call outcomes split into fixed-width buckets.
///
/// Buckets older than the window span are dropped lazily on every access, so the window
/// never needs a background timer.
#[derive(Debug)]
pub struct RollingWindow {
    span: Duration,
    bucket_width: Duration,
    bucket_count: usize,
    buckets: VecDeque<Bucket>,
}

impl RollingWindow {
    pub fn new(span: Duration, bucket_count: u32) -> Self {
        let bucket_count = bucket_count.max(1);
        Self {
            span,
            bucket_width: span / bucket_count,
            bucket_count: bucket_count as usize,
            buckets: VecDeque::with_capacity(bucket_count as usize),
        }
    }

    pub fn record(&mut self, outcome: Outcome, now: Instant) {
        self.evict(now);

        let needs_bucket = match self.buckets.back() {
            Some(bucket) => now >= bucket.started_at + self.bucket_width,
            None => true,
        };
        if needs_bucket {
            if self.buckets.len() == self.bucket_count {
                self.buckets.pop_front();
            }
            self.buckets.push_back(Bucket {
                started_at: now,
                stats: WindowStats::default(),
            });
        }

        if let Some(bucket) = self.buckets.back_mut() {
            match outcome {
                Outcome::Success => bucket.stats.successes += 1,
                Outcome::Failure => bucket.stats.failures += 1,
                Outcome::Timeout => bucket.stats.timeouts += 1,
            }
        }
    }

    pub fn stats(&mut self, now: Instant) -> WindowStats {
        self.evict(now);
        self.buckets
            .iter()
            .fold(WindowStats::default(), |acc, bucket| WindowStats {
                successes: acc.successes + bucket.stats.successes,
                failures: acc.failures + bucket.stats.failures,
                timeouts: acc.timeouts + bucket.stats.timeouts,
            })
    }

    pub fn reset(&mut self) {
        self.buckets.clear();
    }

    fn evict(&mut self, now: Instant) {
        while let Some(bucket) = self.buckets.front() {
            if bucket.started_at + self.span <= now {
                self.buckets.pop_front();
            } else {
                break;
            }
        }
    }
}
