//! Circuit breaker for calls that cross a service boundary.
//!
//! # States
//! - Closed: calls pass through, outcomes are recorded in the rolling window
//! - Open: calls fail fast without reaching the upstream
//! - Half-Open: one trial call decides whether the upstream recovered
//!
//! # Transitions
//! ```text
//! Closed    -> Open:      calls >= volume_threshold and error % >= error_threshold_percentage
//! Open      -> Half-Open: first call after reset_timeout (becomes the trial)
//! Half-Open -> Closed:    trial succeeds (window reset)
//! Half-Open -> Open:      trial fails (reset timer restarts)
//! ```

use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;

use super::config::BreakerConfig;
use super::window::{Outcome, RollingWindow, WindowStats};

/// Circuit state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }
}

/// How a call was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Normal,
    Trial,
}

/// Point-in-time view of a breaker, for health reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub calls: u32,
    pub failures: u32,
    pub timeouts: u32,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    window: RollingWindow,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

/// Three-state circuit breaker shared by every caller of one guarded function.
///
/// All bookkeeping happens under a single mutex that is never held across an await.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

/// Permission to make one call; must be settled with the call's outcome.
///
/// Dropping an unsettled trial permit (the caller was cancelled) counts as a failed trial so
/// the circuit cannot get stuck half-open.
#[derive(Debug)]
pub struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    admission: Admission,
    settled: bool,
}

impl Permit<'_> {
    pub fn settle(mut self, outcome: Outcome) {
        self.settled = true;
        self.breaker.record(self.admission, outcome);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.admission == Admission::Trial {
            self.breaker.record(Admission::Trial, Outcome::Failure);
        }
    }
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        let window = RollingWindow::new(config.rolling_window, config.bucket_count);
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                window,
                opened_at: None,
                trial_in_flight: false,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Current state. An open circuit whose reset timeout elapsed still reports `Open`
    /// until the next call turns it half-open.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let now = Instant::now();
        let mut inner = self.lock();
        let stats: WindowStats = inner.window.stats(now);
        BreakerSnapshot {
            name: self.name.clone(),
            state: inner.state,
            calls: stats.total(),
            failures: stats.failures,
            timeouts: stats.timeouts,
        }
    }

    /// Asks to make a call. `None` means the call is short-circuited.
    pub fn try_acquire(&self) -> Option<Permit<'_>> {
        let now = Instant::now();
        let mut inner = self.lock();

        let admission = match inner.state {
            CircuitState::Closed => Admission::Normal,
            CircuitState::Open => {
                let reset_elapsed = inner
                    .opened_at
                    .is_none_or(|opened_at| now >= opened_at + self.config.reset_timeout);
                if !reset_elapsed || inner.trial_in_flight {
                    return None;
                }
                inner.state = CircuitState::HalfOpen;
                inner.trial_in_flight = true;
                drop(inner);
                tracing::info!(breaker = %self.name, "circuit half open (testing)");
                Admission::Trial
            }
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    return None;
                }
                inner.trial_in_flight = true;
                Admission::Trial
            }
        };

        Some(Permit {
            breaker: self,
            admission,
            settled: false,
        })
    }

    fn record(&self, admission: Admission, outcome: Outcome) {
        let now = Instant::now();
        let mut inner = self.lock();

        match admission {
            Admission::Trial => {
                inner.trial_in_flight = false;
                if outcome == Outcome::Success {
                    inner.state = CircuitState::Closed;
                    inner.opened_at = None;
                    inner.window.reset();
                    drop(inner);
                    tracing::info!(breaker = %self.name, "circuit closed (operating normally)");
                } else {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(now);
                    drop(inner);
                    tracing::warn!(
                        breaker = %self.name,
                        ?outcome,
                        "trial call failed, circuit open again"
                    );
                }
            }
            Admission::Normal => {
                // Late results from calls admitted before the circuit opened are dropped.
                if inner.state != CircuitState::Closed {
                    return;
                }
                inner.window.record(outcome, now);

                let stats = inner.window.stats(now);
                let tripped = stats.total() >= self.config.volume_threshold
                    && stats.error_percentage() >= self.config.error_threshold_percentage;
                if outcome != Outcome::Success && tripped {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(now);
                    drop(inner);
                    tracing::warn!(
                        breaker = %self.name,
                        calls = stats.total(),
                        error_percentage = stats.error_percentage(),
                        "circuit open (failing fast)"
                    );
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
