use std::time::Duration;

/// Settings of one circuit breaker.
///
/// Defaults:
///
/// | field                        | default  |
/// |------------------------------|----------|
/// | `timeout`                    | 5000 ms  |
/// | `error_threshold_percentage` | 50       |
/// | `reset_timeout`              | 10000 ms |
/// | `volume_threshold`           | 5        |
/// | `rolling_window`             | 10000 ms |
/// | `bucket_count`               | 10       |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Budget for a single call; exceeding it is recorded as a timeout.
    pub timeout: Duration,
    /// Failure-or-timeout percentage (0-100) at which the circuit opens.
    pub error_threshold_percentage: u32,
    /// How long the circuit stays open before admitting a trial call.
    pub reset_timeout: Duration,
    /// Minimum number of calls in the window before the circuit may open.
    pub volume_threshold: u32,
    /// Span of the rolling statistics window.
    pub rolling_window: Duration,
    /// Number of buckets the window is divided into.
    pub bucket_count: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5_000),
            error_threshold_percentage: 50,
            reset_timeout: Duration::from_millis(10_000),
            volume_threshold: 5,
            rolling_window: Duration::from_millis(10_000),
            bucket_count: 10,
        }
    }
}

impl BreakerConfig {
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    pub fn with_error_threshold_percentage(self, error_threshold_percentage: u32) -> Self {
        Self {
            error_threshold_percentage,
            ..self
        }
    }

    pub fn with_reset_timeout(self, reset_timeout: Duration) -> Self {
        Self {
            reset_timeout,
            ..self
        }
    }

    pub fn with_volume_threshold(self, volume_threshold: u32) -> Self {
        Self {
            volume_threshold,
            ..self
        }
    }

    pub fn with_rolling_window(self, rolling_window: Duration, bucket_count: u32) -> Self {
        Self {
            rolling_window,
            bucket_count,
            ..self
        }
    }

    /// Checks that the settings describe a usable breaker.
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout.is_zero() {
            return Err("timeout must be positive".to_string());
        }
        if self.error_threshold_percentage > 100 {
            return Err(format!(
                "error threshold percentage must be within 0-100, got {}",
                self.error_threshold_percentage
            ));
        }
        if self.bucket_count == 0 {
            return Err("bucket count must be at least 1".to_string());
        }
        if self.rolling_window < Duration::from_millis(u64::from(self.bucket_count)) {
            return Err(format!(
                "rolling window of {:?} is too short for {} buckets",
                self.rolling_window, self.bucket_count
            ));
        }
        Ok(())
    }
}

/// Partial settings layered over a base [`BreakerConfig`].
///
/// Proxies choose a base per operation (short timeouts for reads, longer ones for
/// mutations); operators override individual fields without restating the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreakerOverride {
    pub timeout: Option<Duration>,
    pub error_threshold_percentage: Option<u32>,
    pub reset_timeout: Option<Duration>,
    pub volume_threshold: Option<u32>,
    pub rolling_window: Option<Duration>,
    pub bucket_count: Option<u32>,
}

impl BreakerOverride {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, base: BreakerConfig) -> BreakerConfig {
        BreakerConfig {
            timeout: self.timeout.unwrap_or(base.timeout),
            error_threshold_percentage: self
                .error_threshold_percentage
                .unwrap_or(base.error_threshold_percentage),
            reset_timeout: self.reset_timeout.unwrap_or(base.reset_timeout),
            volume_threshold: self.volume_threshold.unwrap_or(base.volume_threshold),
            rolling_window: self.rolling_window.unwrap_or(base.rolling_window),
            bucket_count: self.bucket_count.unwrap_or(base.bucket_count),
        }
    }
}
