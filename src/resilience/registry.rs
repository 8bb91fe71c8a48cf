use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::circuit_breaker::{BreakerSnapshot, CircuitBreaker};
use super::config::{BreakerConfig, BreakerOverride};
use super::guard::GuardedCall;

/// Owner of every circuit breaker in the process.
///
/// Created once at start-up and handed to each proxy, so breaker state lives in an explicit
/// object instead of module-level singletons. One breaker exists per guarded-function name;
/// every caller of that function shares it.
#[derive(Debug, Default)]
pub struct BreakerRegistry {
    defaults: BreakerOverride,
    overrides: HashMap<String, BreakerOverride>,
    breakers: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
}

impl BreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose breakers get `defaults` applied first, then the override for their
    /// own name, on top of the base config the proxy asks for.
    pub fn with_overrides(
        defaults: BreakerOverride,
        overrides: HashMap<String, BreakerOverride>,
    ) -> Self {
        Self {
            defaults,
            overrides,
            breakers: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the breaker for `name`, creating it from `base` on first use.
    pub fn breaker(&self, name: &str, base: BreakerConfig) -> Arc<CircuitBreaker> {
        let mut breakers = self.lock();
        if let Some(breaker) = breakers.get(name) {
            return breaker.clone();
        }

        let mut config = self.defaults.apply(base);
        if let Some(over) = self.overrides.get(name) {
            config = over.apply(config);
        }
        tracing::debug!(breaker = name, ?config, "registering circuit breaker");

        let breaker = Arc::new(CircuitBreaker::new(name, config));
        breakers.insert(name.to_string(), breaker.clone());
        breaker
    }

    /// Wraps `operation` with the breaker registered under `name`.
    pub fn guard<A, T, E, F, Fut>(
        &self,
        name: &str,
        base: BreakerConfig,
        operation: F,
    ) -> GuardedCall<A, T, E>
    where
        A: Send + 'static,
        T: Send + 'static,
        E: std::error::Error + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        GuardedCall::wrap(self.breaker(name, base), operation)
    }

    /// Snapshots of all breakers, sorted by name.
    pub fn snapshots(&self) -> Vec<BreakerSnapshot> {
        let breakers: Vec<Arc<CircuitBreaker>> = self.lock().values().cloned().collect();
        let mut snapshots: Vec<BreakerSnapshot> =
            breakers.iter().map(|breaker| breaker.snapshot()).collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<CircuitBreaker>>> {
        self.breakers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
