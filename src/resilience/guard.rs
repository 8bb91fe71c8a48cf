use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::circuit_breaker::CircuitBreaker;
use super::window::Outcome;

/// Why a guarded call did not produce a value
#[derive(Debug, Error)]
pub enum GuardError<E> {
    /// The circuit is open (or a half-open trial is already running)
    #[error("circuit `{breaker}` is open")]
    ShortCircuited { breaker: String },

    /// The operation exceeded the breaker's timeout
    #[error("`{breaker}` timed out after {after:?}")]
    Timeout { breaker: String, after: Duration },

    /// The operation itself failed
    #[error("`{breaker}` failed")]
    Failed {
        breaker: String,
        #[source]
        source: E,
    },
}

type Operation<A, T, E> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;
type Handler<T, E> = Arc<dyn Fn(&GuardError<E>) -> T + Send + Sync>;

/// What happens when a guarded call fails or is short-circuited.
pub enum Fallback<T, E> {
    /// Replace the failure with a neutral value. For reads where staleness is acceptable.
    Tolerant(Handler<T, E>),
    /// Surface the failure unchanged. For mutations, where a default would hide a lost write.
    Escalating,
}

impl<T, E> Fallback<T, E> {
    pub fn tolerant(value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
        E: 'static,
    {
        Fallback::Tolerant(Arc::new(move |_: &GuardError<E>| value.clone()))
    }

    pub fn tolerant_with<F>(handler: F) -> Self
    where
        F: Fn(&GuardError<E>) -> T + Send + Sync + 'static,
    {
        Fallback::Tolerant(Arc::new(handler))
    }

    pub fn escalating() -> Self {
        Fallback::Escalating
    }
}

impl<T, E> Clone for Fallback<T, E> {
    fn clone(&self) -> Self {
        match self {
            Fallback::Tolerant(handler) => Fallback::Tolerant(handler.clone()),
            Fallback::Escalating => Fallback::Escalating,
        }
    }
}

/// A remote operation wrapped with a timeout and a circuit breaker.
///
/// Built once per logical operation; `fire` may be called concurrently from any number of
/// tasks, all sharing the same breaker.
///
/// A timeout ends the call from the caller's point of view but the request may already have
/// reached the upstream. Mutations fired through a guard are therefore not at-most-once.
pub struct GuardedCall<A, T, E> {
    breaker: Arc<CircuitBreaker>,
    operation: Operation<A, T, E>,
    fallback: Option<Fallback<T, E>>,
}

impl<A, T, E> Clone for GuardedCall<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            breaker: self.breaker.clone(),
            operation: self.operation.clone(),
            fallback: self.fallback.clone(),
        }
    }
}

impl<A, T, E> GuardedCall<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: std::error::Error + Send + 'static,
{
    pub fn wrap<F, Fut>(breaker: Arc<CircuitBreaker>, operation: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            breaker,
            operation: Arc::new(move |args| -> BoxFuture<'static, Result<T, E>> {
                Box::pin(operation(args))
            }),
            fallback: None,
        }
    }

    pub fn fallback(self, fallback: Fallback<T, E>) -> Self {
        Self {
            fallback: Some(fallback),
            ..self
        }
    }

    pub fn name(&self) -> &str {
        self.breaker.name()
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Runs the operation through the breaker, then through the fallback on failure.
    pub async fn fire(&self, args: A) -> Result<T, GuardError<E>> {
        let err = match self.call(args).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        match &self.fallback {
            Some(Fallback::Tolerant(handler)) => {
                tracing::warn!(breaker = %self.name(), error = %err, "fallback used");
                Ok(handler(&err))
            }
            Some(Fallback::Escalating) => {
                tracing::error!(breaker = %self.name(), error = %err, "escalating failure");
                Err(err)
            }
            None => Err(err),
        }
    }

    async fn call(&self, args: A) -> Result<T, GuardError<E>> {
        let Some(permit) = self.breaker.try_acquire() else {
            return Err(GuardError::ShortCircuited {
                breaker: self.name().to_string(),
            });
        };

        let timeout = self.breaker.config().timeout;
        match tokio::time::timeout(timeout, (self.operation)(args)).await {
            Ok(Ok(value)) => {
                permit.settle(Outcome::Success);
                Ok(value)
            }
            Ok(Err(source)) => {
                permit.settle(Outcome::Failure);
                Err(GuardError::Failed {
                    breaker: self.name().to_string(),
                    source,
                })
            }
            Err(_) => {
                permit.settle(Outcome::Timeout);
                Err(GuardError::Timeout {
                    breaker: self.name().to_string(),
                    after: timeout,
                })
            }
        }
    }
}
