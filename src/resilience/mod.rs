pub mod circuit_breaker;
pub mod config;
pub mod guard;
pub mod registry;
pub mod window;

pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker, CircuitState};
pub use config::{BreakerConfig, BreakerOverride};
pub use guard::{Fallback, GuardError, GuardedCall};
pub use registry::BreakerRegistry;
pub use window::{Outcome, WindowStats};
