use serde::Serialize;
use thiserror::Error;

use crate::resilience::GuardError;

/// Failure of a call to another service, as seen by the lending service.
///
/// Every variant names the logical operation that failed so callers and logs can tell a
/// failed availability mutation from a failed lookup.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The call exceeded its time budget
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    /// The circuit for the operation is open
    #[error("{operation} unavailable: circuit open")]
    CircuitOpen { operation: &'static str },

    /// The upstream understood the request and refused it (typed `{message}` payload)
    #[error("{operation} rejected: {message}")]
    Rejected {
        operation: &'static str,
        message: String,
    },

    /// Transport failure, unexpected status or undecodable payload
    #[error("{operation} failed")]
    Failed {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ServiceError {
    pub fn failed(
        operation: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ServiceError::Failed {
            operation,
            source: source.into(),
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            ServiceError::Timeout { operation }
            | ServiceError::CircuitOpen { operation }
            | ServiceError::Rejected { operation, .. }
            | ServiceError::Failed { operation, .. } => operation,
        }
    }

    /// Folds a guard failure into the operation's error.
    ///
    /// Failures produced by the operation itself already carry their own context and pass
    /// through unchanged.
    pub fn from_guard(operation: &'static str, err: GuardError<ServiceError>) -> Self {
        match err {
            GuardError::ShortCircuited { .. } => ServiceError::CircuitOpen { operation },
            GuardError::Timeout { .. } => ServiceError::Timeout { operation },
            GuardError::Failed { source, .. } => source,
        }
    }
}

/// Health of one upstream dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: HealthState,
    pub message: String,
}

impl HealthStatus {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: HealthState::Ok,
            message: message.into(),
        }
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            status: HealthState::Error,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == HealthState::Ok
    }
}
