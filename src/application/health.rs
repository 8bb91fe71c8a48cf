use crate::ports::{HealthState, HealthStatus};
use crate::resilience::{BreakerRegistry, BreakerSnapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::loan::ServiceDependencies;

#[derive(Debug, Clone, Serialize)]
pub struct ServicesHealth {
    pub loan_service: HealthStatus,
    pub book_service: HealthStatus,
    pub user_service: HealthStatus,
}

/// Health of the lending service and everything it depends on
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthState,
    pub timestamp: DateTime<Utc>,
    pub services: ServicesHealth,
    pub circuits: Vec<BreakerSnapshot>,
}

/// Overall status is `error` as soon as one dependency reports an error.
pub async fn check_health(
    deps: &ServiceDependencies,
    registry: &BreakerRegistry,
    now: DateTime<Utc>,
) -> HealthReport {
    let (book_service, user_service) =
        futures::join!(deps.book_service.health(), deps.member_service.health());

    let services = ServicesHealth {
        loan_service: HealthStatus::ok("Loan service is running"),
        book_service,
        user_service,
    };

    let healthy = [
        &services.loan_service,
        &services.book_service,
        &services.user_service,
    ]
    .iter()
    .all(|s| s.is_ok());

    HealthReport {
        status: if healthy {
            HealthState::Ok
        } else {
            HealthState::Error
        },
        timestamp: now,
        services,
        circuits: registry.snapshots(),
    }
}
