use crate::domain::value_objects::LoanId;
use crate::ports::lending_service::{self, LendingService, LoanRecord};
use crate::ports::{HealthStatus, ServiceError};
use crate::resilience::{BreakerRegistry, Fallback, GuardError, GuardedCall};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::{READ_REQUEST_TIMEOUT, base, fetch_health, read_breaker, transport_error, unexpected_status};

pub const GET_LOAN_BY_ID: &str = "get_loan_by_id";
pub const LENDING_SERVICE_HEALTH: &str = "lending_service_health";

/// Lending service proxy for the services that consume loans.
///
/// Both operations are reads and degrade instead of failing.
#[derive(Clone)]
pub struct HttpLendingService {
    get_loan: GuardedCall<LoanId, Option<LoanRecord>, ServiceError>,
    health: GuardedCall<(), HealthStatus, ServiceError>,
}

impl HttpLendingService {
    pub fn new(base_url: impl Into<String>, registry: &BreakerRegistry) -> Self {
        let client = Client::new();
        let base_url = base(base_url);

        let get_loan = {
            let (client, base_url) = (client.clone(), base_url.clone());
            registry
                .guard(GET_LOAN_BY_ID, read_breaker(), move |loan_id: LoanId| {
                    fetch_loan(client.clone(), format!("{}/loans/{}", base_url, loan_id))
                })
                .fallback(Fallback::tolerant(None))
        };

        let health = registry
            .guard(LENDING_SERVICE_HEALTH, read_breaker(), move |_: ()| {
                fetch_health(
                    client.clone(),
                    format!("{}/health", base_url),
                    LENDING_SERVICE_HEALTH,
                    "Loan service",
                )
            })
            .fallback(Fallback::tolerant_with(|err: &GuardError<ServiceError>| {
                HealthStatus::degraded(format!("Loan service unavailable: {}", err))
            }));

        Self { get_loan, health }
    }
}

async fn fetch_loan(client: Client, url: String) -> Result<Option<LoanRecord>, ServiceError> {
    let response = client
        .get(&url)
        .timeout(READ_REQUEST_TIMEOUT)
        .send()
        .await
        .map_err(|e| transport_error(GET_LOAN_BY_ID, e))?;

    match response.status() {
        StatusCode::NOT_FOUND => Ok(None),
        status if status.is_success() => response
            .json::<LoanRecord>()
            .await
            .map(Some)
            .map_err(|e| ServiceError::failed(GET_LOAN_BY_ID, e)),
        _ => Err(unexpected_status(GET_LOAN_BY_ID, response).await),
    }
}

#[async_trait]
impl LendingService for HttpLendingService {
    async fn get_by_id(&self, loan_id: LoanId) -> lending_service::Result<Option<LoanRecord>> {
        self.get_loan
            .fire(loan_id)
            .await
            .map_err(|e| ServiceError::from_guard(GET_LOAN_BY_ID, e))
    }

    async fn health(&self) -> HealthStatus {
        match self.health.fire(()).await {
            Ok(status) => status,
            Err(err) => HealthStatus::degraded(format!("Loan service unavailable: {}", err)),
        }
    }
}
