use crate::domain::{LoanStatus, value_objects::LoanId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::service_error::{HealthStatus, ServiceError};

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Loan as exposed by the lending service to its sibling services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub id: LoanId,
    pub member: LoanParty,
    pub book: LoanParty,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    #[serde(default)]
    pub extensions_count: u8,
}

/// Reference to a member or book inside a loan record; only the id is guaranteed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanParty {
    pub id: uuid::Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Lending service port, used by services that consume loans (statistics, membership).
#[async_trait]
pub trait LendingService: Send + Sync {
    /// Looks a loan up. `Ok(None)` when the lending service does not know the id.
    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<LoanRecord>>;

    async fn health(&self) -> HealthStatus;
}
