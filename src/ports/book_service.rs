use crate::domain::value_objects::BookId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::service_error::{HealthStatus, ServiceError};

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Book as owned by the inventory service.
///
/// Invariant held by the inventory service: `0 <= available_copies <= copies`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    #[serde(alias = "_id")]
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub copies: u32,
    #[serde(alias = "availableCopies")]
    pub available_copies: u32,
}

/// Direction of an availability change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityOperation {
    Increment,
    Decrement,
}

impl AvailabilityOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityOperation::Increment => "increment",
            AvailabilityOperation::Decrement => "decrement",
        }
    }

    pub fn reverse(&self) -> Self {
        match self {
            AvailabilityOperation::Increment => AvailabilityOperation::Decrement,
            AvailabilityOperation::Decrement => AvailabilityOperation::Increment,
        }
    }
}

/// Confirmation of an availability change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityUpdate {
    #[serde(alias = "_id")]
    pub id: BookId,
    #[serde(alias = "availableCopies")]
    pub available_copies: u32,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Book service port (inventory context).
///
/// The lending service only holds `BookId`s. Availability is owned by the inventory service
/// and is never read-modify-written here: it changes only through `mutate_availability`.
#[async_trait]
pub trait BookService: Send + Sync {
    /// Looks a book up. `Ok(None)` when the inventory does not know the id.
    async fn get_by_id(&self, book_id: BookId) -> Result<Option<Book>>;

    /// Moves available copies by one in the given direction.
    ///
    /// Must fail loudly: a mutation that did not happen is never reported as done.
    async fn mutate_availability(
        &self,
        book_id: BookId,
        operation: AvailabilityOperation,
    ) -> Result<AvailabilityUpdate>;

    /// Health of the inventory service; degraded rather than an error when unreachable.
    async fn health(&self) -> HealthStatus;
}
