use crate::domain::value_objects::MemberId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::service_error::{HealthStatus, ServiceError};

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Member as owned by the membership service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    #[serde(alias = "_id")]
    pub id: MemberId,
    pub name: String,
    pub email: String,
}

/// Member service port (membership context).
///
/// Keeps the boundary between lending and membership: lending only knows `MemberId`.
#[async_trait]
pub trait MemberService: Send + Sync {
    /// Looks a member up. `Ok(None)` when the membership service does not know the id.
    async fn get_by_id(&self, member_id: MemberId) -> Result<Option<Member>>;

    /// Health of the membership service; degraded rather than an error when unreachable.
    async fn health(&self) -> HealthStatus;
}
