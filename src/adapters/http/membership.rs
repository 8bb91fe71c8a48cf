use crate::domain::value_objects::MemberId;
use crate::ports::member_service::{self, Member, MemberService};
use crate::ports::{HealthStatus, ServiceError};
use crate::resilience::{BreakerRegistry, Fallback, GuardError, GuardedCall};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::{READ_REQUEST_TIMEOUT, base, fetch_health, read_breaker, transport_error, unexpected_status};

pub const GET_MEMBER_BY_ID: &str = "get_member_by_id";
pub const MEMBER_SERVICE_HEALTH: &str = "member_service_health";

/// Membership (user) service proxy
#[derive(Clone)]
pub struct HttpMemberService {
    get_member: GuardedCall<MemberId, Option<Member>, ServiceError>,
    health: GuardedCall<(), HealthStatus, ServiceError>,
}

impl HttpMemberService {
    pub fn new(base_url: impl Into<String>, registry: &BreakerRegistry) -> Self {
        let client = Client::new();
        let base_url = base(base_url);

        let get_member = {
            let (client, base_url) = (client.clone(), base_url.clone());
            registry
                .guard(GET_MEMBER_BY_ID, read_breaker(), move |member_id: MemberId| {
                    fetch_member(client.clone(), format!("{}/users/{}", base_url, member_id))
                })
                .fallback(Fallback::tolerant(None))
        };

        let health = registry
            .guard(MEMBER_SERVICE_HEALTH, read_breaker(), move |_: ()| {
                fetch_health(
                    client.clone(),
                    format!("{}/health", base_url),
                    MEMBER_SERVICE_HEALTH,
                    "User service",
                )
            })
            .fallback(Fallback::tolerant_with(|err: &GuardError<ServiceError>| {
                HealthStatus::degraded(format!("User service unavailable: {}", err))
            }));

        Self { get_member, health }
    }
}

async fn fetch_member(client: Client, url: String) -> Result<Option<Member>, ServiceError> {
    let response = client
        .get(&url)
        .timeout(READ_REQUEST_TIMEOUT)
        .send()
        .await
        .map_err(|e| transport_error(GET_MEMBER_BY_ID, e))?;

    match response.status() {
        StatusCode::NOT_FOUND => Ok(None),
        status if status.is_success() => response
            .json::<Member>()
            .await
            .map(Some)
            .map_err(|e| ServiceError::failed(GET_MEMBER_BY_ID, e)),
        _ => Err(unexpected_status(GET_MEMBER_BY_ID, response).await),
    }
}

#[async_trait]
impl MemberService for HttpMemberService {
    async fn get_by_id(&self, member_id: MemberId) -> member_service::Result<Option<Member>> {
        self.get_member
            .fire(member_id)
            .await
            .map_err(|e| ServiceError::from_guard(GET_MEMBER_BY_ID, e))
    }

    async fn health(&self) -> HealthStatus {
        match self.health.fire(()).await {
            Ok(status) => status,
            Err(err) => HealthStatus::degraded(format!("User service unavailable: {}", err)),
        }
    }
}
