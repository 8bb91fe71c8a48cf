//! Service proxies over the sibling services' HTTP APIs.
//!
//! Every remote operation goes through a [`GuardedCall`](crate::resilience::GuardedCall)
//! registered under its own name. The reqwest per-request timeout sits inside the breaker
//! timeout, so a slow upstream is normally cut by the client first and the breaker timeout
//! only catches what the client misses (slow body reads, DNS).
//!
//! Reads are tolerant: an unreachable upstream looks like a missing entity or degraded health.
//! Mutations are escalating: their failures always reach the caller.

pub mod inventory;
pub mod lending;
pub mod membership;

pub use inventory::HttpBookService;
pub use lending::HttpLendingService;
pub use membership::HttpMemberService;

use crate::ports::{HealthStatus, ServiceError};
use crate::resilience::BreakerConfig;
use reqwest::Response;
use serde::Deserialize;
use std::time::Duration;

pub(crate) const READ_REQUEST_TIMEOUT: Duration = Duration::from_millis(2_500);
pub(crate) const WRITE_REQUEST_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Breaker base config for lookups and health checks
pub fn read_breaker() -> BreakerConfig {
    BreakerConfig::default().with_timeout(Duration::from_millis(3_000))
}

/// Breaker base config for availability mutations
pub fn write_breaker() -> BreakerConfig {
    BreakerConfig::default().with_timeout(Duration::from_millis(6_000))
}

#[derive(Deserialize)]
struct MessagePayload {
    message: String,
}

#[derive(Deserialize)]
struct RemoteHealth {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("unexpected status {status}: {body}")]
struct UnexpectedStatus {
    status: reqwest::StatusCode,
    body: String,
}

fn base(url: impl Into<String>) -> String {
    url.into().trim_end_matches('/').to_string()
}

fn transport_error(operation: &'static str, err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout { operation }
    } else {
        ServiceError::failed(operation, err)
    }
}

async fn unexpected_status(operation: &'static str, response: Response) -> ServiceError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ServiceError::failed(operation, UnexpectedStatus { status, body })
}

/// Message of a 4xx reply, falling back to the status line when the body is not `{message}`.
async fn rejection_message(response: Response) -> String {
    let status = response.status();
    match response.json::<MessagePayload>().await {
        Ok(payload) => payload.message,
        Err(_) => format!("request refused with status {}", status),
    }
}

async fn fetch_health(
    client: reqwest::Client,
    url: String,
    operation: &'static str,
    service: &'static str,
) -> Result<HealthStatus, ServiceError> {
    let response = client
        .get(&url)
        .timeout(READ_REQUEST_TIMEOUT)
        .send()
        .await
        .map_err(|e| transport_error(operation, e))?;

    if !response.status().is_success() {
        return Err(unexpected_status(operation, response).await);
    }

    let health = response.json::<RemoteHealth>().await.ok();
    Ok(match health {
        Some(h) if h.status != "ok" => HealthStatus::degraded(
            h.message
                .unwrap_or_else(|| format!("{} reported {}", service, h.status)),
        ),
        Some(RemoteHealth {
            message: Some(message),
            ..
        }) => HealthStatus::ok(message),
        _ => HealthStatus::ok(format!("{} is running", service)),
    })
}
