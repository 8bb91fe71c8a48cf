use crate::domain::value_objects::BookId;
use crate::ports::book_service::{self, AvailabilityOperation, AvailabilityUpdate, Book, BookService};
use crate::ports::{HealthStatus, ServiceError};
use crate::resilience::{BreakerRegistry, Fallback, GuardError, GuardedCall};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use super::{
    READ_REQUEST_TIMEOUT, WRITE_REQUEST_TIMEOUT, base, fetch_health, read_breaker,
    rejection_message, transport_error, unexpected_status, write_breaker,
};

pub const GET_BOOK_BY_ID: &str = "get_book_by_id";
pub const UPDATE_BOOK_AVAILABILITY: &str = "update_book_availability";
pub const BOOK_SERVICE_HEALTH: &str = "book_service_health";

/// Reply to an availability mutation. A refusal is an answer from a healthy upstream, so it
/// travels as a value and does not count against the breaker.
type MutationReply = Result<AvailabilityUpdate, String>;

#[derive(Serialize)]
struct AvailabilityRequest {
    operation: AvailabilityOperation,
}

/// Inventory service proxy.
///
/// Increment and decrement share the `update_book_availability` breaker: they hit the same
/// endpoint and fail together.
#[derive(Clone)]
pub struct HttpBookService {
    get_book: GuardedCall<BookId, Option<Book>, ServiceError>,
    update_availability: GuardedCall<(BookId, AvailabilityOperation), MutationReply, ServiceError>,
    health: GuardedCall<(), HealthStatus, ServiceError>,
}

impl HttpBookService {
    pub fn new(base_url: impl Into<String>, registry: &BreakerRegistry) -> Self {
        let client = Client::new();
        let base_url = base(base_url);

        let get_book = {
            let (client, base_url) = (client.clone(), base_url.clone());
            registry
                .guard(GET_BOOK_BY_ID, read_breaker(), move |book_id: BookId| {
                    fetch_book(client.clone(), format!("{}/books/{}", base_url, book_id))
                })
                .fallback(Fallback::tolerant(None))
        };

        let update_availability = {
            let (client, base_url) = (client.clone(), base_url.clone());
            registry
                .guard(
                    UPDATE_BOOK_AVAILABILITY,
                    write_breaker(),
                    move |(book_id, operation): (BookId, AvailabilityOperation)| {
                        patch_availability(
                            client.clone(),
                            format!("{}/books/{}/availability", base_url, book_id),
                            operation,
                        )
                    },
                )
                .fallback(Fallback::escalating())
        };

        let health = registry
            .guard(BOOK_SERVICE_HEALTH, read_breaker(), move |_: ()| {
                fetch_health(
                    client.clone(),
                    format!("{}/health", base_url),
                    BOOK_SERVICE_HEALTH,
                    "Book service",
                )
            })
            .fallback(Fallback::tolerant_with(|err: &GuardError<ServiceError>| {
                HealthStatus::degraded(format!("Book service unavailable: {}", err))
            }));

        Self {
            get_book,
            update_availability,
            health,
        }
    }
}

async fn fetch_book(client: Client, url: String) -> Result<Option<Book>, ServiceError> {
    let response = client
        .get(&url)
        .timeout(READ_REQUEST_TIMEOUT)
        .send()
        .await
        .map_err(|e| transport_error(GET_BOOK_BY_ID, e))?;

    match response.status() {
        StatusCode::NOT_FOUND => Ok(None),
        status if status.is_success() => response
            .json::<Book>()
            .await
            .map(Some)
            .map_err(|e| ServiceError::failed(GET_BOOK_BY_ID, e)),
        _ => Err(unexpected_status(GET_BOOK_BY_ID, response).await),
    }
}

async fn patch_availability(
    client: Client,
    url: String,
    operation: AvailabilityOperation,
) -> Result<MutationReply, ServiceError> {
    let response = client
        .patch(&url)
        .timeout(WRITE_REQUEST_TIMEOUT)
        .json(&AvailabilityRequest { operation })
        .send()
        .await
        .map_err(|e| transport_error(UPDATE_BOOK_AVAILABILITY, e))?;

    let status = response.status();
    if status.is_success() {
        return response
            .json::<AvailabilityUpdate>()
            .await
            .map(Ok)
            .map_err(|e| ServiceError::failed(UPDATE_BOOK_AVAILABILITY, e));
    }
    if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
        return Ok(Err(rejection_message(response).await));
    }
    Err(unexpected_status(UPDATE_BOOK_AVAILABILITY, response).await)
}

#[async_trait]
impl BookService for HttpBookService {
    async fn get_by_id(&self, book_id: BookId) -> book_service::Result<Option<Book>> {
        self.get_book
            .fire(book_id)
            .await
            .map_err(|e| ServiceError::from_guard(GET_BOOK_BY_ID, e))
    }

    async fn mutate_availability(
        &self,
        book_id: BookId,
        operation: AvailabilityOperation,
    ) -> book_service::Result<AvailabilityUpdate> {
        let reply = self
            .update_availability
            .fire((book_id, operation))
            .await
            .map_err(|e| ServiceError::from_guard(UPDATE_BOOK_AVAILABILITY, e))?;

        reply.map_err(|message| {
            tracing::warn!(
                book_id = %book_id,
                operation = operation.as_str(),
                %message,
                "availability change refused"
            );
            ServiceError::Rejected {
                operation: UPDATE_BOOK_AVAILABILITY,
                message,
            }
        })
    }

    async fn health(&self) -> HealthStatus {
        match self.health.fire(()).await {
            Ok(status) => status,
            Err(err) => HealthStatus::degraded(format!("Book service unavailable: {}", err)),
        }
    }
}
