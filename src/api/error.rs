use crate::application::loan::{ErrorKind, LoanApplicationError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API layer error
///
/// Wraps application errors and maps them to HTTP responses. Internal details are only
/// included when `expose_internal` is set (development).
#[derive(Debug)]
pub enum ApiError {
    Application {
        error: LoanApplicationError,
        expose_internal: bool,
    },
    /// Malformed request: bad JSON, missing field, invalid id
    BadRequest(String),
}

impl From<LoanApplicationError> for ApiError {
    fn from(error: LoanApplicationError) -> Self {
        ApiError::Application {
            error,
            expose_internal: false,
        }
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_code(error: &LoanApplicationError) -> &'static str {
    match error {
        LoanApplicationError::MemberNotFound => "MEMBER_NOT_FOUND",
        LoanApplicationError::BookNotFound => "BOOK_NOT_FOUND",
        LoanApplicationError::LoanNotFound => "LOAN_NOT_FOUND",
        LoanApplicationError::BookNotAvailable => "BOOK_NOT_AVAILABLE",
        LoanApplicationError::AvailabilityRejected(_) => "AVAILABILITY_REJECTED",
        LoanApplicationError::InvalidLoanState(_) => "INVALID_LOAN_STATE",
        LoanApplicationError::ExtensionLimitReached { .. } => "EXTENSION_LIMIT_REACHED",
        LoanApplicationError::InvalidDueDate(_) => "INVALID_DUE_DATE",
        LoanApplicationError::InvalidExtensionDays(_) => "INVALID_EXTENSION_DAYS",
        LoanApplicationError::Timeout { .. } => "UPSTREAM_TIMEOUT",
        LoanApplicationError::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
        LoanApplicationError::PersistenceFailed { .. } => "PERSISTENCE_FAILED",
        LoanApplicationError::Repository(_) => "REPOSITORY_ERROR",
    }
}

/// Error message with its whole source chain
fn describe(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("BAD_REQUEST", message),
            ),
            ApiError::Application {
                error,
                expose_internal,
            } => {
                let kind = error.kind();
                let message = match kind {
                    ErrorKind::Internal => {
                        // Details are logged; clients only get them in development
                        tracing::error!(error = %describe(&error), "internal error");
                        if expose_internal {
                            describe(&error)
                        } else {
                            "An unexpected error occurred".to_string()
                        }
                    }
                    ErrorKind::Timeout | ErrorKind::ServiceUnavailable => {
                        tracing::warn!(error = %describe(&error), "upstream failure");
                        error.to_string()
                    }
                    _ => error.to_string(),
                };
                (status_for(kind), ErrorResponse::new(error_code(&error), message))
            }
        };

        (status, Json(body)).into_response()
    }
}
