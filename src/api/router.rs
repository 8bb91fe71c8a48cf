use axum::{
    Router,
    routing::{get, patch, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, create_loan, extend_loan, get_loan, health, list_member_loans, list_overdue,
    return_book, update_loan,
};

/// Creates the API router with all loan endpoints
///
/// Commands:
/// - POST /api/loans - lend a book
/// - POST /api/loans/returns - return a book
/// - PUT /api/loans/:id/extend - extend a loan
/// - PATCH /api/loans/:id/update - move the due date
///
/// Queries:
/// - GET /api/loans/overdue
/// - GET /api/loans/user/:member_id
/// - GET /api/loans/:id
/// - GET /api/health
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/loans", post(create_loan))
        .route("/api/loans/returns", post(return_book))
        .route("/api/loans/overdue", get(list_overdue))
        .route("/api/loans/user/:member_id", get(list_member_loans))
        .route("/api/loans/:id", get(get_loan))
        .route("/api/loans/:id/update", patch(update_loan))
        .route("/api/loans/:id/extend", put(extend_loan))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
