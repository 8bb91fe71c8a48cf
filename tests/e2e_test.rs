use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use library_lending::adapters::mock::MockFailure;
use library_lending::ports::AvailabilityOperation;
use serde_json::{Value, json};
use tower::ServiceExt;

mod common;

use common::TestContext;

// ============================================================================
// Helpers
// ============================================================================

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

fn loan_request(ctx: &TestContext) -> Value {
    let member_id = ctx.members.add_member("Alice");
    let book_id = ctx.books.add_book("Dune", 1);
    json!({
        "member_id": member_id.value(),
        "book_id": book_id.value(),
        "due_date": Utc::now() + Duration::days(14),
    })
}

// ============================================================================
// Full flow
// ============================================================================

#[tokio::test]
async fn test_e2e_full_loan_flow() {
    let ctx = TestContext::new();
    let app = ctx.router();
    let request = loan_request(&ctx);

    // Create
    let (status, created) = send(&app, "POST", "/api/loans", Some(request.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "ACTIVE");
    assert_eq!(created["extensions_count"], 0);
    let loan_id = created["id"].as_str().unwrap().to_string();

    // Second loan of the only copy
    let (status, body) = send(&app, "POST", "/api/loans", Some(request.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "BOOK_NOT_AVAILABLE");
    assert!(body["message"].as_str().unwrap().contains("not available for loan"));

    // Details
    let (status, details) = send(&app, "GET", &format!("/api/loans/{}", loan_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["member"]["name"], "Alice");
    assert_eq!(details["book"]["title"], "Dune");

    // Extend
    let (status, extended) = send(
        &app,
        "PUT",
        &format!("/api/loans/{}/extend", loan_id),
        Some(json!({ "extension_days": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(extended["extensions_count"], 1);
    assert_ne!(extended["original_due_date"], extended["new_due_date"]);

    // Member history
    let member_id = request["member_id"].as_str().unwrap();
    let (status, history) = send(&app, "GET", &format!("/api/loans/user/{}", member_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["total"], 1);
    assert_eq!(history["loans"][0]["id"], loan_id.as_str());

    // Return
    let (status, returned) = send(
        &app,
        "POST",
        "/api/loans/returns",
        Some(json!({ "loan_id": loan_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(returned["status"], "RETURNED");
    assert!(returned["return_date"].is_string());

    // Returning twice conflicts
    let (status, body) = send(
        &app,
        "POST",
        "/api/loans/returns",
        Some(json!({ "loan_id": loan_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "INVALID_LOAN_STATE");
}

// ============================================================================
// Error mapping
// ============================================================================

#[tokio::test]
async fn test_e2e_unknown_loan_is_404() {
    let ctx = TestContext::new();
    let app = ctx.router();

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/loans/{}", uuid::Uuid::new_v4()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "LOAN_NOT_FOUND");
}

#[tokio::test]
async fn test_e2e_malformed_requests_are_400() {
    let ctx = TestContext::new();
    let app = ctx.router();

    let (status, body) = send(&app, "POST", "/api/loans", Some(json!({ "member_id": "nope" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");

    let (status, _) = send(&app, "GET", "/api/loans/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/loans/{}/extend", uuid::Uuid::new_v4()),
        Some(json!({ "extension_days": "seven" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_e2e_out_of_range_extension_is_400() {
    let ctx = TestContext::new();
    let app = ctx.router();
    let (_, created) = send(&app, "POST", "/api/loans", Some(loan_request(&ctx))).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/loans/{}/extend", created["id"].as_str().unwrap()),
        Some(json!({ "extension_days": 1_000_000_000 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_EXTENSION_DAYS");
}

#[tokio::test]
async fn test_e2e_upstream_timeout_is_504() {
    let ctx = TestContext::new();
    let app = ctx.router();
    let request = loan_request(&ctx);
    ctx.books
        .fail_mutations(AvailabilityOperation::Decrement, Some(MockFailure::Timeout));

    let (status, body) = send(&app, "POST", "/api/loans", Some(request)).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"], "UPSTREAM_TIMEOUT");
}

#[tokio::test]
async fn test_e2e_open_circuit_on_return_is_503() {
    let ctx = TestContext::new();
    let app = ctx.router();
    let (_, created) = send(&app, "POST", "/api/loans", Some(loan_request(&ctx))).await;
    ctx.books
        .fail_mutations(AvailabilityOperation::Increment, Some(MockFailure::CircuitOpen));

    let (status, body) = send(
        &app,
        "POST",
        "/api/loans/returns",
        Some(json!({ "loan_id": created["id"] })),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_e2e_internal_error_details_hidden() {
    let ctx = TestContext::new();
    let app = ctx.router();
    let request = loan_request(&ctx);
    ctx.loans.fail_next_inserts(3);

    let (status, body) = send(&app, "POST", "/api/loans", Some(request)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "PERSISTENCE_FAILED");
    assert_eq!(body["message"], "An unexpected error occurred");
}

#[tokio::test]
async fn test_e2e_update_past_due_date_marks_overdue() {
    let ctx = TestContext::new();
    let app = ctx.router();
    let (_, created) = send(&app, "POST", "/api/loans", Some(loan_request(&ctx))).await;
    let loan_id = created["id"].as_str().unwrap();

    // Still after the issue date but already in the past
    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/api/loans/{}/update", loan_id),
        Some(json!({ "due_date": Utc::now() + Duration::milliseconds(1) })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    let (_, overdue) = send(&app, "GET", "/api/loans/overdue", None).await;
    let listed = overdue.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], updated["id"]);
    assert_eq!(listed[0]["status"], "OVERDUE");
    assert_eq!(listed[0]["days_overdue"], 1);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_e2e_health_reports_degraded_dependency() {
    let ctx = TestContext::new();
    let app = ctx.router();

    let (status, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["services"]["loan_service"]["status"], "ok");

    ctx.books.set_reads_down(true);
    let (_, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["services"]["book_service"]["status"], "error");
    assert_eq!(body["services"]["user_service"]["status"], "ok");
    assert!(body["circuits"].is_array());
}
