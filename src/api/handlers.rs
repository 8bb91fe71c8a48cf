use crate::application::{
    health::{HealthReport, check_health},
    loan::{self as loan_app, LoanApplicationError, ServiceDependencies},
};
use crate::domain::{
    commands::{CreateLoan, ExtendLoan, ReturnBook, UpdateLoan},
    value_objects::{BookId, LoanId, MemberId},
};
use crate::resilience::BreakerRegistry;
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    error::ApiError,
    types::{
        CreateLoanRequest, ExtendLoanRequest, LoanDetailsResponse, LoanExtendedResponse,
        LoanResponse, MemberLoanResponse, MemberLoansResponse, OverdueLoanResponse,
        ReturnBookRequest, UpdateLoanRequest,
    },
};

// ============================================================================
// State
// ============================================================================

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
    pub registry: Arc<BreakerRegistry>,
    pub expose_internal_errors: bool,
}

impl AppState {
    fn reject(&self) -> impl Fn(LoanApplicationError) -> ApiError + '_ {
        move |error| ApiError::Application {
            error,
            expose_internal: self.expose_internal_errors,
        }
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

fn path_id(id: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    id.map(|Path(id)| id)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

// ============================================================================
// Command handlers
// ============================================================================

/// POST /api/loans - lend a book
pub async fn create_loan(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateLoanRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let req = body(payload)?;
    let cmd = CreateLoan {
        member_id: MemberId::from_uuid(req.member_id),
        book_id: BookId::from_uuid(req.book_id),
        due_date: req.due_date,
        issued_at: Utc::now(),
    };

    let loan = loan_app::create_loan(&state.service_deps, cmd)
        .await
        .map_err(state.reject())?;

    Ok((StatusCode::CREATED, Json(LoanResponse::from(loan))))
}

/// POST /api/loans/returns - return a book
pub async fn return_book(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReturnBookRequest>, JsonRejection>,
) -> Result<Json<LoanResponse>, ApiError> {
    let req = body(payload)?;
    let cmd = ReturnBook {
        loan_id: LoanId::from_uuid(req.loan_id),
        returned_at: Utc::now(),
    };

    let loan = loan_app::return_book(&state.service_deps, cmd)
        .await
        .map_err(state.reject())?;

    Ok(Json(LoanResponse::from(loan)))
}

/// PUT /api/loans/:id/extend - extend a loan
pub async fn extend_loan(
    State(state): State<Arc<AppState>>,
    loan_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ExtendLoanRequest>, JsonRejection>,
) -> Result<Json<LoanExtendedResponse>, ApiError> {
    let loan_id = path_id(loan_id)?;
    let req = body(payload)?;
    let cmd = ExtendLoan {
        loan_id: LoanId::from_uuid(loan_id),
        extension_days: req.extension_days,
        extended_at: Utc::now(),
    };

    let extended = loan_app::extend_loan(&state.service_deps, cmd)
        .await
        .map_err(state.reject())?;

    Ok(Json(LoanExtendedResponse::from(extended)))
}

/// PATCH /api/loans/:id/update - move the due date
pub async fn update_loan(
    State(state): State<Arc<AppState>>,
    loan_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateLoanRequest>, JsonRejection>,
) -> Result<Json<LoanResponse>, ApiError> {
    let loan_id = path_id(loan_id)?;
    let req = body(payload)?;
    let cmd = UpdateLoan {
        loan_id: LoanId::from_uuid(loan_id),
        due_date: req.due_date,
        updated_at: Utc::now(),
    };

    let loan = loan_app::update_loan(&state.service_deps, cmd)
        .await
        .map_err(state.reject())?;

    Ok(Json(LoanResponse::from(loan)))
}

// ============================================================================
// Query handlers
// ============================================================================

/// GET /api/loans/:id - loan with member and book details
pub async fn get_loan(
    State(state): State<Arc<AppState>>,
    loan_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<LoanDetailsResponse>, ApiError> {
    let loan_id = LoanId::from_uuid(path_id(loan_id)?);

    let details = loan_app::get_loan(&state.service_deps, loan_id, Utc::now())
        .await
        .map_err(state.reject())?;

    Ok(Json(LoanDetailsResponse::from(details)))
}

/// GET /api/loans/user/:member_id - loan history of a member
pub async fn list_member_loans(
    State(state): State<Arc<AppState>>,
    member_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MemberLoansResponse>, ApiError> {
    let member_id = MemberId::from_uuid(path_id(member_id)?);

    let loans = loan_app::list_member_loans(&state.service_deps, member_id, Utc::now())
        .await
        .map_err(state.reject())?;

    let loans: Vec<MemberLoanResponse> = loans.into_iter().map(Into::into).collect();
    Ok(Json(MemberLoansResponse {
        total: loans.len(),
        loans,
    }))
}

/// GET /api/loans/overdue - loans past their due date
pub async fn list_overdue(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<OverdueLoanResponse>>, ApiError> {
    let loans = loan_app::list_overdue(&state.service_deps, Utc::now())
        .await
        .map_err(state.reject())?;

    Ok(Json(loans.into_iter().map(Into::into).collect()))
}

/// GET /api/health - service, upstream and circuit health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(check_health(&state.service_deps, &state.registry, Utc::now()).await)
}
