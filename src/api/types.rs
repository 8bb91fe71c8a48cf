use crate::application::loan::{
    BookSummary, ExtendedLoan, LoanDetails, MemberLoan, MemberSummary, OverdueLoan,
};
use crate::domain::{Loan, LoanStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Requests
// ============================================================================

/// POST /api/loans
#[derive(Debug, Deserialize)]
pub struct CreateLoanRequest {
    pub member_id: Uuid,
    pub book_id: Uuid,
    pub due_date: DateTime<Utc>,
}

/// POST /api/loans/returns
#[derive(Debug, Deserialize)]
pub struct ReturnBookRequest {
    pub loan_id: Uuid,
}

/// PATCH /api/loans/:id/update
#[derive(Debug, Deserialize)]
pub struct UpdateLoanRequest {
    pub due_date: DateTime<Utc>,
}

/// PUT /api/loans/:id/extend
#[derive(Debug, Deserialize)]
pub struct ExtendLoanRequest {
    pub extension_days: i64,
}

// ============================================================================
// Responses
// ============================================================================

/// A loan record without enrichment (create, return, update)
#[derive(Debug, Serialize)]
pub struct LoanResponse {
    pub id: Uuid,
    pub member_id: Uuid,
    pub book_id: Uuid,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub extensions_count: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Loan> for LoanResponse {
    fn from(loan: Loan) -> Self {
        Self {
            id: loan.loan_id.value(),
            member_id: loan.member_id.value(),
            book_id: loan.book_id.value(),
            issue_date: loan.issued_at,
            due_date: loan.due_date,
            return_date: loan.returned_at,
            status: loan.status,
            extensions_count: loan.extension_count.value(),
            created_at: loan.created_at,
            updated_at: loan.updated_at,
        }
    }
}

/// GET /api/loans/:id
///
/// Shape read back by the lending proxy as a `LoanRecord`.
#[derive(Debug, Serialize)]
pub struct LoanDetailsResponse {
    pub id: Uuid,
    pub member: MemberSummary,
    pub book: BookSummary,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub extensions_count: u8,
}

impl From<LoanDetails> for LoanDetailsResponse {
    fn from(details: LoanDetails) -> Self {
        let loan = details.loan;
        Self {
            id: loan.loan_id.value(),
            member: details.member,
            book: details.book,
            issue_date: loan.issued_at,
            due_date: loan.due_date,
            return_date: loan.returned_at,
            status: loan.status,
            extensions_count: loan.extension_count.value(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MemberLoanResponse {
    pub id: Uuid,
    pub book: BookSummary,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub extensions_count: u8,
}

impl From<MemberLoan> for MemberLoanResponse {
    fn from(entry: MemberLoan) -> Self {
        let loan = entry.loan;
        Self {
            id: loan.loan_id.value(),
            book: entry.book,
            issue_date: loan.issued_at,
            due_date: loan.due_date,
            return_date: loan.returned_at,
            status: loan.status,
            extensions_count: loan.extension_count.value(),
        }
    }
}

/// GET /api/loans/user/:member_id
#[derive(Debug, Serialize)]
pub struct MemberLoansResponse {
    pub loans: Vec<MemberLoanResponse>,
    pub total: usize,
}

/// GET /api/loans/overdue
#[derive(Debug, Serialize)]
pub struct OverdueLoanResponse {
    pub id: Uuid,
    pub member: MemberSummary,
    pub book: BookSummary,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub status: LoanStatus,
    pub days_overdue: i64,
}

impl From<OverdueLoan> for OverdueLoanResponse {
    fn from(entry: OverdueLoan) -> Self {
        Self {
            id: entry.loan.loan_id.value(),
            member: entry.member,
            book: entry.book,
            issue_date: entry.loan.issued_at,
            due_date: entry.loan.due_date,
            status: entry.loan.status,
            days_overdue: entry.days_overdue,
        }
    }
}

/// PUT /api/loans/:id/extend
#[derive(Debug, Serialize)]
pub struct LoanExtendedResponse {
    pub id: Uuid,
    pub book_id: Uuid,
    pub status: LoanStatus,
    pub original_due_date: DateTime<Utc>,
    pub new_due_date: DateTime<Utc>,
    pub extensions_count: u8,
}

impl From<ExtendedLoan> for LoanExtendedResponse {
    fn from(extended: ExtendedLoan) -> Self {
        Self {
            id: extended.loan.loan_id.value(),
            book_id: extended.loan.book_id.value(),
            status: extended.loan.status,
            original_due_date: extended.original_due_date,
            new_due_date: extended.loan.due_date,
            extensions_count: extended.loan.extension_count.value(),
        }
    }
}

/// Error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
