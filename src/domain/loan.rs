use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{
    BookId, ExtendLoanError, ExtensionCount, LoanId, MemberId, OpenLoanError,
    ReturnBookError, UpdateLoanError,
};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    /// Lent out, due date not passed
    Active,
    /// Lent out, due date passed
    Overdue,
    /// Terminal
    Returned,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "ACTIVE",
            LoanStatus::Overdue => "OVERDUE",
            LoanStatus::Returned => "RETURNED",
        }
    }

    pub fn is_returned(&self) -> bool {
        matches!(self, LoanStatus::Returned)
    }

    /// Active and overdue loans are the only ones that may still change.
    pub fn is_open(&self) -> bool {
        !self.is_returned()
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(LoanStatus::Active),
            "OVERDUE" => Ok(LoanStatus::Overdue),
            "RETURNED" => Ok(LoanStatus::Returned),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

/// Loan aggregate - one lending of one book to one member.
///
/// Invariants:
/// - `returned_at` is set if and only if `status` is `Returned`
/// - `due_date >= issued_at`
/// - `extension_count <= ExtensionCount::MAX` (enforced by the type)
///
/// Loans are never deleted; a returned loan stays as history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: LoanId,

    // References to aggregates owned by other services (ids only)
    pub member_id: MemberId,
    pub book_id: BookId,

    pub issued_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub extension_count: ExtensionCount,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Pure function: open a new loan.
///
/// The loan starts `Active` with no extensions. No side effects; the caller decides when
/// (and whether) to persist it.
pub fn open_loan(
    member_id: MemberId,
    book_id: BookId,
    issued_at: DateTime<Utc>,
    due_date: DateTime<Utc>,
) -> Result<Loan, OpenLoanError> {
    if due_date < issued_at {
        return Err(OpenLoanError::DueBeforeIssue);
    }

    Ok(Loan {
        loan_id: LoanId::new(),
        member_id,
        book_id,
        issued_at,
        due_date,
        returned_at: None,
        status: LoanStatus::Active,
        extension_count: ExtensionCount::new(),
        created_at: issued_at,
        updated_at: issued_at,
    })
}

/// Pure function: whether the loan is past due at `now`.
pub fn is_overdue(loan: &Loan, now: DateTime<Utc>) -> bool {
    loan.status.is_open() && loan.due_date < now
}

/// Pure function: the loan as it should be seen at `now`.
///
/// Overdue is never swept in the background; readers derive it from the stored due date.
pub fn observe(loan: &Loan, now: DateTime<Utc>) -> Loan {
    match mark_overdue(loan, now) {
        Some(overdue) => overdue,
        None => loan.clone(),
    }
}

/// Pure function: the ACTIVE -> OVERDUE transition.
///
/// Returns `None` when nothing changes, so write paths only persist a real transition.
pub fn mark_overdue(loan: &Loan, now: DateTime<Utc>) -> Option<Loan> {
    if loan.status == LoanStatus::Active && is_overdue(loan, now) {
        Some(Loan {
            status: LoanStatus::Overdue,
            updated_at: now,
            ..loan.clone()
        })
    } else {
        None
    }
}

/// Pure function: extend a loan by `days`.
///
/// Business rules:
/// - returned loans cannot be extended
/// - at most `ExtensionCount::MAX` extensions
/// - an overdue loan may be extended and becomes active again
/// - `days` must be positive and keep the due date within the representable range
pub fn extend_loan(
    loan: &Loan,
    days: i64,
    extended_at: DateTime<Utc>,
) -> Result<Loan, ExtendLoanError> {
    if loan.status.is_returned() {
        return Err(ExtendLoanError::AlreadyReturned);
    }

    let extension_count = loan.extension_count.increment().map_err(|_| {
        ExtendLoanError::ExtensionLimitExceeded {
            extensions_count: loan.extension_count.value(),
        }
    })?;

    if days <= 0 {
        return Err(ExtendLoanError::InvalidExtensionDays(days));
    }
    let due_date = Duration::try_days(days)
        .and_then(|extension| loan.due_date.checked_add_signed(extension))
        .ok_or(ExtendLoanError::InvalidExtensionDays(days))?;

    Ok(Loan {
        due_date,
        extension_count,
        status: LoanStatus::Active,
        updated_at: extended_at,
        ..loan.clone()
    })
}

/// Pure function: return the book.
///
/// Accepted from `Active` and `Overdue`; returning late carries no penalty.
pub fn return_book(loan: &Loan, returned_at: DateTime<Utc>) -> Result<Loan, ReturnBookError> {
    if !loan.status.is_open() {
        return Err(ReturnBookError::NotReturnable(loan.status));
    }

    Ok(Loan {
        returned_at: Some(returned_at),
        status: LoanStatus::Returned,
        updated_at: returned_at,
        ..loan.clone()
    })
}

/// Pure function: move the due date of an open loan.
///
/// The status follows the new due date: already past means overdue.
pub fn reschedule(
    loan: &Loan,
    due_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Loan, UpdateLoanError> {
    if loan.status.is_returned() {
        return Err(UpdateLoanError::AlreadyReturned);
    }
    if due_date < loan.issued_at {
        return Err(UpdateLoanError::DueBeforeIssue);
    }

    let status = if due_date < now {
        LoanStatus::Overdue
    } else {
        LoanStatus::Active
    };

    Ok(Loan {
        due_date,
        status,
        updated_at: now,
        ..loan.clone()
    })
}

/// Pure function: whole days overdue, rounded up. Zero when not past due.
pub fn days_overdue(loan: &Loan, now: DateTime<Utc>) -> i64 {
    let elapsed = (now - loan.due_date).num_milliseconds();
    if elapsed <= 0 {
        return 0;
    }
    (elapsed + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}
