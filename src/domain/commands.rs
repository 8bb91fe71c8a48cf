use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, LoanId, MemberId};

/// Command: lend a book to a member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLoan {
    pub member_id: MemberId,
    pub book_id: BookId,
    pub due_date: DateTime<Utc>,
    pub issued_at: DateTime<Utc>,
}

/// Command: extend a loan by a number of days
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendLoan {
    pub loan_id: LoanId,
    pub extension_days: i64,
    pub extended_at: DateTime<Utc>,
}

/// Command: return a borrowed book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnBook {
    pub loan_id: LoanId,
    pub returned_at: DateTime<Utc>,
}

/// Command: move a loan's due date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateLoan {
    pub loan_id: LoanId,
    pub due_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
