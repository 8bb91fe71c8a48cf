use crate::domain::{
    Loan,
    value_objects::{BookId, MemberId},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::loan_service::ServiceDependencies;

const UNKNOWN: &str = "Unknown";

/// Member as shown next to a loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberSummary {
    pub id: MemberId,
    pub name: String,
    pub email: String,
}

impl MemberSummary {
    fn unknown(id: MemberId) -> Self {
        Self {
            id,
            name: UNKNOWN.to_string(),
            email: UNKNOWN.to_string(),
        }
    }
}

/// Book as shown next to a loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookSummary {
    pub id: BookId,
    pub title: String,
    pub author: String,
}

impl BookSummary {
    fn unknown(id: BookId) -> Self {
        Self {
            id,
            title: UNKNOWN.to_string(),
            author: UNKNOWN.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoanDetails {
    pub loan: Loan,
    pub member: MemberSummary,
    pub book: BookSummary,
}

#[derive(Debug, Clone)]
pub struct MemberLoan {
    pub loan: Loan,
    pub book: BookSummary,
}

#[derive(Debug, Clone)]
pub struct OverdueLoan {
    pub loan: Loan,
    pub member: MemberSummary,
    pub book: BookSummary,
    pub days_overdue: i64,
}

/// Result of an extension: the updated loan and the due date it replaced
#[derive(Debug, Clone)]
pub struct ExtendedLoan {
    pub loan: Loan,
    pub original_due_date: DateTime<Utc>,
}

/// Looks the member up for display; an unreachable or unknown member becomes a placeholder.
pub(super) async fn member_summary(deps: &ServiceDependencies, id: MemberId) -> MemberSummary {
    match deps.member_service.get_by_id(id).await {
        Ok(Some(member)) => MemberSummary {
            id,
            name: member.name,
            email: member.email,
        },
        Ok(None) => MemberSummary::unknown(id),
        Err(e) => {
            tracing::warn!(member_id = %id, error = %e, "member lookup failed, using placeholder");
            MemberSummary::unknown(id)
        }
    }
}

/// Looks the book up for display; an unreachable or unknown book becomes a placeholder.
pub(super) async fn book_summary(deps: &ServiceDependencies, id: BookId) -> BookSummary {
    match deps.book_service.get_by_id(id).await {
        Ok(Some(book)) => BookSummary {
            id,
            title: book.title,
            author: book.author,
        },
        Ok(None) => BookSummary::unknown(id),
        Err(e) => {
            tracing::warn!(book_id = %id, error = %e, "book lookup failed, using placeholder");
            BookSummary::unknown(id)
        }
    }
}
