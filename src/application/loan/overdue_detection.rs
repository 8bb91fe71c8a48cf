use crate::domain;
use chrono::{DateTime, Utc};
use futures::future::join_all;

use super::errors::{LoanApplicationError, Result};
use super::loan_service::ServiceDependencies;
use super::views::{OverdueLoan, book_summary, member_summary};

/// Lists loans past their due date at `now`, earliest due date first.
///
/// Overdue is derived here, not by a background job: stored ACTIVE loans whose due date has
/// passed are reported as OVERDUE without being written back.
pub async fn list_overdue(deps: &ServiceDependencies, now: DateTime<Utc>) -> Result<Vec<OverdueLoan>> {
    let mut candidates = deps
        .loan_repository
        .find_overdue_candidates(now)
        .await
        .map_err(LoanApplicationError::Repository)?;

    candidates.retain(|loan| domain::loan::is_overdue(loan, now));
    candidates.sort_by(|a, b| a.due_date.cmp(&b.due_date));

    let enriched = join_all(candidates.iter().map(|loan| async move {
        futures::join!(
            member_summary(deps, loan.member_id),
            book_summary(deps, loan.book_id)
        )
    }))
    .await;

    Ok(candidates
        .iter()
        .zip(enriched)
        .map(|(loan, (member, book))| OverdueLoan {
            loan: domain::loan::observe(loan, now),
            member,
            book,
            days_overdue: domain::loan::days_overdue(loan, now),
        })
        .collect())
}
