use crate::domain::{
    self,
    value_objects::{LoanId, MemberId},
};
use chrono::{DateTime, Utc};
use futures::future::join_all;

use super::errors::{LoanApplicationError, Result};
use super::loan_service::ServiceDependencies;
use super::views::{LoanDetails, MemberLoan, book_summary, member_summary};

/// Loan with member and book details, status as of `now`.
pub async fn get_loan(
    deps: &ServiceDependencies,
    loan_id: LoanId,
    now: DateTime<Utc>,
) -> Result<LoanDetails> {
    let loan = deps
        .loan_repository
        .get_by_id(loan_id)
        .await
        .map_err(LoanApplicationError::Repository)?
        .ok_or(LoanApplicationError::LoanNotFound)?;

    let (member, book) = futures::join!(
        member_summary(deps, loan.member_id),
        book_summary(deps, loan.book_id)
    );

    Ok(LoanDetails {
        loan: domain::loan::observe(&loan, now),
        member,
        book,
    })
}

/// Loan history of a member, newest first.
pub async fn list_member_loans(
    deps: &ServiceDependencies,
    member_id: MemberId,
    now: DateTime<Utc>,
) -> Result<Vec<MemberLoan>> {
    let loans = deps
        .loan_repository
        .find_by_member_id(member_id)
        .await
        .map_err(LoanApplicationError::Repository)?;

    let books = join_all(loans.iter().map(|loan| book_summary(deps, loan.book_id))).await;

    Ok(loans
        .iter()
        .zip(books)
        .map(|(loan, book)| MemberLoan {
            loan: domain::loan::observe(loan, now),
            book,
        })
        .collect())
}
