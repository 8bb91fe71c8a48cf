use crate::domain::{
    self, ExtendLoanError, Loan, OpenLoanError, ReturnBookError, UpdateLoanError, commands::*,
};
use crate::ports::*;
use std::sync::Arc;
use std::time::Duration;

use super::errors::{LoanApplicationError, Result};
use super::views::ExtendedLoan;

/// Attempts at storing a new loan once its copy is reserved
const MAX_PERSIST_ATTEMPTS: u32 = 3;

/// Pause before the n-th retry is `n * PERSIST_RETRY_BACKOFF`
const PERSIST_RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Service dependencies
///
/// A plain data structure handed to every coordinator function, so all dependencies are
/// explicit and tests can swap any of them.
#[derive(Clone)]
pub struct ServiceDependencies {
    pub loan_repository: Arc<dyn LoanRepository>,
    pub member_service: Arc<dyn MemberService>,
    pub book_service: Arc<dyn BookService>,
}

/// Maps a failed conditional write to a conflict when another request returned the loan first.
///
/// # Returns
/// `InvalidLoanState` for `LoanAlreadyReturned`, `Repository` for any other storage error
fn write_error(err: Box<dyn std::error::Error + Send + Sync>) -> LoanApplicationError {
    if err.downcast_ref::<LoanAlreadyReturned>().is_some() {
        LoanApplicationError::InvalidLoanState("Loan has already been returned".to_string())
    } else {
        LoanApplicationError::Repository(err)
    }
}

/// Discards a unit of work, logging if the rollback itself fails.
///
/// # Arguments
/// * `uow` - unit of work holding writes that must not be committed
///
/// A failed rollback is only logged; the staged writes are discarded when the unit of work
/// is dropped.
async fn abandon(uow: Box<dyn LoanUnitOfWork>) {
    if let Err(e) = uow.rollback().await {
        tracing::error!(error = %e, "failed to roll back loan unit of work");
    }
}

/// Lends a book to a member.
///
/// Saga:
/// 1. member must exist
/// 2. book must exist and have a copy on the shelf
/// 3. loan built in memory
/// 4. copy reserved upstream (escalating; nothing is written locally if this fails)
/// 5. loan stored, with bounded retries; if storing keeps failing the reservation is
///    compensated and the failure surfaces
///
/// A step-4 timeout does not prove the decrement never happened upstream.
pub async fn create_loan(deps: &ServiceDependencies, cmd: CreateLoan) -> Result<Loan> {
    // 1. Member lookup
    deps.member_service
        .get_by_id(cmd.member_id)
        .await?
        .ok_or(LoanApplicationError::MemberNotFound)?;

    // 2. Book lookup and availability
    let book = deps
        .book_service
        .get_by_id(cmd.book_id)
        .await?
        .ok_or(LoanApplicationError::BookNotFound)?;

    if book.available_copies == 0 {
        return Err(LoanApplicationError::BookNotAvailable);
    }

    // 3. Build the loan (pure)
    let loan = domain::loan::open_loan(cmd.member_id, cmd.book_id, cmd.issued_at, cmd.due_date)
        .map_err(|e| match e {
            OpenLoanError::DueBeforeIssue => LoanApplicationError::InvalidDueDate(
                "due date must not be before the issue date".to_string(),
            ),
        })?;

    // 4. Reserve a copy
    deps.book_service
        .mutate_availability(cmd.book_id, AvailabilityOperation::Decrement)
        .await
        .map_err(|e| {
            tracing::warn!(book_id = %cmd.book_id, error = %e, "book reservation failed");
            LoanApplicationError::from(e)
        })?;

    // 5. Store the loan, compensating the reservation if that keeps failing
    if let Err(source) = persist_with_retry(deps.loan_repository.as_ref(), &loan).await {
        let compensated = compensate_reservation(deps, &loan).await;
        return Err(LoanApplicationError::PersistenceFailed {
            compensated,
            source,
        });
    }

    tracing::info!(
        loan_id = %loan.loan_id,
        member_id = %loan.member_id,
        book_id = %loan.book_id,
        "loan created"
    );
    Ok(loan)
}

/// Inserts a new loan, retrying transient storage failures.
///
/// # Arguments
/// * `repository` - loan store
/// * `loan` - loan whose copy is already reserved upstream
///
/// # Errors
/// The error of the last attempt once `MAX_PERSIST_ATTEMPTS` inserts have failed
async fn persist_with_retry(
    repository: &dyn LoanRepository,
    loan: &Loan,
) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut attempt = 1;
    loop {
        match repository.insert(loan).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < MAX_PERSIST_ATTEMPTS => {
                tracing::warn!(
                    loan_id = %loan.loan_id,
                    attempt,
                    error = %e,
                    "storing loan failed, retrying"
                );
                tokio::time::sleep(PERSIST_RETRY_BACKOFF * attempt).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Gives the reserved copy back after the loan could not be stored.
///
/// # Arguments
/// * `deps` - service dependencies (only the book service is used)
/// * `loan` - loan that was never stored
///
/// # Returns
/// `true` when the inventory confirmed the increment. `false` leaves the copy reserved
/// upstream and is logged for reconciliation.
async fn compensate_reservation(deps: &ServiceDependencies, loan: &Loan) -> bool {
    match deps
        .book_service
        .mutate_availability(loan.book_id, AvailabilityOperation::Increment)
        .await
    {
        Ok(_) => {
            tracing::error!(
                loan_id = %loan.loan_id,
                book_id = %loan.book_id,
                operation = "increment",
                "loan not stored after reserving a copy; reservation compensated"
            );
            true
        }
        Err(e) => {
            tracing::error!(
                loan_id = %loan.loan_id,
                book_id = %loan.book_id,
                operation = "increment",
                error = %e,
                "loan not stored and compensation failed; availability needs reconciliation"
            );
            false
        }
    }
}

/// Error for an increment that did not confirm a return.
///
/// The unit of work has been rolled back, so the return can be retried. A refusal from the
/// inventory is therefore reported as unavailability, never as a conflict.
///
/// # Arguments
/// * `err` - failure reported by the book service proxy
///
/// # Returns
/// `Timeout` for timeouts, `ServiceUnavailable` for everything else
fn unconfirmed_return(err: ServiceError) -> LoanApplicationError {
    match err {
        ServiceError::Timeout { operation } => LoanApplicationError::Timeout { operation },
        other => LoanApplicationError::ServiceUnavailable {
            operation: other.operation(),
            source: other,
        },
    }
}

/// Returns a borrowed book.
///
/// The RETURNED transition is staged in a unit of work and committed only after the copy is
/// confirmed back on the shelf. If the increment fails the unit of work is rolled back: the loan
/// keeps its previous status and the call can be retried.
pub async fn return_book(deps: &ServiceDependencies, cmd: ReturnBook) -> Result<Loan> {
    // 1. Unit of work scoped to the loan
    let mut uow = deps
        .loan_repository
        .begin()
        .await
        .map_err(LoanApplicationError::Repository)?;

    // 2. Load and validate
    let loan = uow
        .find_for_update(cmd.loan_id)
        .await
        .map_err(LoanApplicationError::Repository)?
        .ok_or(LoanApplicationError::LoanNotFound)?;

    if let Some(overdue) = domain::loan::mark_overdue(&loan, cmd.returned_at) {
        uow.save(&overdue).await.map_err(write_error)?;
    }

    // 3. Stage RETURNED
    let returned = domain::loan::return_book(&loan, cmd.returned_at).map_err(|e| match e {
        ReturnBookError::NotReturnable(status) => LoanApplicationError::InvalidLoanState(
            format!("Loan cannot be returned from status {}", status),
        ),
    })?;
    uow.save(&returned).await.map_err(write_error)?;

    // 4. Copy back on the shelf
    if let Err(e) = deps
        .book_service
        .mutate_availability(returned.book_id, AvailabilityOperation::Increment)
        .await
    {
        tracing::error!(
            loan_id = %returned.loan_id,
            book_id = %returned.book_id,
            operation = "increment",
            error = %e,
            "book return not confirmed by inventory; loan left unchanged"
        );
        abandon(uow).await;
        return Err(unconfirmed_return(e));
    }

    // 5. Commit
    if let Err(e) = uow.commit().await {
        tracing::error!(
            loan_id = %returned.loan_id,
            book_id = %returned.book_id,
            operation = "increment",
            error = %e,
            "copy returned to inventory but loan not committed; needs reconciliation"
        );
        return Err(LoanApplicationError::Repository(e));
    }

    tracing::info!(loan_id = %returned.loan_id, book_id = %returned.book_id, "book returned");
    Ok(returned)
}

/// Extends a loan by a number of days.
///
/// Allowed from ACTIVE and OVERDUE while fewer than two extensions were granted.
pub async fn extend_loan(deps: &ServiceDependencies, cmd: ExtendLoan) -> Result<ExtendedLoan> {
    let mut uow = deps
        .loan_repository
        .begin()
        .await
        .map_err(LoanApplicationError::Repository)?;

    let loan = uow
        .find_for_update(cmd.loan_id)
        .await
        .map_err(LoanApplicationError::Repository)?
        .ok_or(LoanApplicationError::LoanNotFound)?;

    if let Some(overdue) = domain::loan::mark_overdue(&loan, cmd.extended_at) {
        uow.save(&overdue).await.map_err(write_error)?;
    }

    let extended = domain::loan::extend_loan(&loan, cmd.extension_days, cmd.extended_at)
        .map_err(|e| match e {
            ExtendLoanError::AlreadyReturned => LoanApplicationError::InvalidLoanState(
                "Cannot extend a returned loan".to_string(),
            ),
            ExtendLoanError::ExtensionLimitExceeded { extensions_count } => {
                LoanApplicationError::ExtensionLimitReached { extensions_count }
            }
            ExtendLoanError::InvalidExtensionDays(days) => {
                LoanApplicationError::InvalidExtensionDays(days)
            }
        })?;

    uow.save(&extended).await.map_err(write_error)?;
    uow.commit()
        .await
        .map_err(LoanApplicationError::Repository)?;

    tracing::info!(
        loan_id = %extended.loan_id,
        extensions_count = extended.extension_count.value(),
        "loan extended"
    );
    Ok(ExtendedLoan {
        original_due_date: loan.due_date,
        loan: extended,
    })
}

/// Moves the due date of an open loan.
pub async fn update_loan(deps: &ServiceDependencies, cmd: UpdateLoan) -> Result<Loan> {
    let mut uow = deps
        .loan_repository
        .begin()
        .await
        .map_err(LoanApplicationError::Repository)?;

    let loan = uow
        .find_for_update(cmd.loan_id)
        .await
        .map_err(LoanApplicationError::Repository)?
        .ok_or(LoanApplicationError::LoanNotFound)?;

    let updated = domain::loan::reschedule(&loan, cmd.due_date, cmd.updated_at).map_err(|e| {
        match e {
            UpdateLoanError::AlreadyReturned => LoanApplicationError::InvalidLoanState(
                "Cannot update a returned loan".to_string(),
            ),
            UpdateLoanError::DueBeforeIssue => LoanApplicationError::InvalidDueDate(
                "due date must not be before the issue date".to_string(),
            ),
        }
    })?;

    uow.save(&updated).await.map_err(write_error)?;
    uow.commit()
        .await
        .map_err(LoanApplicationError::Repository)?;

    tracing::info!(loan_id = %updated.loan_id, status = %updated.status, "loan rescheduled");
    Ok(updated)
}
