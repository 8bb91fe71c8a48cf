use crate::domain::{
    Loan,
    value_objects::{LoanId, MemberId},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Loan repository port.
///
/// Loans are stored as plain records, one per loan. Reads go through the repository directly;
/// read-modify-write sequences go through a [`LoanUnitOfWork`] obtained from [`begin`].
///
/// [`begin`]: LoanRepository::begin
#[async_trait]
pub trait LoanRepository: Send + Sync {
    /// Persists a freshly opened loan.
    async fn insert(&self, loan: &Loan) -> Result<()>;

    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>>;

    /// All loans of a member, newest issue date first.
    async fn find_by_member_id(&self, member_id: MemberId) -> Result<Vec<Loan>>;

    /// Non-returned loans whose due date is before `now`, earliest due date first.
    ///
    /// Stored status may still say `ACTIVE`; overdue is derived on read.
    async fn find_overdue_candidates(&self, now: DateTime<Utc>) -> Result<Vec<Loan>>;

    /// Starts a unit of work.
    async fn begin(&self) -> Result<Box<dyn LoanUnitOfWork>>;
}

/// Transaction-scoped access to loan records.
///
/// A loan read with [`find_for_update`] stays locked against concurrent units of work until
/// [`commit`] or [`rollback`]. Dropping without committing discards staged writes.
///
/// [`find_for_update`]: LoanUnitOfWork::find_for_update
/// [`commit`]: LoanUnitOfWork::commit
/// [`rollback`]: LoanUnitOfWork::rollback
#[async_trait]
pub trait LoanUnitOfWork: Send {
    async fn find_for_update(&mut self, loan_id: LoanId) -> Result<Option<Loan>>;

    /// Stages an update of an existing loan.
    ///
    /// Writing a loan that is already `RETURNED` in storage is refused with
    /// [`LoanAlreadyReturned`].
    async fn save(&mut self, loan: &Loan) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Conditional write refused because the stored loan is already returned
#[derive(Debug, thiserror::Error)]
#[error("loan {0} is already returned")]
pub struct LoanAlreadyReturned(pub LoanId);
