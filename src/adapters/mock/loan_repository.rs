use crate::domain::{
    Loan,
    value_objects::{LoanId, MemberId},
};
use crate::ports::loan_repository::{
    LoanAlreadyReturned, LoanRepository as LoanRepositoryTrait, LoanUnitOfWork, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};

type Table = HashMap<LoanId, Loan>;

/// In-memory loan repository.
///
/// A unit of work holds the whole table lock until it commits or rolls back, so units of
/// work are serialized. Staged writes become visible only on commit.
pub struct LoanRepository {
    loans: Arc<Mutex<Table>>,
    failing_inserts: AtomicUsize,
    insert_attempts: AtomicUsize,
}

impl LoanRepository {
    pub fn new() -> Self {
        Self {
            loans: Arc::new(Mutex::new(HashMap::new())),
            failing_inserts: AtomicUsize::new(0),
            insert_attempts: AtomicUsize::new(0),
        }
    }

    /// Makes the next `count` inserts fail
    pub fn fail_next_inserts(&self, count: usize) {
        self.failing_inserts.store(count, Ordering::SeqCst);
    }

    pub fn insert_attempts(&self) -> usize {
        self.insert_attempts.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.loans.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.loans.lock().await.is_empty()
    }

    /// Stores a loan as-is, bypassing the saga (test fixtures).
    pub async fn put(&self, loan: Loan) {
        self.loans.lock().await.insert(loan.loan_id, loan);
    }
}

impl Default for LoanRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoanRepositoryTrait for LoanRepository {
    async fn insert(&self, loan: &Loan) -> Result<()> {
        self.insert_attempts.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .failing_inserts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err("connection reset by peer".into());
        }

        let mut loans = self.loans.lock().await;
        if loans.contains_key(&loan.loan_id) {
            return Err(format!("duplicate loan id {}", loan.loan_id).into());
        }
        loans.insert(loan.loan_id, loan.clone());
        Ok(())
    }

    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        Ok(self.loans.lock().await.get(&loan_id).cloned())
    }

    async fn find_by_member_id(&self, member_id: MemberId) -> Result<Vec<Loan>> {
        let mut loans: Vec<Loan> = self
            .loans
            .lock()
            .await
            .values()
            .filter(|loan| loan.member_id == member_id)
            .cloned()
            .collect();
        loans.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        Ok(loans)
    }

    async fn find_overdue_candidates(&self, now: DateTime<Utc>) -> Result<Vec<Loan>> {
        let mut loans: Vec<Loan> = self
            .loans
            .lock()
            .await
            .values()
            .filter(|loan| loan.status.is_open() && loan.due_date < now)
            .cloned()
            .collect();
        loans.sort_by(|a, b| a.due_date.cmp(&b.due_date));
        Ok(loans)
    }

    async fn begin(&self) -> Result<Box<dyn LoanUnitOfWork>> {
        let guard = self.loans.clone().lock_owned().await;
        Ok(Box::new(UnitOfWork {
            table: guard,
            staged: HashMap::new(),
        }))
    }
}

struct UnitOfWork {
    table: OwnedMutexGuard<Table>,
    staged: Table,
}

#[async_trait]
impl LoanUnitOfWork for UnitOfWork {
    async fn find_for_update(&mut self, loan_id: LoanId) -> Result<Option<Loan>> {
        Ok(self
            .staged
            .get(&loan_id)
            .or_else(|| self.table.get(&loan_id))
            .cloned())
    }

    async fn save(&mut self, loan: &Loan) -> Result<()> {
        match self.table.get(&loan.loan_id) {
            None => Err(format!("loan {} does not exist", loan.loan_id).into()),
            Some(stored) if stored.status.is_returned() => {
                Err(Box::new(LoanAlreadyReturned(loan.loan_id)))
            }
            Some(_) => {
                self.staged.insert(loan.loan_id, loan.clone());
                Ok(())
            }
        }
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let UnitOfWork { mut table, staged } = *self;
        table.extend(staged);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
