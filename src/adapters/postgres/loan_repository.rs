use crate::domain::{
    Loan, LoanStatus,
    value_objects::{BookId, ExtensionCount, LoanId, MemberId},
};
use crate::ports::loan_repository::{
    LoanAlreadyReturned, LoanRepository as LoanRepositoryTrait, LoanUnitOfWork, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use std::str::FromStr;

const SELECT_LOAN: &str = r#"
    SELECT
        loan_id,
        member_id,
        book_id,
        issued_at,
        due_date,
        returned_at,
        status,
        extension_count,
        created_at,
        updated_at
    FROM loans
"#;

fn invalid_data(message: String) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}

/// Converts a `loans` row back into a domain loan.
fn map_row_to_loan(row: &PgRow) -> Result<Loan> {
    let extension_count: i16 = row.try_get("extension_count")?;
    let extension_count = u8::try_from(extension_count)
        .ok()
        .and_then(|n| ExtensionCount::try_from(n).ok())
        .ok_or_else(|| invalid_data(format!("extension_count out of range: {}", extension_count)))?;

    let status: &str = row.try_get("status")?;
    let status = LoanStatus::from_str(status).map_err(invalid_data)?;

    Ok(Loan {
        loan_id: LoanId::from_uuid(row.try_get("loan_id")?),
        member_id: MemberId::from_uuid(row.try_get("member_id")?),
        book_id: BookId::from_uuid(row.try_get("book_id")?),
        issued_at: row.try_get("issued_at")?,
        due_date: row.try_get("due_date")?,
        returned_at: row.try_get("returned_at")?,
        status,
        extension_count,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// PostgreSQL loan repository
pub struct LoanRepository {
    pool: PgPool,
}

impl LoanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the migrations under `migrations/`.
    pub async fn migrate(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl LoanRepositoryTrait for LoanRepository {
    async fn insert(&self, loan: &Loan) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO loans (
                loan_id,
                member_id,
                book_id,
                issued_at,
                due_date,
                returned_at,
                status,
                extension_count,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(loan.loan_id.value())
        .bind(loan.member_id.value())
        .bind(loan.book_id.value())
        .bind(loan.issued_at)
        .bind(loan.due_date)
        .bind(loan.returned_at)
        .bind(loan.status.as_str())
        .bind(loan.extension_count.value() as i16)
        .bind(loan.created_at)
        .bind(loan.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(&format!("{} WHERE loan_id = $1", SELECT_LOAN))
            .bind(loan_id.value())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    async fn find_by_member_id(&self, member_id: MemberId) -> Result<Vec<Loan>> {
        let rows = sqlx::query(&format!(
            "{} WHERE member_id = $1 ORDER BY issued_at DESC",
            SELECT_LOAN
        ))
        .bind(member_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_loan).collect()
    }

    async fn find_overdue_candidates(&self, now: DateTime<Utc>) -> Result<Vec<Loan>> {
        let rows = sqlx::query(&format!(
            "{} WHERE status <> 'RETURNED' AND due_date < $1 ORDER BY due_date ASC",
            SELECT_LOAN
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_loan).collect()
    }

    async fn begin(&self) -> Result<Box<dyn LoanUnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(UnitOfWork { tx }))
    }
}

/// Unit of work backed by a database transaction.
///
/// Rows read through `find_for_update` are locked with `FOR UPDATE` until the transaction
/// ends. Dropping the unit of work without committing rolls the transaction back.
struct UnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LoanUnitOfWork for UnitOfWork {
    async fn find_for_update(&mut self, loan_id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(&format!("{} WHERE loan_id = $1 FOR UPDATE", SELECT_LOAN))
            .bind(loan_id.value())
            .fetch_optional(&mut *self.tx)
            .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    async fn save(&mut self, loan: &Loan) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE loans SET
                due_date = $2,
                returned_at = $3,
                status = $4,
                extension_count = $5,
                updated_at = $6
            WHERE loan_id = $1 AND status <> 'RETURNED'
            "#,
        )
        .bind(loan.loan_id.value())
        .bind(loan.due_date)
        .bind(loan.returned_at)
        .bind(loan.status.as_str())
        .bind(loan.extension_count.value() as i16)
        .bind(loan.updated_at)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Box::new(LoanAlreadyReturned(loan.loan_id)));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
