//! Loans repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::loan::{LoanFilter, LoanRecord, LoanStatus, LoanSummary, NewLoan},
};

const SELECT_LOAN_RECORD: &str = r#"
    SELECT l.id, l.book_id, l.borrower_id, l.borrowed_at, l.due_date, l.returned_at,
           b.title AS book_title, b.author AS book_author,
           br.name AS borrower_name
    FROM loans l
    JOIN books b ON b.id = l.book_id
    JOIN borrowers br ON br.id = l.borrower_id
"#;

/// Loan persistence.
///
/// `create` and `mark_returned` are each atomic: the precondition checks and
/// the write happen in one transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoansStore: Send + Sync {
    /// Loans matching `filter`, oldest first
    async fn list(&self, filter: &LoanFilter) -> AppResult<Vec<LoanRecord>>;

    async fn get_by_id(&self, id: i32) -> AppResult<LoanRecord>;

    /// NotFound for an unknown book or borrower, Conflict when the book is
    /// already out on an unreturned loan.
    async fn create(&self, loan: &NewLoan) -> AppResult<LoanRecord>;

    /// NotFound for an unknown loan, Conflict when it was already returned.
    async fn mark_returned(&self, id: i32, returned_at: DateTime<Utc>) -> AppResult<LoanRecord>;

    async fn summary(&self, now: DateTime<Utc>) -> AppResult<LoanSummary>;
}

/// A value bound to a placeholder of the listing query
#[derive(Debug, Clone, Copy, PartialEq)]
enum ListBind {
    Now(DateTime<Utc>),
    BookId(i32),
    BorrowerId(i32),
}

/// Listing SQL for `filter` with its binds in placeholder order
fn list_query(filter: &LoanFilter) -> (String, Vec<ListBind>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    match filter.status {
        Some(LoanStatus::Active) => {
            binds.push(ListBind::Now(filter.now));
            conditions.push(format!("l.returned_at IS NULL AND l.due_date >= ${}", binds.len()));
        }
        Some(LoanStatus::Overdue) => {
            binds.push(ListBind::Now(filter.now));
            conditions.push(format!("l.returned_at IS NULL AND l.due_date < ${}", binds.len()));
        }
        Some(LoanStatus::Returned) => conditions.push("l.returned_at IS NOT NULL".to_string()),
        None => {}
    }
    if let Some(book_id) = filter.book_id {
        binds.push(ListBind::BookId(book_id));
        conditions.push(format!("l.book_id = ${}", binds.len()));
    }
    if let Some(borrower_id) = filter.borrower_id {
        binds.push(ListBind::BorrowerId(borrower_id));
        conditions.push(format!("l.borrower_id = ${}", binds.len()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (format!("{} {} ORDER BY l.id", SELECT_LOAN_RECORD, where_clause), binds)
}

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoansStore for LoansRepository {
    async fn list(&self, filter: &LoanFilter) -> AppResult<Vec<LoanRecord>> {
        let (query, binds) = list_query(filter);

        let mut builder = sqlx::query_as::<_, LoanRecord>(&query);
        for bind in binds {
            builder = match bind {
                ListBind::Now(now) => builder.bind(now),
                ListBind::BookId(id) | ListBind::BorrowerId(id) => builder.bind(id),
            };
        }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<LoanRecord> {
        sqlx::query_as::<_, LoanRecord>(&format!("{} WHERE l.id = $1", SELECT_LOAN_RECORD))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    async fn create(&self, loan: &NewLoan) -> AppResult<LoanRecord> {
        let mut tx = self.pool.begin().await?;

        // Lock the book row so concurrent borrows of the same book serialize here
        let book: Option<i32> = sqlx::query_scalar("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(loan.book_id)
            .fetch_optional(&mut *tx)
            .await?;
        if book.is_none() {
            return Err(AppError::NotFound(format!("Book with id {} not found", loan.book_id)));
        }

        let borrower: Option<i32> =
            sqlx::query_scalar("SELECT id FROM borrowers WHERE id = $1 FOR SHARE")
                .bind(loan.borrower_id)
                .fetch_optional(&mut *tx)
                .await?;
        if borrower.is_none() {
            return Err(AppError::NotFound(format!(
                "Borrower with id {} not found",
                loan.borrower_id
            )));
        }

        let already_borrowed: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE book_id = $1 AND returned_at IS NULL)",
        )
        .bind(loan.book_id)
        .fetch_one(&mut *tx)
        .await?;
        if already_borrowed {
            return Err(AppError::Conflict(format!(
                "Book {} is already on loan",
                loan.book_id
            )));
        }

        let loan_id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO loans (book_id, borrower_id, borrowed_at, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(loan.book_id)
        .bind(loan.borrower_id)
        .bind(loan.borrowed_at)
        .bind(loan.due_date)
        .fetch_one(&mut *tx)
        .await?;

        let record =
            sqlx::query_as::<_, LoanRecord>(&format!("{} WHERE l.id = $1", SELECT_LOAN_RECORD))
                .bind(loan_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(record)
    }

    async fn mark_returned(&self, id: i32, returned_at: DateTime<Utc>) -> AppResult<LoanRecord> {
        let mut tx = self.pool.begin().await?;

        // returned_at is only ever written once
        let updated: Option<i32> = sqlx::query_scalar(
            "UPDATE loans SET returned_at = $2 WHERE id = $1 AND returned_at IS NULL RETURNING id",
        )
        .bind(id)
        .bind(returned_at)
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM loans WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
            return Err(if exists {
                AppError::Conflict(format!("Loan {} was already returned", id))
            } else {
                AppError::NotFound(format!("Loan with id {} not found", id))
            });
        }

        let record = sqlx::query_as::<_, LoanRecord>(&format!("{} WHERE l.id = $1", SELECT_LOAN_RECORD))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(record)
    }

    async fn summary(&self, now: DateTime<Utc>) -> AppResult<LoanSummary> {
        let summary = sqlx::query_as::<_, LoanSummary>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE returned_at IS NULL AND due_date >= $1) AS active,
                   COUNT(*) FILTER (WHERE returned_at IS NULL AND due_date < $1) AS overdue,
                   COUNT(*) FILTER (WHERE returned_at IS NOT NULL) AS returned
            FROM loans
            "#,
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(summary)
    }
}
