//! Loan workflow and query service

use std::sync::Arc;

use crate::{
    clock::Clock,
    config::LoansConfig,
    error::{AppError, AppResult},
    models::loan::{
        parse_due_date, BorrowLoan, LoanFilter, LoanQuery, LoanSummary, LoanView, NewLoan,
    },
    repository::LoansStore,
};

#[derive(Clone)]
pub struct LoansService {
    store: Arc<dyn LoansStore>,
    clock: Arc<dyn Clock>,
    config: LoansConfig,
}

impl LoansService {
    pub fn new(store: Arc<dyn LoansStore>, clock: Arc<dyn Clock>, config: LoansConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// List loans, optionally filtered by status, book or borrower
    pub async fn list(&self, query: &LoanQuery) -> AppResult<Vec<LoanView>> {
        let now = self.clock.now();
        self.list_at(LoanFilter::from_query(query, now)).await
    }

    /// List unreturned loans whose due date has passed
    pub async fn list_overdue(&self) -> AppResult<Vec<LoanView>> {
        let now = self.clock.now();
        self.list_at(LoanFilter::overdue(now)).await
    }

    async fn list_at(&self, filter: LoanFilter) -> AppResult<Vec<LoanView>> {
        let now = filter.now;
        let records = self.store.list(&filter).await?;
        Ok(records
            .into_iter()
            .map(|record| LoanView::from_record(record, now))
            .collect())
    }

    /// Get a single loan
    pub async fn get(&self, loan_id: i32) -> AppResult<LoanView> {
        let record = self.store.get_by_id(loan_id).await?;
        Ok(LoanView::from_record(record, self.clock.now()))
    }

    /// Borrow a book
    pub async fn borrow(&self, request: BorrowLoan) -> AppResult<LoanView> {
        let book_id = require_id(request.book_id, "bookId")?;
        let borrower_id = require_id(request.borrower_id, "borrowerId")?;
        let raw_due_date = request
            .due_date
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::Validation("dueDate is required".to_string()))?;
        let due_date = parse_due_date(raw_due_date)?;

        let now = self.clock.now();
        if self.config.require_future_due_date && due_date < now {
            return Err(AppError::Validation(format!(
                "dueDate {} is before the borrow date",
                due_date.format("%Y-%m-%d")
            )));
        }

        let new_loan = NewLoan {
            book_id,
            borrower_id,
            borrowed_at: now,
            due_date,
        };

        let record = self.store.create(&new_loan).await.map_err(|e| {
            tracing::debug!("Borrow of book {} by borrower {} rejected: {}", book_id, borrower_id, e);
            e
        })?;

        tracing::info!(
            loan_id = record.loan.id,
            book_id,
            borrower_id,
            due_date = %due_date,
            "Loan created"
        );

        Ok(LoanView::from_record(record, now))
    }

    /// Return a borrowed book
    pub async fn return_loan(&self, loan_id: i32) -> AppResult<LoanView> {
        let now = self.clock.now();
        let record = self.store.mark_returned(loan_id, now).await?;

        tracing::info!(loan_id, book_id = record.loan.book_id, "Loan returned");

        Ok(LoanView::from_record(record, now))
    }

    /// Loan counts by derived status
    pub async fn summary(&self) -> AppResult<LoanSummary> {
        self.store.summary(self.clock.now()).await
    }
}

fn require_id(value: Option<i32>, field: &str) -> AppResult<i32> {
    match value {
        Some(id) if id > 0 => Ok(id),
        Some(id) => Err(AppError::Validation(format!("{} must be positive, got {}", field, id))),
        None => Err(AppError::Validation(format!("{} is required", field))),
    }
}
