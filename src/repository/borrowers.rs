//! Borrowers repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::borrower::{Borrower, CreateBorrower, UpdateBorrower},
};

/// Borrower persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BorrowersStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Borrower>>;

    async fn get_by_id(&self, id: i32) -> AppResult<Borrower>;

    async fn create(&self, data: &CreateBorrower, created_at: DateTime<Utc>) -> AppResult<Borrower>;

    async fn update(&self, id: i32, data: &UpdateBorrower) -> AppResult<Borrower>;

    /// Fails with `Conflict` while any loan references the borrower
    async fn delete(&self, id: i32) -> AppResult<()>;
}

#[derive(Clone)]
pub struct BorrowersRepository {
    pool: Pool<Postgres>,
}

impl BorrowersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BorrowersStore for BorrowersRepository {
    async fn list(&self) -> AppResult<Vec<Borrower>> {
        let borrowers = sqlx::query_as::<_, Borrower>("SELECT * FROM borrowers ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(borrowers)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Borrower> {
        sqlx::query_as::<_, Borrower>("SELECT * FROM borrowers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrower with id {} not found", id)))
    }

    async fn create(&self, data: &CreateBorrower, created_at: DateTime<Utc>) -> AppResult<Borrower> {
        let borrower = sqlx::query_as::<_, Borrower>(
            r#"
            INSERT INTO borrowers (name, email, phone, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(borrower)
    }

    async fn update(&self, id: i32, data: &UpdateBorrower) -> AppResult<Borrower> {
        let borrower = sqlx::query_as::<_, Borrower>(
            r#"
            UPDATE borrowers
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.phone)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrower with id {} not found", id)))?;
        Ok(borrower)
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let referenced: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM loans WHERE borrower_id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if referenced {
            return Err(AppError::Conflict(format!(
                "Borrower {} has loans and cannot be deleted",
                id
            )));
        }

        let result = sqlx::query("DELETE FROM borrowers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Borrower with id {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }
}
