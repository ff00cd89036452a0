//! Books repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, CreateBook, UpdateBook},
};

/// Book persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BooksStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Book>>;

    async fn get_by_id(&self, id: i32) -> AppResult<Book>;

    async fn create(&self, data: &CreateBook, created_at: DateTime<Utc>) -> AppResult<Book>;

    async fn update(&self, id: i32, data: &UpdateBook) -> AppResult<Book>;

    /// Fails with `Conflict` while any loan references the book
    async fn delete(&self, id: i32) -> AppResult<()>;
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BooksStore for BooksRepository {
    async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn create(&self, data: &CreateBook, created_at: DateTime<Utc>) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, isbn, published_year, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.author)
        .bind(&data.isbn)
        .bind(data.published_year)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(book)
    }

    async fn update(&self, id: i32, data: &UpdateBook) -> AppResult<Book> {
        let mut sets = Vec::new();
        let mut idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(data.title, "title");
        add_field!(data.author, "author");
        add_field!(data.isbn, "isbn");
        add_field!(data.published_year, "published_year");

        if sets.is_empty() {
            return self.get_by_id(id).await;
        }

        let query = format!("UPDATE books SET {} WHERE id = $1 RETURNING *", sets.join(", "));
        let mut builder = sqlx::query_as::<_, Book>(&query).bind(id);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.title);
        bind_field!(data.author);
        bind_field!(data.isbn);
        bind_field!(data.published_year);

        builder
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let referenced: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM loans WHERE book_id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if referenced {
            return Err(AppError::Conflict(format!(
                "Book {} has loans and cannot be deleted",
                id
            )));
        }

        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }
}
