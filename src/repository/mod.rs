//! Repository layer for database operations
//!
//! Each entity has a store trait consumed by the services and a PostgreSQL
//! implementation backed by the shared pool.

pub mod books;
pub mod borrowers;
pub mod loans;

use sqlx::{Pool, Postgres};

pub use books::{BooksRepository, BooksStore};
pub use borrowers::{BorrowersRepository, BorrowersStore};
pub use loans::{LoansRepository, LoansStore};

/// PostgreSQL stores sharing one connection pool
#[derive(Clone)]
pub struct Repository {
    pub books: BooksRepository,
    pub borrowers: BorrowersRepository,
    pub loans: LoansRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: BooksRepository::new(pool.clone()),
            borrowers: BorrowersRepository::new(pool.clone()),
            loans: LoansRepository::new(pool),
        }
    }
}
