//! Business logic services

pub mod books;
pub mod borrowers;
pub mod loans;

use std::sync::Arc;

use crate::{
    clock::Clock,
    config::LoansConfig,
    repository::{BooksStore, BorrowersStore, LoansStore, Repository},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub borrowers: borrowers::BorrowersService,
    pub loans: loans::LoansService,
}

impl Services {
    /// Create all services on top of the PostgreSQL repository
    pub fn new(repository: Repository, loans_config: LoansConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_stores(
            Arc::new(repository.books),
            Arc::new(repository.borrowers),
            Arc::new(repository.loans),
            loans_config,
            clock,
        )
    }

    /// Create all services on top of arbitrary store implementations
    pub fn with_stores(
        books: Arc<dyn BooksStore>,
        borrowers: Arc<dyn BorrowersStore>,
        loans: Arc<dyn LoansStore>,
        loans_config: LoansConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            books: books::BooksService::new(books, clock.clone()),
            borrowers: borrowers::BorrowersService::new(borrowers, clock.clone()),
            loans: loans::LoansService::new(loans, clock, loans_config),
        }
    }
}
