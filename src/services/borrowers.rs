//! Borrower management service

use std::sync::Arc;

use validator::Validate;

use crate::{
    clock::Clock,
    error::AppResult,
    models::borrower::{Borrower, CreateBorrower, UpdateBorrower},
    repository::BorrowersStore,
};

#[derive(Clone)]
pub struct BorrowersService {
    store: Arc<dyn BorrowersStore>,
    clock: Arc<dyn Clock>,
}

impl BorrowersService {
    pub fn new(store: Arc<dyn BorrowersStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn list(&self) -> AppResult<Vec<Borrower>> {
        self.store.list().await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Borrower> {
        self.store.get_by_id(id).await
    }

    pub async fn create(&self, data: &CreateBorrower) -> AppResult<Borrower> {
        data.validate()?;
        let borrower = self.store.create(data, self.clock.now()).await?;
        tracing::info!("Borrower created: id={}", borrower.id);
        Ok(borrower)
    }

    pub async fn update(&self, id: i32, data: &UpdateBorrower) -> AppResult<Borrower> {
        data.validate()?;
        self.store.update(id, data).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.store.delete(id).await?;
        tracing::info!("Borrower deleted: id={}", id);
        Ok(())
    }
}
