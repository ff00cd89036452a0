//! Book catalog service

use std::sync::Arc;

use validator::Validate;

use crate::{
    clock::Clock,
    error::AppResult,
    models::book::{Book, CreateBook, UpdateBook},
    repository::BooksStore,
};

#[derive(Clone)]
pub struct BooksService {
    store: Arc<dyn BooksStore>,
    clock: Arc<dyn Clock>,
}

impl BooksService {
    pub fn new(store: Arc<dyn BooksStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.store.list().await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        self.store.get_by_id(id).await
    }

    pub async fn create(&self, data: &CreateBook) -> AppResult<Book> {
        data.validate()?;
        let book = self.store.create(data, self.clock.now()).await?;
        tracing::info!("Book created: id={} title={:?}", book.id, book.title);
        Ok(book)
    }

    pub async fn update(&self, id: i32, data: &UpdateBook) -> AppResult<Book> {
        data.validate()?;
        self.store.update(id, data).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.store.delete(id).await?;
        tracing::info!("Book deleted: id={}", id);
        Ok(())
    }
}
