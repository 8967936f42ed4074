//! Catalog management service

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books with filters and pagination
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query).await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: Uuid) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a new book
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()?;
        self.repository.books.create(&book).await
    }

    /// Update a book
    pub async fn update_book(&self, id: Uuid, update: UpdateBook) -> AppResult<Book> {
        update.validate()?;
        self.repository.books.update(id, &update).await
    }

    /// Delete a book
    pub async fn delete_book(&self, id: Uuid) -> AppResult<()> {
        self.repository.books.delete(id).await
    }

    /// Repair drifted availability counters from the ledger
    pub async fn reconcile_availability(&self) -> AppResult<u64> {
        let corrected = self.repository.books.reconcile_availability().await?;
        if corrected > 0 {
            tracing::warn!(corrected, "Availability counters reconciled from ledger");
        }
        Ok(corrected)
    }
}
