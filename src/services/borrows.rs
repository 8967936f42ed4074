//! Borrow ledger service

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::borrow::{BorrowRecord, BorrowWithBook, BorrowWithContext},
    repository::Repository,
};

#[derive(Clone)]
pub struct BorrowsService {
    repository: Repository,
}

impl BorrowsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Return a borrowed book. Borrowers may return their own; admins may
    /// return anyone's.
    pub async fn return_borrow(
        &self,
        borrow_id: Uuid,
        actor_id: Uuid,
        actor_is_admin: bool,
    ) -> AppResult<BorrowRecord> {
        let record = self.repository.borrows.get_by_id(borrow_id).await?;

        if record.user_id != actor_id && !actor_is_admin {
            return Err(AppError::Authorization(
                "You can only return your own borrows".to_string(),
            ));
        }

        self.repository
            .borrows
            .return_borrow(borrow_id, actor_id)
            .await
    }

    /// The caller's borrow records, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<BorrowWithBook>> {
        self.repository.borrows.list_for_user(user_id).await
    }

    /// Every borrow record with context (admin)
    pub async fn list_all(&self) -> AppResult<Vec<BorrowWithContext>> {
        self.repository.borrows.list_all().await
    }
}
