//! Statistics service

use crate::{
    api::stats::{BookStats, BorrowStats, RequestStats, StatsResponse, UserStats},
    error::AppResult,
    models::profile::Role,
    repository::Repository,
};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Snapshot of library activity for the admin dashboard.
    pub async fn get_stats(&self) -> AppResult<StatsResponse> {
        let total_books = self.repository.books.count().await?;
        let copies_available = self.repository.books.sum_available().await?;

        let pending_requests = self.repository.requests.count_pending().await?;

        let borrows_out = self.repository.borrows.count_out().await?;
        let borrows_overdue = self.repository.borrows.count_overdue().await?;
        let returned_today = self.repository.borrows.count_returned_today().await?;

        let total_users = self.repository.profiles.count().await?;
        let admins = self.repository.profiles.count_by_role(Role::Admin).await?;
        let pending_admin_requests = self.repository.admin_requests.count_pending().await?;

        Ok(StatsResponse {
            books: BookStats {
                total: total_books,
                copies_available,
            },
            requests: RequestStats {
                pending: pending_requests,
            },
            borrows: BorrowStats {
                out: borrows_out,
                overdue: borrows_overdue,
                returned_today,
            },
            users: UserStats {
                total: total_users,
                admins,
                pending_admin_requests,
            },
        })
    }
}
