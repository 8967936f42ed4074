//! Repository layer for database operations

pub mod admin_requests;
pub mod books;
pub mod borrows;
pub mod notifications;
pub mod profiles;
pub mod requests;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub profiles: profiles::ProfilesRepository,
    pub books: books::BooksRepository,
    pub requests: requests::RequestsRepository,
    pub borrows: borrows::BorrowsRepository,
    pub admin_requests: admin_requests::AdminRequestsRepository,
    pub notifications: notifications::NotificationsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            profiles: profiles::ProfilesRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            requests: requests::RequestsRepository::new(pool.clone()),
            borrows: borrows::BorrowsRepository::new(pool.clone()),
            admin_requests: admin_requests::AdminRequestsRepository::new(pool.clone()),
            notifications: notifications::NotificationsRepository::new(pool.clone()),
            pool,
        }
    }
}
