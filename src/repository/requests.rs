//! Borrow requests repository for database operations

use chrono::{Duration, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::{is_foreign_key_violation, is_unique_violation, AppError, AppResult},
    models::{
        book::BookSummary,
        borrow::BorrowRecord,
        profile::ProfileSummary,
        request::{BorrowRequest, RequestStatus, RequestWithBook, RequestWithContext},
    },
};

#[derive(Clone)]
pub struct RequestsRepository {
    pool: Pool<Postgres>,
}

impl RequestsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Whether the user already has a pending request for this book
    pub async fn has_pending(&self, user_id: Uuid, book_id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM requests WHERE user_id = $1 AND book_id = $2 AND status = 'pending')",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Insert a pending request. The partial unique index on
    /// (user_id, book_id) over pending rows backstops the advisory check, so
    /// a concurrent duplicate surfaces here as a unique violation.
    pub async fn create(&self, user_id: Uuid, book_id: Uuid) -> AppResult<BorrowRequest> {
        let result = sqlx::query_as::<_, BorrowRequest>(
            r#"
            INSERT INTO requests (id, user_id, book_id, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(request) => Ok(request),
            Err(err) if is_unique_violation(&err) => Err(AppError::Duplicate(
                "You already have a pending request for this book".to_string(),
            )),
            Err(err) if is_foreign_key_violation(&err) => {
                Err(AppError::NotFound("User profile or book not found".to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Requests of one user, newest first, with their books
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<RequestWithBook>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.status, r.requested_at, r.reviewed_at, r.rejection_reason, r.cancelled_at,
                   b.id AS book_id, b.title, b.author, b.category, b.isbn, b.cover_url
            FROM requests r
            JOIN books b ON r.book_id = b.id
            WHERE r.user_id = $1
            ORDER BY r.requested_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::new();
        for row in rows {
            result.push(RequestWithBook {
                id: row.get("id"),
                status: row.get("status"),
                requested_at: row.get("requested_at"),
                reviewed_at: row.get("reviewed_at"),
                rejection_reason: row.get("rejection_reason"),
                cancelled_at: row.get("cancelled_at"),
                book: BookSummary {
                    id: row.get("book_id"),
                    title: row.get("title"),
                    author: row.get("author"),
                    category: row.get("category"),
                    isbn: row.get("isbn"),
                    cover_url: row.get("cover_url"),
                },
            });
        }

        Ok(result)
    }

    /// All requests, newest first, optionally filtered by status
    pub async fn list_all(
        &self,
        status: Option<RequestStatus>,
    ) -> AppResult<Vec<RequestWithContext>> {
        let base = r#"
            SELECT r.id, r.status, r.requested_at, r.reviewed_at, r.rejection_reason, r.cancelled_at,
                   b.id AS book_id, b.title, b.author, b.category, b.isbn, b.cover_url,
                   p.id AS profile_id, p.name, p.username, p.email, p.department
            FROM requests r
            JOIN books b ON r.book_id = b.id
            JOIN profiles p ON r.user_id = p.id
        "#;

        let rows = match status {
            Some(status) => {
                sqlx::query(&format!(
                    "{} WHERE r.status = $1 ORDER BY r.requested_at DESC",
                    base
                ))
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!("{} ORDER BY r.requested_at DESC", base))
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let mut result = Vec::new();
        for row in rows {
            result.push(RequestWithContext {
                id: row.get("id"),
                status: row.get("status"),
                requested_at: row.get("requested_at"),
                reviewed_at: row.get("reviewed_at"),
                rejection_reason: row.get("rejection_reason"),
                cancelled_at: row.get("cancelled_at"),
                book: BookSummary {
                    id: row.get("book_id"),
                    title: row.get("title"),
                    author: row.get("author"),
                    category: row.get("category"),
                    isbn: row.get("isbn"),
                    cover_url: row.get("cover_url"),
                },
                user: ProfileSummary {
                    id: row.get("profile_id"),
                    name: row.get("name"),
                    username: row.get("username"),
                    email: row.get("email"),
                    department: row.get("department"),
                },
            });
        }

        Ok(result)
    }

    /// Approve a pending request and issue the borrow, atomically.
    ///
    /// One transaction covers the status flip, the copy decrement and the
    /// ledger insert; readers never observe a request approved without its
    /// borrow record, and the decrement's `available_copies > 0` guard is
    /// the only place the shared counter is claimed.
    pub async fn approve(
        &self,
        request_id: Uuid,
        approved_by: Uuid,
        due_days: i64,
    ) -> AppResult<(BorrowRequest, BorrowRecord)> {
        let mut tx = self.pool.begin().await?;

        let request =
            sqlx::query_as::<_, BorrowRequest>("SELECT * FROM requests WHERE id = $1 FOR UPDATE")
                .bind(request_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound("Request not found".to_string()))?;

        if request.status != RequestStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Request is no longer pending (status: {})",
                request.status
            )));
        }

        let decremented = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1, updated_at = NOW()
            WHERE id = $1 AND available_copies > 0
            "#,
        )
        .bind(request.book_id)
        .execute(&mut *tx)
        .await?;

        if decremented.rows_affected() == 0 {
            let book_exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
                    .bind(request.book_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if book_exists {
                return Err(AppError::Unavailable(
                    "Book is no longer available".to_string(),
                ));
            }
            return Err(AppError::NotFound("Book not found".to_string()));
        }

        let issued_at = Utc::now();
        let due_at = issued_at + Duration::days(due_days);

        let borrow = sqlx::query_as::<_, BorrowRecord>(
            r#"
            INSERT INTO borrow_records (id, user_id, book_id, request_id, issued_at, due_at, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'active')
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(request.book_id)
        .bind(request.id)
        .bind(issued_at)
        .bind(due_at)
        .fetch_one(&mut *tx)
        .await?;

        let updated = sqlx::query_as::<_, BorrowRequest>(
            r#"
            UPDATE requests
            SET status = 'approved', reviewed_at = NOW(), reviewed_by = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(request.id)
        .bind(approved_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((updated, borrow))
    }

    /// Reject a pending request. The status filter in the UPDATE makes
    /// concurrent decisions race-safe; zero rows affected means the request
    /// was missing or already decided.
    pub async fn reject(
        &self,
        request_id: Uuid,
        rejected_by: Uuid,
        reason: Option<&str>,
    ) -> AppResult<BorrowRequest> {
        let updated = sqlx::query_as::<_, BorrowRequest>(
            r#"
            UPDATE requests
            SET status = 'rejected', reviewed_at = NOW(), reviewed_by = $2, rejection_reason = $3
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(rejected_by)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(request) => Ok(request),
            None => match self.find_by_id(request_id).await? {
                Some(request) => Err(AppError::InvalidState(format!(
                    "Request is no longer pending (status: {})",
                    request.status
                ))),
                None => Err(AppError::NotFound("Request not found".to_string())),
            },
        }
    }

    /// Cancel the caller's own pending request
    pub async fn cancel(&self, request_id: Uuid, user_id: Uuid) -> AppResult<BorrowRequest> {
        let updated = sqlx::query_as::<_, BorrowRequest>(
            r#"
            UPDATE requests
            SET status = 'cancelled', cancelled_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(request) => Ok(request),
            None => match self.find_by_id(request_id).await? {
                Some(request) if request.user_id != user_id => Err(AppError::Authorization(
                    "You can only cancel your own requests".to_string(),
                )),
                Some(_) => Err(AppError::InvalidState(
                    "Only pending requests can be cancelled".to_string(),
                )),
                None => Err(AppError::NotFound("Request not found".to_string())),
            },
        }
    }

    /// Count pending requests
    pub async fn count_pending(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM requests WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<BorrowRequest>> {
        let request = sqlx::query_as::<_, BorrowRequest>("SELECT * FROM requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(request)
    }
}
