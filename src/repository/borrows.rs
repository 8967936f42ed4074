//! Borrow records repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookSummary,
        borrow::{BorrowRecord, BorrowWithBook, BorrowWithContext, OverdueReminder},
        profile::ProfileSummary,
    },
};

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrow record by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<BorrowRecord> {
        sqlx::query_as::<_, BorrowRecord>("SELECT * FROM borrow_records WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Borrow record not found".to_string()))
    }

    /// Borrow records of one user, newest first, with their books
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<BorrowWithBook>> {
        let rows = sqlx::query(
            r#"
            SELECT br.id, br.status, br.issued_at, br.due_at, br.returned_at,
                   b.id AS book_id, b.title, b.author, b.category, b.isbn, b.cover_url
            FROM borrow_records br
            JOIN books b ON br.book_id = b.id
            WHERE br.user_id = $1
            ORDER BY br.issued_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::new();
        for row in rows {
            result.push(BorrowWithBook {
                id: row.get("id"),
                status: row.get("status"),
                issued_at: row.get("issued_at"),
                due_at: row.get("due_at"),
                returned_at: row.get("returned_at"),
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

    /// All borrow records, newest first, with book and borrower
    pub async fn list_all(&self) -> AppResult<Vec<BorrowWithContext>> {
        let rows = sqlx::query(
            r#"
            SELECT br.id, br.status, br.issued_at, br.due_at, br.returned_at,
                   b.id AS book_id, b.title, b.author, b.category, b.isbn, b.cover_url,
                   p.id AS profile_id, p.name, p.username, p.email, p.department
            FROM borrow_records br
            JOIN books b ON br.book_id = b.id
            JOIN profiles p ON br.user_id = p.id
            ORDER BY br.issued_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::new();
        for row in rows {
            result.push(BorrowWithContext {
                id: row.get("id"),
                status: row.get("status"),
                issued_at: row.get("issued_at"),
                due_at: row.get("due_at"),
                returned_at: row.get("returned_at"),
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

    /// Return a borrow and put the copy back on the shelf, atomically.
    ///
    /// The status filter makes a second return a no-op that reports
    /// `InvalidState` instead of double-incrementing. The increment is
    /// guarded by the `available_copies < total_copies` ceiling; a guard hit
    /// means the counter had drifted, which is logged and left to
    /// reconciliation while the return itself still commits.
    pub async fn return_borrow(
        &self,
        borrow_id: Uuid,
        returned_by: Uuid,
    ) -> AppResult<BorrowRecord> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, BorrowRecord>(
            r#"
            UPDATE borrow_records
            SET status = 'returned', returned_at = NOW(), returned_by = $2
            WHERE id = $1 AND status IN ('active', 'overdue')
            RETURNING *
            "#,
        )
        .bind(borrow_id)
        .bind(returned_by)
        .fetch_optional(&mut *tx)
        .await?;

        let record = match updated {
            Some(record) => record,
            None => {
                let current = sqlx::query_as::<_, BorrowRecord>(
                    "SELECT * FROM borrow_records WHERE id = $1",
                )
                .bind(borrow_id)
                .fetch_optional(&mut *tx)
                .await?;
                return match current {
                    Some(_) => Err(AppError::InvalidState(
                        "Borrow record is already returned".to_string(),
                    )),
                    None => Err(AppError::NotFound("Borrow record not found".to_string())),
                };
            }
        };

        let incremented = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies + 1, updated_at = NOW()
            WHERE id = $1 AND available_copies < total_copies
            "#,
        )
        .bind(record.book_id)
        .execute(&mut *tx)
        .await?;

        if incremented.rows_affected() == 0 {
            tracing::error!(
                book_id = %record.book_id,
                borrow_id = %record.id,
                "Availability counter already at ceiling on return, increment skipped"
            );
        }

        tx.commit().await?;

        Ok(record)
    }

    /// Flip every active record past its due date to overdue. One statement,
    /// so a concurrent or repeated sweep matches zero rows.
    pub async fn mark_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<Uuid>> {
        let rows = sqlx::query(
            r#"
            UPDATE borrow_records
            SET status = 'overdue'
            WHERE status = 'active' AND due_at < $1
            RETURNING id
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    /// Contact details for records just swept, for the reminder fan-out
    pub async fn overdue_reminders(&self, ids: &[Uuid]) -> AppResult<Vec<OverdueReminder>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let reminders = sqlx::query_as::<_, OverdueReminder>(
            r#"
            SELECT br.id AS borrow_id, br.user_id, br.book_id, br.due_at,
                   b.title AS book_title, p.name AS user_name, p.email AS user_email
            FROM borrow_records br
            JOIN books b ON br.book_id = b.id
            JOIN profiles p ON br.user_id = p.id
            WHERE br.id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(reminders)
    }

    /// Count records currently out (active or overdue)
    pub async fn count_out(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_records WHERE status IN ('active', 'overdue')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Count overdue records
    pub async fn count_overdue(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM borrow_records WHERE status = 'overdue'")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Count records returned today
    pub async fn count_returned_today(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_records WHERE status = 'returned' AND returned_at >= CURRENT_DATE",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
