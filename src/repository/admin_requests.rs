//! Admin role requests repository for database operations

use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::{is_unique_violation, AppError, AppResult},
    models::{
        admin_request::{AdminApprovalRequest, AdminRequestStatus, AdminRequestWithUser},
        profile::ProfileSummary,
    },
};

#[derive(Clone)]
pub struct AdminRequestsRepository {
    pool: Pool<Postgres>,
}

impl AdminRequestsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// File a request for admin access. Each user gets one lifetime row; a
    /// repeat request returns the existing one unchanged.
    pub async fn request_access(&self, user_id: Uuid) -> AppResult<AdminApprovalRequest> {
        let result = sqlx::query_as::<_, AdminApprovalRequest>(
            r#"
            INSERT INTO admin_approval_requests (id, user_id, status)
            VALUES ($1, $2, 'pending')
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(request) => Ok(request),
            Err(err) if is_unique_violation(&err) => {
                self.status_for_user(user_id).await?.ok_or_else(|| {
                    AppError::Internal("Admin request vanished after conflict".to_string())
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// The user's own request, if they ever filed one
    pub async fn status_for_user(&self, user_id: Uuid) -> AppResult<Option<AdminApprovalRequest>> {
        let request = sqlx::query_as::<_, AdminApprovalRequest>(
            "SELECT * FROM admin_approval_requests WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    /// Pending requests with their requesters, newest first
    pub async fn list_pending(&self) -> AppResult<Vec<AdminRequestWithUser>> {
        let rows = sqlx::query(
            r#"
            SELECT ar.id, ar.status, ar.requested_at,
                   p.id AS profile_id, p.name, p.username, p.email, p.department
            FROM admin_approval_requests ar
            JOIN profiles p ON ar.user_id = p.id
            WHERE ar.status = 'pending'
            ORDER BY ar.requested_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::new();
        for row in rows {
            result.push(AdminRequestWithUser {
                id: row.get("id"),
                status: row.get("status"),
                requested_at: row.get("requested_at"),
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

    /// Approve a pending request and promote the requester, atomically.
    pub async fn approve(
        &self,
        request_id: Uuid,
        reviewed_by: Uuid,
    ) -> AppResult<AdminApprovalRequest> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, AdminApprovalRequest>(
            "SELECT * FROM admin_approval_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Admin request not found".to_string()))?;

        if request.status != AdminRequestStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Admin request is no longer pending (status: {})",
                request.status
            )));
        }

        let updated = sqlx::query_as::<_, AdminApprovalRequest>(
            r#"
            UPDATE admin_approval_requests
            SET status = 'approved', reviewed_at = NOW(), reviewed_by = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(request.id)
        .bind(reviewed_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE profiles SET role = 'admin', updated_at = NOW() WHERE id = $1")
            .bind(request.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Reject a pending request
    pub async fn reject(
        &self,
        request_id: Uuid,
        reviewed_by: Uuid,
    ) -> AppResult<AdminApprovalRequest> {
        let updated = sqlx::query_as::<_, AdminApprovalRequest>(
            r#"
            UPDATE admin_approval_requests
            SET status = 'rejected', reviewed_at = NOW(), reviewed_by = $2
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(reviewed_by)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(request) => Ok(request),
            None => {
                let current = sqlx::query_as::<_, AdminApprovalRequest>(
                    "SELECT * FROM admin_approval_requests WHERE id = $1",
                )
                .bind(request_id)
                .fetch_optional(&self.pool)
                .await?;
                match current {
                    Some(request) => Err(AppError::InvalidState(format!(
                        "Admin request is no longer pending (status: {})",
                        request.status
                    ))),
                    None => Err(AppError::NotFound("Admin request not found".to_string())),
                }
            }
        }
    }

    /// Count pending admin requests
    pub async fn count_pending(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM admin_approval_requests WHERE status = 'pending'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
