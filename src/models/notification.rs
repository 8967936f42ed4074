//! Notification model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Notification kinds written by the lifecycle operations.
///
/// Stored as plain text; readers that encounter an unknown kind keep the raw
/// string, so adding kinds is not a schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    RequestCreated,
    RequestApproved,
    RequestRejected,
    BorrowOverdue,
    AdminRequestApproved,
    AdminRequestRejected,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::RequestCreated => "request_created",
            NotificationKind::RequestApproved => "request_approved",
            NotificationKind::RequestRejected => "request_rejected",
            NotificationKind::BorrowOverdue => "borrow_overdue",
            NotificationKind::AdminRequestApproved => "admin_request_approved",
            NotificationKind::AdminRequestRejected => "admin_request_rejected",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Notification model from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    /// Free-form context (request ids, book ids) for clients to link from.
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
