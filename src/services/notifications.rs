//! Notification inbox and best-effort delivery

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::notification::{Notification, NotificationKind},
    repository::Repository,
};

#[derive(Clone)]
pub struct NotificationsService {
    repository: Repository,
}

impl NotificationsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Record a notification for a user. Delivery is advisory: a failure is
    /// logged and swallowed so the lifecycle operation that triggered it is
    /// never affected.
    pub async fn notify(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        title: &str,
        message: &str,
        metadata: serde_json::Value,
    ) {
        if let Err(err) = self
            .repository
            .notifications
            .create(user_id, kind, title, message, metadata)
            .await
        {
            tracing::warn!(
                user_id = %user_id,
                kind = %kind,
                error = %err,
                "Failed to record notification"
            );
        }
    }

    /// The user's notifications, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Notification>> {
        self.repository.notifications.list_for_user(user_id).await
    }

    /// Mark one of the user's notifications as read
    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<Notification> {
        self.repository.notifications.mark_read(id, user_id).await
    }
}
