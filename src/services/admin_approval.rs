//! Admin role request workflow service

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        admin_request::{AdminApprovalRequest, AdminRequestWithUser},
        notification::NotificationKind,
        profile::Role,
    },
    repository::Repository,
};

use super::{email::EmailService, notifications::NotificationsService};

#[derive(Clone)]
pub struct AdminApprovalService {
    repository: Repository,
    notifications: NotificationsService,
    email: EmailService,
}

impl AdminApprovalService {
    pub fn new(
        repository: Repository,
        notifications: NotificationsService,
        email: EmailService,
    ) -> Self {
        Self {
            repository,
            notifications,
            email,
        }
    }

    /// File a request for admin access. Admins have nothing to request;
    /// everyone else gets their one lifetime row (existing row on repeat).
    pub async fn request_access(&self, user_id: Uuid) -> AppResult<AdminApprovalRequest> {
        let profile = self.repository.profiles.get_by_id(user_id).await?;
        if profile.role == Role::Admin {
            return Err(AppError::InvalidState(
                "You already have administrator access".to_string(),
            ));
        }

        self.repository.admin_requests.request_access(user_id).await
    }

    /// The caller's own request, if any
    pub async fn status_for_user(&self, user_id: Uuid) -> AppResult<Option<AdminApprovalRequest>> {
        self.repository.admin_requests.status_for_user(user_id).await
    }

    /// Pending requests for the review queue (admin)
    pub async fn list_pending(&self) -> AppResult<Vec<AdminRequestWithUser>> {
        self.repository.admin_requests.list_pending().await
    }

    /// Approve a request, promoting the requester in the same transaction
    pub async fn approve(
        &self,
        request_id: Uuid,
        reviewed_by: Uuid,
    ) -> AppResult<AdminApprovalRequest> {
        let request = self
            .repository
            .admin_requests
            .approve(request_id, reviewed_by)
            .await?;

        self.notify_decision(&request, true).await;

        Ok(request)
    }

    /// Reject a request
    pub async fn reject(
        &self,
        request_id: Uuid,
        reviewed_by: Uuid,
    ) -> AppResult<AdminApprovalRequest> {
        let request = self
            .repository
            .admin_requests
            .reject(request_id, reviewed_by)
            .await?;

        self.notify_decision(&request, false).await;

        Ok(request)
    }

    /// Requester-facing follow-ups after a decision. Advisory only.
    async fn notify_decision(&self, request: &AdminApprovalRequest, approved: bool) {
        let (kind, title, message) = if approved {
            (
                NotificationKind::AdminRequestApproved,
                "Admin access granted",
                "Your request for administrator access has been approved.",
            )
        } else {
            (
                NotificationKind::AdminRequestRejected,
                "Admin access declined",
                "Your request for administrator access was declined.",
            )
        };

        self.notifications
            .notify(
                request.user_id,
                kind,
                title,
                message,
                serde_json::json!({ "admin_request_id": request.id }),
            )
            .await;

        if self.email.is_enabled() {
            match self.repository.profiles.get_by_id(request.user_id).await {
                Ok(profile) => {
                    if let Err(err) = self.email.send_admin_decision(&profile.email, approved).await
                    {
                        tracing::warn!(user_id = %request.user_id, error = %err, "Failed to send admin decision email");
                    }
                }
                Err(err) => {
                    tracing::warn!(user_id = %request.user_id, error = %err, "Skipping admin decision email");
                }
            }
        }
    }
}
