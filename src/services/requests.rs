//! Borrow request lifecycle service

use uuid::Uuid;

use crate::{
    config::LoanConfig,
    error::{AppError, AppResult},
    models::{
        borrow::BorrowRecord,
        notification::NotificationKind,
        request::{
            ApproveRequest, BorrowRequest, RejectRequest, RequestStatus, RequestWithBook,
            RequestWithContext,
        },
    },
    repository::Repository,
};

use super::{email::EmailService, notifications::NotificationsService, read_profile_with_retry};

#[derive(Clone)]
pub struct RequestsService {
    repository: Repository,
    config: LoanConfig,
    notifications: NotificationsService,
    email: EmailService,
}

impl RequestsService {
    pub fn new(
        repository: Repository,
        config: LoanConfig,
        notifications: NotificationsService,
        email: EmailService,
    ) -> Self {
        Self {
            repository,
            config,
            notifications,
            email,
        }
    }

    /// File a borrow request.
    ///
    /// Preconditions are checked in the order users see them reported:
    /// profile, then availability, then an existing pending request. The
    /// storage constraints backstop all three against races.
    pub async fn create_request(&self, user_id: Uuid, book_id: Uuid) -> AppResult<BorrowRequest> {
        read_profile_with_retry(&self.repository, user_id).await?;

        let book = self.repository.books.get_by_id(book_id).await?;
        if book.available_copies < 1 {
            return Err(AppError::Unavailable("Book is not available".to_string()));
        }

        if self.repository.requests.has_pending(user_id, book_id).await? {
            return Err(AppError::Duplicate(
                "You already have a pending request for this book".to_string(),
            ));
        }

        let request = self.repository.requests.create(user_id, book_id).await?;

        self.notifications
            .notify(
                user_id,
                NotificationKind::RequestCreated,
                "Borrow request submitted",
                &format!(
                    "Your request for \"{}\" has been submitted and is awaiting review.",
                    book.title
                ),
                serde_json::json!({ "request_id": request.id, "book_id": request.book_id }),
            )
            .await;

        Ok(request)
    }

    /// Cancel the caller's own pending request
    pub async fn cancel_request(&self, request_id: Uuid, user_id: Uuid) -> AppResult<BorrowRequest> {
        self.repository.requests.cancel(request_id, user_id).await
    }

    /// The caller's requests, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<RequestWithBook>> {
        self.repository.requests.list_for_user(user_id).await
    }

    /// All requests, optionally filtered by status (admin)
    pub async fn list_all(
        &self,
        status: Option<RequestStatus>,
    ) -> AppResult<Vec<RequestWithContext>> {
        self.repository.requests.list_all(status).await
    }

    /// Approve a pending request, issuing the borrow atomically
    pub async fn approve_request(
        &self,
        request_id: Uuid,
        approved_by: Uuid,
        approve: ApproveRequest,
    ) -> AppResult<(BorrowRequest, BorrowRecord)> {
        let due_days = match approve.due_days {
            Some(days) => {
                if !(1..=self.config.max_due_days).contains(&days) {
                    return Err(AppError::Validation(format!(
                        "due_days must be between 1 and {}",
                        self.config.max_due_days
                    )));
                }
                days
            }
            None => self.config.default_due_days,
        };

        let (request, borrow) = self
            .repository
            .requests
            .approve(request_id, approved_by, due_days)
            .await?;

        self.notify_approved(&request, &borrow).await;

        Ok((request, borrow))
    }

    /// Reject a pending request
    pub async fn reject_request(
        &self,
        request_id: Uuid,
        rejected_by: Uuid,
        reject: RejectRequest,
    ) -> AppResult<BorrowRequest> {
        let request = self
            .repository
            .requests
            .reject(request_id, rejected_by, reject.reason.as_deref())
            .await?;

        self.notify_rejected(&request).await;

        Ok(request)
    }

    /// Requester-facing follow-ups after an approval. Advisory only.
    async fn notify_approved(&self, request: &BorrowRequest, borrow: &BorrowRecord) {
        let book_title = match self.repository.books.get_by_id(request.book_id).await {
            Ok(book) => book.title,
            Err(err) => {
                tracing::warn!(request_id = %request.id, error = %err, "Skipping approval notification");
                return;
            }
        };

        self.notifications
            .notify(
                request.user_id,
                NotificationKind::RequestApproved,
                "Borrow request approved",
                &format!(
                    "Your request for \"{}\" was approved. Due back {}.",
                    book_title,
                    borrow.due_at.format("%Y-%m-%d")
                ),
                serde_json::json!({
                    "request_id": request.id,
                    "book_id": request.book_id,
                    "borrow_id": borrow.id,
                }),
            )
            .await;

        if self.email.is_enabled() {
            match self.repository.profiles.get_by_id(request.user_id).await {
                Ok(profile) => {
                    if let Err(err) = self
                        .email
                        .send_request_approved(&profile.email, &book_title, borrow.due_at)
                        .await
                    {
                        tracing::warn!(user_id = %request.user_id, error = %err, "Failed to send approval email");
                    }
                }
                Err(err) => {
                    tracing::warn!(user_id = %request.user_id, error = %err, "Skipping approval email");
                }
            }
        }
    }

    /// Requester-facing follow-ups after a rejection. Advisory only.
    async fn notify_rejected(&self, request: &BorrowRequest) {
        let book_title = match self.repository.books.get_by_id(request.book_id).await {
            Ok(book) => book.title,
            Err(err) => {
                tracing::warn!(request_id = %request.id, error = %err, "Skipping rejection notification");
                return;
            }
        };

        let message = match request.rejection_reason.as_deref() {
            Some(reason) => format!(
                "Your request for \"{}\" was declined: {}",
                book_title, reason
            ),
            None => format!("Your request for \"{}\" was declined.", book_title),
        };

        self.notifications
            .notify(
                request.user_id,
                NotificationKind::RequestRejected,
                "Borrow request declined",
                &message,
                serde_json::json!({ "request_id": request.id, "book_id": request.book_id }),
            )
            .await;

        if self.email.is_enabled() {
            match self.repository.profiles.get_by_id(request.user_id).await {
                Ok(profile) => {
                    if let Err(err) = self
                        .email
                        .send_request_rejected(
                            &profile.email,
                            &book_title,
                            request.rejection_reason.as_deref(),
                        )
                        .await
                    {
                        tracing::warn!(user_id = %request.user_id, error = %err, "Failed to send rejection email");
                    }
                }
                Err(err) => {
                    tracing::warn!(user_id = %request.user_id, error = %err, "Skipping rejection email");
                }
            }
        }
    }
}
