//! Overdue sweeper: flips lapsed borrows and fans out reminders

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::interval;
use uuid::Uuid;

use crate::{
    config::SweeperConfig,
    error::AppResult,
    models::{borrow::OverdueReminder, notification::NotificationKind},
    repository::Repository,
};

use super::{email::EmailService, notifications::NotificationsService};

#[derive(Clone)]
pub struct SweeperService {
    repository: Repository,
    notifications: NotificationsService,
    email: EmailService,
}

impl SweeperService {
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

    /// Run one sweep as of `now` and return how many records transitioned.
    ///
    /// The transition is a single bulk update, so a repeated or concurrent
    /// sweep finds nothing left to flip. Reminders happen after the
    /// transition has committed and never affect the count.
    pub async fn sweep_overdue(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let transitioned: Vec<Uuid> = self.repository.borrows.mark_overdue(now).await?;
        let count = transitioned.len() as u64;

        if count == 0 {
            return Ok(0);
        }

        let reminders = match self.repository.borrows.overdue_reminders(&transitioned).await {
            Ok(reminders) => reminders,
            Err(err) => {
                tracing::warn!(error = %err, "Could not load reminder details for swept records");
                return Ok(count);
            }
        };

        for reminder in &reminders {
            self.send_reminder(reminder).await;
        }

        Ok(count)
    }

    /// Per-record follow-ups, each failure isolated so one bad address
    /// never blocks the rest of the batch.
    async fn send_reminder(&self, reminder: &OverdueReminder) {
        self.notifications
            .notify(
                reminder.user_id,
                NotificationKind::BorrowOverdue,
                "Book overdue",
                &format!(
                    "\"{}\" was due on {}. Please return it at your earliest convenience.",
                    reminder.book_title,
                    reminder.due_at.format("%Y-%m-%d")
                ),
                serde_json::json!({
                    "borrow_id": reminder.borrow_id,
                    "book_id": reminder.book_id,
                }),
            )
            .await;

        if self.email.is_enabled() {
            if let Err(err) = self
                .email
                .send_overdue_reminder(&reminder.user_email, &reminder.book_title, reminder.due_at)
                .await
            {
                tracing::warn!(
                    borrow_id = %reminder.borrow_id,
                    error = %err,
                    "Failed to send overdue reminder email"
                );
            }
        }
    }
}

/// Spawn the in-process sweep loop. External schedulers can drive the same
/// sweep through the admin endpoint instead; the two coexist safely because
/// the sweep is idempotent.
pub fn spawn_overdue_sweeper(sweeper: SweeperService, config: SweeperConfig) {
    if !config.enabled {
        tracing::info!("Overdue sweeper is disabled");
        return;
    }

    tracing::info!(
        interval_secs = config.interval_secs,
        startup_delay_secs = config.startup_delay_secs,
        "Starting overdue sweeper task"
    );

    tokio::spawn(async move {
        // Let the server settle before the first pass
        tokio::time::sleep(Duration::from_secs(config.startup_delay_secs)).await;

        let mut tick = interval(Duration::from_secs(config.interval_secs));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tick.tick().await;

            match sweeper.sweep_overdue(Utc::now()).await {
                Ok(0) => tracing::debug!("Overdue sweep cycle completed, nothing to flip"),
                Ok(count) => tracing::info!(marked_overdue = count, "Overdue sweep cycle completed"),
                Err(err) => tracing::error!(error = %err, "Overdue sweep cycle failed"),
            }
        }
    });
}
