//! Business logic services

pub mod admin_approval;
pub mod auth;
pub mod borrows;
pub mod catalog;
pub mod email;
pub mod notifications;
pub mod requests;
pub mod stats;
pub mod sweeper;

use std::time::Duration;

use rand::Rng;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    models::profile::Profile,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub requests: requests::RequestsService,
    pub borrows: borrows::BorrowsService,
    pub admin_approval: admin_approval::AdminApprovalService,
    pub notifications: notifications::NotificationsService,
    pub sweeper: sweeper::SweeperService,
    pub stats: stats::StatsService,
    pub email: email::EmailService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let email = email::EmailService::new(config.email.clone());
        let notifications = notifications::NotificationsService::new(repository.clone());

        Self {
            auth: auth::AuthService::new(repository.clone(), config.auth.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            requests: requests::RequestsService::new(
                repository.clone(),
                config.loans.clone(),
                notifications.clone(),
                email.clone(),
            ),
            borrows: borrows::BorrowsService::new(repository.clone()),
            admin_approval: admin_approval::AdminApprovalService::new(
                repository.clone(),
                notifications.clone(),
                email.clone(),
            ),
            sweeper: sweeper::SweeperService::new(
                repository.clone(),
                notifications.clone(),
                email.clone(),
            ),
            stats: stats::StatsService::new(repository),
            notifications,
            email,
        }
    }
}

const PROFILE_READ_ATTEMPTS: u32 = 3;

/// Load a profile, retrying infrastructure failures a bounded number of
/// times. A definitive answer (found or not found) is never retried; only
/// database errors are, and after the last attempt they surface as
/// `Transient`.
pub(crate) async fn read_profile_with_retry(
    repository: &Repository,
    user_id: Uuid,
) -> AppResult<Profile> {
    for attempt in 1..=PROFILE_READ_ATTEMPTS {
        match repository.profiles.get_by_id(user_id).await {
            Ok(profile) => return Ok(profile),
            Err(AppError::Database(err)) if attempt < PROFILE_READ_ATTEMPTS => {
                tracing::warn!(attempt, error = %err, "Profile read failed, retrying");
                tokio::time::sleep(retry_backoff(attempt)).await;
            }
            Err(AppError::Database(err)) => {
                tracing::error!(user_id = %user_id, error = %err, "Profile read retries exhausted");
                return Err(AppError::Transient(
                    "Could not load user profile".to_string(),
                ));
            }
            Err(err) => return Err(err),
        }
    }
    unreachable!("retry loop always returns")
}

/// Exponential backoff with jitter: 100ms, 200ms, 400ms base, each padded
/// by up to half of itself.
fn retry_backoff(attempt: u32) -> Duration {
    let base = 100u64 * 2u64.pow(attempt.saturating_sub(1));
    let jitter = rand::thread_rng().gen_range(0..=base / 2);
    Duration::from_millis(base + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_stays_bounded() {
        for _ in 0..50 {
            let first = retry_backoff(1).as_millis();
            let second = retry_backoff(2).as_millis();
            let third = retry_backoff(3).as_millis();

            assert!((100..=150).contains(&first));
            assert!((200..=300).contains(&second));
            assert!((400..=600).contains(&third));
        }
    }
}
