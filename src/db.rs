//! Database pool construction with a bounded startup wait.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tokio::time::Instant;

use crate::config::DatabaseConfig;

const RETRY_PAUSE: Duration = Duration::from_secs(2);

/// Connect to Postgres, retrying until `connect_deadline_secs` elapses.
///
/// The outcome resolves exactly once: the first successful connection wins,
/// otherwise the final attempt's error surfaces once the deadline has passed.
pub async fn connect_with_deadline(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let deadline = Instant::now() + Duration::from_secs(config.connect_deadline_secs);
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let result = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await;

        match result {
            Ok(pool) => {
                if attempt > 1 {
                    tracing::info!(attempt, "Database connection established after retry");
                }
                return Ok(pool);
            }
            Err(err) => {
                let now = Instant::now();
                if now >= deadline {
                    tracing::error!(attempt, error = %err, "Database connection deadline exceeded");
                    return Err(err);
                }
                tracing::warn!(attempt, error = %err, "Database connection failed, retrying");
                tokio::time::sleep(RETRY_PAUSE.min(deadline - now)).await;
            }
        }
    }
}
