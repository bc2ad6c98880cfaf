use std::future::Future;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseSettings;

/// Upper bound for a single backoff delay
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Bounded exponential backoff for startup connections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            initial_backoff,
            max_backoff: MAX_BACKOFF,
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

/// Run `operation` until it succeeds or the policy's attempts run out
///
/// Returns the last error when every attempt fails.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: RetryPolicy,
    what: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= policy.attempts => {
                tracing::error!("{} failed after {} attempts: {}", what, attempt, e);
                return Err(e);
            }
            Err(e) => {
                let delay = policy.backoff_after(attempt);
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {:?}",
                    what,
                    attempt,
                    policy.attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Creates a PostgreSQL connection pool, retrying the initial connection
pub async fn connect_with_retry(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    tracing::debug!("Creating database connection pool");

    let policy = RetryPolicy::new(settings.connect_attempts, settings.retry_backoff);
    let pool = retry_with_backoff(policy, "Database connection", || {
        PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.url)
    })
    .await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

/// Applies the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Migrations completed successfully");
    Ok(())
}
