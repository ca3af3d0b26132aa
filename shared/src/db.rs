//! Database connection management.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

use crate::{Config, Result};

/// Fixed-interval retry: up to `attempts` tries, `delay` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

/// Create a database connection pool.
///
/// Connections are opened lazily; use [`wait_until_ready`] to find out
/// whether the database is actually reachable.
pub fn create_pool(config: &Config) -> PgPool {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .test_before_acquire(true)
        .connect_lazy_with(config.connect_options())
}

/// Run `op` until it succeeds or the policy is exhausted, returning the last error.
pub async fn retry<T, E, F, Fut>(policy: RetryPolicy, mut op: F) -> std::result::Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= attempts => return Err(e),
            Err(e) => {
                warn!(attempt, max_attempts = attempts, error = %e, "Attempt failed, retrying");
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}

/// Probe the database with `SELECT 1` until it answers.
pub async fn wait_until_ready(pool: &PgPool, policy: RetryPolicy) -> Result<()> {
    retry(policy, |attempt| async move {
        sqlx::query("SELECT 1").execute(pool).await?;
        info!(attempt, "Database is ready");
        Ok::<(), crate::Error>(())
    })
    .await
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS calendars (
        id SERIAL PRIMARY KEY,
        uuid VARCHAR(64) NOT NULL UNIQUE,
        created_at TIMESTAMP NOT NULL DEFAULT (NOW() AT TIME ZONE 'utc')
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS events (
        id SERIAL PRIMARY KEY,
        calendar_id INTEGER NOT NULL REFERENCES calendars(id) ON DELETE CASCADE,
        title VARCHAR(255) NOT NULL,
        description TEXT,
        start TIMESTAMP NOT NULL,
        "end" TIMESTAMP NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT (NOW() AT TIME ZONE 'utc'),
        CONSTRAINT events_end_after_start CHECK ("end" >= start)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_events_calendar_id ON events (calendar_id)",
    "CREATE INDEX IF NOT EXISTS ix_events_calendar_id_start ON events (calendar_id, start)",
];

/// Create tables and indexes if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    let mut tx = pool.begin().await?;
    for statement in SCHEMA {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    info!("Database schema is up to date");
    Ok(())
}
