use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

/// Error messages that indicate the database was unreachable rather than
/// the query being bad. Matched by substring on the error's display text,
/// so a reworded driver message silently reclassifies the error as fatal.
const CONNECTIVITY_PHRASES: &[&str] = &[
    "connection refused",
    "connection reset",
    "connection closed",
    "failed to lookup address",
    "pool timed out",
    "database system is starting up",
];

const WARM_UP_ATTEMPTS: u32 = 5;
const WARM_UP_DELAY: Duration = Duration::from_secs(2);

pub fn is_connectivity_error(message: &str) -> bool {
    let message = message.to_lowercase();
    CONNECTIVITY_PHRASES
        .iter()
        .any(|phrase| message.contains(phrase))
}

/// Bounded retry with linear backoff for operations against a
/// serverless-hosted Postgres that may be cold.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Runs `op`, retrying on connectivity-classified errors with a delay
    /// of `base_delay * attempt` between tries. Non-connectivity errors
    /// fail immediately; once attempts are exhausted the last underlying
    /// error is surfaced as-is.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= max_attempts || !is_connectivity_error(&err.to_string()) {
                        return Err(err);
                    }
                    let delay = self.base_delay * attempt;
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "database connection failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Runs one persistence operation under the default retry policy.
pub async fn with_retry<T, E, F, Fut>(op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    RetryPolicy::default().run(op).await
}

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")?;
    Ok(db)
}

/// Probes the database with a trivial query until it answers, forcing a
/// cold serverless instance awake before real traffic reaches it.
pub async fn warm_up(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut attempt = 1;
    loop {
        info!(attempt, max_attempts = WARM_UP_ATTEMPTS, "warming up database");
        match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => {
                info!("database warmed up");
                return Ok(());
            }
            Err(err) => {
                if attempt >= WARM_UP_ATTEMPTS {
                    return Err(err);
                }
                warn!(attempt, error = %err, "database warm-up attempt failed");
                tokio::time::sleep(WARM_UP_DELAY).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }

    #[test]
    fn classifies_connectivity_errors() {
        assert!(is_connectivity_error("Connection refused (os error 111)"));
        assert!(is_connectivity_error(
            "pool timed out while waiting for an open connection"
        ));
        assert!(is_connectivity_error(
            "FATAL: the database system is starting up"
        ));
        assert!(is_connectivity_error("failed to lookup address information"));
    }

    #[test]
    fn query_errors_are_not_connectivity_errors() {
        assert!(!is_connectivity_error(
            "duplicate key value violates unique constraint \"users_email_key\""
        ));
        assert!(!is_connectivity_error("relation \"users\" does not exist"));
    }

    #[tokio::test]
    async fn returns_success_after_transient_failures() {
        let calls = Cell::new(0u32);
        let result: Result<i32, String> = instant_policy(3)
            .run(|| {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n <= 2 {
                        Err("connection refused (os error 111)".to_string())
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;
        assert_eq!(result, Ok(7));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn surfaces_last_error_after_exhausting_attempts() {
        let calls = Cell::new(0u32);
        let result: Result<(), String> = instant_policy(3)
            .run(|| {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { Err(format!("connection reset by peer, try {n}")) }
            })
            .await;
        assert_eq!(calls.get(), 3);
        assert_eq!(result.unwrap_err(), "connection reset by peer, try 3");
    }

    #[tokio::test]
    async fn fails_immediately_on_non_connectivity_errors() {
        let calls = Cell::new(0u32);
        let result: Result<(), String> = instant_policy(3)
            .run(|| {
                calls.set(calls.get() + 1);
                async { Err("duplicate key value violates unique constraint".to_string()) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn attempt_ceiling_is_clamped_to_at_least_one() {
        let calls = Cell::new(0u32);
        let result: Result<(), String> = instant_policy(0)
            .run(|| {
                calls.set(calls.get() + 1);
                async { Err("connection refused".to_string()) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }
}
