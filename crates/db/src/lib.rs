//! PostgreSQL persistence for employee credentials and order batches.
//!
//! Both components hold a clone of one [`DbPool`]; every operation checks out
//! its own connection or transaction and returns it on every exit path.

use std::future::Future;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Postgres, Transaction};

pub mod config;
pub mod credential_store;
pub mod error;
pub mod models;
pub mod order_ledger;
pub mod repositories;
pub mod schema;

pub use config::{ConnectTarget, DbConfig};
pub use credential_store::CredentialStore;
pub use error::{StoreError, StoreResult};
pub use order_ledger::OrderLedger;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool.
///
/// Fails once [`DbConfig::connect_timeout`] passes without a first connection.
pub async fn create_pool(config: &DbConfig) -> Result<DbPool, sqlx::Error> {
    let options = config.connect_options()?;
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.connect_timeout)
        .connect_with(options)
        .await
}

/// Block until the store accepts connections, then return the pool.
///
/// Each attempt is bounded by [`DbConfig::connect_timeout`] and followed by a
/// fixed [`DbConfig::retry_interval`] sleep. There is no attempt limit. This is
/// a startup barrier only. A configuration error (e.g. an unparsable URL)
/// cannot fix itself and is returned instead of retried.
pub async fn connect_with_retry(config: &DbConfig) -> Result<DbPool, sqlx::Error> {
    retry_until_connected(config.retry_interval, move || create_pool(config)).await
}

async fn retry_until_connected<T, F, Fut>(
    retry_interval: Duration,
    mut connect: F,
) -> Result<T, sqlx::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match connect().await {
            Ok(connected) => {
                tracing::info!(attempt, "Connected to PostgreSQL");
                return Ok(connected);
            }
            Err(e @ sqlx::Error::Configuration(_)) => {
                tracing::error!(error = %e, "Invalid database configuration");
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(
                    attempt,
                    error = %e,
                    retry_in_ms = retry_interval.as_millis() as u64,
                    "PostgreSQL not reachable, retrying",
                );
            }
        }

        tokio::time::sleep(retry_interval).await;
    }
}

/// Round-trip a trivial query and return the server version string.
pub async fn health_check(pool: &DbPool) -> StoreResult<String> {
    let version: String = sqlx::query_scalar("SELECT version()")
        .fetch_one(pool)
        .await?;
    tracing::debug!(%version, "PostgreSQL health check passed");
    Ok(version)
}

/// Commit `tx` if `outcome` is `Ok`, otherwise roll it back and pass the error on.
pub(crate) async fn finish<T>(
    tx: Transaction<'static, Postgres>,
    outcome: StoreResult<T>,
) -> StoreResult<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "Transaction rollback failed");
            }
            Err(e)
        }
    }
}
