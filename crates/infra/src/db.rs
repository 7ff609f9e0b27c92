//! Database bootstrap: connect with a fixed-delay retry, then create the schema.

use std::future::Future;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::DatabaseConfig;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("could not connect to postgres after {attempts} attempt(s): {source}")]
    Connect {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    #[error("schema migration failed: {0}")]
    Migrate(#[source] sqlx::Error),
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS clients (
        id          BIGSERIAL PRIMARY KEY,
        name        TEXT NOT NULL,
        document    TEXT NOT NULL UNIQUE,
        type        TEXT NOT NULL CHECK (type IN ('PERSON', 'BUSINESS')),
        blocked     BOOLEAN NOT NULL DEFAULT FALSE,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_clients_name_lower ON clients (LOWER(name))",
    r#"
    CREATE TABLE IF NOT EXISTS request_metrics (
        id          BIGSERIAL PRIMARY KEY,
        method      TEXT NOT NULL,
        path        TEXT NOT NULL,
        count       BIGINT NOT NULL DEFAULT 0,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (method, path)
    )
    "#,
];

/// Run `op` up to `attempts` times (at least once), sleeping `delay` between failures.
///
/// Returns the last error together with the number of attempts made.
pub async fn retry_with_fixed_delay<T, E, F, Fut>(
    attempts: u32,
    delay: Duration,
    mut op: F,
) -> Result<T, (u32, E)>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) if attempt >= attempts => return Err((attempt, e)),
            Err(e) => {
                warn!(attempt, max_attempts = attempts, "attempt failed: {e}; retrying in {delay:?}");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

pub async fn connect_with_retry(config: &DatabaseConfig) -> Result<PgPool, BootstrapError> {
    let options = config.connect_options();

    let pool = retry_with_fixed_delay(config.connect_retries, config.retry_delay, |attempt| {
        info!(attempt, host = %config.host, port = config.port, db = %config.name, "connecting to postgres");
        PgPoolOptions::new()
            .max_connections(10)
            .connect_with(options.clone())
    })
    .await
    .map_err(|(attempts, source)| BootstrapError::Connect { attempts, source })?;

    info!(host = %config.host, db = %config.name, "connected to postgres");
    Ok(pool)
}

/// Create tables and indexes if missing. Safe to run on every start.
pub async fn migrate(pool: &PgPool) -> Result<(), BootstrapError> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(BootstrapError::Migrate)?;
    }
    info!("database schema ready");
    Ok(())
}
