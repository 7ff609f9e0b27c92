//! Postgres-backed stores.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (other) | Any other | `Database` |
//! | Row decode failure | N/A | `Database` |
//! | PoolClosed / Io / Tls / other | N/A | `Database` |
//!
//! `NotFound` and `Unchanged` are never produced by SQLx itself; they are derived
//! from affected-row results in `set_blocked`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{Span, instrument};

use clientreg_clients::{Client, ClientId, ClientKind, Document, Registration};

use super::r#trait::{ClientStore, RequestMetric, RequestMetricsStore, StoreError};

const CLIENT_COLUMNS: &str = "id, name, document, type, blocked, created_at, updated_at";

/// Postgres-backed client store.
///
/// Document uniqueness is enforced by the `UNIQUE` constraint on `clients.document`;
/// a losing concurrent insert surfaces as `StoreError::Duplicate`.
#[derive(Debug, Clone)]
pub struct PostgresClientStore {
    pool: Arc<PgPool>,
}

impl PostgresClientStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl ClientStore for PostgresClientStore {
    #[instrument(skip(self, registration), fields(document = %registration.document), err)]
    async fn create(&self, registration: Registration) -> Result<Client, StoreError> {
        let sql = format!(
            "INSERT INTO clients (name, document, type, blocked) \
             VALUES ($1, $2, $3, FALSE) \
             RETURNING {CLIENT_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(&registration.name)
            .bind(registration.document.as_str())
            .bind(registration.kind.as_str())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_client", e))?;

        Client::try_from(ClientRow::from_pg(&row)?)
    }

    #[instrument(skip(self), err)]
    async fn find_by_document(&self, document: &str) -> Result<Option<Client>, StoreError> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE document = $1");

        let row = sqlx::query(&sql)
            .bind(document)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_document", e))?;

        row.map(|r| Client::try_from(ClientRow::from_pg(&r)?))
            .transpose()
    }

    #[instrument(skip(self), fields(result_count = tracing::field::Empty), err)]
    async fn find_by_name(&self, fragment: &str) -> Result<Vec<Client>, StoreError> {
        let sql = format!(
            r#"SELECT {CLIENT_COLUMNS} FROM clients
               WHERE name ILIKE '%' || $1 || '%' ESCAPE '\'
               ORDER BY LOWER(name) ASC, id ASC"#
        );

        let rows = sqlx::query(&sql)
            .bind(escape_like(fragment))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_name", e))?;

        Span::current().record("result_count", rows.len());
        decode_clients(&rows)
    }

    #[instrument(skip(self), fields(result_count = tracing::field::Empty), err)]
    async fn list_all(&self) -> Result<Vec<Client>, StoreError> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients ORDER BY LOWER(name) ASC, id ASC");

        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_clients", e))?;

        Span::current().record("result_count", rows.len());
        decode_clients(&rows)
    }

    #[instrument(skip(self), err)]
    async fn set_blocked(&self, document: &str, blocked: bool) -> Result<Client, StoreError> {
        // Compare-and-set: only flips a row that is not already in the target state.
        let sql = format!(
            "UPDATE clients SET blocked = $2, updated_at = NOW() \
             WHERE document = $1 AND blocked <> $2 \
             RETURNING {CLIENT_COLUMNS}"
        );

        let updated = sqlx::query(&sql)
            .bind(document)
            .bind(blocked)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_blocked", e))?;

        if let Some(row) = updated {
            return Client::try_from(ClientRow::from_pg(&row)?);
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM clients WHERE document = $1)")
                .bind(document)
                .fetch_one(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("set_blocked_exists", e))?;

        if exists {
            Err(StoreError::Unchanged)
        } else {
            Err(StoreError::NotFound)
        }
    }
}

/// Postgres-backed request counters.
#[derive(Debug, Clone)]
pub struct PostgresRequestMetricsStore {
    pool: Arc<PgPool>,
}

impl PostgresRequestMetricsStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl RequestMetricsStore for PostgresRequestMetricsStore {
    #[instrument(skip(self), err)]
    async fn increment(&self, method: &str, path: &str) -> Result<RequestMetric, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query(
            r#"
            INSERT INTO request_metrics (method, path, count)
            VALUES ($1, $2, 1)
            ON CONFLICT (method, path)
            DO UPDATE SET
                count = request_metrics.count + 1,
                updated_at = NOW()
            RETURNING id, method, path, count, created_at, updated_at
            "#,
        )
        .bind(method)
        .bind(path)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("increment_request_metric", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        decode_metric(&row)
    }

    #[instrument(skip(self), err)]
    async fn list_all(&self) -> Result<Vec<RequestMetric>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, method, path, count, created_at, updated_at
            FROM request_metrics
            ORDER BY method ASC, path ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_request_metrics", e))?;

        rows.iter().map(decode_metric).collect()
    }
}

/// Escape `LIKE` wildcards so the fragment is matched literally.
fn escape_like(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = db_err.message().to_string();
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Duplicate(msg),
                _ => StoreError::database(operation, msg),
            }
        }
        other => StoreError::database(operation, other.to_string()),
    }
}

// SQLx row types

#[derive(Debug)]
struct ClientRow {
    id: i64,
    name: String,
    document: String,
    kind: String,
    blocked: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ClientRow {
    fn from_pg(row: &sqlx::postgres::PgRow) -> Result<Self, StoreError> {
        let decode = |e: sqlx::Error| StoreError::database("decode_client_row", e.to_string());
        Ok(ClientRow {
            id: row.try_get("id").map_err(decode)?,
            name: row.try_get("name").map_err(decode)?,
            document: row.try_get("document").map_err(decode)?,
            kind: row.try_get("type").map_err(decode)?,
            blocked: row.try_get("blocked").map_err(decode)?,
            created_at: row.try_get("created_at").map_err(decode)?,
            updated_at: row.try_get("updated_at").map_err(decode)?,
        })
    }
}

impl TryFrom<ClientRow> for Client {
    type Error = StoreError;

    fn try_from(row: ClientRow) -> Result<Self, Self::Error> {
        let kind: ClientKind = row
            .kind
            .parse()
            .map_err(|e| StoreError::database("decode_client_row", format!("{e}")))?;

        Ok(Client {
            id: ClientId(row.id),
            name: row.name,
            document: Document::from_trusted(row.document),
            kind,
            blocked: row.blocked,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn decode_clients(rows: &[sqlx::postgres::PgRow]) -> Result<Vec<Client>, StoreError> {
    rows.iter()
        .map(|r| Client::try_from(ClientRow::from_pg(r)?))
        .collect()
}

fn decode_metric(row: &sqlx::postgres::PgRow) -> Result<RequestMetric, StoreError> {
    let decode = |e: sqlx::Error| StoreError::database("decode_request_metric", e.to_string());
    Ok(RequestMetric {
        id: row.try_get("id").map_err(decode)?,
        method: row.try_get("method").map_err(decode)?,
        path: row.try_get("path").map_err(decode)?,
        count: row.try_get("count").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
        updated_at: row.try_get("updated_at").map_err(decode)?,
    })
}
