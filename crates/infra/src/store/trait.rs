use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use clientreg_clients::{Client, Registration};

/// Store operation error.
///
/// These are **persistence errors** as opposed to domain errors. The service layer
/// translates the ones with domain meaning (`NotFound`, `Duplicate`, `Unchanged`).
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched the targeted key.
    #[error("record not found")]
    NotFound,

    /// A unique constraint rejected the write.
    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// A conditional update matched the row but it already held the target value.
    #[error("record already holds the requested value")]
    Unchanged,

    /// Opaque I/O, decoding or constraint failure.
    #[error("database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn database(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Database {
            operation,
            message: message.into(),
        }
    }
}

/// Persistent registry of clients, keyed by unique normalized document.
///
/// ## Implementation Requirements
///
/// - `create` must enforce document uniqueness itself and report `Duplicate`;
///   callers' pre-checks are not a substitute.
/// - `find_by_name` is a case-insensitive substring match, ordered by name.
/// - `list_all` is ordered by name ascending and returns an empty vec when empty.
/// - "Ordered by name" means case-insensitive (`LOWER(name)`), ties broken by id,
///   so every backend returns the same order.
/// - `set_blocked` is a compare-and-set on `blocked`: `NotFound` when no row has the
///   document, `Unchanged` when the row already holds `blocked`.
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn create(&self, registration: Registration) -> Result<Client, StoreError>;

    async fn find_by_document(&self, document: &str) -> Result<Option<Client>, StoreError>;

    async fn find_by_name(&self, fragment: &str) -> Result<Vec<Client>, StoreError>;

    async fn list_all(&self) -> Result<Vec<Client>, StoreError>;

    async fn set_blocked(&self, document: &str, blocked: bool) -> Result<Client, StoreError>;
}

#[async_trait]
impl<S> ClientStore for Arc<S>
where
    S: ClientStore + ?Sized,
{
    async fn create(&self, registration: Registration) -> Result<Client, StoreError> {
        (**self).create(registration).await
    }

    async fn find_by_document(&self, document: &str) -> Result<Option<Client>, StoreError> {
        (**self).find_by_document(document).await
    }

    async fn find_by_name(&self, fragment: &str) -> Result<Vec<Client>, StoreError> {
        (**self).find_by_name(fragment).await
    }

    async fn list_all(&self) -> Result<Vec<Client>, StoreError> {
        (**self).list_all().await
    }

    async fn set_blocked(&self, document: &str, blocked: bool) -> Result<Client, StoreError> {
        (**self).set_blocked(document, blocked).await
    }
}

/// Per-route request counter row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetric {
    pub id: i64,
    pub method: String,
    pub path: String,
    pub count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persistent request counters keyed by `(method, path)`.
#[async_trait]
pub trait RequestMetricsStore: Send + Sync {
    /// Create the counter at 1 or add 1 to it, atomically.
    async fn increment(&self, method: &str, path: &str) -> Result<RequestMetric, StoreError>;

    /// All counters, ordered by method then path.
    async fn list_all(&self) -> Result<Vec<RequestMetric>, StoreError>;
}

#[async_trait]
impl<S> RequestMetricsStore for Arc<S>
where
    S: RequestMetricsStore + ?Sized,
{
    async fn increment(&self, method: &str, path: &str) -> Result<RequestMetric, StoreError> {
        (**self).increment(method, path).await
    }

    async fn list_all(&self) -> Result<Vec<RequestMetric>, StoreError> {
        (**self).list_all().await
    }
}
