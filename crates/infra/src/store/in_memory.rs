use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use clientreg_clients::{Client, ClientId, Document, Registration};
use clientreg_core::Entity;

use super::r#trait::{ClientStore, RequestMetric, RequestMetricsStore, StoreError};

#[derive(Debug, Default)]
struct ClientTable {
    next_id: i64,
    by_document: HashMap<Document, Client>,
}

/// In-memory client store.
///
/// Intended for tests/dev. The map key plays the role of the unique index.
#[derive(Debug, Default)]
pub struct InMemoryClientStore {
    inner: RwLock<ClientTable>,
}

impl InMemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(operation: &'static str) -> StoreError {
    StoreError::database(operation, "lock poisoned")
}

/// Case-insensitive name order, id as tie-break; matches `ORDER BY LOWER(name), id`.
fn sort_by_name(clients: &mut [Client]) {
    clients.sort_by_cached_key(|c| (c.name.to_lowercase(), c.id));
}

#[async_trait]
impl ClientStore for InMemoryClientStore {
    async fn create(&self, registration: Registration) -> Result<Client, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned("create"))?;

        if table.by_document.contains_key(registration.document.as_str()) {
            return Err(StoreError::Duplicate(format!(
                "document {}",
                registration.document
            )));
        }

        table.next_id += 1;
        let now = Utc::now();
        let client = Client {
            id: ClientId(table.next_id),
            name: registration.name,
            document: registration.document,
            kind: registration.kind,
            blocked: false,
            created_at: now,
            updated_at: now,
        };
        table.by_document.insert(client.key().clone(), client.clone());
        Ok(client)
    }

    async fn find_by_document(&self, document: &str) -> Result<Option<Client>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned("find_by_document"))?;
        Ok(table.by_document.get(document).cloned())
    }

    async fn find_by_name(&self, fragment: &str) -> Result<Vec<Client>, StoreError> {
        let needle = fragment.to_lowercase();
        let table = self.inner.read().map_err(|_| poisoned("find_by_name"))?;

        let mut found: Vec<Client> = table
            .by_document
            .values()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        sort_by_name(&mut found);
        Ok(found)
    }

    async fn list_all(&self) -> Result<Vec<Client>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned("list_all"))?;
        let mut all: Vec<Client> = table.by_document.values().cloned().collect();
        sort_by_name(&mut all);
        Ok(all)
    }

    async fn set_blocked(&self, document: &str, blocked: bool) -> Result<Client, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned("set_blocked"))?;
        let client = table
            .by_document
            .get_mut(document)
            .ok_or(StoreError::NotFound)?;

        if client.blocked == blocked {
            return Err(StoreError::Unchanged);
        }

        client.blocked = blocked;
        client.updated_at = Utc::now();
        Ok(client.clone())
    }
}

#[derive(Debug, Default)]
struct MetricsTable {
    next_id: i64,
    rows: HashMap<(String, String), RequestMetric>,
}

/// In-memory request counters for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryRequestMetricsStore {
    inner: RwLock<MetricsTable>,
}

impl InMemoryRequestMetricsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RequestMetricsStore for InMemoryRequestMetricsStore {
    async fn increment(&self, method: &str, path: &str) -> Result<RequestMetric, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned("increment"))?;
        let now = Utc::now();

        let next_id = table.next_id + 1;
        let row = table
            .rows
            .entry((method.to_string(), path.to_string()))
            .or_insert_with(|| RequestMetric {
                id: next_id,
                method: method.to_string(),
                path: path.to_string(),
                count: 0,
                created_at: now,
                updated_at: now,
            });
        row.count += 1;
        row.updated_at = now;
        let out = row.clone();

        if out.id == next_id {
            table.next_id = next_id;
        }
        Ok(out)
    }

    async fn list_all(&self) -> Result<Vec<RequestMetric>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned("list_all"))?;
        let mut all: Vec<RequestMetric> = table.rows.values().cloned().collect();
        all.sort_by(|a, b| a.method.cmp(&b.method).then_with(|| a.path.cmp(&b.path)));
        Ok(all)
    }
}
