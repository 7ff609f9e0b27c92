//! Client Registry Service.
//!
//! Business rules for registration and the block/unblock lifecycle:
//!
//! ```text
//! create:   validate -> find_by_document (fast path) -> store.create (unique index)
//! block:    find_by_document -> guard transition -> store.set_blocked (compare-and-set)
//! ```
//!
//! The read-before-write checks only exist to produce precise errors early. Under
//! concurrent requests for one document both checks can pass; the store's unique
//! constraint and conditional update are what actually hold the invariants, and
//! their rejections are mapped back onto the same domain errors here.

use thiserror::Error;
use tracing::{info, instrument, warn};

use clientreg_clients::{BlockStatus, Client, NewClient, ValidationMode, normalize};
use clientreg_core::DomainError;

use crate::store::{ClientStore, StoreError};

#[derive(Debug, Error)]
pub enum ClientServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ClientServiceError {
    /// Domain error, if this failure has a business meaning.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            ClientServiceError::Domain(e) => Some(e),
            ClientServiceError::Store(_) => None,
        }
    }
}

pub type ClientServiceResult<T> = Result<T, ClientServiceError>;

/// Client registry operations over any [`ClientStore`].
#[derive(Debug, Clone)]
pub struct ClientService<S> {
    store: S,
    validation: ValidationMode,
}

impl<S> ClientService<S>
where
    S: ClientStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            validation: ValidationMode::default(),
        }
    }

    pub fn with_validation_mode(mut self, mode: ValidationMode) -> Self {
        self.validation = mode;
        self
    }

    pub fn validation_mode(&self) -> ValidationMode {
        self.validation
    }

    /// Register a new client. The stored document is the normalized digits.
    #[instrument(skip(self, new_client), fields(kind = %new_client.kind), err)]
    pub async fn create_client(&self, new_client: NewClient) -> ClientServiceResult<Client> {
        let registration = new_client.validate(self.validation)?;

        if self
            .store
            .find_by_document(registration.document.as_str())
            .await?
            .is_some()
        {
            warn!(document = %registration.document, "client already registered");
            return Err(DomainError::AlreadyExists.into());
        }

        let client = self.store.create(registration).await.map_err(|e| match e {
            StoreError::Duplicate(_) => ClientServiceError::Domain(DomainError::AlreadyExists),
            other => other.into(),
        })?;

        info!(client_id = %client.id, document = %client.document, "client registered");
        Ok(client)
    }

    /// All clients ordered by name; empty when there are none.
    #[instrument(skip(self), err)]
    pub async fn list_clients(&self) -> ClientServiceResult<Vec<Client>> {
        Ok(self.store.list_all().await?)
    }

    #[instrument(skip(self), err)]
    pub async fn block_client(&self, document: &str) -> ClientServiceResult<Client> {
        self.transition(document, BlockStatus::Blocked).await
    }

    #[instrument(skip(self), err)]
    pub async fn unblock_client(&self, document: &str) -> ClientServiceResult<Client> {
        self.transition(document, BlockStatus::Unblocked).await
    }

    #[instrument(skip(self), err)]
    pub async fn get_client_by_document(&self, document: &str) -> ClientServiceResult<Client> {
        let document = normalize(document);
        self.store
            .find_by_document(&document)
            .await?
            .ok_or_else(|| DomainError::not_found().into())
    }

    /// Case-insensitive substring search on the name.
    ///
    /// Zero matches is reported as `NotFound` rather than an empty list.
    #[instrument(skip(self), err)]
    pub async fn get_clients_by_name(&self, pattern: &str) -> ClientServiceResult<Vec<Client>> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(DomainError::EmptyQuery.into());
        }

        let clients = self.store.find_by_name(pattern).await?;
        if clients.is_empty() {
            return Err(DomainError::not_found().into());
        }
        Ok(clients)
    }

    async fn transition(&self, document: &str, target: BlockStatus) -> ClientServiceResult<Client> {
        let document = normalize(document);
        if document.is_empty() {
            return Err(DomainError::validation("document is required").into());
        }

        let current = self
            .store
            .find_by_document(&document)
            .await?
            .ok_or(DomainError::NotFound)?;

        if let Err(e) = current.ensure_transition(target) {
            warn!(document = %document, error = %e, "rejected block transition");
            return Err(e.into());
        }

        let updated = self
            .store
            .set_blocked(&document, target.is_blocked())
            .await
            .map_err(|e| match e {
                // Lost a race against a concurrent transition or removal.
                StoreError::Unchanged => ClientServiceError::Domain(match target {
                    BlockStatus::Blocked => DomainError::AlreadyBlocked,
                    BlockStatus::Unblocked => DomainError::NotBlocked,
                }),
                StoreError::NotFound => ClientServiceError::Domain(DomainError::NotFound),
                other => other.into(),
            })?;

        info!(document = %document, status = ?updated.status(), "client status changed");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use clientreg_clients::{ClientKind, Registration};

    use super::*;
    use crate::store::InMemoryClientStore;

    fn service() -> ClientService<Arc<InMemoryClientStore>> {
        ClientService::new(Arc::new(InMemoryClientStore::new()))
    }

    fn person(name: &str, document: &str) -> NewClient {
        NewClient::new(name, document, ClientKind::Person)
    }

    fn domain_err(err: ClientServiceError) -> DomainError {
        match err {
            ClientServiceError::Domain(e) => e,
            other => panic!("Expected domain error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_client_stores_normalized_document() {
        let svc = service();
        let client = svc
            .create_client(person("Maria Souza", "075.210.019-07"))
            .await
            .unwrap();

        assert_eq!(client.document.as_str(), "07521001907");
        assert!(!client.blocked);

        let fetched = svc.get_client_by_document("07521001907").await.unwrap();
        assert_eq!(fetched, client);
    }

    #[tokio::test]
    async fn create_client_rejects_invalid_document() {
        let svc = service();
        let err = svc.create_client(person("Short", "123")).await.unwrap_err();
        assert!(matches!(domain_err(err), DomainError::Validation(_)));
        assert!(svc.list_clients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_document_after_normalization_is_rejected_without_mutation() {
        let svc = service();
        svc.create_client(person("First", "07521001907")).await.unwrap();

        let err = svc
            .create_client(person("Second", "075.210.019-07"))
            .await
            .unwrap_err();
        assert_eq!(domain_err(err), DomainError::AlreadyExists);

        let all = svc.list_clients().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "First");
    }

    #[tokio::test]
    async fn list_clients_on_empty_store_is_empty() {
        let svc = service();
        assert_eq!(svc.list_clients().await.unwrap(), Vec::<Client>::new());
    }

    #[tokio::test]
    async fn list_clients_is_ordered_by_name() {
        let svc = service();
        svc.create_client(NewClient::new("Zulu SA", "12345678901234", ClientKind::Business))
            .await
            .unwrap();
        svc.create_client(person("alfa", "07521001907")).await.unwrap();

        let names: Vec<String> = svc
            .list_clients()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["alfa", "Zulu SA"]);
    }

    #[tokio::test]
    async fn block_then_unblock_round_trip() {
        let svc = service();
        svc.create_client(person("Ana", "07521001907")).await.unwrap();

        let blocked = svc.block_client("075.210.019-07").await.unwrap();
        assert!(blocked.blocked);

        let unblocked = svc.unblock_client("07521001907").await.unwrap();
        assert!(!unblocked.blocked);
    }

    #[tokio::test]
    async fn block_already_blocked_fails_and_leaves_state() {
        let svc = service();
        svc.create_client(person("Ana", "07521001907")).await.unwrap();
        svc.block_client("07521001907").await.unwrap();

        let err = svc.block_client("07521001907").await.unwrap_err();
        assert_eq!(domain_err(err), DomainError::AlreadyBlocked);
        assert!(svc.get_client_by_document("07521001907").await.unwrap().blocked);
    }

    #[tokio::test]
    async fn unblock_unblocked_fails_and_leaves_state() {
        let svc = service();
        svc.create_client(person("Ana", "07521001907")).await.unwrap();

        let err = svc.unblock_client("07521001907").await.unwrap_err();
        assert_eq!(domain_err(err), DomainError::NotBlocked);
        assert!(!svc.get_client_by_document("07521001907").await.unwrap().blocked);
    }

    #[tokio::test]
    async fn block_and_lookup_of_unknown_document_is_not_found() {
        let svc = service();
        assert_eq!(
            domain_err(svc.block_client("99999999999").await.unwrap_err()),
            DomainError::NotFound
        );
        assert_eq!(
            domain_err(svc.unblock_client("99999999999").await.unwrap_err()),
            DomainError::NotFound
        );
        assert_eq!(
            domain_err(svc.get_client_by_document("99999999999").await.unwrap_err()),
            DomainError::NotFound
        );
    }

    #[tokio::test]
    async fn name_search_rules() {
        let svc = service();
        svc.create_client(person("Maria Souza", "07521001907")).await.unwrap();

        assert_eq!(
            domain_err(svc.get_clients_by_name("").await.unwrap_err()),
            DomainError::EmptyQuery
        );
        assert_eq!(
            domain_err(svc.get_clients_by_name("xyz-no-match").await.unwrap_err()),
            DomainError::NotFound
        );

        let found = svc.get_clients_by_name("souza").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Maria Souza");
    }

    #[tokio::test]
    async fn check_digit_mode_rejects_structurally_valid_but_wrong_numbers() {
        let svc = service().with_validation_mode(ValidationMode::CheckDigits);
        let err = svc
            .create_client(NewClient::new("Acme", "12345678901234", ClientKind::Business))
            .await
            .unwrap_err();
        assert!(matches!(domain_err(err), DomainError::Validation(_)));

        svc.create_client(NewClient::new("Acme", "11.222.333/0001-81", ClientKind::Business))
            .await
            .unwrap();
    }

    /// Store whose pre-check never sees existing rows, like a request that lost a race.
    struct RacingStore {
        inner: InMemoryClientStore,
    }

    #[async_trait]
    impl ClientStore for RacingStore {
        async fn create(&self, registration: Registration) -> Result<Client, StoreError> {
            self.inner.create(registration).await
        }

        async fn find_by_document(&self, _document: &str) -> Result<Option<Client>, StoreError> {
            Ok(None)
        }

        async fn find_by_name(&self, fragment: &str) -> Result<Vec<Client>, StoreError> {
            self.inner.find_by_name(fragment).await
        }

        async fn list_all(&self) -> Result<Vec<Client>, StoreError> {
            self.inner.list_all().await
        }

        async fn set_blocked(&self, document: &str, blocked: bool) -> Result<Client, StoreError> {
            self.inner.set_blocked(document, blocked).await
        }
    }

    #[tokio::test]
    async fn store_unique_constraint_backs_up_the_pre_check() {
        let svc = ClientService::new(RacingStore {
            inner: InMemoryClientStore::new(),
        });
        svc.create_client(person("First", "07521001907")).await.unwrap();

        let err = svc.create_client(person("Second", "07521001907")).await.unwrap_err();
        assert_eq!(domain_err(err), DomainError::AlreadyExists);
    }

    /// Store whose reads always report a fixed `blocked` flag, like a request that
    /// read the row just before a concurrent transition committed.
    struct StaleReadStore {
        inner: InMemoryClientStore,
        reported_blocked: bool,
    }

    #[async_trait]
    impl ClientStore for StaleReadStore {
        async fn create(&self, registration: Registration) -> Result<Client, StoreError> {
            self.inner.create(registration).await
        }

        async fn find_by_document(&self, document: &str) -> Result<Option<Client>, StoreError> {
            Ok(self.inner.find_by_document(document).await?.map(|mut c| {
                c.blocked = self.reported_blocked;
                c
            }))
        }

        async fn find_by_name(&self, fragment: &str) -> Result<Vec<Client>, StoreError> {
            self.inner.find_by_name(fragment).await
        }

        async fn list_all(&self) -> Result<Vec<Client>, StoreError> {
            self.inner.list_all().await
        }

        async fn set_blocked(&self, document: &str, blocked: bool) -> Result<Client, StoreError> {
            self.inner.set_blocked(document, blocked).await
        }
    }

    fn stale_service(reported_blocked: bool) -> ClientService<StaleReadStore> {
        ClientService::new(StaleReadStore {
            inner: InMemoryClientStore::new(),
            reported_blocked,
        })
    }

    #[tokio::test]
    async fn lost_block_race_is_reported_as_already_blocked() {
        let svc = stale_service(false);
        svc.create_client(person("Ana", "07521001907")).await.unwrap();

        let first = svc.block_client("07521001907").await.unwrap();
        assert!(first.blocked);

        let err = svc.block_client("07521001907").await.unwrap_err();
        assert_eq!(domain_err(err), DomainError::AlreadyBlocked);

        let stored = svc.store.inner.find_by_document("07521001907").await.unwrap().unwrap();
        assert!(stored.blocked);
    }

    #[tokio::test]
    async fn lost_unblock_race_is_reported_as_not_blocked() {
        let svc = stale_service(true);
        svc.create_client(person("Ana", "07521001907")).await.unwrap();

        let err = svc.unblock_client("07521001907").await.unwrap_err();
        assert_eq!(domain_err(err), DomainError::NotBlocked);

        let stored = svc.store.inner.find_by_document("07521001907").await.unwrap().unwrap();
        assert!(!stored.blocked);
    }

    #[tokio::test]
    async fn client_removed_mid_transition_is_not_found() {
        struct VanishingStore;

        #[async_trait]
        impl ClientStore for VanishingStore {
            async fn create(&self, _registration: Registration) -> Result<Client, StoreError> {
                Err(StoreError::database("create", "read-only"))
            }

            async fn find_by_document(&self, document: &str) -> Result<Option<Client>, StoreError> {
                let now = chrono::Utc::now();
                Ok(Some(Client {
                    id: clientreg_clients::ClientId(1),
                    name: "Gone".to_string(),
                    document: clientreg_clients::Document::from_trusted(document),
                    kind: ClientKind::Person,
                    blocked: false,
                    created_at: now,
                    updated_at: now,
                }))
            }

            async fn find_by_name(&self, _fragment: &str) -> Result<Vec<Client>, StoreError> {
                Ok(vec![])
            }

            async fn list_all(&self) -> Result<Vec<Client>, StoreError> {
                Ok(vec![])
            }

            async fn set_blocked(&self, _document: &str, _blocked: bool) -> Result<Client, StoreError> {
                Err(StoreError::NotFound)
            }
        }

        let svc = ClientService::new(VanishingStore);
        let err = svc.block_client("07521001907").await.unwrap_err();
        assert_eq!(domain_err(err), DomainError::NotFound);
    }
}
