use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clientreg_core::{DomainError, DomainResult, Entity};

use crate::document::{ClientKind, Document, ValidationMode};

/// Store-assigned client identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub i64);

impl core::fmt::Display for ClientId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Two-state block lifecycle. Every transition must change the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockStatus {
    Unblocked,
    Blocked,
}

impl BlockStatus {
    pub fn is_blocked(self) -> bool {
        self == BlockStatus::Blocked
    }
}

impl From<bool> for BlockStatus {
    fn from(blocked: bool) -> Self {
        if blocked {
            BlockStatus::Blocked
        } else {
            BlockStatus::Unblocked
        }
    }
}

/// Registration input as received from a caller (document not yet validated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub document: String,
    pub kind: ClientKind,
}

/// Validated registration, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub document: Document,
    pub kind: ClientKind,
}

impl NewClient {
    pub fn new(name: impl Into<String>, document: impl Into<String>, kind: ClientKind) -> Self {
        Self {
            name: name.into(),
            document: document.into(),
            kind,
        }
    }

    /// Run the document validator and the name rule.
    pub fn validate(&self, mode: ValidationMode) -> DomainResult<Registration> {
        let document = Document::parse(&self.document, self.kind, mode)?;

        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(Registration {
            name: name.to_string(),
            document,
            kind: self.kind,
        })
    }
}

/// A registered client, as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub document: Document,
    #[serde(rename = "type")]
    pub kind: ClientKind,
    pub blocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Client {
    type Key = Document;

    fn key(&self) -> &Self::Key {
        &self.document
    }
}

impl Client {
    pub fn status(&self) -> BlockStatus {
        BlockStatus::from(self.blocked)
    }

    /// Guard for the Unblocked -> Blocked transition.
    pub fn ensure_can_block(&self) -> DomainResult<()> {
        self.ensure_transition(BlockStatus::Blocked)
    }

    /// Guard for the Blocked -> Unblocked transition.
    pub fn ensure_can_unblock(&self) -> DomainResult<()> {
        self.ensure_transition(BlockStatus::Unblocked)
    }

    /// No-op transitions are rejected rather than treated as idempotent.
    pub fn ensure_transition(&self, target: BlockStatus) -> DomainResult<()> {
        match (self.status(), target) {
            (BlockStatus::Blocked, BlockStatus::Blocked) => Err(DomainError::AlreadyBlocked),
            (BlockStatus::Unblocked, BlockStatus::Unblocked) => Err(DomainError::NotBlocked),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_client(blocked: bool) -> Client {
        let now = Utc::now();
        Client {
            id: ClientId(1),
            name: "Maria Souza".to_string(),
            document: Document::from_trusted("07521001907"),
            kind: ClientKind::Person,
            blocked,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn new_client_validation_normalizes_document() {
        let reg = NewClient::new("  Maria Souza ", "075.210.019-07", ClientKind::Person)
            .validate(ValidationMode::Structural)
            .unwrap();

        assert_eq!(reg.document.as_str(), "07521001907");
        assert_eq!(reg.name, "Maria Souza");
        assert_eq!(reg.kind, ClientKind::Person);
    }

    #[test]
    fn new_client_rejects_blank_name() {
        let err = NewClient::new("   ", "07521001907", ClientKind::Person)
            .validate(ValidationMode::Structural)
            .unwrap_err();

        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for empty name"),
        }
    }

    #[test]
    fn new_client_rejects_document_of_wrong_kind() {
        let err = NewClient::new("Acme", "07521001907", ClientKind::Business)
            .validate(ValidationMode::Structural)
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn unblocked_client_can_only_be_blocked() {
        let client = sample_client(false);
        assert_eq!(client.status(), BlockStatus::Unblocked);
        assert!(client.ensure_can_block().is_ok());
        assert_eq!(client.ensure_can_unblock(), Err(DomainError::NotBlocked));
    }

    #[test]
    fn blocked_client_can_only_be_unblocked() {
        let client = sample_client(true);
        assert!(client.status().is_blocked());
        assert!(client.ensure_can_unblock().is_ok());
        assert_eq!(client.ensure_can_block(), Err(DomainError::AlreadyBlocked));
    }

    #[test]
    fn client_is_keyed_by_document() {
        let client = sample_client(false);
        assert_eq!(client.key().as_str(), "07521001907");
    }
}
