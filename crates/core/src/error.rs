//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// uniqueness, state transitions). Storage failures belong to the infra layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed document, empty name).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The declared party type is not one of the supported kinds.
    #[error("invalid party type: {0}")]
    InvalidPartyType(String),

    /// A client with the same document is already registered.
    #[error("client already exists")]
    AlreadyExists,

    /// A requested resource was not found (domain-level).
    #[error("client not found")]
    NotFound,

    /// Block requested for a client that is already blocked.
    #[error("client is already blocked")]
    AlreadyBlocked,

    /// Unblock requested for a client that is not blocked.
    #[error("client is not blocked")]
    NotBlocked,

    /// A search was issued with an empty query string.
    #[error("search query cannot be empty")]
    EmptyQuery,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_party_type(value: impl Into<String>) -> Self {
        Self::InvalidPartyType(value.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Stable, machine-readable code for this error (used on the wire).
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::InvalidPartyType(_) => "invalid_party_type",
            DomainError::AlreadyExists => "already_exists",
            DomainError::NotFound => "not_found",
            DomainError::AlreadyBlocked => "already_blocked",
            DomainError::NotBlocked => "not_blocked",
            DomainError::EmptyQuery => "empty_query",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_per_variant() {
        assert_eq!(DomainError::validation("x").code(), "validation_error");
        assert_eq!(DomainError::invalid_party_type("X").code(), "invalid_party_type");
        assert_eq!(DomainError::AlreadyExists.code(), "already_exists");
        assert_eq!(DomainError::not_found().code(), "not_found");
        assert_eq!(DomainError::AlreadyBlocked.code(), "already_blocked");
        assert_eq!(DomainError::NotBlocked.code(), "not_blocked");
        assert_eq!(DomainError::EmptyQuery.code(), "empty_query");
    }

    #[test]
    fn validation_message_is_carried_into_display() {
        let err = DomainError::validation("document must have 11 digits");
        assert_eq!(err.to_string(), "validation failed: document must have 11 digits");
    }
}
