use serde::{Deserialize, Serialize};

use clientreg_clients::{ClientKind, NewClient};
use clientreg_core::DomainResult;

// -------------------------
// Request DTOs
// -------------------------

/// `POST /clients` body.
///
/// `type` stays a raw string here so an unknown value surfaces as
/// `invalid_party_type` instead of a generic body rejection.
#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub document: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl CreateClientRequest {
    pub fn into_new_client(self) -> DomainResult<NewClient> {
        let kind: ClientKind = self.kind.parse()?;
        Ok(NewClient::new(self.name, self.document, kind))
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub const BLOCKED: Self = Self {
        message: "client blocked",
    };
    pub const UNBLOCKED: Self = Self {
        message: "client unblocked",
    };
}
