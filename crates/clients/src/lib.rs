//! Clients domain module (persons and businesses identified by a national document).
//!
//! This crate contains the document validator and the client entity with its
//! block/unblock state machine, implemented purely as deterministic domain logic
//! (no IO, no HTTP, no storage).

pub mod client;
pub mod document;

pub use client::{BlockStatus, Client, ClientId, NewClient, Registration};
pub use document::{ClientKind, Document, ValidationMode, normalize, validate, validate_raw};
