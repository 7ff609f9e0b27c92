//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Natural key that identifies the entity across its whole lifecycle.
    type Key: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity key.
    fn key(&self) -> &Self::Key;
}
