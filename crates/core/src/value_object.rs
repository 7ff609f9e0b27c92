//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**; two instances holding the same values are
//! the same value. A normalized national document number is the typical example
//! in this codebase: `"075.210.019-07"` and `"07521001907"` normalize to one value.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new instance.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Document(String);
///
/// impl ValueObject for Document {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
