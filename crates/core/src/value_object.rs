//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**. They are defined entirely by their
//! attribute values, and constructing one is where validation happens:
//! holding a `Quantity` or a `ChemicalIdentifier` means the value already
//! passed its rules.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq)]
/// struct Unit(String);
///
/// impl ValueObject for Unit {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
