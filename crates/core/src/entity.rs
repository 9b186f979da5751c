//! Entity trait: identity + continuity across the record's lifetime.

/// Entity marker + minimal interface.
///
/// Stored records implement this so storage adapters can key them without knowing
/// the concrete record type.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
