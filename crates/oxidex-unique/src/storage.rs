//! Storage for the release policy of a handle.
//!
//! [`DeleterStorage`] holds exactly one policy per handle. Whether the policy
//! costs any bytes is decided at compile time by its type: a policy without
//! per-instance state is zero-sized and vanishes from the handle's layout,
//! while a stateful one is laid out as an ordinary field. Both cases go
//! through the same accessors and [`DeleterStorage::STATELESS`] exposes which
//! one applies.
//!
//! ```
//! use oxidex_unique::{DefaultDelete, DeleterStorage, UniquePtr};
//! use std::mem::size_of;
//!
//! assert!(DeleterStorage::<DefaultDelete<u32>>::STATELESS);
//! assert_eq!(size_of::<UniquePtr<u32>>(), size_of::<*mut u32>());
//! ```

use std::fmt;
use std::mem::{self, size_of};

/// Owns the release policy of a [`UniquePtr`](crate::UniquePtr).
#[repr(transparent)]
#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub struct DeleterStorage<D> {
    deleter: D,
}

impl<D> DeleterStorage<D> {
    /// `true` when `D` carries no per-instance state and adds no size.
    pub const STATELESS: bool = size_of::<D>() == 0;

    /// Stores `deleter`.
    #[inline]
    #[must_use]
    pub const fn new(deleter: D) -> Self {
        Self { deleter }
    }

    /// Returns the stored policy.
    #[inline]
    #[must_use]
    pub const fn get(&self) -> &D {
        &self.deleter
    }

    /// Returns the stored policy mutably.
    #[inline]
    pub fn get_mut(&mut self) -> &mut D {
        &mut self.deleter
    }

    /// Swaps in a new policy, returning the old one.
    #[inline]
    pub fn replace(&mut self, deleter: D) -> D {
        mem::replace(&mut self.deleter, deleter)
    }

    /// Unwraps the policy.
    #[inline]
    pub fn into_inner(self) -> D {
        self.deleter
    }
}

impl<D: fmt::Debug> fmt::Debug for DeleterStorage<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeleterStorage")
            .field("deleter", &self.deleter)
            .field("stateless", &Self::STATELESS)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delete::{DefaultDelete, Logged, NoopDelete};
    use std::ptr::NonNull;

    #[derive(Debug, Default, PartialEq)]
    struct Tagged {
        tag: u32,
    }

    #[test]
    fn test_stateless_policies_take_no_space() {
        assert!(DeleterStorage::<DefaultDelete<String>>::STATELESS);
        assert!(DeleterStorage::<NoopDelete>::STATELESS);
        assert!(DeleterStorage::<Logged<NoopDelete>>::STATELESS);
        assert_eq!(size_of::<DeleterStorage<DefaultDelete<[u8]>>>(), 0);
    }

    #[test]
    fn test_stateful_policies_are_embedded_as_fields() {
        assert!(!DeleterStorage::<Tagged>::STATELESS);
        assert!(!DeleterStorage::<fn(NonNull<u8>)>::STATELESS);
        assert_eq!(size_of::<DeleterStorage<Tagged>>(), size_of::<Tagged>());
    }

    #[test]
    fn test_construction_and_access() {
        let mut storage = DeleterStorage::new(Tagged { tag: 3 });
        assert_eq!(storage.get().tag, 3);

        storage.get_mut().tag = 4;
        assert_eq!(storage.get(), &Tagged { tag: 4 });

        let old = storage.replace(Tagged { tag: 5 });
        assert_eq!(old.tag, 4);
        assert_eq!(storage.into_inner().tag, 5);

        assert_eq!(DeleterStorage::<Tagged>::default().get().tag, 0);
    }
}
