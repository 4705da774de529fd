//! Release policies.
//!
//! A release policy (deleter) knows how to give back the resource behind a
//! raw pointer. [`UniquePtr`](crate::UniquePtr) stores exactly one policy and
//! calls [`Delete::delete`] at most once per owned pointer.
//!
//! # Allocation kinds
//!
//! The allocation kind is part of the pointee type. [`DefaultDelete<T>`]
//! releases a single `Box<T>` allocation while `DefaultDelete<[T]>` releases
//! a boxed slice, using the length carried by the slice pointer. The two are
//! different types, so a handle to an array can never be routed through the
//! scalar release:
//!
//! ```compile_fail
//! use oxidex_unique::{DefaultDelete, UniquePtr};
//!
//! // A scalar policy cannot release an array.
//! let _ = UniquePtr::<[u32], DefaultDelete<u32>>::null();
//! ```
//!
//! # Custom policies
//!
//! Any `FnMut(NonNull<T>)` closure is a policy. A closure without captures
//! is zero-sized, so the handle stays pointer-sized:
//!
//! ```
//! use std::ptr::NonNull;
//! use oxidex_unique::UniquePtr;
//!
//! let raw = Box::into_raw(Box::new(7u32));
//! let release = |ptr: NonNull<u32>| drop(unsafe { Box::from_raw(ptr.as_ptr()) });
//! let handle = unsafe { UniquePtr::from_raw_with(raw, release) };
//!
//! assert_eq!(*handle, 7);
//! assert_eq!(std::mem::size_of_val(&handle), std::mem::size_of::<*mut u32>());
//! ```

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

/// Releases the resource behind a raw pointer.
pub trait Delete<T: ?Sized> {
    /// Releases `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must denote a live resource that this policy is able to release
    /// (for [`DefaultDelete`], one produced by `Box<T>`), and it must not have
    /// been released before. After the call `ptr` dangles.
    unsafe fn delete(&mut self, ptr: NonNull<T>);
}

impl<T: ?Sized, F> Delete<T> for F
where
    F: FnMut(NonNull<T>),
{
    #[inline]
    unsafe fn delete(&mut self, ptr: NonNull<T>) {
        self(ptr);
    }
}

/// Carries a policy over to a handle whose pointee is a compatible type.
///
/// Used by [`UniquePtr::map_raw`](crate::UniquePtr::map_raw) when ownership
/// moves from `UniquePtr<T, D>` to `UniquePtr<U, D::Output>`, for example
/// from a concrete type to a trait object. Rebinding never releases anything.
pub trait Rebind<U: ?Sized> {
    /// The policy for the new pointee type.
    type Output: Delete<U>;

    /// Converts this policy, keeping its state.
    fn rebind(self) -> Self::Output;
}

// ============================================================================
// Default Delete
// ============================================================================

/// The stateless policy for memory obtained from `Box`.
///
/// Dropping the value and freeing its allocation is delegated to
/// `Box::from_raw`, which uses the correct layout for sized values, slices
/// (array allocations) and trait objects alike.
pub struct DefaultDelete<T: ?Sized> {
    _marker: PhantomData<fn() -> NonNull<T>>,
}

impl<T: ?Sized> DefaultDelete<T> {
    /// Creates the policy.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> Default for DefaultDelete<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for DefaultDelete<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for DefaultDelete<T> {}

impl<T: ?Sized> PartialEq for DefaultDelete<T> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<T: ?Sized> Eq for DefaultDelete<T> {}

impl<T: ?Sized> fmt::Debug for DefaultDelete<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DefaultDelete<{}>", type_name::<T>())
    }
}

impl<T: ?Sized> Delete<T> for DefaultDelete<T> {
    #[inline]
    unsafe fn delete(&mut self, ptr: NonNull<T>) {
        // SAFETY: the caller guarantees `ptr` came from a `Box<T>` that is
        // still live. For `T = [E]` the slice pointer carries the length of
        // the original boxed slice.
        drop(unsafe { Box::from_raw(ptr.as_ptr()) });
    }
}

impl<T: ?Sized, U: ?Sized> Rebind<U> for DefaultDelete<T> {
    type Output = DefaultDelete<U>;

    #[inline]
    fn rebind(self) -> DefaultDelete<U> {
        DefaultDelete::new()
    }
}

// ============================================================================
// No-op Delete
// ============================================================================

/// A policy that never releases anything.
///
/// For pointers whose lifetime is managed elsewhere (statics, arena memory,
/// memory borrowed from a foreign caller).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NoopDelete;

impl<T: ?Sized> Delete<T> for NoopDelete {
    #[inline]
    unsafe fn delete(&mut self, _ptr: NonNull<T>) {}
}

impl<U: ?Sized> Rebind<U> for NoopDelete {
    type Output = NoopDelete;

    #[inline]
    fn rebind(self) -> NoopDelete {
        self
    }
}

// ============================================================================
// Logged
// ============================================================================

/// Wraps a policy and emits a trace record for every release.
///
/// Zero-sized whenever the inner policy is.
///
/// ```
/// use oxidex_unique::{DefaultDelete, Logged, UniquePtr};
///
/// let raw = Box::into_raw(Box::new(1u8));
/// let handle = unsafe { UniquePtr::from_raw_with(raw, Logged::new(DefaultDelete::<u8>::new())) };
/// drop(handle); // [TRACE] oxidex_unique::delete: releasing u8 at 0x...
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Logged<D> {
    inner: D,
}

impl<D> Logged<D> {
    /// Wraps `inner`.
    #[must_use]
    pub const fn new(inner: D) -> Self {
        Self { inner }
    }

    /// Returns the wrapped policy.
    #[must_use]
    pub const fn inner(&self) -> &D {
        &self.inner
    }

    /// Unwraps the policy.
    #[must_use]
    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<T: ?Sized, D: Delete<T>> Delete<T> for Logged<D> {
    unsafe fn delete(&mut self, ptr: NonNull<T>) {
        oxidex_log::trace!("releasing {} at {:p}", type_name::<T>(), ptr);
        // SAFETY: forwarded from the caller.
        unsafe { self.inner.delete(ptr) }
    }
}

impl<U: ?Sized, D: Rebind<U>> Rebind<U> for Logged<D> {
    type Output = Logged<D::Output>;

    #[inline]
    fn rebind(self) -> Logged<D::Output> {
        Logged::new(Rebind::<U>::rebind(self.inner))
    }
}
