//! The exclusive-ownership handle.
//!
//! [`UniquePtr<T, D>`] owns at most one resource behind a raw pointer and
//! releases it through its policy `D` exactly once: on [`reset`], on
//! replacement by assignment, or when the handle is dropped. Ownership can be
//! handed out with [`release`] (no release happens) and moved between handles
//! with ordinary Rust moves or [`take`].
//!
//! # States
//!
//! A handle is either *empty* (`get()` is `None`) or *owning*. Empty handles
//! never call their policy.
//!
//! | From    | Operation                               | To      |
//! |---------|-----------------------------------------|---------|
//! | empty   | `from_raw`, `reset_raw`, assignment     | owning  |
//! | owning  | `release`, `reset`, `take`              | empty   |
//! | owning  | `reset_raw` (old released), `swap`      | owning  |
//! | any     | drop                                    | gone    |
//!
//! # Copying
//!
//! A handle cannot be duplicated:
//!
//! ```compile_fail
//! use oxidex_unique::UniquePtr;
//!
//! let a = UniquePtr::new(1u32);
//! let b: UniquePtr<u32> = Clone::clone(&a);
//! ```
//!
//! ```compile_fail
//! use oxidex_unique::UniquePtr;
//!
//! let a = UniquePtr::new(1u32);
//! let b = a;
//! let c = a;
//! ```
//!
//! # Examples
//!
//! ```
//! use oxidex_unique::UniquePtr;
//!
//! let mut first = UniquePtr::new(String::from("owned"));
//! let second = first.take();
//!
//! assert!(first.is_null());
//! assert_eq!(second.as_deref(), Some("owned"));
//! ```
//!
//! [`reset`]: UniquePtr::reset
//! [`release`]: UniquePtr::release
//! [`take`]: UniquePtr::take

use crate::delete::{DefaultDelete, Delete, Rebind};
use crate::error::{Error, Result};
use crate::storage::DeleterStorage;
use std::alloc::Layout;
use std::fmt;
use std::iter;
use std::marker::PhantomData;
use std::mem::{self, ManuallyDrop};
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

/// An exclusive-ownership pointer with a pluggable release policy.
///
/// `None` in the raw slot is the null sentinel, so a handle with a stateless
/// policy is exactly as large as `*mut T`.
///
/// # Method resolution
///
/// Inherent methods take precedence over the pointee's methods reached
/// through `Deref`. On a `UniquePtr<[T]>`, `get` and `swap` are the handle's
/// own; call the slice versions through [`as_ref`](Self::as_ref),
/// [`as_mut`](Self::as_mut) or an explicit `*`:
///
/// ```
/// use oxidex_unique::UniquePtr;
///
/// let mut values = UniquePtr::from_vec(vec![1, 2, 3]);
/// assert_eq!((*values).get(1), Some(&2));
/// values.as_mut().unwrap().swap(0, 2);
/// assert_eq!(values.as_ref(), Some(&[3, 2, 1][..]));
///
/// // `len` agrees with the slice, and is `0` for an empty handle.
/// assert_eq!(values.len(), 3);
/// ```
pub struct UniquePtr<T: ?Sized, D: Delete<T> = DefaultDelete<T>> {
    raw: Option<NonNull<T>>,
    storage: DeleterStorage<D>,
    _owns: PhantomData<T>,
}

// SAFETY: the handle owns its pointee exclusively, exactly like `Box<T>`;
// sending the handle sends the `T` and the policy along with it.
unsafe impl<T: ?Sized + Send, D: Delete<T> + Send> Send for UniquePtr<T, D> {}

// SAFETY: shared access only hands out `&T` and `&D`.
unsafe impl<T: ?Sized + Sync, D: Delete<T> + Sync> Sync for UniquePtr<T, D> {}

impl<T: ?Sized, D: Delete<T> + Default> UniquePtr<T, D> {
    /// Creates an empty handle with a default policy.
    #[must_use]
    pub fn null() -> Self {
        Self::null_with(D::default())
    }

    /// Takes ownership of `raw` with a default policy.
    ///
    /// A null `raw` yields an empty handle.
    ///
    /// # Safety
    ///
    /// If non-null, `raw` must point to a live resource that `D` can release
    /// (for [`DefaultDelete`], memory from `Box<T>`), and nothing else may
    /// release it afterwards.
    #[must_use]
    pub unsafe fn from_raw(raw: *mut T) -> Self {
        // SAFETY: forwarded from the caller.
        unsafe { Self::from_raw_with(raw, D::default()) }
    }

    /// Moves ownership out, leaving this handle empty with a default policy.
    #[must_use = "dropping the returned handle releases the resource"]
    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::null())
    }
}

impl<T: ?Sized, D: Delete<T>> UniquePtr<T, D> {
    /// Creates an empty handle that uses `deleter`.
    #[must_use]
    pub const fn null_with(deleter: D) -> Self {
        Self {
            raw: None,
            storage: DeleterStorage::new(deleter),
            _owns: PhantomData,
        }
    }

    /// Takes ownership of `raw`, to be released through `deleter`.
    ///
    /// # Safety
    ///
    /// Same contract as [`UniquePtr::from_raw`], with `deleter` as the policy.
    #[must_use]
    pub unsafe fn from_raw_with(raw: *mut T, deleter: D) -> Self {
        Self {
            raw: NonNull::new(raw),
            storage: DeleterStorage::new(deleter),
            _owns: PhantomData,
        }
    }

    /// Returns the owned pointer without affecting ownership.
    #[inline]
    #[must_use]
    pub const fn get(&self) -> Option<NonNull<T>> {
        self.raw
    }

    /// Returns `true` if the handle owns nothing.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.raw.is_none()
    }

    /// Returns `true` if the handle owns a resource.
    #[inline]
    #[must_use]
    pub const fn is_some(&self) -> bool {
        self.raw.is_some()
    }

    /// Borrows the pointee, if any.
    #[inline]
    #[must_use]
    pub fn as_ref(&self) -> Option<&T> {
        // SAFETY: an owned pointer is live until released, and `&self`
        // prevents release for the duration of the borrow.
        self.raw.map(|raw| unsafe { raw.as_ref() })
    }

    /// Mutably borrows the pointee, if any.
    #[inline]
    #[must_use]
    pub fn as_mut(&mut self) -> Option<&mut T> {
        // SAFETY: as in `as_ref`, and `&mut self` makes the borrow unique.
        self.raw.map(|mut raw| unsafe { raw.as_mut() })
    }

    /// Borrows the pointee through `Deref`, if any.
    #[inline]
    #[must_use]
    pub fn as_deref(&self) -> Option<&T::Target>
    where
        T: Deref,
    {
        self.as_ref().map(Deref::deref)
    }

    /// Borrows the pointee.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Null`] if the handle owns nothing.
    #[inline]
    pub fn try_deref(&self) -> Result<&T> {
        self.as_ref().ok_or(Error::Null)
    }

    /// Mutably borrows the pointee.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Null`] if the handle owns nothing.
    #[inline]
    pub fn try_deref_mut(&mut self) -> Result<&mut T> {
        self.as_mut().ok_or(Error::Null)
    }

    /// Returns the release policy.
    #[inline]
    #[must_use]
    pub const fn deleter(&self) -> &D {
        self.storage.get()
    }

    /// Returns the release policy mutably.
    #[inline]
    pub fn deleter_mut(&mut self) -> &mut D {
        self.storage.get_mut()
    }

    /// Gives up ownership without releasing.
    ///
    /// The caller becomes responsible for the returned pointer; the handle is
    /// left empty and will never pass that pointer to its policy.
    #[inline]
    #[must_use = "the released resource leaks unless it is released by the caller"]
    pub fn release(&mut self) -> Option<NonNull<T>> {
        self.raw.take()
    }

    /// Consumes the handle, returning the owned pointer unreleased.
    ///
    /// The policy is dropped.
    #[must_use = "the released resource leaks unless it is released by the caller"]
    pub fn into_raw(self) -> Option<NonNull<T>> {
        let (raw, _deleter) = self.into_raw_parts();
        raw
    }

    /// Consumes the handle, returning the owned pointer and the policy.
    #[must_use = "the released resource leaks unless it is released by the caller"]
    pub fn into_raw_parts(self) -> (Option<NonNull<T>>, D) {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the storage is moved out
        // exactly once.
        let storage = unsafe { ptr::read(&this.storage) };
        (this.raw, storage.into_inner())
    }

    /// Releases the owned resource, if any, leaving the handle empty.
    pub fn reset(&mut self) {
        if let Some(old) = self.raw.take() {
            // SAFETY: `old` was owned by this handle and has just been
            // removed from it, so it is released exactly once.
            unsafe { self.storage.get_mut().delete(old) };
        }
    }

    /// Adopts `raw` and releases the previously owned resource, if any.
    ///
    /// The new pointer is stored before the old one is released, so the old
    /// pointer is never released twice even if the policy panics.
    ///
    /// # Safety
    ///
    /// Same contract as [`UniquePtr::from_raw`]. `raw` must not be the
    /// pointer this handle already owns.
    pub unsafe fn reset_raw(&mut self, raw: *mut T) {
        let old = mem::replace(&mut self.raw, NonNull::new(raw));
        if let Some(old) = old {
            // SAFETY: `old` is no longer reachable through this handle.
            unsafe { self.storage.get_mut().delete(old) };
        }
    }

    /// Exchanges pointers and policies with `other`. Nothing is released.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Moves `other` into this handle and returns the previous contents
    /// unreleased.
    #[inline]
    #[must_use = "dropping the returned handle releases the previous resource"]
    pub fn replace(&mut self, other: Self) -> Self {
        mem::replace(self, other)
    }

    /// Transfers ownership to a handle of a compatible pointee type.
    ///
    /// The policy is carried over with [`Rebind`]. Prefer the
    /// [`coerce_unique!`](crate::coerce_unique) macro, which restricts `f` to
    /// unsizing coercions.
    ///
    /// # Safety
    ///
    /// `f` must return a pointer to the same allocation that the rebound
    /// policy is able to release, for example the input pointer coerced to a
    /// trait object or slice type.
    pub unsafe fn map_raw<U, F>(self, f: F) -> UniquePtr<U, D::Output>
    where
        U: ?Sized,
        D: Rebind<U>,
        F: FnOnce(NonNull<T>) -> NonNull<U>,
    {
        let (raw, deleter) = self.into_raw_parts();
        UniquePtr {
            raw: raw.map(f),
            storage: DeleterStorage::new(Rebind::<U>::rebind(deleter)),
            _owns: PhantomData,
        }
    }
}

// ============================================================================
// Box interop
// ============================================================================

impl<T> UniquePtr<T> {
    /// Allocates `value` on the heap and takes ownership of it.
    #[inline]
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::from_box(Box::new(value))
    }
}

impl<T: ?Sized> UniquePtr<T> {
    /// Takes ownership of a boxed value.
    #[inline]
    #[must_use]
    pub fn from_box(boxed: Box<T>) -> Self {
        Self {
            raw: Some(NonNull::from(Box::leak(boxed))),
            storage: DeleterStorage::default(),
            _owns: PhantomData,
        }
    }

    /// Converts back into a `Box`, or `None` for an empty handle.
    #[must_use]
    pub fn into_box(self) -> Option<Box<T>> {
        // SAFETY: with `DefaultDelete` every owned pointer came from a `Box`.
        self.into_raw().map(|raw| unsafe { Box::from_raw(raw.as_ptr()) })
    }

    /// Adopts a boxed value and releases the previously owned one, if any.
    pub fn reset_box(&mut self, boxed: Box<T>) {
        // SAFETY: a fresh `Box` allocation is owned by nobody else and is
        // released by `DefaultDelete`.
        unsafe { self.reset_raw(Box::into_raw(boxed)) };
    }
}

impl<T> UniquePtr<[T]> {
    /// Takes ownership of the elements of `vec` as an array.
    #[must_use]
    pub fn from_vec(vec: Vec<T>) -> Self {
        Self::from_box(vec.into_boxed_slice())
    }

    /// Allocates an array of `len` default values.
    ///
    /// # Panics
    ///
    /// Panics if the allocation size overflows; aborts if the allocator
    /// fails. See [`UniquePtr::try_new_slice`] for the checked variant.
    #[must_use]
    pub fn new_slice(len: usize) -> Self
    where
        T: Default,
    {
        Self::from_vec(iter::repeat_with(T::default).take(len).collect())
    }

    /// Allocates an array of `len` default values, reporting failures.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityOverflow`] if `len` elements do not fit in a
    /// layout, or [`Error::OutOfMemory`] if the allocator refuses the request.
    pub fn try_new_slice(len: usize) -> Result<Self>
    where
        T: Default,
    {
        let layout =
            Layout::array::<T>(len).map_err(|_| Error::CapacityOverflow { len })?;

        let mut elements = Vec::new();
        elements
            .try_reserve_exact(len)
            .map_err(|_| Error::OutOfMemory {
                bytes: layout.size(),
            })?;
        elements.extend(iter::repeat_with(T::default).take(len));

        Ok(Self::from_vec(elements))
    }
}

impl<T, D: Delete<[T]>> UniquePtr<[T], D> {
    /// Number of elements in the owned array, `0` when empty.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.map_or(0, |raw| raw.len())
    }

    /// Returns `true` if the handle owns nothing or a zero-length array.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Trait impls
// ============================================================================

impl<T: ?Sized, D: Delete<T>> Drop for UniquePtr<T, D> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T: ?Sized, D: Delete<T> + Default> Default for UniquePtr<T, D> {
    fn default() -> Self {
        Self::null()
    }
}

#[cold]
#[track_caller]
fn null_deref() -> ! {
    panic!("dereferenced an empty UniquePtr")
}

impl<T: ?Sized, D: Delete<T>> Deref for UniquePtr<T, D> {
    type Target = T;

    /// # Panics
    ///
    /// Panics if the handle owns nothing; check [`UniquePtr::is_some`] first.
    #[track_caller]
    fn deref(&self) -> &T {
        match self.as_ref() {
            Some(value) => value,
            None => null_deref(),
        }
    }
}

impl<T: ?Sized, D: Delete<T>> DerefMut for UniquePtr<T, D> {
    #[track_caller]
    fn deref_mut(&mut self) -> &mut T {
        match self.as_mut() {
            Some(value) => value,
            None => null_deref(),
        }
    }
}

impl<T: ?Sized> From<Box<T>> for UniquePtr<T> {
    fn from(boxed: Box<T>) -> Self {
        Self::from_box(boxed)
    }
}

impl<T> From<Vec<T>> for UniquePtr<[T]> {
    fn from(vec: Vec<T>) -> Self {
        Self::from_vec(vec)
    }
}

impl<T: ?Sized + fmt::Debug, D: Delete<T>> fmt::Debug for UniquePtr<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_ref() {
            Some(value) => f.debug_tuple("UniquePtr").field(&value).finish(),
            None => f.write_str("UniquePtr(null)"),
        }
    }
}

impl<T: ?Sized, D: Delete<T>> fmt::Pointer for UniquePtr<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.raw {
            Some(raw) => fmt::Pointer::fmt(&raw, f),
            None => fmt::Pointer::fmt(&ptr::null::<u8>(), f),
        }
    }
}

/// Moves a [`UniquePtr`] to a compatible pointee type through an unsizing
/// coercion, carrying the policy over with [`Rebind`](crate::Rebind).
///
/// ```
/// use oxidex_unique::{coerce_unique, UniquePtr};
/// use std::fmt::Display;
///
/// let number = UniquePtr::new(42u32);
/// let shown = coerce_unique!(number => dyn Display);
/// assert_eq!(shown.to_string(), "42");
///
/// let fixed = UniquePtr::new([1u8, 2, 3]);
/// let slice = coerce_unique!(fixed => [u8]);
/// assert_eq!(slice.len(), 3);
/// ```
///
/// Conversions that are not coercions are rejected at build time:
///
/// ```compile_fail
/// use oxidex_unique::{coerce_unique, UniquePtr};
///
/// let wide = coerce_unique!(UniquePtr::new(1u32) => u64);
/// ```
#[macro_export]
macro_rules! coerce_unique {
    ($ptr:expr => $target:ty) => {{
        let ptr = $ptr;
        // SAFETY: the closure is the identity and only type-checks as a
        // coercion, so the allocation and its release policy are unchanged.
        unsafe {
            $crate::UniquePtr::map_raw(ptr, |raw| -> ::core::ptr::NonNull<$target> { raw })
        }
    }};
}
