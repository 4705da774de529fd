//! A bounded pool that recycles `Box` allocations through a release policy.
//!
//! Handles acquired from a [`BoxPool`] carry a [`PoolDelete`] policy. When
//! such a handle is released, the value is dropped in place and its
//! allocation goes back to the pool's free list instead of the allocator,
//! so the next [`acquire`](BoxPool::acquire) skips the allocation.
//!
//! # Design
//!
//! - **Single-threaded**: the free list lives in a `RefCell`; the pool is
//!   `!Sync` and pooled handles borrow it.
//! - **Bounded**: at most `capacity` free allocations are kept; surplus
//!   releases go straight back to the allocator and count as rejected.
//! - **Stateful policy**: [`PoolDelete`] holds a reference to its pool, so
//!   a pooled handle is two words wide.
//!
//! # Example
//!
//! ```
//! use oxidex_unique::pool::BoxPool;
//!
//! let pool = BoxPool::new();
//!
//! let first = pool.acquire(String::from("first"));
//! drop(first); // allocation returns to the pool
//!
//! let second = pool.acquire(String::from("second"));
//! assert_eq!(*second, "second");
//!
//! let stats = pool.stats();
//! assert_eq!((stats.hits, stats.misses), (1, 1));
//! ```

use crate::delete::Delete;
use crate::unique::UniquePtr;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::mem::MaybeUninit;
use std::ptr::{self, NonNull};

/// Number of free allocations a pool keeps unless configured otherwise.
pub const DEFAULT_POOL_CAPACITY: usize = 256;

/// Pool statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Free allocations currently held.
    pub pool_size: usize,

    /// Acquisitions served from the free list.
    pub hits: usize,

    /// Acquisitions that had to allocate.
    pub misses: usize,

    /// Releases freed to the allocator because the pool was full.
    pub rejected: usize,
}

impl PoolStats {
    /// Fraction of acquisitions served from the free list, or `None` before
    /// the first acquisition.
    #[must_use]
    pub fn hit_rate(&self) -> Option<f64> {
        let total = self.hits + self.misses;
        if total == 0 {
            None
        } else {
            #[allow(clippy::cast_precision_loss)]
            Some(self.hits as f64 / total as f64)
        }
    }
}

/// Free list of `Box<T>` allocations.
pub struct BoxPool<T> {
    free: RefCell<Vec<Box<MaybeUninit<T>>>>,
    capacity: usize,
    hits: Cell<usize>,
    misses: Cell<usize>,
    rejected: Cell<usize>,
}

impl<T> BoxPool<T> {
    /// Creates an empty pool holding up to [`DEFAULT_POOL_CAPACITY`] free
    /// allocations.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_capacity(DEFAULT_POOL_CAPACITY)
    }

    /// Creates an empty pool holding up to `capacity` free allocations.
    ///
    /// A capacity of zero turns every release into a plain deallocation.
    #[must_use]
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            free: RefCell::new(Vec::new()),
            capacity,
            hits: Cell::new(0),
            misses: Cell::new(0),
            rejected: Cell::new(0),
        }
    }

    /// Maximum number of free allocations kept.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Moves `value` into a pooled allocation.
    ///
    /// Reuses a free allocation when one is available.
    pub fn acquire(&self, value: T) -> UniquePtr<T, PoolDelete<'_, T>> {
        let reused = self.free.borrow_mut().pop();
        let slot = match reused {
            Some(slot) => {
                self.hits.set(self.hits.get() + 1);
                slot
            }
            None => {
                self.misses.set(self.misses.get() + 1);
                Box::new_uninit()
            }
        };

        let raw = Box::into_raw(slot).cast::<T>();
        // SAFETY: `raw` comes from a live `Box<MaybeUninit<T>>`, which has the
        // layout of `T`; writing initializes it. The handle hands the pointer
        // back to `recycle` exactly once.
        unsafe {
            raw.write(value);
            UniquePtr::from_raw_with(raw, PoolDelete { pool: self })
        }
    }

    /// Allocates free slots up front, up to the pool's capacity.
    pub fn reserve(&self, additional: usize) {
        let mut free = self.free.borrow_mut();
        let room = self.capacity.saturating_sub(free.len());
        free.extend((0..additional.min(room)).map(|_| Box::new_uninit()));
    }

    /// Frees every allocation held by the pool.
    pub fn clear(&self) {
        let released = {
            let mut free = self.free.borrow_mut();
            let released = free.len();
            free.clear();
            released
        };
        oxidex_log::trace!("cleared {} pooled allocations", released);
    }

    /// Returns pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            pool_size: self.free.borrow().len(),
            hits: self.hits.get(),
            misses: self.misses.get(),
            rejected: self.rejected.get(),
        }
    }

    /// Drops the value behind `ptr` and keeps or frees its allocation.
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`BoxPool::acquire`] on this pool and must not
    /// have been recycled before.
    unsafe fn recycle(&self, ptr: NonNull<T>) {
        // SAFETY: `ptr` came out of a `Box<MaybeUninit<T>>` in `acquire` and
        // holds an initialized `T` that nobody else owns. The slot is rebuilt
        // first so a panicking destructor still frees it while unwinding.
        // The value is dropped before the free list is borrowed, so a
        // destructor that releases into this same pool does not conflict.
        let slot = unsafe {
            let mut slot = Box::from_raw(ptr.as_ptr().cast::<MaybeUninit<T>>());
            slot.assume_init_drop();
            slot
        };

        let mut free = self.free.borrow_mut();
        if free.len() < self.capacity {
            free.push(slot);
        } else {
            drop(free);
            self.rejected.set(self.rejected.get() + 1);
            oxidex_log::debug!(
                "pool full ({} slots), freeing {}-byte allocation",
                self.capacity,
                size_of::<T>()
            );
        }
    }
}

impl<T> Default for BoxPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BoxPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxPool")
            .field("capacity", &self.capacity)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Release policy that returns allocations to a [`BoxPool`].
pub struct PoolDelete<'p, T> {
    pool: &'p BoxPool<T>,
}

impl<'p, T> PoolDelete<'p, T> {
    /// The pool this policy releases into.
    #[must_use]
    pub const fn pool(&self) -> &'p BoxPool<T> {
        self.pool
    }
}

impl<T> Clone for PoolDelete<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PoolDelete<'_, T> {}

impl<T> fmt::Debug for PoolDelete<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolDelete")
            .field("pool", &ptr::from_ref(self.pool))
            .finish()
    }
}

impl<T> Delete<T> for PoolDelete<'_, T> {
    unsafe fn delete(&mut self, ptr: NonNull<T>) {
        // SAFETY: `PoolDelete` is only created by `acquire`, which pairs it
        // with a pointer from this pool; the caller guarantees uniqueness.
        unsafe { self.pool.recycle(ptr) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;
    use std::rc::Rc;

    #[test]
    fn test_acquire_reuses_released_allocation() {
        let pool = BoxPool::new();

        let first = pool.acquire(1u64);
        let first_addr = first.get().unwrap();
        drop(first);
        assert_eq!(pool.stats().pool_size, 1);

        let second = pool.acquire(2u64);
        assert_eq!(second.get().unwrap(), first_addr);
        assert_eq!(*second, 2);

        let stats = pool.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.pool_size, 0);
    }

    #[test]
    fn test_release_runs_destructor() {
        let pool = BoxPool::new();
        let tracker = Rc::new(());

        let handle = pool.acquire(Rc::clone(&tracker));
        assert_eq!(Rc::strong_count(&tracker), 2);

        drop(handle);
        assert_eq!(Rc::strong_count(&tracker), 1);
    }

    #[test]
    fn test_full_pool_rejects_release() {
        let pool = BoxPool::with_capacity(1);

        let a = pool.acquire(String::from("a"));
        let b = pool.acquire(String::from("b"));
        drop(a);
        drop(b);

        let stats = pool.stats();
        assert_eq!(stats.pool_size, 1);
        assert_eq!(stats.rejected, 1);
    }

    #[test]
    fn test_zero_capacity_pool_never_keeps_allocations() {
        let pool = BoxPool::with_capacity(0);
        drop(pool.acquire(5u8));
        drop(pool.acquire(6u8));

        let stats = pool.stats();
        assert_eq!(stats.pool_size, 0);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.rejected, 2);
    }

    #[test]
    fn test_reserve_and_clear() {
        let pool = BoxPool::<[u8; 32]>::with_capacity(4);
        pool.reserve(10);
        assert_eq!(pool.stats().pool_size, 4);

        let handle = pool.acquire([7; 32]);
        assert_eq!(pool.stats().hits, 1);
        drop(handle);

        pool.clear();
        assert_eq!(pool.stats().pool_size, 0);
    }

    #[test]
    fn test_reset_and_release_with_pool_policy() {
        let pool = BoxPool::new();

        let mut handle = pool.acquire(3u32);
        handle.reset();
        assert!(handle.is_null());
        assert_eq!(pool.stats().pool_size, 1);

        let mut handle = pool.acquire(4u32);
        let (raw, mut policy) = {
            let raw = handle.release();
            (raw.unwrap(), *handle.deleter())
        };
        assert_eq!(pool.stats().pool_size, 0);
        unsafe { policy.delete(raw) };
        assert_eq!(pool.stats().pool_size, 1);
    }

    #[test]
    fn test_zero_sized_values() {
        let pool = BoxPool::new();
        let unit = pool.acquire(());
        drop(unit);
        let unit = pool.acquire(());
        assert!(unit.is_some());
        assert_eq!(pool.stats().hits, 1);
    }

    #[test]
    fn test_hit_rate() {
        assert_eq!(PoolStats::default().hit_rate(), None);

        let pool = BoxPool::new();
        drop(pool.acquire(1i32));
        drop(pool.acquire(2i32));
        drop(pool.acquire(3i32));
        drop(pool.acquire(4i32));

        assert_eq!(pool.stats().hit_rate(), Some(0.75));
    }

    #[test]
    fn test_pooled_handle_is_two_words() {
        assert_eq!(
            size_of::<UniquePtr<u64, PoolDelete<'static, u64>>>(),
            2 * size_of::<usize>()
        );
    }
}
