//! `OxideX` exclusive-ownership pointers
//!
//! This crate provides [`UniquePtr`], a single-owner handle to a heap
//! resource that is released exactly once through a pluggable release
//! policy:
//!
//! - **Release policies**: [`Delete`] implementations for `Box` memory
//!   ([`DefaultDelete`]), no-op ownership ([`NoopDelete`]), closures, and a
//!   tracing wrapper ([`Logged`])
//! - **Zero-cost policy storage**: stateless policies add no bytes to the
//!   handle ([`DeleterStorage`])
//! - **Scalar and array ownership**: `UniquePtr<T>` and `UniquePtr<[T]>`
//!   release through different paths selected by type
//! - **Covariant transfer**: [`coerce_unique!`] moves ownership to a trait
//!   object or slice handle
//! - **Pooled release**: a bounded allocation pool (requires the `pool`
//!   feature, on by default)
//!
//! ```
//! use oxidex_unique::UniquePtr;
//!
//! let mut handle = UniquePtr::new(vec![1, 2, 3]);
//! handle.push(4);
//!
//! let moved = handle.take();
//! assert!(handle.is_null());
//! assert_eq!(moved.len(), 4);
//! ```

pub mod delete;
pub mod error;
#[cfg(feature = "pool")]
pub mod pool;
pub mod storage;
pub mod unique;

pub use delete::{DefaultDelete, Delete, Logged, NoopDelete, Rebind};
pub use error::{Error, Result};
pub use storage::DeleterStorage;
pub use unique::UniquePtr;
