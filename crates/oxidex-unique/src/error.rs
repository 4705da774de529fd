//! Error types for `oxidex-unique`.
//!
//! Ownership transfer, reset and release are infallible. The only
//! recoverable failures are checked array allocation and the checked
//! accessors on an empty handle. Contract violations (double release,
//! foreign pointers, mismatched allocation kinds) are `unsafe` preconditions
//! and never surface here.

use std::fmt;

/// Errors reported by the checked operations of this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The handle owns nothing.
    Null,

    /// The requested array length does not fit in a valid layout.
    CapacityOverflow {
        /// The requested number of elements.
        len: usize,
    },

    /// The allocator could not satisfy an array allocation.
    OutOfMemory {
        /// Size of the failed request in bytes.
        bytes: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Null => write!(f, "Handle owns nothing"),
            Error::CapacityOverflow { len } => {
                write!(f, "Capacity overflow: {len} elements exceed the maximum layout size")
            }
            Error::OutOfMemory { bytes } => {
                write!(f, "Out of memory: failed to allocate {bytes} bytes")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Result type for the checked operations of this crate.
pub type Result<T> = std::result::Result<T, Error>;
