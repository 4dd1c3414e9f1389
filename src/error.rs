//! Crate-wide error type.
//!
//! Per the propagation policy: programmer errors (bad indices, bad
//! arguments, unsupported bloom filter queries) are returned as
//! [`RopeError`]. Data-dependent issues — a diff timing out, a patch
//! failing to relocate, a CSV file containing malformed input — are never
//! represented here; they are localised to the operation that discovered
//! them and surface as plain data. A diff that hits its deadline mid-
//! bisection simply returns a trivial delete-then-insert for the
//! unresolved span as part of its ordinary `Vec<Diff<T>>` result (see
//! [`crate::diff::compute`]), rather than setting any separate flag; a
//! patch that can't be relocated is reported via the per-patch `bool` in
//! [`crate::diff::apply_patches`]'s return value; and a malformed CSV
//! file is reported via the `warning` field on
//! [`crate::index::FileIndex`].

use thiserror::Error;

/// Errors returned by `persist-rope`'s public API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RopeError {
    /// An index (or the end of a range) fell outside `[0, length]`.
    #[error("index {index} out of range (length {length})")]
    OutOfRange {
        /// The offending index.
        index: usize,
        /// The length of the sequence it was checked against.
        length: usize,
    },

    /// A caller-supplied argument was structurally invalid (e.g. a range
    /// whose end precedes its start, or a negative count).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A bloom filter operation was requested that `supported_ops` does
    /// not cover (e.g. `might_contain` on a filter built without the
    /// `Contains` operation).
    #[error("operation not supported by this bloom filter's configuration")]
    Unsupported,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RopeError>;

impl RopeError {
    pub(crate) fn out_of_range(index: usize, length: usize) -> Self {
        RopeError::OutOfRange { index, length }
    }

    pub(crate) fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        RopeError::InvalidArgument(msg.into())
    }
}
