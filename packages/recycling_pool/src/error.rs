use thiserror::Error;

use crate::{ObjectId, Operation};

/// Conditions under which a pool operation was rejected without changing any pool state.
///
/// None of these are fatal. The pool remains fully usable after returning any of them and the
/// same condition has already been reported to the pool's event sink.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The operation referenced an identity that is not live in this pool. It may never have
    /// been allocated, may have been reclaimed or taken already, or may belong to another pool.
    #[error("object {id} is not allocated in this pool (rejected {operation})")]
    NotAllocated {
        /// The identity that was looked up.
        id: ObjectId,

        /// The operation that was rejected.
        operation: Operation,
    },

    /// The reference count of the object is already at its maximum value.
    #[error("reference count of object {id} cannot be increased any further")]
    RefCountOverflow {
        /// The identity whose count is saturated.
        id: ObjectId,
    },
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
