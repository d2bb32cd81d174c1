use std::fmt;
use std::num::NonZero;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for generating unique pool IDs.
static POOL_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generates a unique pool ID.
pub(crate) fn generate_pool_id() -> u64 {
    POOL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Number of logical holders of a live object. Never zero: the instant the last reference is
/// released, the object is reclaimed and its entry disappears.
pub type RefCount = NonZero<usize>;

/// Identity of one live allocation in a pool.
///
/// Identities are issued by the pool on every allocation, including allocations that recycle a
/// previously reclaimed object. An identity is never issued twice by the same pool and an
/// identity issued by one pool is never recognized by another.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ObjectId {
    pool_id: u64,
    serial: u64,
}

impl ObjectId {
    pub(crate) const fn new(pool_id: u64, serial: u64) -> Self {
        Self { pool_id, serial }
    }

    /// The identifier of the pool that issued this identity.
    #[must_use]
    pub const fn pool_id(&self) -> u64 {
        self.pool_id
    }

    /// Position of this identity in the issuing pool's allocation sequence, starting at 0.
    #[must_use]
    pub const fn serial(&self) -> u64 {
        self.serial
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.pool_id, self.serial)
    }
}
