// A poisoned lock means another thread panicked halfway through a pool operation. The tables and
// the memory counter may disagree at that point, so we refuse to continue (we panic).
pub(crate) const ERR_POISONED_LOCK: &str = "encountered poisoned pool lock - the live table, \
    free buckets and memory counter can no longer be trusted to agree with each other";

pub(crate) const ERR_MEMORY_ACCOUNTING: &str = "memory usage accounting went out of range - \
    the memory counter must always equal the sum of recorded live object sizes";

/// Objects smaller than this many bytes are [`SizeCategory::Small`][crate::SizeCategory::Small].
pub(crate) const SMALL_LIMIT_BYTES: usize = 100;

/// Objects smaller than this many bytes (and not small) are
/// [`SizeCategory::Medium`][crate::SizeCategory::Medium].
pub(crate) const MEDIUM_LIMIT_BYTES: usize = 1000;

/// `tracing` target used by [`TracingSink`][crate::TracingSink].
pub(crate) const TRACING_TARGET: &str = "recycling_pool";
