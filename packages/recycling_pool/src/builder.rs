use std::fmt;
use std::marker::PhantomData;
use std::num::NonZero;
use std::sync::Arc;

use crate::{DropPolicy, EventSink, Poolable, RawRecyclingPool, RecyclingPool, TracingSink};

/// Builder for creating an instance of [`RecyclingPool`] or [`RawRecyclingPool`].
///
/// All settings are optional.
///
/// # Examples
///
/// ```
/// use std::num::NonZero;
/// use std::sync::Arc;
///
/// use recycling_pool::{DropPolicy, NullSink, RecyclingPool};
///
/// // Default pool, reporting events through `tracing`.
/// let pool = RecyclingPool::<Vec<u8>>::builder().build();
///
/// // Silent pool that keeps at most 64 reclaimed objects per bucket.
/// let pool = RecyclingPool::<Vec<u8>>::builder()
///     .event_sink(Arc::new(NullSink::new()))
///     .bucket_capacity(NonZero::new(64).unwrap())
///     .drop_policy(DropPolicy::MustNotDropItems)
///     .build();
/// ```
#[must_use]
pub struct RecyclingPoolBuilder<T> {
    event_sink: Arc<dyn EventSink>,
    bucket_capacity: Option<NonZero<usize>>,
    drop_policy: DropPolicy,

    _item: PhantomData<fn() -> T>,
}

impl<T: Poolable> RecyclingPoolBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            event_sink: Arc::new(TracingSink::new()),
            bucket_capacity: None,
            drop_policy: DropPolicy::default(),
            _item: PhantomData,
        }
    }

    /// Sets the sink that receives every [event][crate::PoolEvent] the pool emits.
    ///
    /// Defaults to [`TracingSink`].
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Limits how many reclaimed objects each free pool bucket keeps.
    ///
    /// Objects reclaimed into a full bucket are released instead of being kept for reuse.
    /// By default, buckets are unbounded.
    pub fn bucket_capacity(mut self, capacity: NonZero<usize>) -> Self {
        self.bucket_capacity = Some(capacity);
        self
    }

    /// Sets the [drop policy][DropPolicy] for the pool. This governs how
    /// to treat live objects when the pool is dropped.
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Builds a thread-safe pool with the specified configuration.
    #[must_use]
    pub fn build(self) -> RecyclingPool<T> {
        RecyclingPool::from(self.build_raw())
    }

    /// Builds a single-threaded pool with the specified configuration.
    #[must_use]
    pub fn build_raw(self) -> RawRecyclingPool<T> {
        RawRecyclingPool::new_inner(self.event_sink, self.bucket_capacity, self.drop_policy)
    }
}

impl<T> fmt::Debug for RecyclingPoolBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecyclingPoolBuilder")
            .field("event_sink", &self.event_sink)
            .field("bucket_capacity", &self.bucket_capacity)
            .field("drop_policy", &self.drop_policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::NullSink;

    assert_impl_all!(RecyclingPoolBuilder<String>: Send, Sync);

    #[test]
    fn defaults() {
        let builder = RecyclingPoolBuilder::<String>::new();

        assert_eq!(builder.bucket_capacity, None);
        assert_eq!(builder.drop_policy, DropPolicy::MayDropItems);
    }

    #[test]
    fn settings_are_applied() {
        let builder = RecyclingPoolBuilder::<String>::new()
            .event_sink(Arc::new(NullSink::new()))
            .bucket_capacity(NonZero::<usize>::MIN)
            .drop_policy(DropPolicy::MustNotDropItems);

        assert_eq!(builder.bucket_capacity, Some(NonZero::<usize>::MIN));
        assert_eq!(builder.drop_policy, DropPolicy::MustNotDropItems);

        let debug = format!("{builder:?}");
        assert!(debug.contains("NullSink"));
    }
}
