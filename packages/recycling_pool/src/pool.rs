use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::constants::ERR_POISONED_LOCK;
use crate::error::Result;
use crate::{
    Bucket, ObjectId, PoolStats, Poolable, RawRecyclingPool, RecyclingPoolBuilder, RefCount, Release,
    TypeTag,
};

/// A thread-safe wrapper around [`RawRecyclingPool`].
///
/// This type acts as a cloneable handle to a shared pool instance. Multiple handles can exist
/// simultaneously, and the underlying pool remains alive as long as at least one handle exists.
///
/// # Thread safety
///
/// Every operation holds the pool's lock for its entire duration, including the events it
/// reports and any nested steps (a final [`decrease_ref()`][Self::decrease_ref] reclaims the
/// object, [`reuse()`][Self::reuse] allocates the recycled object). Concurrent calls therefore
/// behave as if they had been made one after another in some order, and no caller can observe
/// a reference count of zero or a memory usage that disagrees with the live objects.
///
/// # Example
///
/// ```rust
/// use std::thread;
///
/// use recycling_pool::RecyclingPool;
///
/// let pool = RecyclingPool::<Vec<u8>>::new();
///
/// // Clone the pool handle to share across threads.
/// let pool_clone = pool.clone();
///
/// let id = thread::spawn(move || pool_clone.allocate(vec![0; 64]))
///     .join()
///     .unwrap();
///
/// assert!(pool.contains(id));
/// pool.decrease_ref(id).unwrap();
/// assert_eq!(pool.memory_usage(), 0);
/// assert_eq!(pool.pooled_len(), 1);
/// ```
pub struct RecyclingPool<T> {
    /// The shared pool instance protected by a mutex for thread safety.
    inner: Arc<Mutex<RawRecyclingPool<T>>>,
}

impl<T> fmt::Debug for RecyclingPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecyclingPool")
            .field("inner", &self.inner)
            .finish()
    }
}

impl<T> Clone for RecyclingPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> From<RawRecyclingPool<T>> for RecyclingPool<T> {
    /// Wraps an existing single-threaded pool, including everything it already tracks.
    fn from(pool: RawRecyclingPool<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pool)),
        }
    }
}

impl<T: Poolable> RecyclingPool<T> {
    /// Creates a new pool with default configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use recycling_pool::RecyclingPool;
    ///
    /// let pool = RecyclingPool::<String>::new();
    ///
    /// assert!(pool.is_empty());
    /// assert_eq!(pool.memory_usage(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Returns a builder for creating a pool with custom configuration.
    pub fn builder() -> RecyclingPoolBuilder<T> {
        RecyclingPoolBuilder::new()
    }

    /// Registers `value` as a live object with a reference count of 1 and returns its identity.
    ///
    /// See [`RawRecyclingPool::allocate()`].
    pub fn allocate(&self, value: T) -> ObjectId {
        self.lock().allocate(value)
    }

    /// Adds a reference to a live object and returns the new reference count.
    ///
    /// See [`RawRecyclingPool::increase_ref()`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAllocated`][crate::Error::NotAllocated] if `id` is not live in this
    /// pool and [`Error::RefCountOverflow`][crate::Error::RefCountOverflow] if the count is
    /// saturated.
    pub fn increase_ref(&self, id: ObjectId) -> Result<RefCount> {
        self.lock().increase_ref(id)
    }

    /// Releases one reference to a live object, reclaiming it if that was the last one.
    ///
    /// See [`RawRecyclingPool::decrease_ref()`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAllocated`][crate::Error::NotAllocated] if `id` is not live in this
    /// pool.
    pub fn decrease_ref(&self, id: ObjectId) -> Result<Release> {
        self.lock().decrease_ref(id)
    }

    /// Reclaims a live object into the free pool, regardless of its reference count.
    ///
    /// See [`RawRecyclingPool::reclaim()`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAllocated`][crate::Error::NotAllocated] if `id` is not live in this
    /// pool.
    pub fn reclaim(&self, id: ObjectId) -> Result<Bucket> {
        self.lock().reclaim(id)
    }

    /// Brings a matching reclaimed object back to life under a new identity.
    ///
    /// See [`RawRecyclingPool::reuse()`].
    pub fn reuse(&self, desired: Option<TypeTag>, min_size: usize) -> Option<ObjectId> {
        self.lock().reuse(desired, min_size)
    }

    /// Reuses a matching reclaimed object if one exists, otherwise allocates the object
    /// returned by `make`.
    ///
    /// `make` is called while the pool is locked and must not use the pool.
    pub fn reuse_or_allocate(
        &self,
        desired: Option<TypeTag>,
        min_size: usize,
        make: impl FnOnce() -> T,
    ) -> ObjectId {
        self.lock().reuse_or_allocate(desired, min_size, make)
    }

    /// Total size in bytes of all live objects.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.lock().memory_usage()
    }

    /// Current reference count of a live object, or `None` if `id` is not live.
    #[must_use]
    pub fn ref_count(&self, id: ObjectId) -> Option<RefCount> {
        self.lock().ref_count(id)
    }

    /// Whether `id` is live in this pool.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.lock().contains(id)
    }

    /// Number of live objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the pool has no live objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of reclaimed objects waiting in the free pool.
    #[must_use]
    pub fn pooled_len(&self) -> usize {
        self.lock().pooled_len()
    }

    /// Number of reclaimed objects waiting in one free pool bucket.
    #[must_use]
    pub fn bucket_len(&self, bucket: Bucket) -> usize {
        self.lock().bucket_len(bucket)
    }

    /// Point-in-time summary of the pool's contents, taken under a single lock acquisition.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.lock().stats()
    }

    /// Calls `f` with a shared reference to a live object and returns its result.
    ///
    /// The pool stays locked while `f` runs, so `f` must not use the pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAllocated`][crate::Error::NotAllocated] if `id` is not live in this
    /// pool.
    pub fn with<R>(&self, id: ObjectId, f: impl FnOnce(&T) -> R) -> Result<R> {
        self.lock().with(id, f)
    }

    /// Calls `f` with an exclusive reference to a live object and returns its result.
    ///
    /// The pool stays locked while `f` runs, so `f` must not use the pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAllocated`][crate::Error::NotAllocated] if `id` is not live in this
    /// pool.
    pub fn with_mut<R>(&self, id: ObjectId, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        self.lock().with_mut(id, f)
    }

    /// Removes a live object from the pool and returns it to the caller instead of pooling it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAllocated`][crate::Error::NotAllocated] if `id` is not live in this
    /// pool.
    pub fn take(&self, id: ObjectId) -> Result<T> {
        self.lock().take(id)
    }

    /// Releases every reclaimed object in the free pool and returns how many there were.
    pub fn clear_pooled(&self) -> usize {
        self.lock().clear_pooled()
    }

    fn lock(&self) -> MutexGuard<'_, RawRecyclingPool<T>> {
        self.inner.lock().expect(ERR_POISONED_LOCK)
    }
}

impl<T: Poolable> Default for RecyclingPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::thread;

    use static_assertions::assert_impl_all;

    use super::*;
    use crate::{EventLog, NullSink, PoolEvent, SizeCategory};

    assert_impl_all!(RecyclingPool<String>: Send, Sync, Clone);

    #[test]
    fn clones_share_state() {
        let pool = RecyclingPool::<String>::builder()
            .event_sink(Arc::new(NullSink::new()))
            .build();
        let clone = pool.clone();

        let id = pool.allocate("shared".to_string());

        assert!(clone.contains(id));
        assert_eq!(clone.memory_usage(), pool.memory_usage());
    }

    #[test]
    fn from_raw_keeps_existing_objects() {
        let mut raw = RawRecyclingPool::<String>::builder()
            .event_sink(Arc::new(NullSink::new()))
            .build_raw();
        let id = raw.allocate("kept".to_string());

        let pool = RecyclingPool::from(raw);

        assert_eq!(pool.with(id, String::clone), Ok("kept".to_string()));
    }

    #[test]
    fn final_release_emits_decrease_then_drop_together() {
        let log = EventLog::new();
        let pool = RecyclingPool::<String>::builder()
            .event_sink(Arc::new(log.clone()))
            .build();

        let id = pool.allocate(String::with_capacity(10));
        let release = pool.decrease_ref(id).unwrap();

        let Release::Reclaimed(bucket) = release else {
            panic!("expected the object to be reclaimed, got {release:?}");
        };
        assert_eq!(bucket.category(), SizeCategory::Small);

        let events = log.events();
        assert!(matches!(
            events.as_slice(),
            [
                PoolEvent::Allocated { .. },
                PoolEvent::RefDecreased { ref_count: 0, .. },
                PoolEvent::Dropped { recycled: true, .. },
            ]
        ));
    }

    #[test]
    fn concurrent_allocate_and_release_keeps_exact_accounting() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 200;

        let pool = RecyclingPool::<Vec<u8>>::builder()
            .event_sink(Arc::new(NullSink::new()))
            .build();

        let survivors: Vec<Vec<(ObjectId, usize)>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|thread_index| {
                    let pool = pool.clone();

                    scope.spawn(move || {
                        let mut kept = Vec::new();

                        for i in 0..PER_THREAD {
                            let id = pool.allocate(Vec::with_capacity(thread_index * 100 + i));
                            let size = pool.with(id, Poolable::size_hint).unwrap();

                            if i % 2 == 0 {
                                pool.decrease_ref(id).unwrap();
                            } else {
                                kept.push((id, size));
                            }
                        }

                        kept
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect()
        });

        let expected: usize = survivors.iter().flatten().map(|(_, size)| size).sum();

        assert_eq!(pool.memory_usage(), expected);
        assert_eq!(pool.len(), THREADS * PER_THREAD / 2);
        assert_eq!(pool.pooled_len(), THREADS * PER_THREAD / 2);
    }
}
