use std::collections::BTreeMap;
use std::collections::hash_map::Entry;
use std::num::NonZero;
use std::sync::Arc;
use std::{fmt, thread};

use foldhash::{HashMap, HashMapExt};

use crate::constants::ERR_MEMORY_ACCOUNTING;
use crate::error::Result;
use crate::object_id::generate_pool_id;
use crate::{
    Bucket, DropPolicy, Error, EventSink, ObjectId, Operation, PoolEvent, Poolable, RecyclingPoolBuilder,
    RefCount, Release, SizeCategory, TypeTag,
};

/// A reference-counted object pool that recycles reclaimed objects, for single-threaded use.
///
/// The pool owns every object it tracks. An object is live from the moment it is
/// [allocated][Self::allocate] until its last reference is [released][Self::decrease_ref] (or it
/// is [reclaimed][Self::reclaim] or [taken][Self::take] explicitly). A reclaimed object is not
/// discarded but filed into a free pool bucket keyed by its [type tag][TypeTag] and
/// [size category][SizeCategory], from where [`reuse()`][Self::reuse] can bring it back to life
/// under a new identity.
///
/// All operations take `&mut self` and never lock. For a pool that can be shared between
/// threads, use [`RecyclingPool`][crate::RecyclingPool], which wraps this type.
///
/// # Memory accounting
///
/// The pool maintains the total size of all live objects as reported by
/// [`Poolable::size_hint()`] at allocation time. The total is updated incrementally with every
/// allocation and reclamation and always equals the sum of recorded sizes in the live table.
/// Objects in the free pool do not count towards it.
///
/// # Example
///
/// ```rust
/// use recycling_pool::{RawRecyclingPool, Release};
///
/// let mut pool = RawRecyclingPool::<Vec<u8>>::new();
///
/// let id = pool.allocate(vec![0; 32]);
/// pool.increase_ref(id).unwrap();
///
/// assert!(matches!(pool.decrease_ref(id), Ok(Release::Live(_))));
/// assert!(matches!(pool.decrease_ref(id), Ok(Release::Reclaimed(_))));
/// assert_eq!(pool.memory_usage(), 0);
///
/// // The reclaimed vector comes back under a new identity.
/// let reused = pool.reuse(None, 0).unwrap();
/// assert_ne!(reused, id);
/// assert_eq!(pool.with(reused, Vec::len).unwrap(), 32);
/// ```
pub struct RawRecyclingPool<T> {
    /// Identifies identities issued by this pool, so identities from other pools never match.
    pool_id: u64,

    /// Serial number for the next identity we issue. Serials are never reused.
    next_serial: u64,

    /// Reference counts and payloads of all live objects. One map for both, so an identity can
    /// never have a count without an object or the other way around.
    live: HashMap<ObjectId, LiveEntry<T>>,

    /// Reclaimed objects waiting for reuse. Ordered so that reuse lookups are deterministic,
    /// visiting the smallest sufficient category first.
    free: BTreeMap<Bucket, Vec<T>>,

    /// Sum of `size_bytes` over all entries in `live`.
    memory_usage: usize,

    event_sink: Arc<dyn EventSink>,

    /// If set, reclaimed objects beyond this many per bucket are released instead of pooled.
    bucket_capacity: Option<NonZero<usize>>,

    drop_policy: DropPolicy,
}

struct LiveEntry<T> {
    value: T,
    ref_count: RefCount,

    /// Measured once at allocation. Reclamation subtracts exactly this, even if the object has
    /// changed shape since.
    size_bytes: usize,
}

/// Point-in-time summary of a pool's contents.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct PoolStats {
    /// Number of live objects.
    pub live: usize,

    /// Number of reclaimed objects waiting in the free pool.
    pub pooled: usize,

    /// Number of free pool buckets holding at least one object.
    pub buckets: usize,

    /// Total recorded size of all live objects, in bytes.
    pub memory_usage: usize,
}

impl<T: Poolable> RawRecyclingPool<T> {
    /// Creates a new pool with default configuration.
    ///
    /// For custom configuration, use [`RawRecyclingPool::builder()`].
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build_raw()
    }

    /// Creates a builder for configuring and constructing a pool.
    ///
    /// # Example
    ///
    /// ```rust
    /// use recycling_pool::{DropPolicy, RawRecyclingPool};
    ///
    /// let pool = RawRecyclingPool::<String>::builder()
    ///     .drop_policy(DropPolicy::MustNotDropItems)
    ///     .build_raw();
    /// ```
    pub fn builder() -> RecyclingPoolBuilder<T> {
        RecyclingPoolBuilder::new()
    }

    #[must_use]
    pub(crate) fn new_inner(
        event_sink: Arc<dyn EventSink>,
        bucket_capacity: Option<NonZero<usize>>,
        drop_policy: DropPolicy,
    ) -> Self {
        Self {
            pool_id: generate_pool_id(),
            next_serial: 0,
            live: HashMap::new(),
            free: BTreeMap::new(),
            memory_usage: 0,
            event_sink,
            bucket_capacity,
            drop_policy,
        }
    }

    /// Registers `value` as a live object with a reference count of 1 and returns its identity.
    ///
    /// The size reported by the object is added to the [memory usage][Self::memory_usage].
    pub fn allocate(&mut self, value: T) -> ObjectId {
        let id = self.issue_id();
        let type_tag = value.type_tag();
        let size_bytes = value.size_hint();

        // Account first, so an overflow leaves the pool exactly as it was.
        let memory_usage = self
            .memory_usage
            .checked_add(size_bytes)
            .expect(ERR_MEMORY_ACCOUNTING);

        let previous = self.live.insert(
            id,
            LiveEntry {
                value,
                ref_count: RefCount::MIN,
                size_bytes,
            },
        );
        debug_assert!(previous.is_none(), "issued identity {id} twice");

        self.memory_usage = memory_usage;

        self.event_sink.record(&PoolEvent::Allocated {
            id,
            type_tag,
            size_bytes,
        });

        id
    }

    /// Adds a reference to a live object and returns the new reference count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAllocated`] if `id` is not live in this pool and
    /// [`Error::RefCountOverflow`] if the count is already at its maximum. Nothing is changed
    /// in either case.
    pub fn increase_ref(&mut self, id: ObjectId) -> Result<RefCount> {
        let Some(entry) = self.live.get_mut(&id) else {
            return Err(self.not_allocated(id, Operation::IncreaseRef));
        };

        let Some(ref_count) = entry.ref_count.checked_add(1) else {
            self.event_sink.record(&PoolEvent::RefCountOverflow { id });
            return Err(Error::RefCountOverflow { id });
        };

        entry.ref_count = ref_count;

        self.event_sink
            .record(&PoolEvent::RefIncreased { id, ref_count });

        Ok(ref_count)
    }

    /// Releases one reference to a live object.
    ///
    /// If that was the last reference, the object is reclaimed into the free pool before this
    /// returns, exactly as [`reclaim()`][Self::reclaim] would do. There is no state in which the
    /// object is live with a count of zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAllocated`] if `id` is not live in this pool. Nothing is changed.
    pub fn decrease_ref(&mut self, id: ObjectId) -> Result<Release> {
        let mut occupied = match self.live.entry(id) {
            Entry::Occupied(occupied) => occupied,
            Entry::Vacant(_) => return Err(self.not_allocated(id, Operation::DecreaseRef)),
        };

        let remaining = occupied.get().ref_count.get().saturating_sub(1);
        let ref_count = RefCount::new(remaining);

        if let Some(ref_count) = ref_count {
            occupied.get_mut().ref_count = ref_count;
        }

        self.event_sink.record(&PoolEvent::RefDecreased {
            id,
            ref_count: remaining,
        });

        match ref_count {
            Some(ref_count) => Ok(Release::Live(ref_count)),
            None => {
                let entry = occupied.remove();
                Ok(Release::Reclaimed(self.reclaim_entry(id, entry)))
            }
        }
    }

    /// Reclaims a live object into the free pool, regardless of its reference count.
    ///
    /// The recorded size of the object is subtracted from the memory usage and the object is
    /// filed into the bucket matching its current type tag and size. Returns that bucket.
    ///
    /// If the pool has a [bucket capacity][RecyclingPoolBuilder::bucket_capacity] and the bucket
    /// is full, the object is released instead of being pooled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAllocated`] if `id` is not live in this pool. Nothing is changed.
    pub fn reclaim(&mut self, id: ObjectId) -> Result<Bucket> {
        let Some(entry) = self.live.remove(&id) else {
            return Err(self.not_allocated(id, Operation::Reclaim));
        };

        Ok(self.reclaim_entry(id, entry))
    }

    /// Takes a reclaimed object matching the request out of the free pool, allocates it again
    /// and returns its new identity.
    ///
    /// A bucket qualifies if its type tag equals `desired` (any tag if `None`) and its size
    /// category is at least the category of `min_size`. The comparison is made on categories,
    /// not bytes: a `Large` bucket satisfies every request and a `Small` bucket only satisfies
    /// requests whose `min_size` is itself small.
    ///
    /// Among qualifying buckets, the smallest category is preferred, then the lowest type tag.
    /// Within a bucket, the most recently reclaimed object is returned.
    ///
    /// Returns `None` if no object qualifies. This is a normal outcome, not an error.
    pub fn reuse(&mut self, desired: Option<TypeTag>, min_size: usize) -> Option<ObjectId> {
        let required = SizeCategory::of(min_size);

        let candidate = self
            .free
            .iter_mut()
            .filter(|(bucket, _)| bucket.matches(desired, required))
            .find_map(|(bucket, objects)| objects.pop().map(|value| (*bucket, value)));

        let Some((bucket, value)) = candidate else {
            self.event_sink
                .record(&PoolEvent::NoReuseCandidate { desired, min_size });
            return None;
        };

        let id = self.allocate(value);

        self.event_sink.record(&PoolEvent::Reused { id, bucket });

        Some(id)
    }

    /// Reuses a matching reclaimed object if one exists, otherwise allocates the object
    /// returned by `make`.
    pub fn reuse_or_allocate(
        &mut self,
        desired: Option<TypeTag>,
        min_size: usize,
        make: impl FnOnce() -> T,
    ) -> ObjectId {
        match self.reuse(desired, min_size) {
            Some(id) => id,
            None => self.allocate(make()),
        }
    }

    /// Total size in bytes of all live objects, as recorded when each was allocated.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.event_sink.record(&PoolEvent::MemoryUsage {
            bytes: self.memory_usage,
        });

        self.memory_usage
    }

    /// Current reference count of a live object, or `None` if `id` is not live.
    #[must_use]
    pub fn ref_count(&self, id: ObjectId) -> Option<RefCount> {
        self.live.get(&id).map(|entry| entry.ref_count)
    }

    /// Whether `id` is live in this pool.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.live.contains_key(&id)
    }

    /// Number of live objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether the pool has no live objects. The free pool may still hold reclaimed objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Number of reclaimed objects waiting in the free pool.
    #[must_use]
    pub fn pooled_len(&self) -> usize {
        self.free.values().map(Vec::len).sum()
    }

    /// Number of reclaimed objects waiting in one free pool bucket.
    #[must_use]
    pub fn bucket_len(&self, bucket: Bucket) -> usize {
        self.free.get(&bucket).map_or(0, Vec::len)
    }

    /// Point-in-time summary of the pool's contents.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            live: self.live.len(),
            pooled: self.pooled_len(),
            buckets: self.free.values().filter(|objects| !objects.is_empty()).count(),
            memory_usage: self.memory_usage,
        }
    }

    /// Calls `f` with a shared reference to a live object and returns its result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAllocated`] if `id` is not live in this pool.
    pub fn with<R>(&self, id: ObjectId, f: impl FnOnce(&T) -> R) -> Result<R> {
        match self.live.get(&id) {
            Some(entry) => Ok(f(&entry.value)),
            None => Err(self.not_allocated(id, Operation::Access)),
        }
    }

    /// Calls `f` with an exclusive reference to a live object and returns its result.
    ///
    /// The recorded size of the object is not updated. When the object is eventually reclaimed,
    /// it is filed into the bucket that matches its shape at that time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAllocated`] if `id` is not live in this pool.
    pub fn with_mut<R>(&mut self, id: ObjectId, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        match self.live.get_mut(&id) {
            Some(entry) => Ok(f(&mut entry.value)),
            None => Err(self.not_allocated(id, Operation::Access)),
        }
    }

    /// Removes a live object from the pool regardless of its reference count and returns it to
    /// the caller instead of pooling it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAllocated`] if `id` is not live in this pool. Nothing is changed.
    pub fn take(&mut self, id: ObjectId) -> Result<T> {
        let Some(entry) = self.live.remove(&id) else {
            return Err(self.not_allocated(id, Operation::Take));
        };

        self.subtract_memory(entry.size_bytes);

        self.event_sink.record(&PoolEvent::Taken {
            id,
            size_bytes: entry.size_bytes,
        });

        Ok(entry.value)
    }

    /// Releases every reclaimed object in the free pool and returns how many there were.
    ///
    /// Live objects are not affected.
    pub fn clear_pooled(&mut self) -> usize {
        let released = self.pooled_len();
        self.free.clear();

        self.event_sink.record(&PoolEvent::PoolCleared { released });

        released
    }

    fn issue_id(&mut self) -> ObjectId {
        let id = ObjectId::new(self.pool_id, self.next_serial);

        self.next_serial = self
            .next_serial
            .checked_add(1)
            .expect("a pool cannot issue more than u64::MAX identities");

        id
    }

    /// Moves an entry that has already been removed from the live table into the free pool.
    fn reclaim_entry(&mut self, id: ObjectId, entry: LiveEntry<T>) -> Bucket {
        self.subtract_memory(entry.size_bytes);

        let type_tag = entry.value.type_tag();
        let bucket = Bucket::for_object(type_tag, entry.value.size_hint());

        let objects = self.free.entry(bucket).or_default();

        let recycled = self
            .bucket_capacity
            .is_none_or(|capacity| objects.len() < capacity.get());

        if recycled {
            objects.push(entry.value);
        } else {
            drop(entry.value);
        }

        self.event_sink.record(&PoolEvent::Dropped {
            id,
            type_tag,
            size_bytes: entry.size_bytes,
            bucket,
            recycled,
        });

        bucket
    }

    fn subtract_memory(&mut self, size_bytes: usize) {
        self.memory_usage = self
            .memory_usage
            .checked_sub(size_bytes)
            .expect(ERR_MEMORY_ACCOUNTING);
    }

    fn not_allocated(&self, id: ObjectId, operation: Operation) -> Error {
        self.event_sink
            .record(&PoolEvent::NotAllocated { id, operation });

        Error::NotAllocated { id, operation }
    }
}

impl<T> RawRecyclingPool<T> {
    /// Identifier of this pool, shared by every [`ObjectId`] it issues.
    #[must_use]
    pub fn pool_id(&self) -> u64 {
        self.pool_id
    }
}

impl<T: Poolable> Default for RawRecyclingPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for RawRecyclingPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawRecyclingPool")
            .field("pool_id", &self.pool_id)
            .field("next_serial", &self.next_serial)
            .field("live", &self.live.len())
            .field("free", &self.free.keys().collect::<Vec<_>>())
            .field("memory_usage", &self.memory_usage)
            .field("event_sink", &self.event_sink)
            .field("bucket_capacity", &self.bucket_capacity)
            .field("drop_policy", &self.drop_policy)
            .finish()
    }
}

impl<T> Drop for RawRecyclingPool<T> {
    fn drop(&mut self) {
        // If we are already panicking, we do not want to panic again because that will
        // simply obscure whatever the original panic was, leading to debug difficulties.
        if !thread::panicking() && matches!(self.drop_policy, DropPolicy::MustNotDropItems) {
            assert!(
                self.live.is_empty(),
                "dropped a RecyclingPool with {} live objects - this is forbidden by DropPolicy::MustNotDropItems",
                self.live.len()
            );
        }
    }
}
