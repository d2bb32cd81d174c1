use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use crate::constants::{ERR_POISONED_LOCK, TRACING_TARGET};
use crate::{Bucket, ObjectId, Operation, RefCount, TypeTag};

/// Something that happened inside a pool, reported to the pool's [`EventSink`].
///
/// Every public pool operation that mutates state or rejects a request reports what it did.
/// Operations that internally perform other operations (a final [`decrease_ref()`] reclaims the
/// object, a [`reuse()`] allocates it again) report each step in the order it happened.
///
/// [`decrease_ref()`]: crate::RecyclingPool::decrease_ref
/// [`reuse()`]: crate::RecyclingPool::reuse
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum PoolEvent {
    /// An object became live with a reference count of 1.
    Allocated {
        /// Identity issued for the object.
        id: ObjectId,
        /// Type tag reported by the object.
        type_tag: TypeTag,
        /// Size reported by the object, now included in the memory usage.
        size_bytes: usize,
    },

    /// A reference was added to a live object.
    RefIncreased {
        /// The object.
        id: ObjectId,
        /// Reference count after the increase.
        ref_count: RefCount,
    },

    /// A reference was released from a live object.
    ///
    /// A count of zero is only ever reported immediately before the [`Dropped`] event of the
    /// same object, from the same operation.
    ///
    /// [`Dropped`]: PoolEvent::Dropped
    RefDecreased {
        /// The object.
        id: ObjectId,
        /// Reference count after the decrease.
        ref_count: usize,
    },

    /// A live object was reclaimed: it left the live table and its memory was subtracted.
    Dropped {
        /// The identity the object had while live. It is never valid again.
        id: ObjectId,
        /// Type tag reported by the object at reclaim time.
        type_tag: TypeTag,
        /// Size that was subtracted from the memory usage.
        size_bytes: usize,
        /// Free pool bucket the object belongs to.
        bucket: Bucket,
        /// Whether the object was stored for reuse. `false` if the bucket was full and the
        /// object was released instead.
        recycled: bool,
    },

    /// A live object was removed from the pool and handed back to the caller.
    Taken {
        /// The identity the object had while live.
        id: ObjectId,
        /// Size that was subtracted from the memory usage.
        size_bytes: usize,
    },

    /// A reclaimed object was taken out of the free pool and allocated again.
    Reused {
        /// The new identity of the object.
        id: ObjectId,
        /// The bucket the object was taken from.
        bucket: Bucket,
    },

    /// A reuse request found no suitable object in the free pool.
    NoReuseCandidate {
        /// Requested type tag, `None` meaning any type.
        desired: Option<TypeTag>,
        /// Requested minimum size.
        min_size: usize,
    },

    /// An operation referenced an identity that is not live.
    NotAllocated {
        /// The identity that was looked up.
        id: ObjectId,
        /// The operation that was rejected.
        operation: Operation,
    },

    /// A reference could not be added because the count is at its maximum.
    RefCountOverflow {
        /// The object.
        id: ObjectId,
    },

    /// The memory usage was queried.
    MemoryUsage {
        /// Total recorded size of all live objects.
        bytes: usize,
    },

    /// Every object in the free pool was released.
    PoolCleared {
        /// How many objects were released.
        released: usize,
    },
}

/// Receives the events emitted by a pool.
///
/// The pool calls the sink synchronously while holding its lock, before the operation that
/// produced the event returns. A sink must therefore be quick and must not call back into the
/// pool that owns it.
#[cfg_attr(test, mockall::automock)]
pub trait EventSink: Debug + Send + Sync {
    /// Records one event.
    fn record(&self, event: &PoolEvent);
}

/// Emits pool events as structured [`tracing`] events with the `recycling_pool` target.
///
/// This is the default sink. Lifecycle events are emitted at `DEBUG` level, rejected operations
/// at `WARN` level.
#[derive(Clone, Copy, Debug, Default)]
#[non_exhaustive]
pub struct TracingSink;

impl TracingSink {
    /// Creates a new tracing sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EventSink for TracingSink {
    #[cfg_attr(test, mutants::skip)] // Nothing observes the log output in tests.
    fn record(&self, event: &PoolEvent) {
        match *event {
            PoolEvent::Allocated {
                id,
                type_tag,
                size_bytes,
            } => {
                tracing::debug!(target: TRACING_TARGET, %id, %type_tag, size_bytes, ref_count = 1, "allocated object");
            }
            PoolEvent::RefIncreased { id, ref_count } => {
                tracing::debug!(target: TRACING_TARGET, %id, ref_count = ref_count.get(), "increased reference count");
            }
            PoolEvent::RefDecreased { id, ref_count } => {
                tracing::debug!(target: TRACING_TARGET, %id, ref_count, "decreased reference count");
            }
            PoolEvent::Dropped {
                id,
                type_tag,
                size_bytes,
                bucket,
                recycled,
            } => {
                tracing::debug!(target: TRACING_TARGET, %id, %type_tag, size_bytes, %bucket, recycled, "dropped object");
            }
            PoolEvent::Taken { id, size_bytes } => {
                tracing::debug!(target: TRACING_TARGET, %id, size_bytes, "object taken out of pool");
            }
            PoolEvent::Reused { id, bucket } => {
                tracing::debug!(target: TRACING_TARGET, %id, %bucket, "reused object");
            }
            PoolEvent::NoReuseCandidate { desired, min_size } => {
                let desired = desired.map_or("any", TypeTag::as_str);
                tracing::debug!(target: TRACING_TARGET, desired, min_size, "no suitable object available for reuse");
            }
            PoolEvent::NotAllocated { id, operation } => {
                tracing::warn!(target: TRACING_TARGET, %id, %operation, "object not allocated");
            }
            PoolEvent::RefCountOverflow { id } => {
                tracing::warn!(target: TRACING_TARGET, %id, "reference count saturated");
            }
            PoolEvent::MemoryUsage { bytes } => {
                tracing::debug!(target: TRACING_TARGET, bytes, "current memory usage");
            }
            PoolEvent::PoolCleared { released } => {
                tracing::debug!(target: TRACING_TARGET, released, "cleared free pool");
            }
        }
    }
}

/// Discards all events.
#[derive(Clone, Copy, Debug, Default)]
#[non_exhaustive]
pub struct NullSink;

impl NullSink {
    /// Creates a new sink that discards all events.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EventSink for NullSink {
    fn record(&self, _event: &PoolEvent) {}
}

/// Keeps every event in memory, in the order received.
///
/// Clones share the same buffer, so one clone can be handed to the pool builder while another
/// is kept for inspection.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use recycling_pool::{EventLog, PoolEvent, RecyclingPool};
///
/// let log = EventLog::new();
/// let pool = RecyclingPool::<Vec<u8>>::builder()
///     .event_sink(Arc::new(log.clone()))
///     .build();
///
/// let id = pool.allocate(vec![0; 16]);
///
/// assert!(matches!(
///     log.events().as_slice(),
///     [PoolEvent::Allocated { id: allocated, .. }] if *allocated == id
/// ));
/// ```
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<PoolEvent>>>,
}

impl EventLog {
    /// Creates an empty event log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<PoolEvent> {
        self.events.lock().expect(ERR_POISONED_LOCK).clone()
    }

    /// Number of events recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().expect(ERR_POISONED_LOCK).len()
    }

    /// Whether no events have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().expect(ERR_POISONED_LOCK).is_empty()
    }

    /// Removes and returns all events recorded so far.
    pub fn drain(&self) -> Vec<PoolEvent> {
        let mut events = self.events.lock().expect(ERR_POISONED_LOCK);
        events.drain(..).collect()
    }
}

impl EventSink for EventLog {
    fn record(&self, event: &PoolEvent) {
        self.events.lock().expect(ERR_POISONED_LOCK).push(*event);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::SizeCategory;

    assert_impl_all!(TracingSink: EventSink, Send, Sync);
    assert_impl_all!(NullSink: EventSink, Send, Sync);
    assert_impl_all!(EventLog: EventSink, Send, Sync, Clone);

    fn every_event() -> Vec<PoolEvent> {
        let id = ObjectId::new(1, 0);
        let type_tag = TypeTag::new("dict");
        let bucket = Bucket::new(type_tag, SizeCategory::Small);

        vec![
            PoolEvent::Allocated {
                id,
                type_tag,
                size_bytes: 64,
            },
            PoolEvent::RefIncreased {
                id,
                ref_count: RefCount::MIN,
            },
            PoolEvent::RefDecreased { id, ref_count: 0 },
            PoolEvent::Dropped {
                id,
                type_tag,
                size_bytes: 64,
                bucket,
                recycled: true,
            },
            PoolEvent::Taken { id, size_bytes: 64 },
            PoolEvent::Reused { id, bucket },
            PoolEvent::NoReuseCandidate {
                desired: None,
                min_size: 50,
            },
            PoolEvent::NotAllocated {
                id,
                operation: Operation::Reclaim,
            },
            PoolEvent::RefCountOverflow { id },
            PoolEvent::MemoryUsage { bytes: 0 },
            PoolEvent::PoolCleared { released: 3 },
        ]
    }

    #[test]
    fn log_keeps_order() {
        let log = EventLog::new();
        assert!(log.is_empty());

        for event in every_event() {
            log.record(&event);
        }

        assert_eq!(log.events(), every_event());
        assert_eq!(log.len(), every_event().len());
    }

    #[test]
    fn log_clones_share_buffer() {
        let log = EventLog::new();
        let clone = log.clone();

        clone.record(&PoolEvent::MemoryUsage { bytes: 5 });

        assert_eq!(log.len(), 1);
    }

    #[test]
    fn drain_empties_log() {
        let log = EventLog::new();
        log.record(&PoolEvent::PoolCleared { released: 0 });

        let drained = log.drain();

        assert_eq!(drained, vec![PoolEvent::PoolCleared { released: 0 }]);
        assert!(log.is_empty());
    }

    #[test]
    fn tracing_and_null_sinks_accept_every_event() {
        // No subscriber is installed, this only verifies that formatting every variant is sound.
        for event in every_event() {
            TracingSink::new().record(&event);
            NullSink::new().record(&event);
        }
    }
}
