#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! This package provides [`RecyclingPool`], a reference-counted object pool that recycles
//! reclaimed objects instead of discarding them.
//!
//! It is aimed at workloads that allocate and release many same-shaped objects (buffers,
//! message envelopes and similar) and want to avoid repeated allocation cost by handing
//! previously used objects back out.
//!
//! # How it works
//!
//! - [`allocate()`] takes ownership of an object, issues an [`ObjectId`] for it and starts
//!   tracking it with a reference count of 1.
//! - [`increase_ref()`] and [`decrease_ref()`] adjust the count. When the last reference is
//!   released, the object is reclaimed in the same operation.
//! - A reclaimed object is filed into a free pool [`Bucket`] keyed by its [`TypeTag`] and
//!   [`SizeCategory`].
//! - [`reuse()`] takes a matching object out of the free pool and allocates it again under a
//!   new identity.
//! - [`memory_usage()`] reports the total size of all live objects, maintained incrementally.
//!
//! Objects describe themselves to the pool through the [`Poolable`] trait.
//!
//! # Variants
//!
//! - [`RecyclingPool`] is a cloneable, thread-safe handle. Every operation holds the pool lock
//!   for its whole duration, so concurrent operations never observe each other half-done.
//! - [`RawRecyclingPool`] is the single-threaded core with `&mut self` operations.
//!
//! # Observability
//!
//! Every state change and every rejected request is reported as a [`PoolEvent`] to the
//! pool's [`EventSink`]. The default [`TracingSink`] emits structured [`tracing`] events.
//!
//! # Example
//!
//! ```rust
//! use recycling_pool::{RecyclingPool, Release, TypeTag};
//!
//! let pool = RecyclingPool::<Vec<u8>>::new();
//!
//! let id = pool.allocate(Vec::with_capacity(512));
//! pool.increase_ref(id).unwrap();
//!
//! assert!(matches!(pool.decrease_ref(id), Ok(Release::Live(_))));
//! assert!(matches!(pool.decrease_ref(id), Ok(Release::Reclaimed(_))));
//! assert_eq!(pool.memory_usage(), 0);
//!
//! // The buffer is recycled instead of allocating a new one.
//! let reused = pool.reuse(Some(TypeTag::new("vec")), 100).unwrap();
//! assert!(pool.with(reused, Vec::capacity).unwrap() >= 512);
//! assert!(pool.memory_usage() > 0);
//! ```
//!
//! [`allocate()`]: RecyclingPool::allocate
//! [`increase_ref()`]: RecyclingPool::increase_ref
//! [`decrease_ref()`]: RecyclingPool::decrease_ref
//! [`reuse()`]: RecyclingPool::reuse
//! [`memory_usage()`]: RecyclingPool::memory_usage

mod builder;
mod constants;
mod drop_policy;
mod error;
mod event;
mod object_id;
mod operation;
mod pool;
mod poolable;
mod raw;
mod release;
mod size_category;

pub use builder::*;
pub use drop_policy::*;
pub use error::Error;
pub use event::*;
pub use object_id::{ObjectId, RefCount};
pub use operation::*;
pub use pool::*;
pub use poolable::*;
pub use raw::*;
pub use release::*;
pub use size_category::*;
