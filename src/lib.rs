#![warn(missing_docs, missing_debug_implementations)]
//!
//! Synchronisation primitives and concurrency patterns.
//!
//! Synchro bundles a small set of building blocks for in-process
//! coordination between OS threads. Each of them is independent of the
//! others and can be shared between any number of threads.
//!
//! - A [`Spinlock`](crate::spin::Spinlock) for very short critical
//!   sections, that busy-waits instead of suspending the thread.
//! - A [`HierarchicalLock`](crate::hierarchy::HierarchicalLock), a mutex with
//!   a level in a lock hierarchy. Locks can only be taken in strictly
//!   decreasing order per thread, which makes circular-wait deadlocks
//!   impossible. Out of order operations fail with
//!   [`SyncError::HierarchyViolation`](crate::error::SyncError).
//! - A [`BoundedQueue`](crate::queue::BoundedQueue), a fixed-capacity FIFO
//!   for producer/consumer hand-off with blocking `push` and `pop`.
//! - A [`ReadWriteCache`](crate::cache::ReadWriteCache), a read-mostly
//!   key/value store guarded by the writer-preferring
//!   [`FairRwLock`](crate::rwlock::FairRwLock).
//! - Lazily initialized shared resources: the process-wide
//!   [`Singleton`](crate::lazy::Singleton) and the connect-on-first-use
//!   [`LazyConnection`](crate::lazy::LazyConnection). Both are built on the
//!   [`OnceGate`](crate::once::OnceGate), which is only consumed by a
//!   successful initializer.
//!
//! # Blocking
//!
//! Apart from the spinlock, all primitives suspend the calling thread while
//! they wait. None of them supports timeouts or cancellation. A caller that
//! needs bounded waiting must layer it on top, e.g. with a sentinel item
//! pushed into a [`BoundedQueue`](crate::queue::BoundedQueue).
//!
//! # Errors
//!
//! All errors are returned synchronously to the calling thread as
//! [`SyncError`](crate::error::SyncError). No primitive retries, logs or
//! swallows an error on its own.
//!
//! # Logging
//!
//! Lazy initialization, blocking queue operations and cache updates emit
//! [`tracing`] events. The [`logger`] module provides a ready made subscriber.
//!

pub mod prelude;

pub mod cache;
pub mod error;
pub mod hierarchy;
pub mod lazy;
pub mod logger;
pub mod once;
pub mod queue;
pub mod rwlock;
pub mod spin;
