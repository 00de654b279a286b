//! A writer-preferring reader-writer lock.
//!
//! Any number of readers or exactly one writer may hold the lock, never
//! both. Unlike a reader-preferring lock, a writer that starts waiting
//! closes the lock for newly arriving readers. The readers already inside
//! drain, the writer enters, and only then are the blocked readers admitted
//! again. A continuous stream of readers can thus never starve a writer.
//!
//! This is the task-fair policy of [`parking_lot::RwLock`], which is used
//! as is. The lock does not poison. A panic while holding a guard simply
//! releases the lock when the guard is dropped during unwinding.
//!
//! Recursive read locks may deadlock if a writer queues up in between.

/// A reader-writer lock that prioritises waiting writers over new readers.
pub type FairRwLock<T> = parking_lot::RwLock<T>;

/// Shared access to the value of a [`FairRwLock`].
pub type ReadGuard<'a, T> = parking_lot::RwLockReadGuard<'a, T>;

/// Exclusive access to the value of a [`FairRwLock`].
pub type WriteGuard<'a, T> = parking_lot::RwLockWriteGuard<'a, T>;
