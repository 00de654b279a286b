//! A mutex annotated with a level in a lock hierarchy.
//!
//! Every [`HierarchicalLock`] carries an immutable level. A thread may only
//! acquire a lock whose level is strictly less than the level it currently
//! holds, so locks are always taken in strictly decreasing order. With all
//! threads following the same order no cycle of waiting threads can form,
//! which rules out circular-wait deadlocks.
//!
//! The level currently held is per-thread state, shared by all hierarchical
//! locks touched by that thread. A fresh thread starts at [`MAX_LEVEL`], so the
//! first lock it takes always passes the check. Acquiring a lock records the
//! previous level in the lock instance, releasing restores it.
//!
//! Violations are detected before the underlying mutex is touched and are
//! returned as [`SyncError::HierarchyViolation`].
//!
//! ```
//! use synchro::hierarchy::HierarchicalLock;
//!
//! let high = HierarchicalLock::new(10_000)?;
//! let low = HierarchicalLock::new(5_000)?;
//!
//! high.lock()?;
//! low.lock()?;
//! low.unlock()?;
//! high.unlock()?;
//!
//! low.lock()?;
//! assert!(high.lock().is_err());
//! low.unlock()?;
//! # Ok::<(), synchro::error::SyncError>(())
//! ```

use std::{
    cell::Cell,
    fmt::Debug,
    mem,
    sync::atomic::{AtomicU64, Ordering},
    thread::{self, ThreadId},
};

use parking_lot::{Condvar, Mutex};

use crate::error::{LockOp, Result, SyncError};

/// The level a thread holds while it holds no hierarchical lock.
pub const MAX_LEVEL: u64 = u64::MAX;

thread_local! {
    static HELD_LEVEL: Cell<u64> = const { Cell::new(MAX_LEVEL) };
}

/// Returns the hierarchy level currently held by the calling thread.
///
/// This is [`MAX_LEVEL`] if the thread holds no hierarchical lock.
pub fn current_level() -> u64 {
    HELD_LEVEL.with(Cell::get)
}

fn set_current_level(level: u64) {
    HELD_LEVEL.with(|held| held.set(level));
}

/// A blocking mutex without guards, that remembers its owning thread.
struct RawMutex {
    owner: Mutex<Option<ThreadId>>,
    released: Condvar,
}

impl RawMutex {
    fn new() -> Self {
        Self {
            owner: Mutex::new(None),
            released: Condvar::new(),
        }
    }

    fn acquire(&self) {
        let mut owner = self.owner.lock();
        self.released.wait_while(&mut owner, |owner| owner.is_some());
        *owner = Some(thread::current().id());
    }

    fn try_acquire(&self) -> bool {
        let mut owner = self.owner.lock();
        if owner.is_some() {
            return false;
        }
        *owner = Some(thread::current().id());
        true
    }

    fn is_owned_by_current(&self) -> bool {
        *self.owner.lock() == Some(thread::current().id())
    }

    fn release(&self) {
        *self.owner.lock() = None;
        self.released.notify_one();
    }

    fn is_locked(&self) -> bool {
        self.owner.lock().is_some()
    }
}

/// A mutex that enforces a strict acquisition order per thread.
///
/// See the [module level documentation](self) for the ordering rules.
pub struct HierarchicalLock {
    level: u64,
    // Only written by the owning thread while `raw` is held.
    previous: AtomicU64,
    raw: RawMutex,
}

impl HierarchicalLock {
    /// Creates a new unlocked lock with the given level.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidArgument`] if `level` is [`MAX_LEVEL`],
    /// since such a lock could never be acquired.
    pub fn new(level: u64) -> Result<Self> {
        if level == MAX_LEVEL {
            return Err(SyncError::InvalidArgument(format!(
                "hierarchy level must be less than {MAX_LEVEL}"
            )));
        }

        Ok(Self {
            level,
            previous: AtomicU64::new(MAX_LEVEL),
            raw: RawMutex::new(),
        })
    }

    /// The level of this lock.
    pub fn level(&self) -> u64 {
        self.level
    }

    /// Whether some thread currently holds this lock.
    ///
    /// The result may be stale immediately.
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }

    /// Acquires the lock, blocking until it is available.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::HierarchyViolation`] if the calling thread holds
    /// a level that is not strictly greater than this lock's level. The
    /// underlying mutex is not touched in that case.
    pub fn lock(&self) -> Result<()> {
        let held = self.check_acquire(LockOp::Lock)?;
        self.raw.acquire();
        self.enter(held);
        Ok(())
    }

    /// Attempts to acquire the lock without blocking.
    ///
    /// Returns `Ok(false)` if the lock is held by another thread, leaving
    /// the per-thread level untouched.
    ///
    /// # Errors
    ///
    /// Same as [`HierarchicalLock::lock`].
    pub fn try_lock(&self) -> Result<bool> {
        let held = self.check_acquire(LockOp::TryLock)?;
        if !self.raw.try_acquire() {
            return Ok(false);
        }
        self.enter(held);
        Ok(true)
    }

    /// Releases the lock and restores the level held before acquisition.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::HierarchyViolation`] if the calling thread's level
    /// does not equal this lock's level (the lock is released out of order)
    /// or if the calling thread does not own this lock.
    pub fn unlock(&self) -> Result<()> {
        let held = current_level();
        if held != self.level || !self.raw.is_owned_by_current() {
            return Err(SyncError::HierarchyViolation {
                held,
                requested: self.level,
                op: LockOp::Unlock,
            });
        }

        set_current_level(self.previous.load(Ordering::Relaxed));
        self.raw.release();
        Ok(())
    }

    /// Runs `f` while holding the lock.
    ///
    /// If `f` acquires further hierarchical locks it must release them
    /// before returning, otherwise the final release fails. If `f` panics
    /// the lock is released during unwinding.
    pub fn with<T>(&self, f: impl FnOnce() -> T) -> Result<T> {
        self.lock()?;
        let unwind = ReleaseOnUnwind(self);
        let value = f();
        mem::forget(unwind);
        self.unlock()?;
        Ok(value)
    }

    fn check_acquire(&self, op: LockOp) -> Result<u64> {
        let held = current_level();
        if held <= self.level {
            return Err(SyncError::HierarchyViolation {
                held,
                requested: self.level,
                op,
            });
        }
        Ok(held)
    }

    fn enter(&self, held: u64) {
        self.previous.store(held, Ordering::Relaxed);
        set_current_level(self.level);
    }
}

/// Releases the lock if the closure passed to [`HierarchicalLock::with`]
/// unwinds.
struct ReleaseOnUnwind<'a>(&'a HierarchicalLock);

impl Drop for ReleaseOnUnwind<'_> {
    fn drop(&mut self) {
        // Fails only if the closure leaked a nested lock, which then stays held.
        let _ = self.0.unlock();
    }
}

impl Debug for HierarchicalLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchicalLock")
            .field("level", &self.level)
            .field("locked", &self.is_locked())
            .finish()
    }
}
