//! A test-and-set spinlock for very short critical sections.
//!
//! The lock is a single atomic flag, which is `true` iff some thread holds
//! the lock. Acquiring it busy-waits on the current core instead of
//! suspending the thread, so contending threads burn cycles while they
//! wait. There is no queueing and thus no fairness: under heavy contention
//! a thread may starve. This is only worth it if the protected section is
//! shorter than a context switch.
//!
//! The way a thread waits between two acquire attempts is chosen with a
//! [`RelaxStrategy`] from the `spin` crate. The default [`Spin`] emits a
//! spin-loop hint to the processor, [`Loop`] does nothing
//! at all. Strategies that yield to the OS scheduler defeat the purpose of
//! this lock and should not be used.

use std::{
    fmt::Debug,
    marker::PhantomData,
    sync::atomic::{AtomicBool, Ordering},
};

pub use ::spin::relax::{Loop, RelaxStrategy, Spin};

/// A busy-waiting mutual exclusion lock.
///
/// The lock does not own the data it protects, it merely fences access.
/// Use [`Spinlock::guard`] or [`Spinlock::with`] to get automatic release.
///
/// # Examples
///
/// ```
/// use synchro::spin::Spinlock;
///
/// let lock: Spinlock = Spinlock::new();
/// lock.lock();
/// assert!(lock.is_locked());
/// lock.unlock();
/// assert!(!lock.is_locked());
/// ```
pub struct Spinlock<R = Spin> {
    locked: AtomicBool,
    relax: PhantomData<R>,
}

impl<R> Spinlock<R> {
    /// Creates a new unlocked spinlock.
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
            relax: PhantomData,
        }
    }

    /// Attempts to take the lock without waiting.
    pub fn try_lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Releases the lock.
    ///
    /// Releasing a lock that is held by another thread is a logic error,
    /// but cannot cause undefined behaviour since no data is guarded.
    pub fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }

    /// Checks whether the lock is currently held.
    ///
    /// This performs no synchronisation, so the result should be treated
    /// as stale immediately. Only use it for debugging and heuristics.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

impl<R: RelaxStrategy> Spinlock<R> {
    /// Spins until the lock is acquired.
    pub fn lock(&self) {
        while self.locked.swap(true, Ordering::Acquire) {
            // Wait on a plain load to keep the cache line shared until
            // the holder releases it.
            while self.locked.load(Ordering::Relaxed) {
                R::relax();
            }
        }
    }

    /// Acquires the lock, returning a guard that releases it when dropped.
    pub fn guard(&self) -> SpinGuard<'_, R> {
        self.lock();
        SpinGuard { lock: self }
    }

    /// Runs `f` while holding the lock.
    pub fn with<T>(&self, f: impl FnOnce() -> T) -> T {
        let _guard = self.guard();
        f()
    }
}

impl<R> Default for Spinlock<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Debug for Spinlock<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spinlock")
            .field("locked", &self.is_locked())
            .finish()
    }
}

/// A guard that holds a [`Spinlock`] until it is dropped.
#[must_use = "if unused the Spinlock will immediately unlock"]
pub struct SpinGuard<'a, R = Spin> {
    lock: &'a Spinlock<R>,
}

impl<R> Drop for SpinGuard<'_, R> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}

impl<R> Debug for SpinGuard<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpinGuard").finish_non_exhaustive()
    }
}
