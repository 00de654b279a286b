//! A one-time gate that is only consumed by a successful initializer.
//!
//! [`OnceGate`] runs an initializer at most once successfully, no matter how
//! many threads race to be first. Concurrent first callers block until the
//! running attempt finishes. If the initializer fails (or panics) the gate
//! stays open and the next caller runs its own attempt, so a transient
//! failure does not wedge the gate forever.
//!
//! Once initialized, [`OnceGate::get`] is a plain lock-free read and every
//! thread observes the fully constructed value.

use std::{convert::Infallible, fmt::Debug, sync::OnceLock};

use parking_lot::{const_mutex, Mutex};

/// A cell that is written exactly once by the first successful initializer.
pub struct OnceGate<T> {
    value: OnceLock<T>,
    // Serialises initialization attempts.
    attempt: Mutex<()>,
}

impl<T> OnceGate<T> {
    /// Creates a new uninitialized gate.
    pub const fn new() -> Self {
        Self {
            value: OnceLock::new(),
            attempt: const_mutex(()),
        }
    }

    /// Returns the value if the gate was initialized.
    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    /// Whether a successful initializer has run.
    pub fn is_initialized(&self) -> bool {
        self.value.get().is_some()
    }

    /// Returns the value, running `f` if the gate is not yet initialized.
    ///
    /// Only one initializer runs at a time. A caller that waited for a
    /// successful attempt of another thread returns that value without
    /// running `f`.
    ///
    /// # Errors
    ///
    /// Returns the error of `f`. The gate remains uninitialized.
    pub fn get_or_try_init<E>(&self, f: impl FnOnce() -> Result<T, E>) -> Result<&T, E> {
        if let Some(value) = self.value.get() {
            return Ok(value);
        }

        // A panicking initializer unlocks on unwind and leaves the gate open.
        let _attempt = self.attempt.lock();
        if let Some(value) = self.value.get() {
            return Ok(value);
        }

        let value = f()?;
        Ok(self.value.get_or_init(|| value))
    }

    /// Returns the value, running the infallible `f` if required.
    pub fn get_or_init(&self, f: impl FnOnce() -> T) -> &T {
        match self.get_or_try_init(|| Ok::<T, Infallible>(f())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Consumes the gate, returning the value if it was initialized.
    pub fn into_inner(self) -> Option<T> {
        self.value.into_inner()
    }
}

impl<T> Default for OnceGate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Debug> Debug for OnceGate<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("OnceGate").field(&self.value.get()).finish()
    }
}
