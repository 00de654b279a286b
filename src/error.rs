//! Errors returned by the synchronisation primitives.

use std::{error::Error, fmt::Display};

/// A boxed error produced by user supplied initializers or transports.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// A specialised result type for fallible synchronisation operations.
pub type Result<T, E = SyncError> = std::result::Result<T, E>;

/// The operation of a [`HierarchicalLock`](crate::hierarchy::HierarchicalLock)
/// that caused a [`SyncError::HierarchyViolation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockOp {
    /// A blocking acquire.
    Lock,
    /// A non-blocking acquire.
    TryLock,
    /// A release.
    Unlock,
}

impl Display for LockOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Lock => "lock",
                Self::TryLock => "try_lock",
                Self::Unlock => "unlock",
            }
        )
    }
}

/// An error raised by one of the synchronisation primitives.
///
/// Errors are always returned to the calling thread. No primitive
/// retries internally, so any retry is a decision of the caller.
#[derive(Debug)]
pub enum SyncError {
    /// A thread tried to acquire or release a hierarchical lock out of the
    /// declared order. `held` is the level the calling thread currently holds,
    /// `requested` the level of the lock that was operated on.
    HierarchyViolation {
        /// The current level of the calling thread.
        held: u64,
        /// The level of the lock the operation targeted.
        requested: u64,
        /// The offending operation.
        op: LockOp,
    },
    /// An argument was outside of the documented domain of an operation.
    /// Nothing was modified.
    InvalidArgument(String),
    /// A one-time initializer failed. The gate remains open, so a later
    /// caller may retry.
    InitializationFailure(BoxError),
    /// An established connection failed to transfer a packet.
    Transport(BoxError),
}

impl SyncError {
    /// Wraps an initializer error.
    pub fn initialization(err: impl Into<BoxError>) -> Self {
        Self::InitializationFailure(err.into())
    }

    /// Wraps a transport error.
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::Transport(err.into())
    }

    /// Whether this error is a [`SyncError::HierarchyViolation`].
    pub fn is_hierarchy_violation(&self) -> bool {
        matches!(self, Self::HierarchyViolation { .. })
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HierarchyViolation {
                held,
                requested,
                op,
            } => write!(
                f,
                "lock hierarchy violated: {op} of level {requested} while holding level {held}"
            ),
            Self::InvalidArgument(str) => write!(f, "invalid argument: {str}"),
            Self::InitializationFailure(err) => write!(f, "initialization failed: {err}"),
            Self::Transport(err) => write!(f, "transport failed: {err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InitializationFailure(err) | Self::Transport(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
