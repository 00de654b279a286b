//!
//! Convenience re-export of common members.
//!

pub use crate::cache::ReadWriteCache;

pub use crate::error::BoxError;
pub use crate::error::LockOp;
pub use crate::error::SyncError;

pub use crate::hierarchy::current_level;
pub use crate::hierarchy::HierarchicalLock;

pub use crate::lazy::LazyConnection;
pub use crate::lazy::Singleton;
pub use crate::lazy::Transport;

pub use crate::logger::Logger;

pub use crate::once::OnceGate;

pub use crate::queue::BoundedQueue;

pub use crate::rwlock::FairRwLock;

pub use crate::spin::SpinGuard;
pub use crate::spin::Spinlock;
