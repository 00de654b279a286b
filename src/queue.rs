//! A fixed-capacity blocking FIFO queue for producer/consumer hand-off.
//!
//! Producers block in [`BoundedQueue::push`] while the queue is full,
//! consumers block in [`BoundedQueue::pop`] while it is empty. Items are
//! handed out in the order they were pushed. The capacity is fixed at
//! construction, so the queue also provides backpressure: a fast producer
//! cannot run further ahead of its consumers than `max_size` items.
//!
//! There is no timeout and no cancellation. A consumer loop that must end
//! has to be told so by the producer, e.g. with a sentinel item:
//!
//! ```
//! use std::{sync::Arc, thread};
//! use synchro::queue::BoundedQueue;
//!
//! let queue = Arc::new(BoundedQueue::new(4)?);
//!
//! let consumer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || {
//!         let mut sum = 0;
//!         while let Some(n) = queue.pop() {
//!             sum += n;
//!         }
//!         sum
//!     })
//! };
//!
//! for n in 1..=10 {
//!     queue.push(Some(n));
//! }
//! queue.push(None);
//!
//! assert_eq!(consumer.join().unwrap(), 55);
//! # Ok::<(), synchro::error::SyncError>(())
//! ```

use std::{collections::VecDeque, fmt::Debug};

use parking_lot::{Condvar, Mutex};

use crate::error::{Result, SyncError};

/// A thread-safe FIFO queue holding at most `max_size` items.
pub struct BoundedQueue<T> {
    max_size: usize,
    items: Mutex<VecDeque<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Creates an empty queue with capacity `max_size`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidArgument`] if `max_size` is zero.
    pub fn new(max_size: usize) -> Result<Self> {
        if max_size == 0 {
            return Err(SyncError::InvalidArgument(
                "max_size of a bounded queue must be positive".to_string(),
            ));
        }

        Ok(Self {
            max_size,
            items: Mutex::new(VecDeque::with_capacity(max_size)),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        })
    }

    /// Appends `item` at the back, blocking while the queue is full.
    pub fn push(&self, item: T) {
        let mut items = self.items.lock();
        if items.len() >= self.max_size {
            tracing::trace!(max_size = self.max_size, "producer waiting on full queue");
            self.not_full.wait_while(&mut items, |items| items.len() >= self.max_size);
        }

        items.push_back(item);
        drop(items);
        self.not_empty.notify_one();
    }

    /// Removes the front item, blocking while the queue is empty.
    pub fn pop(&self) -> T {
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                drop(items);
                self.not_full.notify_one();
                return item;
            }

            tracing::trace!("consumer waiting on empty queue");
            self.not_empty.wait(&mut items);
        }
    }

    /// Appends `item` if there is room, handing it back otherwise.
    pub fn try_push(&self, item: T) -> std::result::Result<(), T> {
        let mut items = self.items.lock();
        if items.len() >= self.max_size {
            return Err(item);
        }

        items.push_back(item);
        drop(items);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Removes the front item if there is one.
    pub fn try_pop(&self) -> Option<T> {
        let item = self.items.lock().pop_front()?;
        self.not_full.notify_one();
        Some(item)
    }

    /// The number of queued items.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Whether the queue holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Whether the queue holds `max_size` items.
    pub fn is_full(&self) -> bool {
        self.items.lock().len() >= self.max_size
    }

    /// The maximum number of items.
    pub fn capacity(&self) -> usize {
        self.max_size
    }
}

impl<T> Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("len", &self.len())
            .field("max_size", &self.max_size)
            .finish()
    }
}
