//! A concurrent read-mostly key/value cache.
//!
//! [`ReadWriteCache`] is the classic lookup table shared by many threads
//! that mostly read it, e.g. a resolver cache mapping domain names to
//! records. Lookups take shared access and proceed in parallel, updates take
//! exclusive access. The map is guarded by a [`FairRwLock`], so a pending
//! update is never starved by continuous lookup traffic.

use std::{borrow::Borrow, fmt::Debug, hash::Hash, marker::PhantomData};

use fxhash::{FxBuildHasher, FxHashMap};

use crate::rwlock::FairRwLock;

/// A key/value store with concurrent readers and exclusive writers.
///
/// ```
/// use synchro::cache::ReadWriteCache;
///
/// let cache = ReadWriteCache::new();
/// cache.update("example.org".to_string(), [93, 184, 215, 14]);
///
/// assert_eq!(cache.find("example.org"), Some([93, 184, 215, 14]));
/// assert_eq!(cache.find("example.com"), None);
/// ```
pub struct ReadWriteCache<K, V> {
    label: Option<String>,
    entries: FairRwLock<FxHashMap<K, V>>,
}

impl<K, V> ReadWriteCache<K, V> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Builder::new().build()
    }

    /// Creates a [`Builder`] to configure a new cache.
    pub fn builder() -> Builder<K, V> {
        Builder::new()
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl<K: Eq + Hash, V> ReadWriteCache<K, V> {
    /// Checks whether an entry for `key` exists.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.read().contains_key(key)
    }

    /// Inserts or overwrites the entry for `key`.
    ///
    /// Blocks until no reader and no other writer holds the cache and
    /// excludes all readers while the entry is written.
    pub fn update(&self, key: K, value: V) {
        let replaced = self.entries.write().insert(key, value).is_some();
        tracing::trace!(cache = self.label.as_deref(), replaced, "cache entry updated");
    }

    /// Removes the entry for `key`, returning it if it existed.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.write().remove(key)
    }
}

impl<K: Eq + Hash, V: Clone> ReadWriteCache<K, V> {
    /// Looks up the entry for `key`.
    ///
    /// A missing entry is not an error, `None` is returned instead.
    /// Concurrent lookups proceed in parallel.
    pub fn find<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.read().get(key).cloned()
    }
}

impl<K, V> Default for ReadWriteCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Debug for ReadWriteCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadWriteCache")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// A builder for a [`ReadWriteCache`].
#[must_use]
pub struct Builder<K, V> {
    capacity: usize,
    label: Option<String>,
    entries: PhantomData<fn() -> (K, V)>,
}

impl<K, V> Builder<K, V> {
    /// Creates a new unconfigured builder.
    pub fn new() -> Builder<K, V> {
        Builder {
            capacity: 0,
            label: None,
            entries: PhantomData,
        }
    }

    ///
    /// Preallocates space for `capacity` entries.
    ///
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    ///
    /// Names the cache in emitted trace events.
    ///
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    ///
    /// Builds a new empty cache.
    ///
    pub fn build(self) -> ReadWriteCache<K, V> {
        ReadWriteCache {
            label: self.label,
            entries: FairRwLock::new(FxHashMap::with_capacity_and_hasher(
                self.capacity,
                FxBuildHasher::default(),
            )),
        }
    }
}

impl<K, V> Default for Builder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Debug for Builder<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("capacity", &self.capacity)
            .field("label", &self.label)
            .finish()
    }
}
