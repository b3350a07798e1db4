//! Typed listener registries.
//!
//! A [`ListenerRegistry`] maps handles to callbacks. Callers iterate over a
//! snapshot, so a callback may add or remove listeners (itself included)
//! while it is being notified.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Handle identifying a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

impl ListenerId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

struct Entries<L: ?Sized> {
    listeners: HashMap<ListenerId, Arc<L>>,
    ordered: Vec<ListenerId>,
}

/// A thread-safe registry of listeners of type `L`.
///
/// # Example
///
/// ```rust
/// use config_registry::ListenerRegistry;
/// use std::sync::Arc;
///
/// let registry: ListenerRegistry<dyn Fn() + Send + Sync> = ListenerRegistry::new();
/// let id = registry.add(Arc::new(|| println!("changed")));
///
/// assert_eq!(registry.len(), 1);
/// assert!(registry.remove(id));
/// assert!(registry.is_empty());
/// ```
pub struct ListenerRegistry<L: ?Sized> {
    entries: RwLock<Entries<L>>,
}

impl<L: ?Sized> ListenerRegistry<L> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Entries {
                listeners: HashMap::new(),
                ordered: Vec::new(),
            }),
        }
    }

    /// Register a listener and return its handle.
    pub fn add(&self, listener: Arc<L>) -> ListenerId {
        let id = ListenerId::next();
        let mut entries = self.entries.write();
        entries.ordered.push(id);
        entries.listeners.insert(id, listener);
        id
    }

    /// Unregister a listener. Returns `false` if the handle was unknown.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write();
        entries.ordered.retain(|n| *n != id);
        entries.listeners.remove(&id).is_some()
    }

    /// Listeners in registration order, detached from the registry.
    pub fn snapshot(&self) -> Vec<Arc<L>> {
        let entries = self.entries.read();
        entries
            .ordered
            .iter()
            .filter_map(|id| entries.listeners.get(id))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().listeners.is_empty()
    }
}

impl<L: ?Sized> Default for ListenerRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> fmt::Debug for ListenerRegistry<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .finish()
    }
}
