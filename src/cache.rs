//! Process-wide cache of configuration providers keyed by project root.
//!
//! The cache holds weak references only. A provider lives as long as some
//! caller holds a [`ConfigurationProvider`] handle for it; once the last
//! handle is dropped, the next lookup for that root creates a fresh provider.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::debug;

use crate::config::RegistryConfig;
use crate::dispatch::Dispatcher;
use crate::error::RegistryResult;
use crate::provider::{ConfigurationProvider, ProviderContext, WeakConfigurationProvider};
use crate::root::ProjectRoot;
use crate::runner::ThreadTaskRunner;
use crate::store::DirectoryProfileStore;

static GLOBAL: Lazy<ProviderCache> = Lazy::new(|| ProviderCache::with_defaults(&RegistryConfig::default()));

/// Cache mapping canonical project roots to their provider.
///
/// # Example
///
/// ```rust
/// use config_registry::{Dispatcher, MemoryProfileStore, ProviderCache, ProviderContext, ThreadTaskRunner};
/// use std::sync::Arc;
///
/// let cache = ProviderCache::new(ProviderContext::new(
///     Arc::new(MemoryProfileStore::new()),
///     Arc::new(ThreadTaskRunner::default()),
///     Dispatcher::inline(),
/// ));
///
/// let first = cache.get("/tmp/project").unwrap();
/// let second = cache.get("/tmp/project").unwrap();
/// assert!(first.ptr_eq(&second));
/// ```
#[derive(Debug)]
pub struct ProviderCache {
    context: ProviderContext,
    entries: Mutex<HashMap<ProjectRoot, WeakConfigurationProvider>>,
}

impl ProviderCache {
    /// Create a cache whose providers share `context`.
    pub fn new(context: ProviderContext) -> Self {
        Self {
            context,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Create a cache from `config`, using the directory profile store, a
    /// thread runner and the global dispatcher.
    pub fn from_config(config: &RegistryConfig) -> RegistryResult<Self> {
        config.validate()?;
        Ok(Self::with_defaults(config))
    }

    fn with_defaults(config: &RegistryConfig) -> Self {
        let context = ProviderContext::new(
            Arc::new(DirectoryProfileStore::from_config(config)),
            Arc::new(ThreadTaskRunner::new(config.worker_thread())),
            Dispatcher::global().clone(),
        )
        .with_event_buffer(config.event_buffer());
        Self::new(context)
    }

    /// The process-wide cache.
    pub fn global() -> &'static ProviderCache {
        &GLOBAL
    }

    /// Return the provider for `root`, creating it if no live one exists.
    pub fn get(&self, root: impl AsRef<Path>) -> RegistryResult<ConfigurationProvider> {
        let root = ProjectRoot::new(root)?;

        let mut entries = self.entries.lock();
        if let Some(provider) = entries.get(&root).and_then(WeakConfigurationProvider::upgrade) {
            return Ok(provider);
        }

        entries.retain(|_, weak| weak.is_alive());
        debug!(root = %root, "Creating configuration provider");
        let provider = ConfigurationProvider::new(root.clone(), self.context.clone());
        entries.insert(root, provider.downgrade());
        Ok(provider)
    }

    /// Number of providers still referenced by some caller.
    pub fn live_count(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|weak| weak.is_alive())
            .count()
    }
}

/// Return the provider for `root` from the process-wide cache.
pub fn config_provider(root: impl AsRef<Path>) -> RegistryResult<ConfigurationProvider> {
    ProviderCache::global().get(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryProfileStore;

    fn cache() -> ProviderCache {
        ProviderCache::new(ProviderContext::new(
            Arc::new(MemoryProfileStore::new()),
            Arc::new(ThreadTaskRunner::default()),
            Dispatcher::inline(),
        ))
    }

    #[test]
    fn test_same_root_same_instance() {
        let cache = cache();
        let a = cache.get("/tmp/cache-test/a").unwrap();
        let again = cache.get("/tmp/cache-test/a").unwrap();
        let b = cache.get("/tmp/cache-test/b").unwrap();

        assert!(a.ptr_eq(&again));
        assert!(!a.ptr_eq(&b));
        assert_eq!(cache.live_count(), 2);
    }

    #[test]
    fn test_dropped_provider_is_reclaimed() {
        let cache = cache();
        let first = cache.get("/tmp/cache-test/reclaim").unwrap();
        let weak = first.downgrade();
        drop(first);

        assert!(weak.upgrade().is_none());
        assert_eq!(cache.live_count(), 0);

        let second = cache.get("/tmp/cache-test/reclaim").unwrap();
        assert_eq!(cache.live_count(), 1);
        assert!(second.configurations().len() >= 1);
    }

    #[test]
    fn test_dead_entries_are_swept_on_insert() {
        let cache = cache();
        drop(cache.get("/tmp/cache-test/x").unwrap());
        drop(cache.get("/tmp/cache-test/y").unwrap());
        let _z = cache.get("/tmp/cache-test/z").unwrap();
        assert_eq!(cache.entries.lock().len(), 1);
    }

    #[test]
    fn test_invalid_root_is_rejected() {
        assert!(cache().get("").is_err());
    }

    #[test]
    fn test_from_config_validates() {
        let config = RegistryConfig::new().with_event_buffer(0);
        assert!(ProviderCache::from_config(&config).is_err());
    }
}
