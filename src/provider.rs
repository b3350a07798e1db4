//! Per-root configuration provider.
//!
//! A [`ConfigurationProvider`] owns the configuration set of one project root,
//! the active configuration, and the listeners observing both. It is a cheap
//! handle: clones share the same state, and the provider stays alive as long
//! as any handle does.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::configuration::{Configuration, ConfigurationSet};
use crate::dispatch::Dispatcher;
use crate::error::{RegistryResult, StoreResult};
use crate::event::ConfigurationEvent;
use crate::listeners::{ListenerId, ListenerRegistry};
use crate::root::ProjectRoot;
use crate::runner::TaskRunner;
use crate::store::ProfileStore;
use crate::stream::EventSubscription;

/// Listener for every configuration event.
pub type ChangeListener = dyn Fn(&ConfigurationEvent) + Send + Sync;

/// Listener notified, without payload, when the active configuration changes.
pub type ActiveListener = dyn Fn() + Send + Sync;

/// Progress of the one-shot background discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DiscoveryState {
    /// No accessor has been called yet
    Unused = 0,
    /// Discovery has been handed to the task runner
    Scheduled = 1,
    /// Discovery has completed
    Populated = 2,
}

impl DiscoveryState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => DiscoveryState::Unused,
            1 => DiscoveryState::Scheduled,
            _ => DiscoveryState::Populated,
        }
    }
}

/// Collaborators shared by every provider of a cache.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    pub store: Arc<dyn ProfileStore>,
    pub runner: Arc<dyn TaskRunner>,
    pub dispatcher: Dispatcher,
    pub event_buffer: usize,
}

impl ProviderContext {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        runner: Arc<dyn TaskRunner>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            store,
            runner,
            dispatcher,
            event_buffer: crate::config::DEFAULT_EVENT_BUFFER,
        }
    }

    pub fn with_event_buffer(mut self, size: usize) -> Self {
        self.event_buffer = size;
        self
    }
}

#[derive(Debug)]
struct ProviderState {
    root: ProjectRoot,
    context: ProviderContext,
    configs: RwLock<ConfigurationSet>,
    active: ArcSwap<Configuration>,
    discovery: AtomicU8,
    change_listeners: Arc<ListenerRegistry<ChangeListener>>,
    active_listeners: Arc<ListenerRegistry<ActiveListener>>,
}

/// Configurations of one project root.
///
/// Obtain providers through [`ProviderCache::get`](crate::ProviderCache::get)
/// so that every caller for the same root shares one instance.
///
/// # Example
///
/// ```rust
/// use config_registry::{
///     Configuration, ConfigurationProvider, Dispatcher, MemoryProfileStore, ProjectRoot,
///     ProviderContext, ThreadTaskRunner,
/// };
/// use std::sync::Arc;
///
/// let context = ProviderContext::new(
///     Arc::new(MemoryProfileStore::with_profiles(["debug"])),
///     Arc::new(ThreadTaskRunner::default()),
///     Dispatcher::inline(),
/// );
/// let provider = ConfigurationProvider::new(ProjectRoot::new("/tmp/app").unwrap(), context);
///
/// let configs = provider.find_and_update_configurations(false);
/// assert!(configs.contains(&Configuration::profile("debug")));
///
/// provider.set_active_configuration(Configuration::profile("debug"));
/// assert_eq!(provider.active_configuration(), Configuration::profile("debug"));
/// ```
#[derive(Debug, Clone)]
pub struct ConfigurationProvider {
    state: Arc<ProviderState>,
}

impl ConfigurationProvider {
    /// Create a provider that is not registered in any cache.
    pub fn new(root: ProjectRoot, context: ProviderContext) -> Self {
        Self {
            state: Arc::new(ProviderState {
                root,
                context,
                configs: RwLock::new(ConfigurationSet::new()),
                active: ArcSwap::from_pointee(Configuration::DEFAULT),
                discovery: AtomicU8::new(DiscoveryState::Unused as u8),
                change_listeners: Arc::new(ListenerRegistry::new()),
                active_listeners: Arc::new(ListenerRegistry::new()),
            }),
        }
    }

    /// A handle that does not keep the provider alive.
    ///
    /// Listeners that need to call back into their own provider should
    /// capture this instead of a [`ConfigurationProvider`] clone: the
    /// provider owns its listeners, so a strong handle inside a listener
    /// keeps the provider (and its cache entry) alive forever.
    pub fn downgrade(&self) -> WeakConfigurationProvider {
        WeakConfigurationProvider {
            state: Arc::downgrade(&self.state),
        }
    }

    pub fn root(&self) -> &ProjectRoot {
        &self.state.root
    }

    /// Whether both handles refer to the same provider.
    pub fn ptr_eq(&self, other: &ConfigurationProvider) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    pub fn discovery_state(&self) -> DiscoveryState {
        DiscoveryState::from_u8(self.state.discovery.load(Ordering::Acquire))
    }

    /// Snapshot of the configuration set.
    ///
    /// The first call schedules background discovery; the snapshot returned
    /// here does not wait for it. A `ConfigurationsChanged` event follows
    /// once discovery has reconciled the set.
    pub fn configurations(&self) -> ConfigurationSet {
        self.ensure_discovery();
        self.state.configs.read().clone()
    }

    /// The active configuration.
    ///
    /// If the active configuration is no longer part of the set it is reset
    /// to the default configuration, which is published as a change.
    pub fn active_configuration(&self) -> Configuration {
        self.ensure_discovery();

        let current = self.state.active.load_full();
        if self.state.configs.read().contains(&current) {
            return Configuration::clone(&current);
        }
        self.set_active_configuration(Configuration::DEFAULT);
        Configuration::DEFAULT
    }

    /// Make `config` the active configuration.
    ///
    /// `None` is ignored with a warning. Listeners are notified only when the
    /// active configuration actually changes.
    pub fn set_active_configuration(&self, config: impl Into<Option<Configuration>>) {
        let config: Option<Configuration> = config.into();
        let Some(config) = config else {
            warn!(root = %self.state.root, "Attempting to set a missing active configuration");
            return;
        };

        let previous = self.state.active.swap(Arc::new(config.clone()));
        if *previous == config {
            return;
        }

        debug!(root = %self.state.root, from = %previous, to = %config, "Active configuration changed");
        let change_listeners = Arc::clone(&self.state.change_listeners);
        let active_listeners = Arc::clone(&self.state.active_listeners);
        let event = ConfigurationEvent::ActiveChanged {
            old: Configuration::clone(&previous),
            new: config,
        };
        self.state.context.dispatcher.deliver(move || {
            for listener in change_listeners.snapshot() {
                listener(&event);
            }
            for listener in active_listeners.snapshot() {
                listener();
            }
        });
    }

    /// Add `config` to the set.
    ///
    /// Listeners are told the set changed even when `config` was already
    /// present.
    pub fn add_configuration(&self, config: Configuration) {
        if self.state.configs.write().insert(config.clone()) {
            debug!(root = %self.state.root, config = %config, "Configuration added");
        }
        self.fire_configurations_changed();
    }

    /// Remove `config` from the set and delete its profile artifact.
    ///
    /// The default configuration cannot be removed. The removal is visible to
    /// readers immediately; the artifact is deleted in the background and
    /// failures are only logged.
    pub fn remove_configuration(&self, config: &Configuration) {
        let Some(profile) = config.profile_name() else {
            warn!(root = %self.state.root, "Cannot remove the default configuration");
            return;
        };

        self.state.configs.write().remove(config);

        let store = Arc::clone(&self.state.context.store);
        let root = self.state.root.clone();
        let profile = profile.to_string();
        self.state.context.runner.schedule(Box::new(move || {
            if let Err(err) = store.delete_profile_artifact(&root, &profile) {
                debug!(root = %root, profile = %profile, error = %err, "Failed to delete profile artifact");
            }
        }));

        self.fire_configurations_changed();
    }

    /// Reconcile the set with the profile store.
    ///
    /// Every discovered profile is added. With `may_remove`, configurations
    /// the store no longer reports are dropped as well. A store failure leaves
    /// the set untouched and is logged; the current snapshot is returned.
    pub fn find_and_update_configurations(&self, may_remove: bool) -> ConfigurationSet {
        match self.reconcile(may_remove) {
            Ok(configs) => configs,
            Err(err) => {
                warn!(root = %self.state.root, error = %err, "Profile discovery failed");
                self.state.configs.read().clone()
            }
        }
    }

    /// Reconcile with the store, pruning stale configurations, and report
    /// store failures to the caller.
    pub fn refresh(&self) -> RegistryResult<ConfigurationSet> {
        Ok(self.reconcile(true)?)
    }

    fn reconcile(&self, may_remove: bool) -> StoreResult<ConfigurationSet> {
        let names = self
            .state
            .context
            .store
            .list_profile_names(&self.state.root)?;
        let discovered: ConfigurationSet = names.into_iter().map(Configuration::profile).collect();

        let snapshot = {
            let mut configs = self.state.configs.write();
            configs.extend(discovered.iter().cloned());
            if may_remove {
                let removed = configs.retain_only(&discovered);
                if !removed.is_empty() {
                    debug!(root = %self.state.root, removed = removed.len(), "Pruned configurations");
                }
            }
            configs.clone()
        };

        let active = self.state.active.load_full();
        if !snapshot.contains(&active) {
            self.set_active_configuration(Configuration::DEFAULT);
        }

        self.fire_configurations_changed();
        Ok(snapshot)
    }

    fn ensure_discovery(&self) {
        let claimed = self
            .state
            .discovery
            .compare_exchange(
                DiscoveryState::Unused as u8,
                DiscoveryState::Scheduled as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if !claimed {
            return;
        }

        debug!(root = %self.state.root, "Scheduling profile discovery");
        let weak = self.downgrade();
        self.state.context.runner.schedule(Box::new(move || {
            // Nobody is left to observe the result.
            let Some(provider) = weak.upgrade() else {
                return;
            };
            provider.find_and_update_configurations(false);
            provider
                .state
                .discovery
                .store(DiscoveryState::Populated as u8, Ordering::Release);
        }));
    }

    fn fire_configurations_changed(&self) {
        let listeners = Arc::clone(&self.state.change_listeners);
        self.state.context.dispatcher.deliver(move || {
            for listener in listeners.snapshot() {
                listener(&ConfigurationEvent::ConfigurationsChanged);
            }
        });
    }

    /// Register a listener for every configuration event.
    ///
    /// Capture a [`WeakConfigurationProvider`] rather than the provider
    /// itself if the listener needs to read it back.
    pub fn add_change_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ConfigurationEvent) + Send + Sync + 'static,
    {
        self.state.change_listeners.add(Arc::new(listener))
    }

    pub fn remove_change_listener(&self, id: ListenerId) -> bool {
        self.state.change_listeners.remove(id)
    }

    /// Register a payload-less listener for active configuration changes.
    ///
    /// # Example
    ///
    /// ```rust
    /// use config_registry::{
    ///     Configuration, ConfigurationProvider, Dispatcher, MemoryProfileStore, ProjectRoot,
    ///     ProviderContext, ThreadTaskRunner,
    /// };
    /// use std::sync::Arc;
    ///
    /// let provider = ConfigurationProvider::new(
    ///     ProjectRoot::new("/tmp/app").unwrap(),
    ///     ProviderContext::new(
    ///         Arc::new(MemoryProfileStore::new()),
    ///         Arc::new(ThreadTaskRunner::default()),
    ///         Dispatcher::inline(),
    ///     ),
    /// );
    ///
    /// let weak = provider.downgrade();
    /// provider.add_active_listener(move || {
    ///     if let Some(provider) = weak.upgrade() {
    ///         println!("now active: {}", provider.active_configuration());
    ///     }
    /// });
    /// provider.set_active_configuration(Configuration::DEFAULT);
    /// ```
    pub fn add_active_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.state.active_listeners.add(Arc::new(listener))
    }

    pub fn remove_active_listener(&self, id: ListenerId) -> bool {
        self.state.active_listeners.remove(id)
    }

    /// Subscribe to configuration events as an async stream.
    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription::register(
            &self.state.change_listeners,
            self.state.context.event_buffer,
        )
    }
}

/// Non-owning handle to a [`ConfigurationProvider`].
#[derive(Debug, Clone, Default)]
pub struct WeakConfigurationProvider {
    state: Weak<ProviderState>,
}

impl WeakConfigurationProvider {
    /// The provider, if some [`ConfigurationProvider`] handle still exists.
    pub fn upgrade(&self) -> Option<ConfigurationProvider> {
        self.state.upgrade().map(|state| ConfigurationProvider { state })
    }

    pub fn is_alive(&self) -> bool {
        self.state.strong_count() > 0
    }
}
