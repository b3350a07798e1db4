//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use config_registry::{
    ConfigurationEvent, ConfigurationProvider, Dispatcher, MemoryProfileStore, ProviderCache,
    ProviderContext, Task, TaskRunner,
};
use parking_lot::Mutex;

/// Runner that queues tasks until the test runs them.
#[derive(Default)]
pub struct ManualRunner {
    tasks: Mutex<Vec<Task>>,
}

impl ManualRunner {
    pub fn pending(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Run every queued task on the calling thread.
    pub fn run_all(&self) -> usize {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }
}

impl std::fmt::Debug for ManualRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualRunner")
            .field("pending", &self.pending())
            .finish()
    }
}

impl TaskRunner for ManualRunner {
    fn schedule(&self, task: Task) {
        self.tasks.lock().push(task);
    }
}

pub struct Fixture {
    pub cache: ProviderCache,
    pub store: Arc<MemoryProfileStore>,
    pub runner: Arc<ManualRunner>,
    pub dispatcher: Dispatcher,
}

impl Fixture {
    /// Cache backed by an in-memory store, a manual runner and a dedicated
    /// notification thread.
    pub fn new(profiles: &[&str]) -> Self {
        let store = Arc::new(MemoryProfileStore::with_profiles(profiles.iter().copied()));
        let runner = Arc::new(ManualRunner::default());
        let dispatcher = Dispatcher::spawn("test-notify").unwrap();
        let cache = ProviderCache::new(ProviderContext::new(
            store.clone(),
            runner.clone(),
            dispatcher.clone(),
        ));
        Self {
            cache,
            store,
            runner,
            dispatcher,
        }
    }

    pub fn provider(&self, root: &str) -> ConfigurationProvider {
        self.cache.get(root).unwrap()
    }
}

/// Records every generic event delivered to a provider.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<ConfigurationEvent>>>,
}

impl EventLog {
    pub fn attach(provider: &ConfigurationProvider) -> Self {
        let log = Self::default();
        let events = Arc::clone(&log.events);
        provider.add_change_listener(move |event| events.lock().push(event.clone()));
        log
    }

    pub fn events(&self) -> Vec<ConfigurationEvent> {
        self.events.lock().clone()
    }
}
