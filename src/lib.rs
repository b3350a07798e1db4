//! # Config Registry
//!
//! Per-project registry of named build/run configurations ("profiles").
//!
//! ## Overview
//!
//! Each project root gets exactly one [`ConfigurationProvider`], handed out by
//! the weak-referenced [`ProviderCache`]. A provider:
//! - owns the insertion-ordered [`ConfigurationSet`], which always contains
//!   the default configuration
//! - tracks the active configuration, swapped atomically
//! - discovers profiles lazily, once, in the background, through a
//!   [`ProfileStore`] and a [`TaskRunner`]
//! - notifies observers on a single notification thread via the [`Dispatcher`]
//!
//! ## Components
//!
//! ```text
//! ProviderCache  - root -> provider, weak values, one lock
//! Provider       - configuration set, active cell, listeners
//! Dispatcher     - thread-affine callback delivery
//! ProfileStore   - profile discovery and artifact deletion (pluggable)
//! TaskRunner     - background execution (pluggable)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use config_registry::prelude::*;
//!
//! let provider = config_provider("/path/to/project")?;
//! provider.add_change_listener(|event| println!("{:?}", event.kind()));
//!
//! // Returns immediately; discovered profiles arrive with a change event.
//! for config in &provider.configurations() {
//!     println!("{config}");
//! }
//! provider.set_active_configuration(Configuration::profile("release"));
//! # Ok::<(), RegistryError>(())
//! ```

mod cache;
mod config;
mod configuration;
mod dispatch;
mod error;
mod event;
mod listeners;
mod provider;
mod root;
mod runner;
mod store;
pub mod stream;

pub mod prelude;

pub use cache::{config_provider, ProviderCache};
pub use config::{
    RegistryConfig, DEFAULT_EVENT_BUFFER, DEFAULT_NOTIFIER_THREAD, DEFAULT_PROFILE_DIR,
    DEFAULT_PROFILE_EXTENSION, DEFAULT_WORKER_THREAD,
};
pub use configuration::{Configuration, ConfigurationSet};
pub use dispatch::{Callback, Dispatcher, NotificationSink};
pub use error::{ConfigError, RegistryError, RegistryResult, StoreError, StoreResult};
pub use event::{ConfigurationEvent, EventKind};
pub use listeners::{ListenerId, ListenerRegistry};
pub use provider::{
    ActiveListener, ChangeListener, ConfigurationProvider, DiscoveryState, ProviderContext,
    WeakConfigurationProvider,
};
pub use root::ProjectRoot;
pub use runner::{Task, TaskRunner, ThreadTaskRunner, TokioTaskRunner};
pub use store::{DirectoryProfileStore, MemoryProfileStore, ProfileStore};
pub use stream::{EventStream, EventSubscription};
