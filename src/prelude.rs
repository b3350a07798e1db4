//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust
//! use config_registry::prelude::*;
//! ```

// Registry
pub use crate::cache::{config_provider, ProviderCache};
pub use crate::provider::{
    ConfigurationProvider, DiscoveryState, ProviderContext, WeakConfigurationProvider,
};

// Values and events
pub use crate::configuration::{Configuration, ConfigurationSet};
pub use crate::event::{ConfigurationEvent, EventKind};
pub use crate::root::ProjectRoot;

// Collaborators
pub use crate::dispatch::Dispatcher;
pub use crate::runner::{TaskRunner, ThreadTaskRunner, TokioTaskRunner};
pub use crate::store::{DirectoryProfileStore, MemoryProfileStore, ProfileStore};

// Configuration
pub use crate::config::RegistryConfig;

// Errors
pub use crate::error::{ConfigError, RegistryError, RegistryResult, StoreError, StoreResult};
