//! Registry configuration.
//!
//! [`RegistryConfig`] carries the knobs of the bundled collaborators: where the
//! directory profile store looks for profiles, how background and notification
//! threads are named, and how many events a subscription buffers.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Default profile directory, relative to the project root.
pub const DEFAULT_PROFILE_DIR: &str = ".config-registry/profiles";

/// Default profile artifact extension.
pub const DEFAULT_PROFILE_EXTENSION: &str = "toml";

/// Default name of the notification thread.
pub const DEFAULT_NOTIFIER_THREAD: &str = "config-registry-notify";

/// Default name of background discovery/deletion threads.
pub const DEFAULT_WORKER_THREAD: &str = "config-registry-worker";

/// Default number of events buffered per subscription.
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Configuration for the registry and its bundled collaborators.
///
/// # Example
///
/// ```rust
/// use config_registry::RegistryConfig;
///
/// let config = RegistryConfig::new()
///     .with_profile_dir("build/profiles")
///     .with_profile_extension("properties")
///     .with_event_buffer(16);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.profile_extension(), "properties");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    profile_dir: PathBuf,
    profile_extension: String,
    notifier_thread: String,
    worker_thread: String,
    event_buffer: usize,
}

impl RegistryConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the profile directory, relative to each project root.
    pub fn with_profile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profile_dir = dir.into();
        self
    }

    /// Set the profile artifact extension (without the leading dot).
    pub fn with_profile_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.profile_extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Set the notification thread name.
    pub fn with_notifier_thread(mut self, name: impl Into<String>) -> Self {
        self.notifier_thread = name.into();
        self
    }

    /// Set the background worker thread name.
    pub fn with_worker_thread(mut self, name: impl Into<String>) -> Self {
        self.worker_thread = name.into();
        self
    }

    /// Set the per-subscription event buffer.
    pub fn with_event_buffer(mut self, size: usize) -> Self {
        self.event_buffer = size;
        self
    }

    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    pub fn profile_extension(&self) -> &str {
        &self.profile_extension
    }

    pub fn notifier_thread(&self) -> &str {
        &self.notifier_thread
    }

    pub fn worker_thread(&self) -> &str {
        &self.worker_thread
    }

    pub fn event_buffer(&self) -> usize {
        self.event_buffer
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.profile_dir.as_os_str().is_empty() {
            return Err(ConfigError::Empty("profile directory"));
        }
        if self.profile_dir.is_absolute() {
            return Err(ConfigError::AbsoluteProfileDir(
                self.profile_dir.display().to_string(),
            ));
        }
        if self.profile_extension.is_empty() {
            return Err(ConfigError::Empty("profile extension"));
        }
        if self.notifier_thread.is_empty() {
            return Err(ConfigError::Empty("notifier thread name"));
        }
        if self.worker_thread.is_empty() {
            return Err(ConfigError::Empty("worker thread name"));
        }
        if self.event_buffer == 0 {
            return Err(ConfigError::ZeroEventBuffer);
        }
        Ok(())
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            profile_dir: PathBuf::from(DEFAULT_PROFILE_DIR),
            profile_extension: DEFAULT_PROFILE_EXTENSION.to_string(),
            notifier_thread: DEFAULT_NOTIFIER_THREAD.to_string(),
            worker_thread: DEFAULT_WORKER_THREAD.to_string(),
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}
