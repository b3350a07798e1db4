//! Change events published by a configuration provider.

use crate::configuration::Configuration;

/// Kind tag of a [`ConfigurationEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The configuration set changed
    ConfigurationsChanged,
    /// The active configuration changed
    ActiveConfigurationChanged,
}

/// An event delivered to generic change listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationEvent {
    /// Coarse invalidation: re-read the configuration set.
    ConfigurationsChanged,
    /// The active configuration moved from `old` to `new`.
    ActiveChanged {
        old: Configuration,
        new: Configuration,
    },
}

impl ConfigurationEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ConfigurationEvent::ConfigurationsChanged => EventKind::ConfigurationsChanged,
            ConfigurationEvent::ActiveChanged { .. } => EventKind::ActiveConfigurationChanged,
        }
    }
}
