//! Configuration values and insertion-ordered configuration sets.

use std::fmt;
use std::sync::Arc;

/// A build/run configuration, identified by an optional profile name.
///
/// The configuration without a profile name is the default configuration,
/// [`Configuration::DEFAULT`]. Two configurations are equal when their profile
/// names are equal, so the default configuration compares equal across every
/// provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Configuration {
    profile: Option<Arc<str>>,
}

impl Configuration {
    /// The default configuration.
    pub const DEFAULT: Configuration = Configuration { profile: None };

    /// Create the configuration backed by the named profile.
    pub fn profile(name: impl Into<Arc<str>>) -> Self {
        Self {
            profile: Some(name.into()),
        }
    }

    /// Returns the profile name, or `None` for the default configuration.
    pub fn profile_name(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    pub fn is_default(&self) -> bool {
        self.profile.is_none()
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.profile_name() {
            Some(name) => f.write_str(name),
            None => f.write_str("default"),
        }
    }
}

/// Unique, insertion-ordered collection of configurations.
///
/// A set always contains [`Configuration::DEFAULT`]; [`remove`](Self::remove)
/// refuses to take it out. Values handed out by a provider are snapshots and
/// are not affected by later changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationSet {
    ordered: Vec<Configuration>,
}

impl ConfigurationSet {
    /// Create a set holding only the default configuration.
    pub fn new() -> Self {
        Self {
            ordered: vec![Configuration::DEFAULT],
        }
    }

    /// Insert a configuration. Returns `false` if it was already present.
    pub fn insert(&mut self, config: Configuration) -> bool {
        if self.contains(&config) {
            return false;
        }
        self.ordered.push(config);
        true
    }

    /// Remove a configuration. The default configuration is never removed.
    pub fn remove(&mut self, config: &Configuration) -> bool {
        if config.is_default() {
            return false;
        }
        let before = self.ordered.len();
        self.ordered.retain(|c| c != config);
        self.ordered.len() != before
    }

    /// Keep only the configurations present in `keep` (and the default).
    ///
    /// Returns the removed configurations in set order.
    pub fn retain_only(&mut self, keep: &ConfigurationSet) -> Vec<Configuration> {
        let mut removed = Vec::new();
        self.ordered.retain(|c| {
            let retained = c.is_default() || keep.contains(c);
            if !retained {
                removed.push(c.clone());
            }
            retained
        });
        removed
    }

    pub fn contains(&self, config: &Configuration) -> bool {
        self.ordered.iter().any(|c| c == config)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Always `false` for sets built by this crate, which keep the default.
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Configuration> {
        self.ordered.iter()
    }

    /// Profile names in insertion order, skipping the default configuration.
    pub fn profile_names(&self) -> Vec<&str> {
        self.ordered.iter().filter_map(|c| c.profile_name()).collect()
    }
}

impl Default for ConfigurationSet {
    fn default() -> Self {
        Self::new()
    }
}

impl Extend<Configuration> for ConfigurationSet {
    fn extend<I: IntoIterator<Item = Configuration>>(&mut self, iter: I) {
        for config in iter {
            self.insert(config);
        }
    }
}

impl FromIterator<Configuration> for ConfigurationSet {
    fn from_iter<I: IntoIterator<Item = Configuration>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<'a> IntoIterator for &'a ConfigurationSet {
    type Item = &'a Configuration;
    type IntoIter = std::slice::Iter<'a, Configuration>;

    fn into_iter(self) -> Self::IntoIter {
        self.ordered.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration() {
        assert!(Configuration::DEFAULT.is_default());
        assert_eq!(Configuration::default(), Configuration::DEFAULT);
        assert_eq!(Configuration::DEFAULT.profile_name(), None);
        assert_eq!(Configuration::DEFAULT.to_string(), "default");
    }

    #[test]
    fn test_profile_equality_by_name() {
        let a = Configuration::profile("debug");
        let b = Configuration::profile(String::from("debug"));
        assert_eq!(a, b);
        assert_ne!(a, Configuration::profile("release"));
        assert_ne!(a, Configuration::DEFAULT);
        assert_eq!(a.to_string(), "debug");
    }

    #[test]
    fn test_set_starts_with_default() {
        let set = ConfigurationSet::new();
        assert_eq!(set.len(), 1);
        assert!(set.contains(&Configuration::DEFAULT));
    }

    #[test]
    fn test_set_insert_is_unique_and_ordered() {
        let mut set = ConfigurationSet::new();
        assert!(set.insert(Configuration::profile("b")));
        assert!(set.insert(Configuration::profile("a")));
        assert!(!set.insert(Configuration::profile("b")));
        assert!(!set.insert(Configuration::DEFAULT));

        assert_eq!(set.profile_names(), vec!["b", "a"]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_set_never_removes_default() {
        let mut set = ConfigurationSet::new();
        assert!(!set.remove(&Configuration::DEFAULT));
        assert_eq!(set.len(), 1);

        let keep = ConfigurationSet::new();
        set.insert(Configuration::profile("x"));
        let removed = set.retain_only(&keep);
        assert_eq!(removed, vec![Configuration::profile("x")]);
        assert!(set.contains(&Configuration::DEFAULT));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_set_from_iter_contains_default() {
        let set: ConfigurationSet = ["a", "b"].into_iter().map(Configuration::profile).collect();
        assert_eq!(set.len(), 3);
        assert_eq!(set.iter().next(), Some(&Configuration::DEFAULT));
    }
}
