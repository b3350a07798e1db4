//! Profile store: discovers profile names and deletes profile artifacts.
//!
//! The registry never reads or writes profile contents. A store only has to
//! enumerate the profiles available under a project root and map a profile
//! name to the artifact that backs it.

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::path::PathBuf;

use parking_lot::{Mutex, RwLock};

use crate::config::RegistryConfig;
use crate::error::{StoreError, StoreResult};
use crate::root::ProjectRoot;

/// Source of profile names for a project root.
///
/// # Example
///
/// ```rust
/// use config_registry::{MemoryProfileStore, ProfileStore, ProjectRoot};
///
/// let store = MemoryProfileStore::with_profiles(["debug", "release"]);
/// let root = ProjectRoot::new("/tmp/project").unwrap();
///
/// let names = store.list_profile_names(&root).unwrap();
/// assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["debug", "release"]);
/// ```
pub trait ProfileStore: Send + Sync + Debug {
    /// Names of the profiles currently available under `root`.
    fn list_profile_names(&self, root: &ProjectRoot) -> StoreResult<BTreeSet<String>>;

    /// Path of the artifact backing `profile` under `root`.
    fn locate_profile_artifact(&self, root: &ProjectRoot, profile: &str) -> StoreResult<PathBuf>;

    /// Delete the artifact backing `profile`, if it exists as a regular file.
    fn delete_profile_artifact(&self, root: &ProjectRoot, profile: &str) -> StoreResult<()> {
        let artifact = self.locate_profile_artifact(root, profile)?;
        if artifact.is_file() {
            std::fs::remove_file(&artifact)?;
        }
        Ok(())
    }
}

/// Profile store backed by one file per profile in a directory under the root.
///
/// A profile named `debug` lives at `<root>/<profile_dir>/debug.<extension>`.
#[derive(Debug, Clone)]
pub struct DirectoryProfileStore {
    profile_dir: PathBuf,
    extension: String,
}

impl DirectoryProfileStore {
    /// Create a store using the default layout.
    pub fn new() -> Self {
        Self::from_config(&RegistryConfig::default())
    }

    /// Create a store using the layout from `config`.
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self {
            profile_dir: config.profile_dir().to_path_buf(),
            extension: config.profile_extension().to_string(),
        }
    }

    fn validate_name(profile: &str) -> StoreResult<()> {
        let invalid = profile.is_empty()
            || profile == "."
            || profile == ".."
            || profile.contains(['/', '\\']);
        if invalid {
            return Err(StoreError::InvalidProfileName(profile.to_string()));
        }
        Ok(())
    }
}

impl Default for DirectoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileStore for DirectoryProfileStore {
    fn list_profile_names(&self, root: &ProjectRoot) -> StoreResult<BTreeSet<String>> {
        let dir = root.join(&self.profile_dir);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(err) => return Err(err.into()),
        };

        let mut names = BTreeSet::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.is_empty() {
                    names.insert(stem.to_string());
                }
            }
        }
        Ok(names)
    }

    fn locate_profile_artifact(&self, root: &ProjectRoot, profile: &str) -> StoreResult<PathBuf> {
        Self::validate_name(profile)?;
        Ok(root
            .join(&self.profile_dir)
            .join(format!("{profile}.{}", self.extension)))
    }
}

/// In-memory profile store.
///
/// Useful for embedding and tests: profiles are plain names, deletions are
/// recorded instead of touching the file system, and the store can be put
/// into a failing mode to exercise discovery errors.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    names: RwLock<BTreeSet<String>>,
    deleted: Mutex<Vec<String>>,
    failing: RwLock<Option<String>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with profile names.
    pub fn with_profiles<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        store.names.write().extend(names.into_iter().map(Into::into));
        store
    }

    pub fn insert_profile(&self, name: impl Into<String>) {
        self.names.write().insert(name.into());
    }

    pub fn remove_profile(&self, name: &str) -> bool {
        self.names.write().remove(name)
    }

    /// Profiles deleted through [`ProfileStore::delete_profile_artifact`], in order.
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }

    /// Make every listing fail with `reason` until cleared with `None`.
    pub fn set_failing(&self, reason: Option<&str>) {
        *self.failing.write() = reason.map(str::to_string);
    }
}

impl ProfileStore for MemoryProfileStore {
    fn list_profile_names(&self, _root: &ProjectRoot) -> StoreResult<BTreeSet<String>> {
        if let Some(reason) = self.failing.read().as_ref() {
            return Err(StoreError::Unavailable(reason.clone()));
        }
        Ok(self.names.read().clone())
    }

    fn locate_profile_artifact(&self, root: &ProjectRoot, profile: &str) -> StoreResult<PathBuf> {
        Ok(root.join(profile))
    }

    fn delete_profile_artifact(&self, _root: &ProjectRoot, profile: &str) -> StoreResult<()> {
        self.names.write().remove(profile);
        self.deleted.lock().push(profile.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_profile(root: &std::path::Path, file: &str) {
        let dir = root.join(crate::config::DEFAULT_PROFILE_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(file), "").unwrap();
    }

    #[test]
    fn test_directory_store_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let root = ProjectRoot::new(dir.path()).unwrap();
        let store = DirectoryProfileStore::new();
        assert!(store.list_profile_names(&root).unwrap().is_empty());
    }

    #[test]
    fn test_directory_store_lists_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        write_profile(dir.path(), "release.toml");
        write_profile(dir.path(), "debug.toml");
        write_profile(dir.path(), "notes.txt");
        std::fs::create_dir_all(dir.path().join(crate::config::DEFAULT_PROFILE_DIR).join("nested.toml"))
            .unwrap();

        let root = ProjectRoot::new(dir.path()).unwrap();
        let names = DirectoryProfileStore::new().list_profile_names(&root).unwrap();
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["debug", "release"]);
    }

    #[test]
    fn test_directory_store_delete() {
        let dir = tempfile::tempdir().unwrap();
        write_profile(dir.path(), "debug.toml");
        let root = ProjectRoot::new(dir.path()).unwrap();
        let store = DirectoryProfileStore::new();

        let artifact = store.locate_profile_artifact(&root, "debug").unwrap();
        assert!(artifact.is_file());
        store.delete_profile_artifact(&root, "debug").unwrap();
        assert!(!artifact.exists());

        // Missing artifacts are not an error.
        store.delete_profile_artifact(&root, "debug").unwrap();
    }

    #[test]
    fn test_directory_store_rejects_traversal() {
        let root = ProjectRoot::new("/tmp/project").unwrap();
        let store = DirectoryProfileStore::new();
        for name in ["", "..", "../etc/passwd", "a\\b"] {
            assert!(matches!(
                store.locate_profile_artifact(&root, name),
                Err(StoreError::InvalidProfileName(_))
            ));
        }
    }

    #[test]
    fn test_directory_store_custom_layout() {
        let dir = tempfile::tempdir().unwrap();
        let profiles = dir.path().join("profiles");
        std::fs::create_dir_all(&profiles).unwrap();
        std::fs::write(profiles.join("ci.properties"), "").unwrap();

        let config = RegistryConfig::new()
            .with_profile_dir("profiles")
            .with_profile_extension("properties");
        let store = DirectoryProfileStore::from_config(&config);
        let root = ProjectRoot::new(dir.path()).unwrap();
        assert!(store.list_profile_names(&root).unwrap().contains("ci"));
    }

    #[test]
    fn test_memory_store_failing_mode() {
        let store = MemoryProfileStore::with_profiles(["a"]);
        let root = ProjectRoot::new("/tmp/project").unwrap();

        store.set_failing(Some("offline"));
        assert!(matches!(
            store.list_profile_names(&root),
            Err(StoreError::Unavailable(_))
        ));

        store.set_failing(None);
        assert_eq!(store.list_profile_names(&root).unwrap().len(), 1);
    }

    #[test]
    fn test_memory_store_records_deletions() {
        let store = MemoryProfileStore::with_profiles(["a", "b"]);
        let root = ProjectRoot::new("/tmp/project").unwrap();
        store.delete_profile_artifact(&root, "a").unwrap();
        assert_eq!(store.deleted(), vec!["a"]);
        assert!(!store.list_profile_names(&root).unwrap().contains("a"));
    }
}
