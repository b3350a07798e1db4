//! Project root identity.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::error::{RegistryError, RegistryResult};

/// Canonical identity of a project root directory.
///
/// Two roots are equal when their canonical paths are equal. The longest
/// existing prefix of the path is resolved through the file system (symlinks,
/// `..`) and the missing remainder is appended lexically, so a root keyed
/// before its directory is created matches the same root keyed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectRoot {
    path: Arc<Path>,
}

impl ProjectRoot {
    /// Resolve `path` to its canonical identity.
    ///
    /// Fails with [`RegistryError::InvalidRoot`] for an empty path.
    pub fn new(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(RegistryError::InvalidRoot("empty path".to_string()));
        }

        let absolute = std::path::absolute(path)
            .map_err(|err| RegistryError::InvalidRoot(format!("{}: {err}", path.display())))?;

        Ok(Self {
            path: Arc::from(resolve_existing_prefix(&absolute)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Join a relative path onto the root.
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.path.join(relative)
    }
}

/// Canonicalize the longest ancestor of `absolute` that exists and append the
/// rest, folding `.` and `..` in the appended part.
fn resolve_existing_prefix(absolute: &Path) -> PathBuf {
    for ancestor in absolute.ancestors() {
        let Ok(mut resolved) = std::fs::canonicalize(ancestor) else {
            continue;
        };
        let Ok(rest) = absolute.strip_prefix(ancestor) else {
            continue;
        };
        for component in rest.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    resolved.pop();
                }
                other => resolved.push(other),
            }
        }
        return resolved;
    }
    absolute.to_path_buf()
}

impl AsRef<Path> for ProjectRoot {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for ProjectRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.path.display().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_root_is_rejected() {
        let err = ProjectRoot::new("").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidRoot(_)));
    }

    #[test]
    fn test_existing_root_is_canonicalized() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("sub");
        std::fs::create_dir(&nested).unwrap();

        let direct = ProjectRoot::new(&nested).unwrap();
        let dotted = ProjectRoot::new(nested.join("..").join("sub")).unwrap();
        assert_eq!(direct, dotted);
        assert!(direct.path().is_absolute());
    }

    #[test]
    fn test_missing_root_is_made_absolute() {
        let root = ProjectRoot::new("does-not-exist/project").unwrap();
        assert!(root.path().is_absolute());
        assert!(root.path().ends_with("does-not-exist/project"));
    }

    #[test]
    fn test_missing_tail_is_folded() {
        let dir = tempfile::tempdir().unwrap();
        let plain = ProjectRoot::new(dir.path().join("later")).unwrap();
        let dotted = ProjectRoot::new(dir.path().join("gone").join("..").join("later")).unwrap();
        assert_eq!(plain, dotted);
    }

    #[cfg(unix)]
    #[test]
    fn test_root_through_symlink_is_stable_across_creation() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        std::fs::create_dir(&real).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let before = ProjectRoot::new(link.join("project")).unwrap();
        std::fs::create_dir(real.join("project")).unwrap();
        let after = ProjectRoot::new(link.join("project")).unwrap();

        assert_eq!(before, after);
        assert_eq!(after, ProjectRoot::new(real.join("project")).unwrap());
    }
}
