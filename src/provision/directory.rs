use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ProvisioningError;
use crate::ownership::Ownership;

/// A directory the node expects to exist, with the ownership to enforce
/// on it.
#[derive(Debug, Clone)]
pub struct DirectorySpec {
    pub path: PathBuf,
    pub owner: String,
    pub group: String,
    pub recursive: bool,
}

impl DirectorySpec {
    pub fn new(path: PathBuf, owner: &str, group: &str) -> Self {
        DirectorySpec {
            path,
            owner: owner.to_string(),
            group: group.to_string(),
            recursive: true,
        }
    }
}

/// Creates directories and enforces their ownership. `ensure` is
/// idempotent; ownership is re-applied on every call so a drifted tree
/// converges back to the spec.
pub struct DirectoryProvisioner<'a> {
    ownership: &'a dyn Ownership,
}

impl<'a> DirectoryProvisioner<'a> {
    pub fn new(ownership: &'a dyn Ownership) -> Self {
        DirectoryProvisioner { ownership }
    }

    pub fn ensure(&self, spec: &DirectorySpec) -> Result<(), ProvisioningError> {
        if spec.path.exists() {
            if !spec.path.is_dir() {
                return Err(ProvisioningError::NotADirectory {
                    path: spec.path.clone(),
                });
            }
        } else {
            let created = if spec.recursive {
                fs::create_dir_all(&spec.path)
            } else {
                fs::create_dir(&spec.path)
            };
            created.map_err(|source| ProvisioningError::CreateDir {
                path: spec.path.clone(),
                source,
            })?;
            tracing::debug!(path = %spec.path.display(), "Created directory");
        }

        self.ownership.apply(&spec.path, &spec.owner, &spec.group)
    }

    /// Remove whatever sits at `path` (directory tree or stray regular
    /// file). Absent path is success. Called once per configure cycle on
    /// the top-level configuration directory only.
    pub fn reset(&self, path: &Path) -> Result<(), ProvisioningError> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(ProvisioningError::Remove {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let removed = if metadata.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        removed.map_err(|source| ProvisioningError::Remove {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(path = %path.display(), "Reset configuration directory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ownership::SkipOwnership;

    fn provisioner() -> DirectoryProvisioner<'static> {
        DirectoryProvisioner::new(&SkipOwnership)
    }

    #[test]
    fn ensure_creates_missing_ancestors() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("etc").join("catalog");

        provisioner()
            .ensure(&DirectorySpec::new(target.clone(), "presto", "hadoop"))
            .unwrap();

        assert!(target.is_dir());
    }

    #[test]
    fn ensure_twice_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let spec = DirectorySpec::new(dir.path().join("etc"), "presto", "hadoop");

        provisioner().ensure(&spec).unwrap();
        provisioner().ensure(&spec).unwrap();

        assert!(spec.path.is_dir());
    }

    #[test]
    fn ensure_refuses_a_file_in_the_way() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("etc");
        std::fs::write(&target, "stray").unwrap();

        let err = provisioner()
            .ensure(&DirectorySpec::new(target, "presto", "hadoop"))
            .unwrap_err();

        assert!(matches!(err, ProvisioningError::NotADirectory { .. }));
    }

    #[test]
    fn reset_removes_populated_tree() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("etc");
        std::fs::create_dir_all(target.join("catalog")).unwrap();
        std::fs::write(target.join("config.properties"), "old").unwrap();

        provisioner().reset(&target).unwrap();

        assert!(!target.exists());
    }

    #[test]
    fn reset_removes_stray_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("etc");
        std::fs::write(&target, "not a directory").unwrap();

        provisioner().reset(&target).unwrap();

        assert!(!target.exists());
    }

    #[test]
    fn reset_of_absent_path_is_success() {
        let dir = tempfile::tempdir().unwrap();
        provisioner().reset(&dir.path().join("missing")).unwrap();
    }
}
