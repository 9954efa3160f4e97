use std::path::Path;
use std::process::Command;

use crate::error::ProvisioningError;

/// Seam for OS-level user/group enforcement. The materializer invokes
/// this after every directory or file it produces; it never reimplements
/// permission logic itself.
pub trait Ownership: Send + Sync {
    fn apply(&self, path: &Path, user: &str, group: &str) -> Result<(), ProvisioningError>;
}

/// Applies ownership with chown(1). Requires the agent to run with
/// sufficient privilege (the host agent runs lifecycle verbs as root).
pub struct SystemOwnership;

impl Ownership for SystemOwnership {
    fn apply(&self, path: &Path, user: &str, group: &str) -> Result<(), ProvisioningError> {
        let owner = format!("{user}:{group}");
        let status = Command::new("chown")
            .arg(&owner)
            .arg(path)
            .status()
            .map_err(|e| ProvisioningError::Chown {
                path: path.to_path_buf(),
                owner: owner.clone(),
                detail: e.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ProvisioningError::Chown {
                path: path.to_path_buf(),
                owner,
                detail: format!("chown exited with {status}"),
            })
        }
    }
}

/// Leaves ownership as-is. Used when the agent already runs as the
/// service user and chown to a foreign owner would be refused anyway.
pub struct SkipOwnership;

impl Ownership for SkipOwnership {
    fn apply(&self, path: &Path, user: &str, group: &str) -> Result<(), ProvisioningError> {
        tracing::debug!(
            path = %path.display(),
            owner = %format!("{user}:{group}"),
            "Skipping ownership change (not running as root)"
        );
        Ok(())
    }
}

/// Pick the enforcement mode for the current process.
pub fn for_current_user() -> Box<dyn Ownership> {
    if is_root() {
        Box::new(SystemOwnership)
    } else {
        Box::new(SkipOwnership)
    }
}

#[cfg(unix)]
fn is_root() -> bool {
    // Safety: geteuid has no failure mode.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_ownership_always_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        SkipOwnership
            .apply(dir.path(), "presto", "hadoop")
            .unwrap();
    }

    #[test]
    fn system_ownership_reports_chown_refusal() {
        if is_root() {
            return; // chown would actually succeed under root
        }
        let dir = tempfile::tempdir().unwrap();
        let err = SystemOwnership
            .apply(dir.path(), "no-such-user-xyz", "no-such-group-xyz")
            .unwrap_err();
        assert!(matches!(err, ProvisioningError::Chown { .. }));
    }
}
