use std::fs;
use std::path::Path;

use crate::config::PluginMap;
use crate::error::ProvisioningError;

/// Copy each plugin's artifact set from the shared source directory into
/// `<dest_root>/<name>`. Destination directories are created but never
/// reset, and existing artifacts are overwritten; artifacts no longer
/// listed are left in place (additive-only). A missing source artifact
/// aborts the whole cycle rather than leaving a partial plugin set.
pub fn provision_plugins(
    plugins: &PluginMap,
    source_dir: &Path,
    dest_root: &Path,
) -> Result<(), ProvisioningError> {
    for (name, artifacts) in plugins {
        let dest_dir = dest_root.join(name);
        fs::create_dir_all(&dest_dir).map_err(|source| ProvisioningError::CreateDir {
            path: dest_dir.clone(),
            source,
        })?;

        for artifact in artifacts {
            let src = source_dir.join(artifact);
            if !src.is_file() {
                return Err(ProvisioningError::MissingArtifact {
                    artifact: artifact.clone(),
                    source_dir: source_dir.to_path_buf(),
                });
            }

            let dest = dest_dir.join(artifact);
            fs::copy(&src, &dest).map_err(|source| ProvisioningError::CopyArtifact {
                artifact: artifact.clone(),
                dest: dest.clone(),
                source,
            })?;
            tracing::debug!(plugin = %name, artifact = %artifact, "Copied plugin artifact");
        }
    }
    Ok(())
}
