use std::fs;

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::info;

use crate::config::ConfigurationSet;
use crate::error::{NodeError, Result};
use crate::layout::NodeLayout;

/// Interface to the packaging collaborator that places the server
/// distribution under the node root. The host agent may bind its own
/// implementation; `TarballInstaller` ships as the default.
pub trait PackageInstaller: Send + Sync {
    fn install(&self, config: &ConfigurationSet, layout: &NodeLayout) -> Result<()>;
}

/// Unpacks a local `.tar.gz` server distribution (the `package_path`
/// key) into the node root. No downloads, no version resolution; the
/// archive is expected to carry `bin/launcher` at its top level.
pub struct TarballInstaller;

impl PackageInstaller for TarballInstaller {
    fn install(&self, config: &ConfigurationSet, layout: &NodeLayout) -> Result<()> {
        let package = config.package_path.as_ref().ok_or_else(|| NodeError::Install {
            reason: "no package_path configured".to_string(),
        })?;

        let file = fs::File::open(package).map_err(|e| NodeError::Install {
            reason: format!("failed to open {}: {e}", package.display()),
        })?;

        fs::create_dir_all(&layout.node_root).map_err(|e| NodeError::Install {
            reason: format!("failed to create {}: {e}", layout.node_root.display()),
        })?;

        let mut archive = Archive::new(GzDecoder::new(file));
        archive.unpack(&layout.node_root).map_err(|e| NodeError::Install {
            reason: format!("failed to unpack {}: {e}", package.display()),
        })?;

        info!(
            package = %package.display(),
            root = %layout.node_root.display(),
            "Installed server distribution"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    fn make_package(dest: &std::path::Path) {
        let file = fs::File::create(dest).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));

        let script = b"#!/bin/sh\nexec echo launcher\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(script.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, "bin/launcher", script.as_ref())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }

    fn config_in(root: &std::path::Path, package: Option<&std::path::Path>) -> ConfigurationSet {
        let mut doc = serde_json::json!({
            "global": {
                "app_root": root.join("opt").to_str().unwrap(),
                "app_name": "presto-server",
                "app_user": "presto",
                "user_group": "hadoop",
                "data_dir": root.join("data").to_str().unwrap(),
                "java_home": "/usr",
                "coordinator_host": "master-1"
            }
        });
        if let Some(package) = package {
            doc["global"].as_object_mut().unwrap().insert(
                "package_path".into(),
                serde_json::Value::String(package.to_str().unwrap().into()),
            );
        }
        ConfigurationSet::from_document(&doc.to_string()).unwrap()
    }

    #[test]
    fn tarball_unpacks_into_node_root() {
        let root = tempfile::tempdir().unwrap();
        let package = root.path().join("presto-server-0.167.tar.gz");
        make_package(&package);

        let config = config_in(root.path(), Some(&package));
        let layout = NodeLayout::new(&config);
        TarballInstaller.install(&config, &layout).unwrap();

        assert!(layout.launcher().is_file());
    }

    #[test]
    fn missing_package_path_is_an_install_error() {
        let root = tempfile::tempdir().unwrap();
        let config = config_in(root.path(), None);
        let layout = NodeLayout::new(&config);

        let err = TarballInstaller.install(&config, &layout).unwrap_err();
        assert!(matches!(err, NodeError::Install { .. }));
    }
}
