use std::path::{Path, PathBuf};

use crate::config::ConfigurationSet;

const PID_FILE: &str = "launcher.pid";
const LOG_FILE: &str = "server.log";

/// Every path the node reads or the agent writes, resolved once from the
/// application root / name pair and the data directory. All generated
/// files live under `node_root`; only the pid and log files live under
/// the data directory.
#[derive(Debug, Clone)]
pub struct NodeLayout {
    pub node_root: PathBuf,
    pub etc_dir: PathBuf,
    pub catalog_dir: PathBuf,
    pub plugin_dir: PathBuf,
    pub pid_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl NodeLayout {
    pub fn new(config: &ConfigurationSet) -> Self {
        let node_root = config.app_root.join(&config.app_name);
        let etc_dir = node_root.join("etc");
        NodeLayout {
            catalog_dir: etc_dir.join("catalog"),
            plugin_dir: node_root.join("plugin"),
            pid_dir: config.data_dir.join("var").join("run"),
            log_dir: config.data_dir.join("var").join("log"),
            node_root,
            etc_dir,
        }
    }

    pub fn config_properties(&self) -> PathBuf {
        self.etc_dir.join("config.properties")
    }

    pub fn jvm_config(&self) -> PathBuf {
        self.etc_dir.join("jvm.config")
    }

    pub fn node_properties(&self) -> PathBuf {
        self.etc_dir.join("node.properties")
    }

    pub fn log_properties(&self) -> PathBuf {
        self.etc_dir.join("log.properties")
    }

    pub fn queue_config(&self) -> PathBuf {
        self.etc_dir.join("queues.json")
    }

    pub fn readme(&self) -> PathBuf {
        self.etc_dir.join("README.txt")
    }

    pub fn catalog_properties(&self, name: &str) -> PathBuf {
        self.catalog_dir.join(format!("{name}.properties"))
    }

    pub fn pid_file(&self) -> PathBuf {
        self.pid_dir.join(PID_FILE)
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE)
    }

    /// The run command of the installed server distribution.
    pub fn launcher(&self) -> PathBuf {
        self.node_root.join("bin").join("launcher")
    }

    /// True when `path` sits underneath the resolved node root.
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.node_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigurationSet;

    fn layout() -> NodeLayout {
        let doc = serde_json::json!({
            "global": {
                "app_root": "/opt/presto",
                "app_name": "presto-server",
                "app_user": "presto",
                "user_group": "hadoop",
                "data_dir": "/var/lib/presto/data",
                "java_home": "/usr/lib/jvm/java8",
                "coordinator_host": "master-1"
            }
        });
        NodeLayout::new(&ConfigurationSet::from_document(&doc.to_string()).unwrap())
    }

    #[test]
    fn paths_derive_from_root_and_data_dir() {
        let layout = layout();

        assert_eq!(layout.node_root, Path::new("/opt/presto/presto-server"));
        assert_eq!(
            layout.config_properties(),
            Path::new("/opt/presto/presto-server/etc/config.properties")
        );
        assert_eq!(
            layout.catalog_properties("hive"),
            Path::new("/opt/presto/presto-server/etc/catalog/hive.properties")
        );
        assert_eq!(
            layout.pid_file(),
            Path::new("/var/lib/presto/data/var/run/launcher.pid")
        );
        assert_eq!(
            layout.log_file(),
            Path::new("/var/lib/presto/data/var/log/server.log")
        );
    }

    #[test]
    fn generated_files_stay_under_node_root() {
        let layout = layout();

        for path in [
            layout.config_properties(),
            layout.jvm_config(),
            layout.node_properties(),
            layout.queue_config(),
            layout.readme(),
            layout.catalog_properties("tpch"),
            layout.launcher(),
        ] {
            assert!(layout.contains(&path), "{} escapes node root", path.display());
        }
    }
}
