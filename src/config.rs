use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ParseError;

/// Cluster function a node is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Coordinator,
    Worker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Coordinator => "coordinator",
            Role::Worker => "worker",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "coordinator" => Ok(Role::Coordinator),
            "worker" => Ok(Role::Worker),
            other => Err(format!("unknown role {other:?} (expected coordinator or worker)")),
        }
    }
}

/// Catalog name to ordered property lines, one generated file per entry.
pub type CatalogMap = BTreeMap<String, Vec<String>>;

/// Plugin name to ordered artifact filenames copied from the shared source.
pub type PluginMap = BTreeMap<String, Vec<String>>;

/// The resolved, read-only view of everything the host agent delivered for
/// one node. Constructed once per invocation; nested structures arrive as
/// JSON-encoded strings inside the document and are parsed up front so
/// malformed input fails here instead of mid-materialization.
#[derive(Debug, Clone)]
pub struct ConfigurationSet {
    pub app_root: PathBuf,
    pub app_name: String,
    pub app_user: String,
    pub user_group: String,
    pub data_dir: PathBuf,
    pub java_home: PathBuf,
    pub node_environment: String,
    pub singlenode: bool,
    pub coordinator_host: String,
    pub server_port: u16,
    pub jvm_heapsize: String,
    pub query_max_memory: String,
    pub query_max_memory_per_node: String,
    /// Generated once at construction; stable across configure cycles of
    /// the same invocation.
    pub node_id: String,
    pub package_path: Option<PathBuf>,
    pub plugin_src_dir: Option<PathBuf>,
    pub catalogs: CatalogMap,
    pub plugins: PluginMap,
    pub jvm_args: Vec<String>,
    pub log_properties: Vec<String>,
    pub additional_config_properties: Vec<String>,
    pub additional_node_properties: Vec<String>,
}

/// Host-agent document shape: one `global` section of scalar keys, some of
/// which carry serialized nested structures.
#[derive(Debug, Deserialize)]
struct RawDocument {
    global: RawGlobal,
}

#[derive(Debug, Deserialize)]
struct RawGlobal {
    app_root: String,
    app_name: String,
    app_user: String,
    user_group: String,
    data_dir: String,
    java_home: String,
    #[serde(default = "default_node_environment")]
    node_environment: String,
    #[serde(default)]
    singlenode: bool,
    coordinator_host: String,
    #[serde(default = "default_server_port")]
    server_port: u16,
    #[serde(default = "default_jvm_heapsize")]
    jvm_heapsize: String,
    #[serde(default = "default_query_max_memory")]
    query_max_memory: String,
    #[serde(default = "default_query_max_memory_per_node")]
    query_max_memory_per_node: String,
    #[serde(default)]
    package_path: Option<String>,
    #[serde(default)]
    plugin_src_dir: Option<String>,
    #[serde(default)]
    catalog: Option<String>,
    #[serde(default)]
    plugins: Option<String>,
    #[serde(default)]
    jvm_args: Option<String>,
    #[serde(default)]
    log_properties: Option<String>,
    #[serde(default)]
    additional_config_properties: Option<String>,
    #[serde(default)]
    additional_node_properties: Option<String>,
}

fn default_node_environment() -> String {
    "production".to_string()
}

fn default_server_port() -> u16 {
    8081
}

fn default_jvm_heapsize() -> String {
    "1024m".to_string()
}

fn default_query_max_memory() -> String {
    "50GB".to_string()
}

fn default_query_max_memory_per_node() -> String {
    "1GB".to_string()
}

impl ConfigurationSet {
    /// Read and parse the configuration document at `path`.
    pub fn load(path: &Path) -> Result<Self, ParseError> {
        tracing::debug!(path = %path.display(), "Loading configuration document");
        let text = fs::read_to_string(path).map_err(|source| ParseError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_document(&text)
    }

    /// Parse a configuration document already in memory.
    pub fn from_document(text: &str) -> Result<Self, ParseError> {
        let raw: RawDocument =
            serde_json::from_str(text).map_err(|source| ParseError::Document { source })?;
        let global = raw.global;

        let catalogs = match &global.catalog {
            Some(encoded) => parse_map("catalog", encoded)?,
            None => CatalogMap::new(),
        };
        for name in catalogs.keys() {
            validate_name("catalog", name)?;
        }

        let plugins = match &global.plugins {
            Some(encoded) => parse_map("plugins", encoded)?,
            None => PluginMap::new(),
        };
        for (name, artifacts) in &plugins {
            validate_name("plugins", name)?;
            for artifact in artifacts {
                validate_name("plugins", artifact)?;
            }
        }

        let plugin_src_dir = global.plugin_src_dir.as_ref().map(PathBuf::from);
        if !plugins.is_empty() && plugin_src_dir.is_none() {
            return Err(ParseError::MissingPluginSource);
        }

        Ok(ConfigurationSet {
            app_root: PathBuf::from(&global.app_root),
            app_name: global.app_name,
            app_user: global.app_user,
            user_group: global.user_group,
            data_dir: PathBuf::from(&global.data_dir),
            java_home: PathBuf::from(&global.java_home),
            node_environment: global.node_environment,
            singlenode: global.singlenode,
            coordinator_host: global.coordinator_host,
            server_port: global.server_port,
            jvm_heapsize: global.jvm_heapsize,
            query_max_memory: global.query_max_memory,
            query_max_memory_per_node: global.query_max_memory_per_node,
            node_id: Uuid::new_v4().to_string(),
            package_path: global.package_path.map(PathBuf::from),
            plugin_src_dir,
            catalogs,
            plugins,
            jvm_args: parse_lines("jvm_args", global.jvm_args.as_deref())?,
            log_properties: parse_lines("log_properties", global.log_properties.as_deref())?,
            additional_config_properties: parse_lines(
                "additional_config_properties",
                global.additional_config_properties.as_deref(),
            )?,
            additional_node_properties: parse_lines(
                "additional_node_properties",
                global.additional_node_properties.as_deref(),
            )?,
        })
    }
}

fn parse_map(
    field: &'static str,
    encoded: &str,
) -> Result<BTreeMap<String, Vec<String>>, ParseError> {
    serde_json::from_str(encoded).map_err(|source| ParseError::Field { field, source })
}

fn parse_lines(field: &'static str, encoded: Option<&str>) -> Result<Vec<String>, ParseError> {
    match encoded {
        Some(encoded) => {
            serde_json::from_str(encoded).map_err(|source| ParseError::Field { field, source })
        }
        None => Ok(Vec::new()),
    }
}

/// Map keys and artifact filenames become path components under the node
/// root; anything that could escape it is rejected at parse time.
fn validate_name(field: &'static str, name: &str) -> Result<(), ParseError> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\');
    if valid {
        Ok(())
    } else {
        Err(ParseError::InvalidName {
            field,
            name: name.to_string(),
        })
    }
}
