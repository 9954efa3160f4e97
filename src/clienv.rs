use std::path::PathBuf;

const CONFIG_PATH_VAR: &str = "PRESTOCTL_CONFIG";
const FALLBACK_CONFIG_DIR: &str = "~/.config";
const APP_SUBDIR: &str = "prestoctl";
const CONFIG_FILE: &str = "node.json";

/// Configuration document path ($PRESTOCTL_CONFIG or
/// ~/.config/prestoctl/node.json)
pub fn config_document_path() -> PathBuf {
    let path = std::env::var_os(CONFIG_PATH_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from(FALLBACK_CONFIG_DIR))
                .join(APP_SUBDIR)
                .join(CONFIG_FILE)
        });
    tracing::trace!(path = %path.display(), "Resolved configuration document path");
    path
}
