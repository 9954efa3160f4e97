use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Directory, ownership, and artifact provisioning failures.
#[derive(Error, Debug)]
pub enum ProvisioningError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("{path} exists but is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("failed to remove {path}: {source}")]
    Remove { path: PathBuf, source: io::Error },

    #[error("failed to set ownership {owner} on {path}: {detail}")]
    Chown {
        path: PathBuf,
        owner: String,
        detail: String,
    },

    #[error("plugin artifact {artifact} not found in {source_dir}")]
    MissingArtifact {
        artifact: String,
        source_dir: PathBuf,
    },

    #[error("failed to copy {artifact} to {dest}: {source}")]
    CopyArtifact {
        artifact: String,
        dest: PathBuf,
        source: io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Template resolution and substitution failures.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("unknown template {id}")]
    UnknownTemplate { id: String },

    #[error("template {id} requires a value for {key}")]
    MissingValue { id: String, key: &'static str },

    #[error("failed to write rendered {id} to {path}: {source}")]
    Write {
        id: String,
        path: PathBuf,
        source: io::Error,
    },
}

/// Malformed content in the delivered configuration document.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failed to read configuration document {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("malformed configuration document: {source}")]
    Document { source: serde_json::Error },

    #[error("malformed {field}: {source}")]
    Field {
        field: &'static str,
        source: serde_json::Error,
    },

    #[error("{field} contains invalid name {name:?}")]
    InvalidName { field: &'static str, name: String },

    #[error("plugins supplied without plugin_src_dir")]
    MissingPluginSource,
}

/// Process spawn and pid confirmation failures.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("failed to spawn {command}: {source}")]
    Spawn { command: String, source: io::Error },

    #[error("launched process exited before a pid could be recorded")]
    NoPid,

    #[error("process {pid} exited during startup")]
    DiedAfterLaunch { pid: u32 },

    #[error("failed to open log file {path}: {source}")]
    LogFile { path: PathBuf, source: io::Error },

    #[error("failed to write pid file {path}: {source}")]
    PidFileWrite { path: PathBuf, source: io::Error },

    #[error("failed to read pid file {path}: {source}")]
    PidFileRead { path: PathBuf, source: io::Error },
}

/// Umbrella for every failure a lifecycle verb can surface.
///
/// Each class propagates transparently so callers see the originating
/// error unmodified.
#[derive(Error, Debug)]
pub enum NodeError {
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error("package installation failed: {reason}")]
    Install { reason: String },
}

pub type Result<T> = std::result::Result<T, NodeError>;
