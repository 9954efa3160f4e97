use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{info, warn};

use crate::config::{ConfigurationSet, Role};
use crate::error::{LaunchError, Result};
use crate::installer::{PackageInstaller, TarballInstaller};
use crate::layout::NodeLayout;
use crate::ownership::{self, Ownership};
use crate::provision::template::{BuiltinRenderer, Renderer};
use crate::provision::NodeConfigurator;

/// Single bounded poll after launch before the pid is trusted.
const DEFAULT_POLL_AFTER: Duration = Duration::from_secs(3);

/// The pid file written at start time and read back at status time. An
/// absent file or unparseable content means "not running", never an
/// error; only real I/O failures raise.
#[derive(Debug, Clone)]
pub struct PidRecord {
    path: PathBuf,
}

impl PidRecord {
    pub fn new(path: PathBuf) -> Self {
        PidRecord { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write(&self, pid: u32) -> std::result::Result<(), LaunchError> {
        tokio::fs::write(&self.path, format!("{pid}\n"))
            .await
            .map_err(|source| LaunchError::PidFileWrite {
                path: self.path.clone(),
                source,
            })
    }

    pub async fn read(&self) -> std::result::Result<Option<u32>, LaunchError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => match text.trim().parse::<u32>() {
                Ok(pid) => Ok(Some(pid)),
                Err(_) => {
                    warn!(path = %self.path.display(), "Pid file content is not a pid, treating as stale");
                    Ok(None)
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(LaunchError::PidFileRead {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Existence probe. EPERM still means the process is there, just owned
/// by someone else.
#[cfg(unix)]
pub fn is_process_running(pid: u32) -> bool {
    let rc = unsafe { libc::kill(pid as i32, 0) };
    rc == 0 || io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
pub fn is_process_running(_pid: u32) -> bool {
    false
}

/// Best-effort identity check on top of the existence probe: where /proc
/// is available, the command line must mention `needle` so a recycled pid
/// belonging to some unrelated process does not count as our node.
fn process_matches(pid: u32, needle: &str) -> bool {
    #[cfg(target_os = "linux")]
    {
        if let Ok(raw) = std::fs::read(format!("/proc/{pid}/cmdline")) {
            let cmdline = String::from_utf8_lossy(&raw).replace('\0', " ");
            return cmdline.contains(needle);
        }
    }
    let _ = needle;
    is_process_running(pid)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Running { pid: u32 },
    NotRunning,
}

impl NodeStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, NodeStatus::Running { .. })
    }
}

/// Drives one node through its lifecycle: install the distribution,
/// materialize its configuration, launch it detached, and answer
/// liveness queries via the pid record. Stopping is deliberately absent;
/// the surrounding orchestrator owns termination.
pub struct NodeController {
    config: ConfigurationSet,
    layout: NodeLayout,
    renderer: Box<dyn Renderer>,
    ownership: Box<dyn Ownership>,
    installer: Box<dyn PackageInstaller>,
    poll_after: Duration,
}

impl NodeController {
    pub fn new(config: ConfigurationSet) -> Self {
        NodeController {
            layout: NodeLayout::new(&config),
            config,
            renderer: Box::new(BuiltinRenderer),
            ownership: ownership::for_current_user(),
            installer: Box::new(TarballInstaller),
            poll_after: DEFAULT_POLL_AFTER,
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_ownership(mut self, ownership: Box<dyn Ownership>) -> Self {
        self.ownership = ownership;
        self
    }

    pub fn with_installer(mut self, installer: Box<dyn PackageInstaller>) -> Self {
        self.installer = installer;
        self
    }

    pub fn with_poll_after(mut self, poll_after: Duration) -> Self {
        self.poll_after = poll_after;
        self
    }

    pub fn config(&self) -> &ConfigurationSet {
        &self.config
    }

    pub fn layout(&self) -> &NodeLayout {
        &self.layout
    }

    pub fn pid_record(&self) -> PidRecord {
        PidRecord::new(self.layout.pid_file())
    }

    /// Install the server distribution through the packaging seam.
    pub fn install(&self) -> Result<()> {
        self.installer.install(&self.config, &self.layout)
    }

    /// Run one configure cycle. Idempotent; always safe right before
    /// `start`.
    pub fn configure(&self, role: Role) -> Result<()> {
        NodeConfigurator::new(&self.config, self.renderer.as_ref(), self.ownership.as_ref())
            .configure(role)
    }

    /// Configure, then launch the node detached and record its pid. The
    /// child is never awaited; the only guarantee on return is that the
    /// pid file holds a live pid, or an error.
    pub async fn start(&self, role: Role) -> Result<u32> {
        self.configure(role)?;

        let launcher = self.layout.launcher();
        let log_path = self.layout.log_file();
        let log_err = |source| LaunchError::LogFile {
            path: log_path.clone(),
            source,
        };
        let stdout = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(log_err)?;
        let stderr = stdout.try_clone().map_err(log_err)?;

        let mut command = Command::new(&launcher);
        command
            .arg("run")
            .env("PATH", prefixed_path(&self.config.java_home))
            .current_dir(&self.layout.node_root)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr));

        info!(command = %launcher.display(), "Launching node process detached");
        let mut child = command.spawn().map_err(|source| LaunchError::Spawn {
            command: launcher.display().to_string(),
            source,
        })?;
        let pid = child.id().ok_or(LaunchError::NoPid)?;
        self.pid_record().write(pid).await?;

        tokio::time::sleep(self.poll_after).await;
        match child.try_wait() {
            Ok(Some(status)) => {
                warn!(pid, %status, "Node process exited during startup");
                return Err(LaunchError::DiedAfterLaunch { pid }.into());
            }
            // Still running (or unknowable): detach. The child is dropped,
            // never awaited, and outlives us.
            Ok(None) | Err(_) => drop(child),
        }

        info!(pid, pid_file = %self.layout.pid_file().display(), "Node process is up");
        Ok(pid)
    }

    /// No-op. Termination is owned by the orchestrator that manages the
    /// whole execution context; this agent must leave both the process
    /// and the pid file alone.
    pub async fn stop(&self) -> Result<()> {
        info!("Stop is delegated to the cluster orchestrator, nothing to do");
        Ok(())
    }

    pub async fn status(&self) -> Result<NodeStatus> {
        match self.pid_record().read().await? {
            None => Ok(NodeStatus::NotRunning),
            Some(pid) => {
                let needle = self.layout.launcher().display().to_string();
                if process_matches(pid, &needle) {
                    Ok(NodeStatus::Running { pid })
                } else {
                    Ok(NodeStatus::NotRunning)
                }
            }
        }
    }
}

/// The runtime's binary directory, prepended to the inherited search
/// path so the launcher finds its JVM.
fn prefixed_path(java_home: &Path) -> OsString {
    let bin = java_home.join("bin");
    let mut paths = vec![bin.clone()];
    if let Some(existing) = std::env::var_os("PATH") {
        paths.extend(std::env::split_paths(&existing));
    }
    std::env::join_paths(paths).unwrap_or_else(|_| bin.into_os_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ownership::SkipOwnership;

    fn controller_in(root: &Path) -> NodeController {
        let doc = serde_json::json!({
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
        let config = ConfigurationSet::from_document(&doc.to_string()).unwrap();
        NodeController::new(config)
            .with_ownership(Box::new(SkipOwnership))
            .with_poll_after(Duration::from_millis(200))
    }

    #[cfg(unix)]
    fn write_launcher(layout: &NodeLayout, script: &str) {
        use std::os::unix::fs::PermissionsExt;
        let launcher = layout.launcher();
        std::fs::create_dir_all(launcher.parent().unwrap()).unwrap();
        std::fs::write(&launcher, script).unwrap();
        std::fs::set_permissions(&launcher, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[tokio::test]
    async fn pid_record_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let record = PidRecord::new(dir.path().join("launcher.pid"));

        record.write(4242).await.unwrap();

        assert_eq!(record.read().await.unwrap(), Some(4242));
    }

    #[tokio::test]
    async fn missing_pid_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let record = PidRecord::new(dir.path().join("launcher.pid"));

        assert_eq!(record.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_pid_file_reads_as_stale() {
        let dir = tempfile::tempdir().unwrap();
        let record = PidRecord::new(dir.path().join("launcher.pid"));
        std::fs::write(record.path(), "not a pid\n").unwrap();

        assert_eq!(record.read().await.unwrap(), None);
    }

    #[test]
    fn own_process_is_running() {
        assert!(is_process_running(std::process::id()));
    }

    #[cfg(unix)]
    #[test]
    fn exited_process_is_not_running() {
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();

        assert!(!is_process_running(pid));
    }

    #[tokio::test]
    async fn status_without_pid_file_is_not_running() {
        let root = tempfile::tempdir().unwrap();
        let controller = controller_in(root.path());

        assert_eq!(controller.status().await.unwrap(), NodeStatus::NotRunning);
    }

    #[tokio::test]
    async fn stop_touches_neither_process_nor_pid_file() {
        let root = tempfile::tempdir().unwrap();
        let controller = controller_in(root.path());
        std::fs::create_dir_all(&controller.layout().pid_dir).unwrap();
        std::fs::write(controller.layout().pid_file(), "31337\n").unwrap();

        controller.stop().await.unwrap();

        assert_eq!(
            std::fs::read_to_string(controller.layout().pid_file()).unwrap(),
            "31337\n"
        );
        // And our own process obviously survived the call.
        assert!(is_process_running(std::process::id()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn start_records_a_live_pid() {
        let root = tempfile::tempdir().unwrap();
        let controller = controller_in(root.path());
        // No exec: the shell stays the recorded pid and its command line
        // keeps the launcher path for the identity check.
        write_launcher(controller.layout(), "#!/bin/sh\nsleep 5\n");

        let pid = controller.start(Role::Worker).await.unwrap();

        assert_eq!(controller.pid_record().read().await.unwrap(), Some(pid));
        assert!(controller.status().await.unwrap().is_running());

        unsafe { libc::kill(pid as i32, libc::SIGKILL) };
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn start_fails_when_the_process_dies_during_startup() {
        let root = tempfile::tempdir().unwrap();
        let controller = controller_in(root.path());
        write_launcher(controller.layout(), "#!/bin/sh\nexit 1\n");

        let err = controller.start(Role::Worker).await.unwrap_err();

        assert!(matches!(
            err,
            crate::error::NodeError::Launch(LaunchError::DiedAfterLaunch { .. })
        ));
    }

    #[tokio::test]
    async fn start_surfaces_spawn_failure_for_missing_launcher() {
        let root = tempfile::tempdir().unwrap();
        let controller = controller_in(root.path());

        let err = controller.start(Role::Worker).await.unwrap_err();

        assert!(matches!(
            err,
            crate::error::NodeError::Launch(LaunchError::Spawn { .. })
        ));
    }
}
