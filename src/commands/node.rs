use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use prestoctl::clienv;
use prestoctl::config::{ConfigurationSet, Role};
use prestoctl::lifecycle::{NodeController, NodeStatus};

fn load_controller(config_path: Option<PathBuf>) -> Result<NodeController> {
    let path = config_path.unwrap_or_else(clienv::config_document_path);
    let config = ConfigurationSet::load(&path)
        .with_context(|| format!("Failed to load configuration document {}", path.display()))?;
    Ok(NodeController::new(config))
}

pub(crate) async fn cmd_install(config_path: Option<PathBuf>) -> Result<()> {
    let controller = load_controller(config_path)?;

    let pb = create_progress_bar("Installing server distribution");
    let result = controller.install();
    pb.finish_with_message(match &result {
        Ok(_) => "Server distribution installed".to_string(),
        Err(e) => format!("Failed: {e}"),
    });
    result?;

    println!(
        "{} Installed into {}",
        style("✓").green().bold(),
        controller.layout().node_root.display()
    );
    Ok(())
}

pub(crate) async fn cmd_configure(config_path: Option<PathBuf>, role: Role) -> Result<()> {
    let controller = load_controller(config_path)?;

    let pb = create_progress_bar(&format!("Configuring {role} node"));
    let result = controller.configure(role);
    pb.finish_with_message(match &result {
        Ok(_) => format!("{role} node configured"),
        Err(e) => format!("Failed: {e}"),
    });
    result?;

    println!(
        "{} Configuration materialized under {}",
        style("✓").green().bold(),
        controller.layout().etc_dir.display()
    );
    Ok(())
}

pub(crate) async fn cmd_start(config_path: Option<PathBuf>, role: Role) -> Result<()> {
    let controller = load_controller(config_path)?;

    let pb = create_progress_bar(&format!("Starting {role} node"));
    let result = controller.start(role).await;
    pb.finish_with_message(match &result {
        Ok(pid) => format!("Node started (PID {pid})"),
        Err(e) => format!("Failed: {e}"),
    });
    let pid = result?;

    println!(
        "{} Node running with PID {} (pid file {})",
        style("✓").green().bold(),
        style(pid).bold(),
        controller.layout().pid_file().display()
    );
    Ok(())
}

pub(crate) async fn cmd_stop(config_path: Option<PathBuf>) -> Result<()> {
    let controller = load_controller(config_path)?;
    controller.stop().await?;

    println!(
        "{} Process termination is owned by the cluster orchestrator; nothing to do",
        style("i").cyan()
    );
    Ok(())
}

pub(crate) async fn cmd_status(config_path: Option<PathBuf>) -> Result<()> {
    let controller = load_controller(config_path)?;

    match controller.status().await? {
        NodeStatus::Running { pid } => println!(
            "{} Node is {} (PID {})",
            style("✓").green().bold(),
            style("running").green(),
            pid
        ),
        NodeStatus::NotRunning => println!(
            "{} Node is {}",
            style("i").cyan(),
            style("not running").yellow()
        ),
    }
    Ok(())
}

fn create_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
