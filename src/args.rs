use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use prestoctl::config::Role;

#[derive(Parser)]
#[command(name = "prestoctl")]
#[command(version)]
#[command(about = "Provision and supervise Presto cluster nodes", long_about = None)]
pub(crate) struct Cli {
    /// Path to the node configuration document (JSON). Can also be set
    /// via the PRESTOCTL_CONFIG env var.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Install the server distribution into the node root
    Install,

    /// Materialize the node configuration for a role
    Configure {
        /// Cluster function of this node
        #[arg(long, value_enum)]
        role: RoleArg,
    },

    /// Configure, then launch the node process detached
    Start {
        /// Cluster function of this node
        #[arg(long, value_enum)]
        role: RoleArg,
    },

    /// No-op: process termination is owned by the cluster orchestrator
    Stop,

    /// Report whether the node process is running
    Status,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum RoleArg {
    Coordinator,
    Worker,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Coordinator => Role::Coordinator,
            RoleArg::Worker => Role::Worker,
        }
    }
}
