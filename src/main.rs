mod args;
mod commands;

use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Install => commands::node::cmd_install(cli.config).await?,
        Commands::Configure { role } => {
            commands::node::cmd_configure(cli.config, role.into()).await?
        }
        Commands::Start { role } => commands::node::cmd_start(cli.config, role.into()).await?,
        Commands::Stop => commands::node::cmd_stop(cli.config).await?,
        Commands::Status => commands::node::cmd_status(cli.config).await?,
    }

    Ok(())
}
