// maskward/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::Workspace;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("maskward=info,maskward_core=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let workspace = Workspace::open(cli.config.as_deref(), &cli.project_dir, cli.strict_columns)?;

    match cli.command {
        Commands::Run => commands::run::execute(&workspace).await,
        Commands::Trigger => commands::trigger::execute(&workspace).await,
        Commands::Serve { bind, port } => commands::serve::execute(workspace, &bind, port).await,
        Commands::Ingest => commands::stage::ingest(&workspace).await,
        Commands::Load => commands::stage::load(&workspace).await,
        Commands::Reset => commands::stage::reset(&workspace).await,
        Commands::Apply { audit } => commands::stage::apply(&workspace, audit.into()).await,
    }
}
