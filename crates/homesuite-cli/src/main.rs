//! homesuite - command-line front end for the homesuite tools.

mod cli;
mod config;
mod handlers;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Args;

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so command output stays clean on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("homesuite_cli=info".parse()?)
                .add_directive("homesuite_core=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    // A missing .env file is fine.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env loaded: {}", e);
    }

    let mut config = config::Config::load(args.config)?;

    if let Some(data_dir) = args.data_dir {
        tracing::info!("Overriding data directory from CLI: {}", data_dir.display());
        config.data_dir = data_dir;
    }
    tracing::debug!("Data directory: {}", config.data_dir.display());

    handlers::run(args.command, &config)
}
