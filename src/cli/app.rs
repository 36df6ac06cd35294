use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};

use super::context::CliContext;
use super::dispatch::dispatch;
use super::env::CliArgs;
use super::runtime::{init_logging, load_engine, LoadedEngine};

pub async fn run() -> Result<()> {
    let cli = CliArgs::parse();

    init_logging(&cli.log_level, cli.debug)?;
    debug!("Starting refgate v{}", env!("CARGO_PKG_VERSION"));

    let LoadedEngine { engine, path } = load_engine(cli.config.as_ref(), &cli.overrides)?;
    let cli_context = CliContext::new(engine, path, cli.output);

    match dispatch(&cli, &cli_context).await {
        Ok(()) => {
            debug!("Command completed successfully");
            Ok(())
        }
        Err(err) => {
            error!("Command failed: {}", err);
            Err(err)
        }
    }
}
