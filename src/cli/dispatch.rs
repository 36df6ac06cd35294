use super::auth::cmd_auth;
use super::config::cmd_config;
use super::env::CliArgs;
use super::info::cmd_info;
use super::origin::cmd_origin;
use super::query::cmd_query;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Origin(args) => cmd_origin(args, ctx),
        Commands::Query(args) => cmd_query(args, ctx),
        Commands::Auth(args) => cmd_auth(args, ctx).await,
        Commands::Config(args) => cmd_config(args, ctx),
        Commands::Info => cmd_info(ctx),
    }
}
