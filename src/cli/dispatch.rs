use super::env::CliArgs;
use super::fingerprint::cmd_fingerprint;
use super::info::cmd_info;
use super::plan::cmd_plan;
use super::resolve::cmd_resolve;
use super::validate::cmd_validate;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    let output = cli.output.clone();
    match cli.command.clone() {
        Commands::Resolve(args) => cmd_resolve(args, ctx, output).await,
        Commands::Plan(args) => cmd_plan(args, ctx, output).await,
        Commands::Fingerprint(args) => cmd_fingerprint(args, ctx, output).await,
        Commands::Validate(args) => cmd_validate(args, ctx, output).await,
        Commands::Info => cmd_info(ctx, output).await,
    }
}
