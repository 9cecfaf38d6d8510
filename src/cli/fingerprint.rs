use anyhow::Result;
use clap::Args;
use node_overlay_resolver::{fingerprint, Fingerprint};
use serde::Serialize;

use super::context::CliContext;
use super::inputs::{load_labels, load_rules, load_template, SourceArgs, TargetArgs};
use super::output::OutputFormat;

#[derive(Args, Clone, Debug)]
pub struct FingerprintArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Print only the short form used as a revision label
    #[arg(long)]
    pub short: bool,
}

#[derive(Debug, Serialize)]
struct FingerprintReport<'a> {
    fingerprint: &'a Fingerprint,
    short: &'a str,
    matched: usize,
}

pub async fn cmd_fingerprint(
    args: FingerprintArgs,
    ctx: &CliContext,
    output: OutputFormat,
) -> Result<()> {
    let template = load_template(&args.source, ctx).await?;
    let rules = load_rules(&args.source.rules, ctx).await?;
    let labels = load_labels(&args.target).await?;

    let plan = ctx.resolver().plan(&labels, &rules);
    let digest = fingerprint(&template, &plan);
    let report = FingerprintReport {
        fingerprint: &digest,
        short: digest.short(),
        matched: plan.len(),
    };

    output.emit(&report, || {
        if args.short {
            println!("{}", report.short);
        } else {
            println!("{}", report.fingerprint);
        }
        Ok(())
    })
}
