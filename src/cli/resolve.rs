use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use node_overlay_core_types::{LabelSet, RuleId};
use node_overlay_resolver::{Fingerprint, Resolution, Rule, Template, TargetResolution};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::context::CliContext;
use super::inputs::{load_labels, load_rules, load_targets, load_template, SourceArgs, TargetArgs};
use super::output::OutputFormat;

#[derive(Args, Clone, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Mapping of node name to labels; resolves every node independently
    #[arg(long, value_name = "FILE", conflicts_with_all = ["labels", "node"])]
    pub nodes: Option<PathBuf>,
}

/// One line of a batch report.
#[derive(Debug, Serialize)]
struct NodeReport {
    node: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fingerprint: Option<Fingerprint>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    applied: Vec<RuleId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<TargetResolution<String>> for NodeReport {
    fn from(result: TargetResolution<String>) -> Self {
        match result.outcome {
            Ok(resolution) => NodeReport {
                node: result.target,
                status: "ok",
                fingerprint: Some(resolution.fingerprint),
                applied: resolution.applied,
                template: Some(resolution.template.into_value()),
                error: None,
            },
            Err(err) => NodeReport {
                node: result.target,
                status: "error",
                fingerprint: None,
                applied: Vec::new(),
                template: None,
                error: Some(err.to_string()),
            },
        }
    }
}

pub async fn cmd_resolve(args: ResolveArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let template = load_template(&args.source, ctx).await?;
    let rules = load_rules(&args.source.rules, ctx).await?;

    if let Some(path) = &args.nodes {
        let targets = load_targets(path).await?;
        return resolve_batch(template, rules, targets, ctx, output).await;
    }

    let labels = load_labels(&args.target).await?;
    let resolution = ctx.resolver().resolve(&template, &labels, &rules)?;
    output.emit(&resolution, || print_resolution(&resolution))
}

async fn resolve_batch(
    template: Template,
    rules: Vec<Rule>,
    targets: Vec<(String, LabelSet)>,
    ctx: &CliContext,
    output: OutputFormat,
) -> Result<()> {
    let resolver = ctx.resolver().clone();
    let results =
        tokio::task::spawn_blocking(move || resolver.resolve_many(&template, &targets, &rules))
            .await
            .context("Batch resolution task failed")?;

    let total = results.len();
    let reports: Vec<NodeReport> = results.into_iter().map(NodeReport::from).collect();
    let failed = reports.iter().filter(|report| report.error.is_some()).count();
    info!(total, failed, "batch resolution finished");

    output.emit(&reports, || {
        for report in &reports {
            match (&report.fingerprint, &report.error) {
                (Some(fingerprint), _) => println!(
                    "{:<24} ok     {}  {}",
                    report.node,
                    fingerprint.short(),
                    applied_list(&report.applied)
                ),
                (None, Some(error)) => println!("{:<24} error  {}", report.node, error),
                (None, None) => println!("{:<24} {}", report.node, report.status),
            }
        }
        Ok(())
    })?;

    if failed > 0 {
        bail!("{} of {} nodes failed to resolve", failed, total);
    }
    Ok(())
}

fn print_resolution(resolution: &Resolution) -> Result<()> {
    let rendered = serde_yaml::to_string(resolution.template.as_value())
        .context("Failed to render template")?;
    print!("{}", rendered);
    println!("# applied: {}", applied_list(&resolution.applied));
    println!("# fingerprint: {}", resolution.fingerprint);
    Ok(())
}

pub(crate) fn applied_list(applied: &[RuleId]) -> String {
    if applied.is_empty() {
        return "(none)".to_string();
    }
    applied
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
