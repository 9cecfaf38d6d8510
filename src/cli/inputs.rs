use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use node_overlay_core_types::{parse_label_set, LabelSet};
use node_overlay_resolver::{
    parse_labels_str, parse_rules_str, parse_targets_str, parse_template_str, Rule, Template,
};
use tokio::fs;
use tracing::debug;

use super::context::CliContext;

/// Base template and rule files; both fall back to the config file.
#[derive(Args, Clone, Debug)]
pub struct SourceArgs {
    /// Pod template, or a workload wrapping it under spec.template
    #[arg(long, value_name = "FILE")]
    pub template: Option<PathBuf>,

    #[command(flatten)]
    pub rules: RulesArgs,
}

#[derive(Args, Clone, Debug)]
pub struct RulesArgs {
    /// Rule list, {patches: [...]} document, or resource with spec.patches
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,
}

/// Labels of the node being resolved.
#[derive(Args, Clone, Debug)]
pub struct TargetArgs {
    /// Node labels as key=value pairs separated by commas
    #[arg(long, value_name = "LABELS", conflicts_with = "node")]
    pub labels: Option<String>,

    /// Node resource or plain label mapping (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    pub node: Option<PathBuf>,
}

pub async fn load_template(args: &SourceArgs, ctx: &CliContext) -> Result<Template> {
    let path = choose(args.template.as_ref(), ctx.config().template.as_ref(), "--template")?;
    let raw = read(path).await?;
    parse_template_str(&raw).with_context(|| format!("Failed to parse template {}", path.display()))
}

pub async fn load_rules(args: &RulesArgs, ctx: &CliContext) -> Result<Vec<Rule>> {
    let path = choose(args.rules.as_ref(), ctx.config().rules.as_ref(), "--rules")?;
    let raw = read(path).await?;
    let rules = parse_rules_str(&raw)
        .with_context(|| format!("Failed to parse rules {}", path.display()))?;
    debug!(path = %path.display(), count = rules.len(), "loaded rules");
    Ok(rules)
}

pub async fn load_labels(args: &TargetArgs) -> Result<LabelSet> {
    match (&args.labels, &args.node) {
        (Some(raw), _) => parse_label_set(raw).context("Invalid --labels value"),
        (None, Some(path)) => {
            let raw = read(path).await?;
            parse_labels_str(&raw)
                .with_context(|| format!("Failed to parse node labels {}", path.display()))
        }
        (None, None) => bail!("either --labels or --node is required"),
    }
}

pub async fn load_targets(path: &Path) -> Result<Vec<(String, LabelSet)>> {
    let raw = read(path).await?;
    parse_targets_str(&raw).with_context(|| format!("Failed to parse nodes {}", path.display()))
}

fn choose<'a>(
    flag: Option<&'a PathBuf>,
    configured: Option<&'a PathBuf>,
    name: &str,
) -> Result<&'a PathBuf> {
    match flag.or(configured) {
        Some(path) => Ok(path),
        None => bail!("{} is required (or set it in the config file)", name),
    }
}

async fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}
