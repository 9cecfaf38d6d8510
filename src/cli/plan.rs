use anyhow::Result;
use clap::Args;
use node_overlay_core_types::RuleId;
use node_overlay_resolver::Priority;
use serde::Serialize;

use super::context::CliContext;
use super::inputs::{load_labels, load_rules, RulesArgs, TargetArgs};
use super::output::OutputFormat;

#[derive(Args, Clone, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub rules: RulesArgs,

    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Debug, Serialize)]
struct PlanStep {
    order: usize,
    rule: RuleId,
    priority: Priority,
    payload_bytes: usize,
}

pub async fn cmd_plan(args: PlanArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let rules = load_rules(&args.rules, ctx).await?;
    let labels = load_labels(&args.target).await?;

    let steps: Vec<PlanStep> = ctx
        .resolver()
        .plan(&labels, &rules)
        .iter()
        .enumerate()
        .map(|(order, matched)| PlanStep {
            order: order + 1,
            rule: matched.id(),
            priority: matched.rule.priority.clone(),
            payload_bytes: matched.rule.payload.len(),
        })
        .collect();

    output.emit(&steps, || {
        if steps.is_empty() {
            println!("No rules match ({} declared)", rules.len());
            return Ok(());
        }
        println!("{} of {} rules match, applied in this order:", steps.len(), rules.len());
        for step in &steps {
            println!(
                "{:>3}. {:<24} priority={:<6} index={:<3} {} bytes",
                step.order,
                step.rule.to_string(),
                step.priority,
                step.rule.index,
                step.payload_bytes
            );
        }
        Ok(())
    })
}
