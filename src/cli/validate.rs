use anyhow::{bail, Result};
use clap::Args;
use node_overlay_validator::Violation;
use serde::Serialize;

use super::context::CliContext;
use super::inputs::{load_rules, RulesArgs};
use super::output::OutputFormat;

#[derive(Args, Clone, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub rules: RulesArgs,
}

#[derive(Debug, Serialize)]
struct ValidationReport<'a> {
    valid: bool,
    rules: usize,
    violations: &'a [Violation],
}

pub async fn cmd_validate(args: ValidateArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let rules = load_rules(&args.rules, ctx).await?;
    let violations = ctx.validator().validate(&rules);
    let report = ValidationReport {
        valid: violations.is_empty(),
        rules: rules.len(),
        violations: &violations,
    };

    output.emit(&report, || {
        if violations.is_empty() {
            println!("{} rules valid", rules.len());
        } else {
            for violation in &violations {
                println!("[{}] {}", violation.kind, violation);
            }
        }
        Ok(())
    })?;

    if !violations.is_empty() {
        bail!("{} violation(s) found", violations.len());
    }
    Ok(())
}
