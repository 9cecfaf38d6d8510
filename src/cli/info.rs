use anyhow::Result;
use node_overlay_resolver::FieldSchema;
use node_overlay_validator::ValidatorLimits;
use serde::Serialize;

use super::context::CliContext;
use super::output::OutputFormat;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InfoReport<'a> {
    version: &'static str,
    build_date: &'static str,
    git_commit: &'static str,
    git_branch: &'static str,
    config_path: String,
    config_found: bool,
    limits: &'a ValidatorLimits,
    schema_fields: Vec<&'a str>,
}

pub async fn cmd_info(ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let config = ctx.config();
    let schema_fields = match ctx.resolver().schema().root() {
        FieldSchema::Struct(fields) => fields.keys().map(String::as_str).collect(),
        _ => Vec::new(),
    };
    let report = InfoReport {
        version: env!("CARGO_PKG_VERSION"),
        build_date: env!("BUILD_DATE"),
        git_commit: env!("GIT_HASH"),
        git_branch: env!("GIT_BRANCH"),
        config_path: ctx.config_path().display().to_string(),
        config_found: ctx.config_path().exists(),
        limits: &config.limits,
        schema_fields,
    };

    output.emit(&report, || {
        println!("node-overlay System Information");
        println!("==============================");
        println!("Version: {}", report.version);
        println!("Build Date: {}", report.build_date);
        println!("Git Commit: {} ({})", report.git_commit, report.git_branch);
        println!();

        println!("Configuration:");
        if report.config_found {
            println!("- Config File: {}", report.config_path);
        } else {
            println!("- Config File: {} (not found, defaults)", report.config_path);
        }
        println!("- Max Rules: {}", config.limits.max_rules);
        println!("- Max Payload Bytes: {}", config.limits.max_payload_bytes);
        match &config.template {
            Some(path) => println!("- Default Template: {}", path.display()),
            None => println!("- Default Template: (none)"),
        }
        match &config.rules {
            Some(path) => println!("- Default Rules: {}", path.display()),
            None => println!("- Default Rules: (none)"),
        }
        println!();
        println!("Template schema: {}", report.schema_fields.join(", "));
        Ok(())
    })
}
