use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Prints `value` as JSON or YAML, or runs `human` for the text rendering.
    pub fn emit<T, F>(&self, value: &T, human: F) -> Result<()>
    where
        T: Serialize,
        F: FnOnce() -> Result<()>,
    {
        match self {
            OutputFormat::Human => human()?,
            OutputFormat::Json => {
                let rendered =
                    serde_json::to_string_pretty(value).context("Failed to render JSON output")?;
                println!("{}", rendered);
            }
            OutputFormat::Yaml => {
                let rendered =
                    serde_yaml::to_string(value).context("Failed to render YAML output")?;
                print!("{}", rendered);
            }
        }
        Ok(())
    }
}
