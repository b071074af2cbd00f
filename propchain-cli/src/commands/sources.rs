//! Sources command implementation.
//!
//! Shows the property sources in precedence order, highest first.

use crate::commands::OutputFormat;
use crate::error::CliError;
use crate::utils::{build_environment, json_error, GlobalOptions};
use clap::Args;
use std::io::Write;

/// List property sources in precedence order.
#[derive(Args)]
pub struct SourcesCommand {
    /// Output format
    #[arg(long, value_enum, default_value = "text", ignore_case = true)]
    pub format: OutputFormat,
}

impl SourcesCommand {
    /// Execute the sources command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let env = build_environment(global)?;
        let sources = env.sources().snapshot();

        let stdout = std::io::stdout();
        let mut handle = stdout.lock();

        match self.format {
            OutputFormat::Text => {
                for source in &sources {
                    let count = source
                        .property_names()
                        .map_or_else(|| "-".to_string(), |names| names.len().to_string());
                    writeln!(handle, "{}\t{count}", source.name())?;
                }
            }
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = sources
                    .iter()
                    .enumerate()
                    .map(|(precedence, source)| {
                        serde_json::json!({
                            "name": source.name(),
                            "precedence": precedence,
                            "properties": source.property_names().map(|names| names.len()),
                        })
                    })
                    .collect();
                serde_json::to_writer_pretty(&mut handle, &json).map_err(json_error)?;
                writeln!(handle)?;
            }
        }

        Ok(())
    }
}
