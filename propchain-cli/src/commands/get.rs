//! Get command implementation.
//!
//! Resolves one property through the full chain, optionally converting it
//! to a given shape.

use crate::error::CliError;
use crate::utils::{build_environment, json_error, value_to_json, GlobalOptions};
use crate::commands::OutputFormat;
use clap::Args;
use propchain::{Shape, Value};
use std::io::Write;

/// Resolve a single property.
#[derive(Args)]
pub struct GetCommand {
    /// Property key, e.g. server.port
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Convert the value before printing (string, integer, float, bool,
    /// duration, string-list, map)
    #[arg(long = "as", value_name = "SHAPE", value_parser = Shape::parse)]
    pub shape: Option<Shape>,

    /// Fail if the property is not defined
    #[arg(long)]
    pub required: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text", ignore_case = true)]
    pub format: OutputFormat,
}

impl GetCommand {
    /// Execute the get command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        // 1. Build the environment
        let env = build_environment(global)?;

        // 2. Resolve
        let Some(raw) = env.get_value(&self.key)? else {
            if self.required {
                return Err(CliError::SemanticFailure(format!(
                    "required property '{}' not found",
                    self.key
                )));
            }
            log::info!("property '{}' is not defined", self.key);
            return Ok(());
        };

        // 3. Convert if requested
        let value = match self.shape {
            Some(shape) => env.conversion_service().convert(&raw, shape)?,
            None => raw,
        };

        // 4. Output
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        match self.format {
            OutputFormat::Text => write_text(&mut handle, &value)?,
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "key": self.key,
                    "value": value_to_json(&value),
                    "source": env.origin_of(&self.key),
                });
                serde_json::to_writer_pretty(&mut handle, &json).map_err(json_error)?;
                writeln!(handle)?;
            }
        }
        Ok(())
    }
}

/// Lists print one entry per line and maps one `key=value` per line.
fn write_text(out: &mut impl Write, value: &Value) -> Result<(), CliError> {
    match value {
        Value::List(items) => {
            for item in items {
                writeln!(out, "{item}")?;
            }
        }
        Value::Map(_) => {
            for (key, item) in value.flatten() {
                writeln!(out, "{key}={item}")?;
            }
        }
        other => writeln!(out, "{other}")?,
    }
    Ok(())
}
