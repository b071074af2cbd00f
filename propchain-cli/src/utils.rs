//! Utility functions for CLI operations.
//!
//! This module provides the global options shared by every command, the
//! construction of the environment they resolve against, and output
//! helpers.

use crate::error::CliError;
use propchain::{Environment, Value};
use std::path::PathBuf;

/// Global CLI options shared across all commands.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Property files, lowest precedence first.
    pub files: Vec<PathBuf>,

    /// `--set` overrides.
    pub overrides: Vec<(String, String)>,

    /// Leave environment variables out of the chain.
    pub no_env: bool,

    /// Fail on unresolvable placeholders.
    pub strict: bool,

    /// Profiles to activate.
    pub profiles: Vec<String>,
}

/// Build the environment described by the global options.
///
/// Sources, highest precedence first: `--set` overrides, environment
/// variables (unless `--no-env`), then `--file` files with later files
/// winning.
///
/// # Errors
///
/// Returns `Config` if a file cannot be loaded and `InvalidArguments` for
/// invalid profile labels.
pub fn build_environment(global: &GlobalOptions) -> Result<Environment, CliError> {
    let mut builder = Environment::builder().ignore_unresolvable_nested_placeholders(!global.strict);

    for (key, value) in &global.overrides {
        builder = builder.with_override(key.as_str(), value.as_str());
    }
    for path in &global.files {
        builder = builder.with_file(path.clone());
    }
    if global.no_env {
        builder = builder.without_system_environment();
    }
    if !global.profiles.is_empty() {
        builder = builder.with_active_profiles(global.profiles.iter().cloned());
    }

    let env = builder.build()?;
    log::debug!("resolving against sources {:?}", env.sources().names());
    Ok(env)
}

/// Convert a property value to JSON.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Integer(n) => serde_json::Value::from(*n),
        Value::Float(n) => serde_json::Value::from(*n),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Duration(_) => serde_json::Value::String(value.to_string()),
        Value::List(items) => items.iter().map(value_to_json).collect(),
        Value::Map(entries) => entries
            .iter()
            .map(|(k, v)| (k.clone(), value_to_json(v)))
            .collect::<serde_json::Map<_, _>>()
            .into(),
    }
}

/// Convert a serialization failure into an I/O error.
pub fn json_error(e: serde_json::Error) -> CliError {
    CliError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
}
