//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{ExpandCommand, GetCommand, KeysCommand, ProfilesCommand, SourcesCommand};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line tool for resolving layered property configurations.
#[derive(Parser)]
#[command(name = "propchain")]
#[command(version, about = "Resolve layered property configurations", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Load properties from a YAML, JSON or .env file (later files win)
    #[arg(long = "file", short = 'f', value_name = "PATH", global = true)]
    pub files: Vec<PathBuf>,

    /// Override a property, taking precedence over every other source
    #[arg(
        long = "set",
        value_name = "KEY=VALUE",
        global = true,
        value_parser = parse_key_value
    )]
    pub overrides: Vec<(String, String)>,

    /// Do not read properties from environment variables
    #[arg(long, global = true, env = "PROPCHAIN_NO_ENV")]
    pub no_env: bool,

    /// Fail on placeholders that cannot be resolved instead of keeping them
    #[arg(long, global = true)]
    pub strict: bool,

    /// Activate a profile (repeatable)
    #[arg(long = "profile", short = 'p', value_name = "LABEL", global = true)]
    pub profiles: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Resolve a single property
    Get(GetCommand),

    /// Expand placeholders in a piece of text
    Expand(ExpandCommand),

    /// List property sources in precedence order
    Sources(SourcesCommand),

    /// Evaluate profile expressions, or show profile state
    Profiles(ProfilesCommand),

    /// List known property keys
    Keys(KeysCommand),
}

/// Parses a `KEY=VALUE` pair. The value may itself contain `=`.
///
/// # Errors
///
/// Returns an error if there is no `=` or the key is empty.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("db.url=pg://h?a=b").unwrap(),
            ("db.url".to_string(), "pg://h?a=b".to_string())
        );
        assert_eq!(
            parse_key_value("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_cli_parses_globals_after_subcommand() {
        let cli = Cli::try_parse_from([
            "propchain",
            "get",
            "server.port",
            "--set",
            "a=1",
            "-p",
            "dev",
            "--no-env",
        ])
        .unwrap();
        assert_eq!(cli.overrides, vec![("a".to_string(), "1".to_string())]);
        assert_eq!(cli.profiles, vec!["dev"]);
        assert!(cli.no_env);
        assert!(matches!(cli.command, Command::Get(_)));
    }

    #[test]
    fn test_cli_verify() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
