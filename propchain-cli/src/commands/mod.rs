//! CLI command implementations.
//!
//! This module contains the implementations of all CLI commands:
//! - `get`: Resolve a single property
//! - `expand`: Expand placeholders in free text
//! - `sources`: List property sources in precedence order
//! - `profiles`: Evaluate profile expressions
//! - `keys`: List known property keys

use clap::ValueEnum;

pub mod expand;
pub mod get;
pub mod keys;
pub mod profiles;
pub mod sources;

pub use expand::ExpandCommand;
pub use get::GetCommand;
pub use keys::KeysCommand;
pub use profiles::ProfilesCommand;
pub use sources::SourcesCommand;

/// Output format shared by commands with structured output.
#[derive(Clone, Copy, Debug, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text, one entry per line
    Text,
    /// JSON format
    Json,
}
