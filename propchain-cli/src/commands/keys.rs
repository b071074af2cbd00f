//! Keys command implementation.

use crate::error::CliError;
use crate::utils::{build_environment, GlobalOptions};
use clap::Args;
use std::io::Write;

/// List every key defined by an enumerable source.
#[derive(Args)]
pub struct KeysCommand {
    /// Only list keys starting with PREFIX
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Show which source supplies each key
    #[arg(long)]
    pub show_source: bool,
}

impl KeysCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let env = build_environment(global)?;

        let stdout = std::io::stdout();
        let mut handle = stdout.lock();

        let prefix = self.prefix.as_deref().unwrap_or("");
        for key in env.property_names() {
            if !key.starts_with(prefix) {
                continue;
            }
            if self.show_source {
                let origin = env.origin_of(&key).unwrap_or_default();
                writeln!(handle, "{key}\t{origin}")?;
            } else {
                writeln!(handle, "{key}")?;
            }
        }

        Ok(())
    }
}
