//! Command to expand placeholders in free text.

use crate::error::CliError;
use crate::utils::{build_environment, GlobalOptions};
use clap::Args;

/// Expand `#{...}` placeholders in TEXT against the configured sources.
#[derive(Args)]
pub struct ExpandCommand {
    /// Text containing placeholders
    #[arg(value_name = "TEXT")]
    pub text: String,
}

impl ExpandCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let env = build_environment(global)?;

        let expanded = if global.strict {
            env.expand_required(&self.text)?
        } else {
            env.expand(&self.text)?
        };

        println!("{expanded}");
        Ok(())
    }
}
