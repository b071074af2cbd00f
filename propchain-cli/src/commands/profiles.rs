//! Command to evaluate profile expressions.
//!
//! With expressions, exits 0 when any of them matches and 1 otherwise.
//! Without, prints the active and default profile sets.

use crate::error::CliError;
use crate::utils::{build_environment, GlobalOptions};
use clap::Args;
use propchain::Profiles;

/// Evaluate profile expressions against the active profiles.
#[derive(Args)]
pub struct ProfilesCommand {
    /// Profile expressions such as "dev & !test"; any match succeeds
    #[arg(value_name = "EXPR")]
    pub expressions: Vec<String>,
}

impl ProfilesCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let env = build_environment(global)?;

        if self.expressions.is_empty() {
            println!("active: {}", env.active_profiles()?.join(","));
            println!("default: {}", env.default_profiles()?.join(","));
            return Ok(());
        }

        let profiles = Profiles::parse(&self.expressions)?;
        if env.accepts_profiles(&profiles)? {
            log::info!("profiles match: {profiles}");
            Ok(())
        } else {
            Err(CliError::SemanticFailure(format!(
                "profiles do not match: {profiles}"
            )))
        }
    }
}
