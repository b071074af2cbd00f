//! Main entry point for the propchain CLI.
//!
//! This is the command-line interface for layered property resolution.
//! It provides commands for inspecting a configuration:
//! - `get`: Resolve a single property
//! - `expand`: Expand placeholders in free text
//! - `sources`: List property sources in precedence order
//! - `profiles`: Evaluate profile expressions
//! - `keys`: List known property keys

use clap::Parser;
use propchain_cli::cli::{Cli, Command};
use propchain_cli::utils::GlobalOptions;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    if let Err(e) = propchain::init_logger(cli.verbose, cli.quiet).install() {
        eprintln!("warning: could not install logger: {e}");
    }

    // Convert CLI args to GlobalOptions
    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        files: cli.files,
        overrides: cli.overrides,
        no_env: cli.no_env,
        strict: cli.strict,
        profiles: cli.profiles,
    };

    // Execute the command
    let result = match cli.command {
        Command::Get(cmd) => cmd.execute(&global),
        Command::Expand(cmd) => cmd.execute(&global),
        Command::Sources(cmd) => cmd.execute(&global),
        Command::Profiles(cmd) => cmd.execute(&global),
        Command::Keys(cmd) => cmd.execute(&global),
    };

    // Handle errors and set exit code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            if !global.quiet {
                eprintln!("Error: {e}");
            }
            std::process::exit(e.exit_code());
        }
    }
}
