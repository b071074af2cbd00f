//! Library exports for propchain-cli.
//!
//! The binary in `main.rs` is a thin wrapper around these modules; keeping
//! them in a library lets the unit tests reach the argument parsing and
//! environment construction directly.

pub mod cli;
pub mod commands;
pub mod error;
pub mod utils;

pub use cli::Cli;
