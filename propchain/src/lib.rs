#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # propchain
//!
//! Layered property resolution.
//!
//! An [`Environment`] answers "what is the effective value of this key" over
//! an ordered chain of named property sources: maps, the process
//! environment, command-line arguments and YAML/JSON/`.env` files. Values
//! may reference other keys with `#{key}` or `#{key:fallback}`; references
//! are expanded recursively, with cycle detection. The result can be
//! converted to strings, integers, floats, booleans, durations, lists and
//! flat maps.
//!
//! The same environment tracks active and default profiles and evaluates
//! profile expressions such as `dev & !test` or `(a | b) & !c`.
//!
//! ## Core Types
//!
//! - [`Environment`] and [`EnvironmentBuilder`]: resolution and profile state
//! - [`SourceChain`] and [`PropertySource`]: the ordered sources
//! - [`PlaceholderExpander`]: placeholder syntax and expansion
//! - [`ConversionService`]: conversion to target [`Shape`]s
//! - [`Profiles`]: parsed profile expressions
//! - [`Error`] and [`Result`]: error handling types
//! - [`Logger`] and [`LogLevel`]: logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use std::sync::Arc;
//! use propchain::source::MapSource;
//! use propchain::Environment;
//!
//! let env = Environment::builder()
//!     .without_system_environment()
//!     .with_source(Arc::new(MapSource::new("site").with("domain", "example.com")))
//!     .with_default("host", "api.#{domain}")
//!     .with_default("timeout", "30s")
//!     .with_active_profiles(["prod"])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(env.get_required("host").unwrap(), "api.example.com");
//! assert_eq!(
//!     env.get_as::<std::time::Duration>("timeout").unwrap(),
//!     Some(std::time::Duration::from_secs(30))
//! );
//! assert!(env.accepts(&["prod & !test"]).unwrap());
//! ```

pub mod chain;
pub mod convert;
pub mod environment;
pub mod error;
pub mod logging;
pub mod placeholder;
pub mod profiles;
pub mod source;
pub mod value;

// Re-export key types at crate root for convenience
pub use chain::{OrderRule, SourceChain};
pub use convert::{ConversionService, FromValue, Shape};
pub use environment::{Environment, EnvironmentBuilder};
pub use error::{Error, Result};
pub use logging::{init_logger, LogLevel, Logger};
pub use placeholder::{Mode, PlaceholderExpander};
pub use profiles::{ProfileExpr, ProfileParseError, Profiles};
pub use source::{PropertySource, SharedSource};
pub use value::Value;
