//! Property sources.
//!
//! A property source is a named, read-only key/value lookup. The engine only
//! relies on the [`PropertySource`] contract; this module ships the concrete
//! kinds that callers usually need:
//!
//! - [`MapSource`]: an owned in-memory map
//! - [`SystemEnvironmentSource`]: process environment variables with relaxed
//!   name matching
//! - [`CommandLineSource`]: `--key=value` style arguments
//! - [`file`]: loaders turning YAML, JSON and env files into map sources

pub mod command_line;
pub mod file;
pub mod map;
pub mod system_env;

pub use command_line::CommandLineSource;
pub use map::MapSource;
pub use system_env::SystemEnvironmentSource;

use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// A named key/value lookup.
///
/// Lookups must be pure: calling [`get_property`](Self::get_property) twice
/// with the same key yields the same answer and has no side effects.
///
/// # Examples
///
/// ```
/// use propchain::source::{MapSource, PropertySource};
///
/// let source = MapSource::new("defaults").with("server.port", 8080_i64);
/// assert!(source.contains_property("server.port"));
/// assert_eq!(source.get_property("server.port").unwrap().to_string(), "8080");
/// ```
pub trait PropertySource: Send + Sync {
    /// The name identifying this source inside a chain.
    fn name(&self) -> &str;

    /// Looks up a single key.
    fn get_property(&self, key: &str) -> Option<Value>;

    /// Whether this source defines `key`.
    ///
    /// Overriding is only worthwhile when it is cheaper than a full lookup.
    fn contains_property(&self, key: &str) -> bool {
        self.get_property(key).is_some()
    }

    /// All keys, for sources that can enumerate them.
    fn property_names(&self) -> Option<Vec<String>> {
        None
    }
}

/// Shared handle to a source, as stored in a chain.
pub type SharedSource = Arc<dyn PropertySource>;

impl fmt::Debug for dyn PropertySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySource")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}
