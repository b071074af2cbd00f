//! Builder for layered environments.
//!
//! Sources end up in the chain in this order, highest precedence first:
//!
//! 1. programmatic overrides ([`with_override`](EnvironmentBuilder::with_override))
//! 2. command-line arguments ([`with_args`](EnvironmentBuilder::with_args))
//! 3. explicit sources, in the order they were added
//! 4. the system environment, unless skipped or suppressed through
//!    [`IGNORE_GETENV_KEY`]
//! 5. files; a later file wins over an earlier one
//! 6. defaults ([`with_default`](EnvironmentBuilder::with_default))

use std::path::PathBuf;
use std::sync::Arc;

use crate::convert::converters;
use crate::environment::{Environment, IGNORE_GETENV_KEY};
use crate::error::Result;
use crate::placeholder::PlaceholderExpander;
use crate::source::{file, CommandLineSource, MapSource, SharedSource, SystemEnvironmentSource};
use crate::value::Value;

/// Name of the source holding programmatic overrides.
pub const OVERRIDES_SOURCE_NAME: &str = "overrides";

/// Name of the source holding defaults.
pub const DEFAULTS_SOURCE_NAME: &str = "defaults";

/// Builder for an [`Environment`].
///
/// # Examples
///
/// ```
/// use propchain::Environment;
///
/// let env = Environment::builder()
///     .without_system_environment()
///     .with_default("server.port", "8080")
///     .with_args(["--server.port=9090", "input.txt"])
///     .build()
///     .unwrap();
///
/// assert_eq!(env.get_as::<u16>("server.port").unwrap(), Some(9090));
/// assert_eq!(env.get("nonOptionArgs").unwrap().as_deref(), Some("input.txt"));
/// ```
#[derive(Debug)]
pub struct EnvironmentBuilder {
    overrides: MapSource,
    args: Option<Vec<String>>,
    sources: Vec<SharedSource>,
    system_env: SystemEnv,
    files: Vec<PathBuf>,
    defaults: MapSource,
    expander: Option<PlaceholderExpander>,
    ignore_unresolvable: bool,
    active_profiles: Option<Vec<String>>,
    default_profiles: Option<Vec<String>>,
}

impl Default for EnvironmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
enum SystemEnv {
    Process,
    Explicit(SystemEnvironmentSource),
    Skipped,
}

impl EnvironmentBuilder {
    /// Creates a builder that includes the process environment and nothing
    /// else.
    #[must_use]
    pub fn new() -> Self {
        Self {
            overrides: MapSource::new(OVERRIDES_SOURCE_NAME),
            args: None,
            sources: Vec::new(),
            system_env: SystemEnv::Process,
            files: Vec::new(),
            defaults: MapSource::new(DEFAULTS_SOURCE_NAME),
            expander: None,
            ignore_unresolvable: false,
            active_profiles: None,
            default_profiles: None,
        }
    }

    /// Sets a value that beats every other source.
    #[must_use]
    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.insert(key, value);
        self
    }

    /// Sets a value that every other source beats.
    #[must_use]
    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(key, value);
        self
    }

    /// Adds command-line arguments, without the program name.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args
            .get_or_insert_with(Vec::new)
            .extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds a source below the command line and above the system
    /// environment.
    #[must_use]
    pub fn with_source(mut self, source: SharedSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Adds a YAML, JSON or `.env` file. Files are read by
    /// [`build`](Self::build).
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Leaves the system environment out of the chain.
    #[must_use]
    pub fn without_system_environment(mut self) -> Self {
        self.system_env = SystemEnv::Skipped;
        self
    }

    /// Uses `source` in place of the process environment.
    #[must_use]
    pub fn with_system_environment(mut self, source: SystemEnvironmentSource) -> Self {
        self.system_env = SystemEnv::Explicit(source);
        self
    }

    /// Uses a custom placeholder syntax.
    #[must_use]
    pub fn with_expander(mut self, expander: PlaceholderExpander) -> Self {
        self.expander = Some(expander);
        self
    }

    /// Leaves unresolvable placeholders in values instead of failing.
    #[must_use]
    pub fn ignore_unresolvable_nested_placeholders(mut self, ignore: bool) -> Self {
        self.ignore_unresolvable = ignore;
        self
    }

    /// Sets the active profiles.
    #[must_use]
    pub fn with_active_profiles<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_profiles = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the default profiles.
    #[must_use]
    pub fn with_default_profiles<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_profiles = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    /// Loads files, parses arguments and assembles the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be loaded, the arguments are
    /// malformed, or a profile label is invalid.
    pub fn build(self) -> Result<Environment> {
        let mut chain: Vec<SharedSource> = Vec::new();

        if !self.overrides.is_empty() {
            chain.push(Arc::new(self.overrides));
        }
        if let Some(args) = self.args {
            chain.push(Arc::new(CommandLineSource::parse(args)?));
        }
        chain.extend(self.sources);

        let system_env = match self.system_env {
            _ if suppresses_getenv(&chain) => {
                log::debug!("'{IGNORE_GETENV_KEY}' is set; skipping system environment");
                None
            }
            SystemEnv::Process => Some(SystemEnvironmentSource::from_process()),
            SystemEnv::Explicit(source) => Some(source),
            SystemEnv::Skipped => None,
        };
        if let Some(source) = system_env {
            chain.push(Arc::new(source));
        }

        for path in self.files.iter().rev() {
            let source = file::load_file(path)?;
            log::debug!("loaded {} properties from {}", source.len(), path.display());
            chain.push(Arc::new(source));
        }

        if !self.defaults.is_empty() {
            chain.push(Arc::new(self.defaults));
        }

        let mut env = Environment::new();
        if let Some(expander) = self.expander {
            env = env.with_expander(expander);
        }
        for source in chain {
            env.sources().add_last(source);
        }
        env.set_ignore_unresolvable_nested_placeholders(self.ignore_unresolvable);

        if let Some(labels) = self.active_profiles {
            env.set_active_profiles(labels)?;
        }
        if let Some(labels) = self.default_profiles {
            env.set_default_profiles(labels)?;
        }

        log::debug!("environment built with sources {:?}", env.sources().names());
        Ok(env)
    }
}

/// Whether a source above the system environment sets
/// [`IGNORE_GETENV_KEY`] to a truthy value.
fn suppresses_getenv(sources: &[SharedSource]) -> bool {
    sources
        .iter()
        .find_map(|source| source.get_property(IGNORE_GETENV_KEY))
        .is_some_and(|value| matches!(converters::to_bool(&value), Ok(Value::Bool(true))))
}
