//! Command-line argument source.
//!
//! Arguments are split the simple way:
//!
//! - `--key=value` defines `key` with `value`
//! - `--flag` defines `flag` with an empty value
//! - repeated options accumulate, joined with `,`
//! - anything else is positional, as is everything after a bare `--`
//!
//! Positional arguments are exposed under one synthetic key
//! ([`DEFAULT_NON_OPTION_ARGS_KEY`] unless configured otherwise).

use std::collections::BTreeMap;

use super::PropertySource;
use crate::error::{Error, Result};
use crate::value::Value;

/// Conventional name of the command-line source.
pub const COMMAND_LINE_SOURCE_NAME: &str = "commandLineArgs";

/// Default key under which positional arguments are exposed.
pub const DEFAULT_NON_OPTION_ARGS_KEY: &str = "nonOptionArgs";

/// A property source built from command-line arguments.
///
/// # Examples
///
/// ```
/// use propchain::source::{CommandLineSource, PropertySource};
///
/// let source = CommandLineSource::parse(["--server.port=9000", "--debug", "input.txt"]).unwrap();
///
/// assert_eq!(source.get_property("server.port").unwrap().to_string(), "9000");
/// assert_eq!(source.get_property("debug").unwrap().to_string(), "");
/// assert_eq!(source.get_property("nonOptionArgs").unwrap().to_string(), "input.txt");
/// ```
#[derive(Debug, Clone)]
pub struct CommandLineSource {
    name: String,
    options: BTreeMap<String, Vec<String>>,
    non_option_args: Vec<String>,
    non_option_args_key: String,
}

impl CommandLineSource {
    /// Parses arguments into a source named [`COMMAND_LINE_SOURCE_NAME`].
    ///
    /// The program name must not be included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] for options with an empty name such
    /// as `--=value`.
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut non_option_args = Vec::new();
        let mut end_of_options = false;

        for arg in args {
            let arg = arg.as_ref();
            if end_of_options {
                non_option_args.push(arg.to_string());
                continue;
            }
            if arg == "--" {
                end_of_options = true;
                continue;
            }
            let Some(option) = arg.strip_prefix("--") else {
                non_option_args.push(arg.to_string());
                continue;
            };

            let (name, value) = match option.split_once('=') {
                Some((name, value)) => (name, value),
                None => (option, ""),
            };
            if name.is_empty() {
                return Err(Error::illegal(format!("invalid argument syntax: {arg}")));
            }
            options
                .entry(name.to_string())
                .or_default()
                .push(value.to_string());
        }

        Ok(Self {
            name: COMMAND_LINE_SOURCE_NAME.to_string(),
            options,
            non_option_args,
            non_option_args_key: DEFAULT_NON_OPTION_ARGS_KEY.to_string(),
        })
    }

    /// Renames the source.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Changes the synthetic key exposing positional arguments.
    #[must_use]
    pub fn with_non_option_args_key(mut self, key: impl Into<String>) -> Self {
        self.non_option_args_key = key.into();
        self
    }

    /// Positional arguments in the order given.
    #[must_use]
    pub fn non_option_args(&self) -> &[String] {
        &self.non_option_args
    }

    /// All values given for an option, in order.
    #[must_use]
    pub fn option_values(&self, name: &str) -> Option<&[String]> {
        self.options.get(name).map(Vec::as_slice)
    }
}

impl PropertySource for CommandLineSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_property(&self, key: &str) -> Option<Value> {
        if key == self.non_option_args_key {
            if self.non_option_args.is_empty() {
                return None;
            }
            return Some(Value::String(self.non_option_args.join(",")));
        }
        self.options
            .get(key)
            .map(|values| Value::String(values.join(",")))
    }

    fn property_names(&self) -> Option<Vec<String>> {
        let mut names: Vec<String> = self.options.keys().cloned().collect();
        if !self.non_option_args.is_empty() {
            names.push(self.non_option_args_key.clone());
        }
        Some(names)
    }
}
