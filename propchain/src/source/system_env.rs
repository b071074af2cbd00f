//! Process environment source.
//!
//! Environment variable names rarely allow `.` or `-`, so lookups are
//! relaxed: `server.port` also matches `server_port`, `SERVER_PORT` and the
//! other combinations produced by [`candidate_names`].

use std::collections::BTreeMap;
use std::env;

use super::PropertySource;
use crate::value::Value;

/// Conventional name of the system environment source.
pub const SYSTEM_ENVIRONMENT_SOURCE_NAME: &str = "systemEnvironment";

/// A snapshot of environment variables with relaxed key matching.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use propchain::source::{PropertySource, SystemEnvironmentSource};
///
/// let mut vars = BTreeMap::new();
/// vars.insert("SERVER_PORT".to_string(), "9000".to_string());
/// let source = SystemEnvironmentSource::from_vars("env", vars);
///
/// assert!(source.contains_property("server.port"));
/// assert!(source.contains_property("server-port"));
/// assert!(!source.contains_property("server.host"));
/// ```
#[derive(Debug, Clone)]
pub struct SystemEnvironmentSource {
    name: String,
    vars: BTreeMap<String, String>,
}

impl SystemEnvironmentSource {
    /// Snapshots the current process environment.
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    #[must_use]
    pub fn from_process() -> Self {
        let vars: BTreeMap<String, String> = env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        log::debug!("captured {} environment variables", vars.len());
        Self::from_vars(SYSTEM_ENVIRONMENT_SOURCE_NAME, vars)
    }

    /// Builds a source from an explicit variable map.
    #[must_use]
    pub fn from_vars(name: impl Into<String>, vars: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            vars,
        }
    }

    fn resolve_name(&self, key: &str) -> Option<&String> {
        candidate_names(key)
            .into_iter()
            .find_map(|candidate| self.vars.get(&candidate))
    }
}

/// The variable names tried for `key`, in lookup order.
///
/// # Examples
///
/// ```
/// use propchain::source::system_env::candidate_names;
///
/// assert_eq!(
///     candidate_names("a.b-c"),
///     vec!["a.b-c", "a_b-c", "a.b_c", "a_b_c", "A.B-C", "A_B-C", "A.B_C", "A_B_C"]
/// );
/// ```
#[must_use]
pub fn candidate_names(key: &str) -> Vec<String> {
    let mut names = Vec::with_capacity(8);
    for base in [key.to_string(), key.to_uppercase()] {
        for name in [
            base.clone(),
            base.replace('.', "_"),
            base.replace('-', "_"),
            base.replace(['.', '-'], "_"),
        ] {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

impl PropertySource for SystemEnvironmentSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_property(&self, key: &str) -> Option<Value> {
        let value = self.resolve_name(key).cloned().map(Value::String);
        if value.is_some() {
            log::trace!("environment variable matched for '{key}'");
        }
        value
    }

    fn contains_property(&self, key: &str) -> bool {
        self.resolve_name(key).is_some()
    }

    fn property_names(&self) -> Option<Vec<String>> {
        Some(self.vars.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn source(pairs: &[(&str, &str)]) -> SystemEnvironmentSource {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        SystemEnvironmentSource::from_vars("env", vars)
    }

    #[test]
    fn test_exact_name_wins_over_relaxed() {
        let source = source(&[("db.url", "exact"), ("DB_URL", "upper")]);
        assert_eq!(source.get_property("db.url"), Some(Value::from("exact")));
    }

    #[test]
    fn test_uppercase_underscore_match() {
        let source = source(&[("DB_URL", "upper")]);
        assert_eq!(source.get_property("db.url"), Some(Value::from("upper")));
        assert_eq!(source.get_property("DB_URL"), Some(Value::from("upper")));
    }

    #[test]
    fn test_candidates_deduplicated() {
        assert_eq!(candidate_names("PATH"), vec!["PATH"]);
    }

    #[test]
    #[serial]
    fn test_from_process_sees_variables() {
        env::set_var("PROPCHAIN_TEST_SYSENV_VALUE", "present");
        let source = SystemEnvironmentSource::from_process();
        env::remove_var("PROPCHAIN_TEST_SYSENV_VALUE");

        assert_eq!(source.name(), SYSTEM_ENVIRONMENT_SOURCE_NAME);
        assert_eq!(
            source.get_property("propchain.test.sysenv.value"),
            Some(Value::from("present"))
        );
    }
}
