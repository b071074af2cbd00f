//! In-memory map source.

use std::collections::BTreeMap;

use super::PropertySource;
use crate::value::Value;

/// A property source backed by an owned map.
///
/// # Examples
///
/// ```
/// use propchain::source::{MapSource, PropertySource};
///
/// let source = MapSource::new("overrides")
///     .with("app.name", "demo")
///     .with("app.debug", true);
///
/// assert_eq!(source.name(), "overrides");
/// assert_eq!(source.property_names().unwrap(), vec!["app.debug", "app.name"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    name: String,
    entries: BTreeMap<String, Value>,
}

impl MapSource {
    /// Creates an empty map source.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Creates a map source from existing entries.
    #[must_use]
    pub fn from_map(name: impl Into<String>, entries: BTreeMap<String, Value>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    /// Adds an entry, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Adds or replaces an entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the source has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PropertySource for MapSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_property(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn contains_property(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn property_names(&self) -> Option<Vec<String>> {
        Some(self.entries.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let source = MapSource::new("m").with("a", "1");
        assert_eq!(source.get_property("a"), Some(Value::from("1")));
        assert_eq!(source.get_property("b"), None);
    }

    #[test]
    fn test_empty_value_is_still_contained() {
        let source = MapSource::new("m").with("blank", "");
        assert!(source.contains_property("blank"));
    }

    #[test]
    fn test_insert_replaces() {
        let mut source = MapSource::new("m").with("a", "1");
        source.insert("a", "2");
        assert_eq!(source.len(), 1);
        assert_eq!(source.get_property("a"), Some(Value::from("2")));
    }
}
