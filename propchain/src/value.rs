//! The value model carried by property sources.
//!
//! Sources hand out [`Value`]s; text values are subject to placeholder
//! expansion, every value can be rendered as text for substitution, and the
//! conversion service turns values into the shapes callers ask for.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// A property value.
///
/// # Examples
///
/// ```
/// use propchain::Value;
///
/// let port = Value::from(8080_i64);
/// assert_eq!(port.to_string(), "8080");
///
/// let hosts = Value::List(vec![Value::from("a"), Value::from("b")]);
/// assert_eq!(hosts.to_string(), "a,b");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Free text, subject to placeholder expansion.
    String(String),
    /// A signed integer.
    Integer(i64),
    /// A floating point number.
    Float(f64),
    /// A boolean.
    Bool(bool),
    /// A span of time.
    Duration(Duration),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A nested map of values.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the text if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the variant, used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Duration(_) => "duration",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Flattens nested maps and lists into dotted keys.
    ///
    /// Map entries become `prefix.key`, list entries `prefix[i]`. Scalars are
    /// stored under `prefix` itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use propchain::Value;
    ///
    /// let mut db = BTreeMap::new();
    /// db.insert("host".to_string(), Value::from("localhost"));
    /// db.insert("replicas".to_string(), Value::List(vec![Value::from("r1")]));
    /// let mut root = BTreeMap::new();
    /// root.insert("db".to_string(), Value::Map(db));
    ///
    /// let flat = Value::Map(root).flatten();
    /// assert_eq!(flat["db.host"], Value::from("localhost"));
    /// assert_eq!(flat["db.replicas[0]"], Value::from("r1"));
    /// ```
    #[must_use]
    pub fn flatten(&self) -> BTreeMap<String, Value> {
        let mut out = BTreeMap::new();
        flatten_into(&mut out, "", self);
        out
    }
}

// Empty nested maps become an empty string and empty nested lists stay as
// they are, so the key is still defined.
fn flatten_into(out: &mut BTreeMap<String, Value>, prefix: &str, value: &Value) {
    match value {
        Value::Map(entries) if entries.is_empty() && !prefix.is_empty() => {
            out.insert(prefix.to_string(), Value::String(String::new()));
        }
        Value::Map(entries) => {
            for (key, child) in entries {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(out, &path, child);
            }
        }
        Value::List(items) if !prefix.is_empty() && !items.is_empty() => {
            for (idx, child) in items.iter().enumerate() {
                flatten_into(out, &format!("{prefix}[{idx}]"), child);
            }
        }
        other => {
            out.insert(prefix.to_string(), other.clone());
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Duration(d) => write!(f, "{}", humantime::format_duration(*d)),
            Self::List(items) => {
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (idx, (key, item)) in entries.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}={item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Duration> for Value {
    fn from(value: Duration) -> Self {
        Self::Duration(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value as Yaml;

        match value {
            Yaml::Null => Self::String(String::new()),
            Yaml::Bool(b) => Self::Bool(b),
            Yaml::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    Self::Float(f)
                } else {
                    Self::String(n.to_string())
                }
            }
            Yaml::String(s) => Self::String(s),
            Yaml::Sequence(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Yaml::Mapping(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (yaml_key(k), Self::from(v)))
                    .collect(),
            ),
            Yaml::Tagged(tagged) => Self::from(tagged.value),
        }
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        other => Value::from(other).to_string(),
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match value {
            Json::Null => Self::String(String::new()),
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    Self::Float(f)
                } else {
                    Self::String(n.to_string())
                }
            }
            Json::String(s) => Self::String(s),
            Json::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Json::Object(entries) => {
                Self::Map(entries.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}
