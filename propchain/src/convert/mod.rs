//! Type coercion.
//!
//! Conversion targets form a closed set of [`Shape`]s. The
//! [`ConversionService`] keeps one converter per shape; the built-in ones
//! live in [`converters`] and any of them can be replaced with
//! [`ConversionService::register`]. Typed access goes through [`FromValue`],
//! which names the shape a Rust type is read from.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use propchain::convert::ConversionService;
//! use propchain::Value;
//!
//! let service = ConversionService::new();
//! let timeout: Duration = service.convert_to(&Value::from("1m 30s")).unwrap();
//! assert_eq!(timeout, Duration::from_secs(90));
//!
//! let enabled: bool = service.convert_to(&Value::from("YES")).unwrap();
//! assert!(enabled);
//! ```

pub mod converters;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::value::Value;

/// Target shapes understood by the conversion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Text.
    String,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit float.
    Float,
    /// Boolean.
    Bool,
    /// Span of time.
    Duration,
    /// List of strings.
    StringList,
    /// Flat map of dotted keys to strings.
    Map,
}

impl Shape {
    /// All shapes, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::String,
        Self::Integer,
        Self::Float,
        Self::Bool,
        Self::Duration,
        Self::StringList,
        Self::Map,
    ];

    /// Parses a shape name as printed by [`Display`](fmt::Display).
    ///
    /// # Errors
    ///
    /// Returns an error message if the name is not recognized.
    ///
    /// # Examples
    ///
    /// ```
    /// use propchain::convert::Shape;
    ///
    /// assert_eq!(Shape::parse("Duration").unwrap(), Shape::Duration);
    /// assert_eq!(Shape::parse("string-list").unwrap(), Shape::StringList);
    /// assert!(Shape::parse("decimal").is_err());
    /// ```
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|shape| shape.to_string() == wanted)
            .ok_or_else(|| format!("invalid shape: {s}"))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Bool => write!(f, "bool"),
            Self::Duration => write!(f, "duration"),
            Self::StringList => write!(f, "string-list"),
            Self::Map => write!(f, "map"),
        }
    }
}

/// A converter turns any value into the canonical value of its shape, or
/// explains why it cannot.
pub type Converter = Arc<dyn Fn(&Value) -> std::result::Result<Value, String> + Send + Sync>;

/// Registry of converters keyed by shape.
pub struct ConversionService {
    converters: RwLock<HashMap<Shape, Converter>>,
}

impl Default for ConversionService {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConversionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut shapes: Vec<String> = self
            .converters
            .read()
            .keys()
            .map(ToString::to_string)
            .collect();
        shapes.sort();
        f.debug_struct("ConversionService")
            .field("shapes", &shapes)
            .finish()
    }
}

impl ConversionService {
    /// Creates a service with the built-in converter for every shape.
    #[must_use]
    pub fn new() -> Self {
        let converters: HashMap<Shape, Converter> = HashMap::from([
            (Shape::String, Arc::new(converters::to_string) as Converter),
            (Shape::Integer, Arc::new(converters::to_integer) as Converter),
            (Shape::Float, Arc::new(converters::to_float) as Converter),
            (Shape::Bool, Arc::new(converters::to_bool) as Converter),
            (Shape::Duration, Arc::new(converters::to_duration) as Converter),
            (Shape::StringList, Arc::new(converters::to_string_list) as Converter),
            (Shape::Map, Arc::new(converters::to_map) as Converter),
        ]);
        Self {
            converters: RwLock::new(converters),
        }
    }

    /// Creates a service with no converters at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            converters: RwLock::new(HashMap::new()),
        }
    }

    /// Installs `converter` for `shape`, replacing any previous one.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use propchain::convert::{ConversionService, Shape};
    /// use propchain::Value;
    ///
    /// let service = ConversionService::new();
    /// // Accept "enabled"/"disabled" in addition to nothing else.
    /// service.register(Shape::Bool, Arc::new(|value: &Value| match value.to_string().as_str() {
    ///     "enabled" => Ok(Value::Bool(true)),
    ///     "disabled" => Ok(Value::Bool(false)),
    ///     other => Err(format!("expected enabled/disabled, got {other}")),
    /// }));
    ///
    /// assert_eq!(service.convert_to::<bool>(&Value::from("enabled")).unwrap(), true);
    /// assert!(service.convert_to::<bool>(&Value::from("true")).is_err());
    /// ```
    pub fn register(&self, shape: Shape, converter: Converter) {
        self.converters.write().insert(shape, converter);
    }

    /// Whether a converter is installed for `shape`.
    #[must_use]
    pub fn can_convert(&self, shape: Shape) -> bool {
        self.converters.read().contains_key(&shape)
    }

    /// Converts `value` to `shape`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] if no converter is installed for the
    /// shape or the converter rejects the value.
    pub fn convert(&self, value: &Value, shape: Shape) -> Result<Value> {
        let converter = self.converters.read().get(&shape).cloned();
        let Some(converter) = converter else {
            return Err(conversion_error(value, shape, "no converter registered"));
        };
        converter(value).map_err(|reason| conversion_error(value, shape, reason))
    }

    /// Converts `value` to `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] if conversion to `T::SHAPE` fails or the
    /// converted value does not fit `T`.
    pub fn convert_to<T: FromValue>(&self, value: &Value) -> Result<T> {
        let converted = self.convert(value, T::SHAPE)?;
        T::from_value(converted).map_err(|reason| conversion_error(value, T::SHAPE, reason))
    }
}

fn conversion_error(value: &Value, shape: Shape, reason: impl Into<String>) -> Error {
    Error::Conversion {
        value: value.to_string(),
        shape,
        reason: reason.into(),
    }
}

/// Rust types that can be read out of a converted [`Value`].
pub trait FromValue: Sized {
    /// The shape the value is converted to first.
    const SHAPE: Shape;

    /// Extracts `Self` from a value already converted to [`Self::SHAPE`].
    ///
    /// # Errors
    ///
    /// Returns a reason when the value does not fit, for example an integer
    /// out of range for a narrower type.
    fn from_value(value: Value) -> std::result::Result<Self, String>;
}

fn unexpected(shape: Shape, value: &Value) -> String {
    format!("{shape} converter produced a {} value", value.kind())
}

impl FromValue for String {
    const SHAPE: Shape = Shape::String;

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(unexpected(Self::SHAPE, &other)),
        }
    }
}

impl FromValue for bool {
    const SHAPE: Shape = Shape::Bool;

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(unexpected(Self::SHAPE, &other)),
        }
    }
}

impl FromValue for i64 {
    const SHAPE: Shape = Shape::Integer;

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Integer(n) => Ok(n),
            other => Err(unexpected(Self::SHAPE, &other)),
        }
    }
}

macro_rules! narrow_integer {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                const SHAPE: Shape = Shape::Integer;

                fn from_value(value: Value) -> std::result::Result<Self, String> {
                    let n = i64::from_value(value)?;
                    <$ty>::try_from(n)
                        .map_err(|_| format!("{n} is out of range for {}", stringify!($ty)))
                }
            }
        )*
    };
}

narrow_integer!(i32, u16, u32, u64, usize);

impl FromValue for f64 {
    const SHAPE: Shape = Shape::Float;

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Float(n) => Ok(n),
            other => Err(unexpected(Self::SHAPE, &other)),
        }
    }
}

impl FromValue for Duration {
    const SHAPE: Shape = Shape::Duration;

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Duration(d) => Ok(d),
            other => Err(unexpected(Self::SHAPE, &other)),
        }
    }
}

impl FromValue for Vec<String> {
    const SHAPE: Shape = Shape::StringList;

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::List(items) => Ok(items.iter().map(ToString::to_string).collect()),
            other => Err(unexpected(Self::SHAPE, &other)),
        }
    }
}

impl FromValue for BTreeMap<String, String> {
    const SHAPE: Shape = Shape::Map;

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Map(entries) => Ok(entries
                .into_iter()
                .map(|(k, v)| (k, v.to_string()))
                .collect()),
            other => Err(unexpected(Self::SHAPE, &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_display_round_trips_through_parse() {
        for shape in Shape::ALL {
            assert_eq!(Shape::parse(&shape.to_string()).unwrap(), shape);
        }
    }

    #[test]
    fn test_narrowing_refuses_to_truncate() {
        let service = ConversionService::new();
        let err = service.convert_to::<u16>(&Value::from("70000")).unwrap_err();
        match err {
            Error::Conversion { value, shape, reason } => {
                assert_eq!(value, "70000");
                assert_eq!(shape, Shape::Integer);
                assert!(reason.contains("out of range for u16"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(service.convert_to::<u16>(&Value::from("8080")).unwrap(), 8080);
    }

    #[test]
    fn test_negative_into_unsigned() {
        let service = ConversionService::new();
        assert!(service.convert_to::<u64>(&Value::Integer(-1)).is_err());
        assert_eq!(service.convert_to::<i32>(&Value::Integer(-1)).unwrap(), -1);
    }

    #[test]
    fn test_missing_converter() {
        let service = ConversionService::empty();
        assert!(!service.can_convert(Shape::String));
        let err = service.convert(&Value::from("x"), Shape::String).unwrap_err();
        assert!(format!("{err}").contains("no converter registered"));
    }

    #[test]
    fn test_register_replaces_builtin() {
        let service = ConversionService::new();
        service.register(
            Shape::Integer,
            Arc::new(|value: &Value| {
                value
                    .to_string()
                    .replace('_', "")
                    .parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|e| e.to_string())
            }),
        );
        assert_eq!(service.convert_to::<i64>(&Value::from("1_000")).unwrap(), 1000);
    }

    #[test]
    fn test_converter_returning_wrong_variant() {
        let service = ConversionService::new();
        service.register(Shape::Bool, Arc::new(|_: &Value| Ok(Value::from("nope"))));
        let err = service.convert_to::<bool>(&Value::from("true")).unwrap_err();
        assert!(err.is_conversion());
    }

    #[test]
    fn test_typed_collections() {
        let service = ConversionService::new();
        let list: Vec<String> = service.convert_to(&Value::from("a, b,,c")).unwrap();
        assert_eq!(list, vec!["a", "b", "c"]);

        let mut inner = BTreeMap::new();
        inner.insert("port".to_string(), Value::Integer(1));
        let mut outer = BTreeMap::new();
        outer.insert("server".to_string(), Value::Map(inner));
        let map: BTreeMap<String, String> = service.convert_to(&Value::Map(outer)).unwrap();
        assert_eq!(map["server.port"], "1");
    }
}
