//! Error types for the propchain library.
//!
//! This module provides the error hierarchy shared by every component of the
//! resolution engine, using `thiserror` for ergonomic error handling.

use std::path::PathBuf;

use thiserror::Error;

use crate::convert::Shape;
use crate::profiles::ProfileParseError;

/// Result type alias for operations that may fail with a propchain error.
///
/// # Examples
///
/// ```
/// use propchain::{Error, Result};
///
/// fn lookup_port() -> Result<u16> {
///     Ok(8080)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the propchain library.
///
/// Every failure is surfaced synchronously to the immediate caller; the
/// engine never retries and never returns a partial result.
#[derive(Debug, Error)]
pub enum Error {
    /// No source in the chain defines the requested key.
    #[error("required property '{key}' not found")]
    PropertyNotFound {
        /// The key that was looked up.
        key: String,
    },

    /// A chain operation referenced a source name that is not registered.
    #[error("property source '{name}' not found{}", format_suggestions(suggestions))]
    SourceNotFound {
        /// The missing source name.
        name: String,
        /// Registered source names that look similar.
        suggestions: Vec<String>,
    },

    /// An argument was rejected (invalid profile label, self-relative insertion).
    #[error("illegal argument: {reason}")]
    IllegalArgument {
        /// Why the argument was rejected.
        reason: String,
    },

    /// A value exists but cannot be converted to the requested shape.
    #[error("cannot convert '{value}' to {shape}: {reason}")]
    Conversion {
        /// Textual rendering of the offending value.
        value: String,
        /// The requested target shape.
        shape: Shape,
        /// The converter's explanation.
        reason: String,
    },

    /// Strict expansion hit a placeholder with no value and no fallback.
    #[error("could not resolve placeholder '{placeholder}' in value \"{text}\"")]
    UnresolvablePlaceholder {
        /// The placeholder key.
        placeholder: String,
        /// The text being expanded when the failure occurred.
        text: String,
    },

    /// Expansion re-entered a key that is still being expanded.
    #[error("circular placeholder reference '{key}'")]
    CircularReference {
        /// The key that closed the cycle.
        key: String,
    },

    /// A profile expression could not be parsed.
    #[error("malformed profile expression: {0}")]
    ProfileParse(#[from] ProfileParseError),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML document could not be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON document could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration file could not be turned into a source.
    #[error("cannot load {}: {reason}", path.display())]
    FileLoad {
        /// The file being loaded.
        path: PathBuf,
        /// Why loading failed.
        reason: String,
    },
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}

impl Error {
    /// Check if the error means a key or source was absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use propchain::Error;
    ///
    /// let err = Error::PropertyNotFound { key: "server.port".into() };
    /// assert!(err.is_not_found());
    /// ```
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::PropertyNotFound { .. } | Self::SourceNotFound { .. }
        )
    }

    /// Check if the error is a conversion failure.
    #[must_use]
    pub fn is_conversion(&self) -> bool {
        matches!(self, Self::Conversion { .. })
    }

    pub(crate) fn illegal(reason: impl Into<String>) -> Self {
        Self::IllegalArgument {
            reason: reason.into(),
        }
    }
}
