//! Recursive placeholder expansion.
//!
//! A placeholder is a span `prefix key [separator fallback] suffix`, by
//! default `#{key:fallback}`. Expansion scans text left to right and, for
//! each placeholder:
//!
//! 1. finds the matching suffix, skipping over nested placeholders;
//! 2. splits the content on the first top-level separator;
//! 3. expands the key itself, since it may contain placeholders;
//! 4. looks the key up and expands the value found, or expands the fallback,
//!    or (when neither exists) keeps the span verbatim in
//!    [`Mode::Permissive`] and fails in [`Mode::Strict`].
//!
//! Keys currently being expanded are tracked per top-level call; meeting one
//! again is reported as [`Error::CircularReference`].
//!
//! An escape character (default `\`) directly before a prefix keeps that
//! placeholder literally, minus the escape; a doubled escape yields one
//! literal escape followed by the expanded placeholder. Directly before a
//! separator it makes the separator part of the key. Anywhere else the
//! escape is an ordinary character.
//!
//! # Examples
//!
//! ```
//! use std::collections::HashMap;
//! use propchain::placeholder::{Mode, PlaceholderExpander};
//!
//! let values = HashMap::from([("host", "db.local"), ("url", "jdbc://#{host}:#{port:5432}")]);
//! let lookup = |key: &str| values.get(key).map(|v| v.to_string());
//!
//! let expander = PlaceholderExpander::default();
//! let expanded = expander.replace_placeholders("#{url}", Mode::Strict, lookup).unwrap();
//! assert_eq!(expanded, "jdbc://db.local:5432");
//! ```

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

use std::collections::HashSet;

use crate::error::{Error, Result};

/// Default placeholder prefix.
pub const DEFAULT_PREFIX: &str = "#{";

/// Default placeholder suffix.
pub const DEFAULT_SUFFIX: &str = "}";

/// Default separator between key and fallback.
pub const DEFAULT_SEPARATOR: &str = ":";

/// Default escape character.
pub const DEFAULT_ESCAPE: char = '\\';

/// What to do with a placeholder that has neither a value nor a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Fail with [`Error::UnresolvablePlaceholder`].
    Strict,
    /// Leave the placeholder text untouched.
    Permissive,
}

/// Key lookup used during expansion.
///
/// The scope records where a piece of text came from. It is handed back with
/// every lookup so the implementation can restrict which values a
/// placeholder may see; `has_fallback` tells it whether the placeholder
/// declares a fallback of its own.
pub trait ScopedLookup {
    /// Origin marker for a piece of text.
    type Scope: Clone;

    /// Looks up `key` for a placeholder found in text from `scope`.
    ///
    /// Returns the raw value and the scope it came from.
    fn lookup(&self, key: &str, scope: &Self::Scope, has_fallback: bool)
        -> Option<(String, Self::Scope)>;
}

/// Adapts a plain `key -> value` function to [`ScopedLookup`].
struct FnLookup<F>(F);

impl<F> ScopedLookup for FnLookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    type Scope = ();

    fn lookup(&self, key: &str, _scope: &(), _has_fallback: bool) -> Option<(String, ())> {
        (self.0)(key).map(|value| (value, ()))
    }
}

/// Placeholder syntax and the expansion algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderExpander {
    prefix: String,
    suffix: String,
    nesting_prefix: String,
    separator: Option<String>,
    escape: Option<char>,
}

impl Default for PlaceholderExpander {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, DEFAULT_SUFFIX)
            .with_separator(Some(DEFAULT_SEPARATOR))
            .with_escape(Some(DEFAULT_ESCAPE))
    }
}

impl PlaceholderExpander {
    /// Creates an expander for `prefix`/`suffix` with no separator and no
    /// escape character.
    ///
    /// # Panics
    ///
    /// Panics if `prefix` or `suffix` is empty.
    #[must_use]
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let suffix = suffix.into();
        assert!(
            !prefix.is_empty() && !suffix.is_empty(),
            "placeholder prefix and suffix must not be empty"
        );
        let nesting_prefix = nesting_prefix(&prefix, &suffix);
        Self {
            prefix,
            suffix,
            nesting_prefix,
            separator: None,
            escape: None,
        }
    }

    /// Sets the key/fallback separator; `None` disables fallbacks.
    #[must_use]
    pub fn with_separator(mut self, separator: Option<&str>) -> Self {
        self.separator = separator.filter(|s| !s.is_empty()).map(str::to_string);
        self
    }

    /// Sets the escape character; `None` disables escaping.
    #[must_use]
    pub fn with_escape(mut self, escape: Option<char>) -> Self {
        self.escape = escape;
        self
    }

    /// The placeholder prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The placeholder suffix.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Expands `text` using a plain lookup function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CircularReference`] on cycles, and in
    /// [`Mode::Strict`] [`Error::UnresolvablePlaceholder`] for placeholders
    /// with neither value nor fallback.
    pub fn replace_placeholders<F>(&self, text: &str, mode: Mode, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.replace_placeholders_scoped(text, mode, &FnLookup(lookup), &())
    }

    /// Expands `text`, which originates from `scope`.
    ///
    /// # Errors
    ///
    /// Same as [`replace_placeholders`](Self::replace_placeholders).
    pub fn replace_placeholders_scoped<L>(
        &self,
        text: &str,
        mode: Mode,
        lookup: &L,
        scope: &L::Scope,
    ) -> Result<String>
    where
        L: ScopedLookup,
    {
        let mut expansion = Expansion {
            syntax: self,
            lookup,
            mode,
            root: text,
            visiting: HashSet::new(),
        };
        expansion.expand(text, scope)
    }

    /// Finds the suffix closing the placeholder whose content starts at
    /// `from`, skipping nested placeholders.
    ///
    /// An escape only matters before a prefix or a separator; before
    /// anything else, the suffix included, it is an ordinary character.
    fn find_end(&self, text: &str, from: usize) -> Option<usize> {
        let mut idx = from;
        let mut nested = 0usize;
        while idx < text.len() {
            let rest = &text[idx..];
            if let Some(escape) = self.escape {
                if let Some(after) = rest.strip_prefix(escape) {
                    if after.starts_with(&self.prefix)
                        || self.separator.as_deref().is_some_and(|sep| after.starts_with(sep))
                    {
                        idx += escape.len_utf8();
                        idx += after.chars().next()?.len_utf8();
                        continue;
                    }
                }
            }
            if rest.starts_with(&self.suffix) {
                if nested == 0 {
                    return Some(idx);
                }
                nested -= 1;
                idx += self.suffix.len();
            } else if rest.starts_with(&self.nesting_prefix) {
                nested += 1;
                idx += self.nesting_prefix.len();
            } else {
                idx += rest.chars().next()?.len_utf8();
            }
        }
        None
    }

    /// Splits placeholder content into key and fallback at the first
    /// top-level separator.
    fn split<'t>(&self, content: &'t str) -> (String, Option<&'t str>) {
        let Some(separator) = self.separator.as_deref() else {
            return (content.to_string(), None);
        };

        let mut key = String::with_capacity(content.len());
        let mut idx = 0;
        while idx < content.len() {
            let rest = &content[idx..];
            if let Some(escape) = self.escape {
                if rest.starts_with(escape) && rest[escape.len_utf8()..].starts_with(separator) {
                    key.push_str(separator);
                    idx += escape.len_utf8() + separator.len();
                    continue;
                }
            }
            if rest.starts_with(&self.prefix) {
                if let Some(end) = self.find_end(content, idx + self.prefix.len()) {
                    let next = end + self.suffix.len();
                    key.push_str(&content[idx..next]);
                    idx = next;
                    continue;
                }
            }
            if rest.starts_with(separator) {
                return (key, Some(&content[idx + separator.len()..]));
            }
            let Some(ch) = rest.chars().next() else { break };
            key.push(ch);
            idx += ch.len_utf8();
        }
        (key, None)
    }
}

/// The opener tracked for nesting: `{` for `#{...}`, `(` for `$(...)` and so
/// on, otherwise the full prefix.
fn nesting_prefix(prefix: &str, suffix: &str) -> String {
    let simple = match suffix {
        "}" => "{",
        "]" => "[",
        ")" => "(",
        _ => return prefix.to_string(),
    };
    if prefix.ends_with(simple) {
        simple.to_string()
    } else {
        prefix.to_string()
    }
}

/// State of one top-level expansion call.
struct Expansion<'a, L: ScopedLookup> {
    syntax: &'a PlaceholderExpander,
    lookup: &'a L,
    mode: Mode,
    root: &'a str,
    visiting: HashSet<String>,
}

impl<L: ScopedLookup> Expansion<'_, L> {
    fn expand(&mut self, text: &str, scope: &L::Scope) -> Result<String> {
        let syntax = self.syntax;
        let mut out = String::with_capacity(text.len());
        let mut pos = 0;

        while let Some(found) = text[pos..].find(&syntax.prefix) {
            let start = pos + found;
            let content_start = start + syntax.prefix.len();

            // A run of escapes before the prefix collapses in pairs; an odd
            // one left over keeps the placeholder literal.
            if let Some(escape) = syntax.escape {
                let run = text[pos..start]
                    .chars()
                    .rev()
                    .take_while(|c| *c == escape)
                    .count();
                if run > 0 {
                    out.push_str(&text[pos..start - run * escape.len_utf8()]);
                    out.extend(std::iter::repeat(escape).take(run / 2));
                    pos = start;
                    if run % 2 == 1 {
                        let literal_end = syntax
                            .find_end(text, content_start)
                            .map_or(content_start, |end| end + syntax.suffix.len());
                        out.push_str(&text[start..literal_end]);
                        pos = literal_end;
                        continue;
                    }
                }
            }

            // Unterminated: keep the prefix and carry on scanning after it.
            let Some(end) = syntax.find_end(text, content_start) else {
                out.push_str(&text[pos..content_start]);
                pos = content_start;
                continue;
            };
            out.push_str(&text[pos..start]);
            let next = end + syntax.suffix.len();
            let resolved = self.placeholder(&text[content_start..end], &text[start..next], scope)?;
            out.push_str(&resolved);
            pos = next;
        }

        out.push_str(&text[pos..]);
        Ok(out)
    }

    fn placeholder(&mut self, content: &str, original: &str, scope: &L::Scope) -> Result<String> {
        let (raw_key, fallback) = self.syntax.split(content);
        let key = self.expand(&raw_key, scope)?;

        if !self.visiting.insert(key.clone()) {
            return Err(Error::CircularReference { key });
        }
        let result = self.substitute(&key, fallback, original, scope);
        self.visiting.remove(&key);
        result
    }

    fn substitute(
        &mut self,
        key: &str,
        fallback: Option<&str>,
        original: &str,
        scope: &L::Scope,
    ) -> Result<String> {
        if let Some((value, origin)) = self.lookup.lookup(key, scope, fallback.is_some()) {
            return self.expand(&value, &origin);
        }
        match (fallback, self.mode) {
            (Some(fallback), _) => self.expand(fallback, scope),
            (None, Mode::Permissive) => Ok(original.to_string()),
            (None, Mode::Strict) => Err(Error::UnresolvablePlaceholder {
                placeholder: key.to_string(),
                text: self.root.to_string(),
            }),
        }
    }
}
