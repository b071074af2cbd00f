//! The precedence-ordered source chain.
//!
//! Index 0 has the highest precedence: lookups walk the chain front to back
//! and stop at the first source that defines a key. A source is identified
//! by its name, so adding a source whose name is already registered moves it
//! instead of duplicating it.
//!
//! The backing sequence sits behind a read/write lock. Readers take a
//! [`snapshot`](SourceChain::snapshot) and resolve against it without holding
//! the lock, so a concurrent mutation is either fully visible or not at all.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::source::{PropertySource, SharedSource};

/// Comparator used by [`OrderRule::Custom`].
pub type SourceComparator =
    Arc<dyn Fn(&dyn PropertySource, &dyn PropertySource) -> Ordering + Send + Sync>;

/// One step of a [`SourceChain::reorder`] call.
///
/// Rules are applied in sequence, each producing a new ordering from the
/// previous one. A later rule may undo what an earlier rule did; nothing
/// reconciles them.
#[derive(Clone)]
pub enum OrderRule {
    /// Stable sort by priority, highest first. Unlisted sources count as 0.
    Priority(HashMap<String, i32>),
    /// Move `name` directly in front of `anchor`.
    Before {
        /// Source to move.
        name: String,
        /// Source it must precede.
        anchor: String,
    },
    /// Move `name` directly behind `anchor`.
    After {
        /// Source to move.
        name: String,
        /// Source it must follow.
        anchor: String,
    },
    /// Stable sort by name.
    Alphabetical,
    /// Stable sort with a caller-supplied comparator.
    Custom(SourceComparator),
}

impl fmt::Debug for OrderRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Priority(map) => f.debug_tuple("Priority").field(map).finish(),
            Self::Before { name, anchor } => f
                .debug_struct("Before")
                .field("name", name)
                .field("anchor", anchor)
                .finish(),
            Self::After { name, anchor } => f
                .debug_struct("After")
                .field("name", name)
                .field("anchor", anchor)
                .finish(),
            Self::Alphabetical => f.write_str("Alphabetical"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl OrderRule {
    /// Applies the rule to an ordering, producing a new one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceNotFound`] when `Before`/`After` name a source
    /// that is not in `sources`, and [`Error::IllegalArgument`] when a
    /// source is asked to move relative to itself.
    pub fn apply(&self, mut sources: Vec<SharedSource>) -> Result<Vec<SharedSource>> {
        match self {
            Self::Priority(priorities) => {
                let rank = |s: &SharedSource| priorities.get(s.name()).copied().unwrap_or(0);
                sources.sort_by(|a, b| rank(b).cmp(&rank(a)));
            }
            Self::Before { name, anchor } | Self::After { name, anchor } => {
                if name == anchor {
                    return Err(Error::illegal(format!(
                        "source '{name}' cannot be ordered relative to itself"
                    )));
                }
                let from = position(&sources, name)?;
                position(&sources, anchor)?;
                let moved = sources.remove(from);
                let anchor_idx = position(&sources, anchor)?;
                let at = if matches!(self, Self::Before { .. }) {
                    anchor_idx
                } else {
                    anchor_idx + 1
                };
                sources.insert(at, moved);
            }
            Self::Alphabetical => sources.sort_by(|a, b| a.name().cmp(b.name())),
            Self::Custom(compare) => sources.sort_by(|a, b| compare(a.as_ref(), b.as_ref())),
        }
        Ok(sources)
    }
}

fn position(sources: &[SharedSource], name: &str) -> Result<usize> {
    sources
        .iter()
        .position(|s| s.name() == name)
        .ok_or_else(|| Error::SourceNotFound {
            name: name.to_string(),
            suggestions: suggest_from(sources, name),
        })
}

/// Source names resembling `name`: case-insensitive equality or substring
/// containment in either direction.
fn suggest_from(sources: &[SharedSource], name: &str) -> Vec<String> {
    let wanted = name.to_lowercase();
    if wanted.is_empty() {
        return Vec::new();
    }
    sources
        .iter()
        .map(|s| s.name())
        .filter(|candidate| {
            let candidate = candidate.to_lowercase();
            candidate == wanted || candidate.contains(&wanted) || wanted.contains(&candidate)
        })
        .map(str::to_string)
        .collect()
}

/// A mutable, thread-safe, precedence-ordered list of property sources.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use propchain::chain::SourceChain;
/// use propchain::source::MapSource;
///
/// let chain = SourceChain::new();
/// chain.add_last(Arc::new(MapSource::new("defaults")));
/// chain.add_first(Arc::new(MapSource::new("overrides")));
/// chain.add_after("overrides", Arc::new(MapSource::new("env"))).unwrap();
///
/// assert_eq!(chain.names(), vec!["overrides", "env", "defaults"]);
/// ```
#[derive(Default)]
pub struct SourceChain {
    sources: RwLock<Vec<SharedSource>>,
}

impl SourceChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `source` with the highest precedence.
    pub fn add_first(&self, source: SharedSource) {
        log::debug!("adding property source '{}' with highest precedence", source.name());
        let mut sources = self.sources.write();
        remove_named(&mut sources, source.name());
        sources.insert(0, source);
    }

    /// Inserts `source` with the lowest precedence.
    pub fn add_last(&self, source: SharedSource) {
        log::debug!("adding property source '{}' with lowest precedence", source.name());
        let mut sources = self.sources.write();
        remove_named(&mut sources, source.name());
        sources.push(source);
    }

    /// Inserts `source` immediately ahead of `anchor`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceNotFound`] if `anchor` is not registered and
    /// [`Error::IllegalArgument`] if `source` is itself named `anchor`.
    pub fn add_before(&self, anchor: &str, source: SharedSource) -> Result<()> {
        self.add_relative(anchor, source, 0)
    }

    /// Inserts `source` immediately behind `anchor`.
    ///
    /// # Errors
    ///
    /// Same as [`add_before`](Self::add_before).
    pub fn add_after(&self, anchor: &str, source: SharedSource) -> Result<()> {
        self.add_relative(anchor, source, 1)
    }

    fn add_relative(&self, anchor: &str, source: SharedSource, offset: usize) -> Result<()> {
        if source.name() == anchor {
            return Err(Error::illegal(format!(
                "property source '{anchor}' cannot be added relative to itself"
            )));
        }
        let mut sources = self.sources.write();
        position(&sources, anchor)?;
        log::debug!(
            "adding property source '{}' {} '{anchor}'",
            source.name(),
            if offset == 0 { "before" } else { "after" }
        );
        remove_named(&mut sources, source.name());
        let idx = position(&sources, anchor)?;
        sources.insert(idx + offset, source);
        Ok(())
    }

    /// Removes the source called `name`, returning it if it was present.
    pub fn remove(&self, name: &str) -> Option<SharedSource> {
        let removed = remove_named(&mut self.sources.write(), name);
        if removed.is_some() {
            log::debug!("removed property source '{name}'");
        }
        removed
    }

    /// Replaces the source called `name`, keeping its position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceNotFound`] if `name` is not registered.
    pub fn replace(&self, name: &str, source: SharedSource) -> Result<()> {
        let mut sources = self.sources.write();
        position(&sources, name)?;
        log::debug!("replacing property source '{name}' with '{}'", source.name());
        if source.name() != name {
            remove_named(&mut sources, source.name());
        }
        let idx = position(&sources, name)?;
        sources[idx] = source;
        Ok(())
    }

    /// Applies `rules` in order and commits the final ordering.
    ///
    /// If any rule fails the chain is left unchanged.
    ///
    /// # Errors
    ///
    /// Propagates the first rule failure.
    pub fn reorder(&self, rules: &[OrderRule]) -> Result<()> {
        let mut sources = self.sources.write();
        let mut working = sources.clone();
        for rule in rules {
            working = rule.apply(working)?;
        }
        log::debug!("reordered property sources: {rules:?}");
        *sources = working;
        Ok(())
    }

    /// Returns the source called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<SharedSource> {
        self.sources.read().iter().find(|s| s.name() == name).cloned()
    }

    /// Whether a source called `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.sources.read().iter().any(|s| s.name() == name)
    }

    /// Number of registered sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.read().len()
    }

    /// Whether the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.read().is_empty()
    }

    /// Source names in precedence order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.sources.read().iter().map(|s| s.name().to_string()).collect()
    }

    /// A consistent copy of the current ordering.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SharedSource> {
        self.sources.read().clone()
    }

    /// Registered source names that resemble `name`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use propchain::chain::SourceChain;
    /// use propchain::source::MapSource;
    ///
    /// let chain = SourceChain::new();
    /// chain.add_last(Arc::new(MapSource::new("systemEnvironment")));
    /// chain.add_last(Arc::new(MapSource::new("defaults")));
    ///
    /// assert_eq!(chain.suggest("environment"), vec!["systemEnvironment"]);
    /// assert!(chain.suggest("files").is_empty());
    /// ```
    #[must_use]
    pub fn suggest(&self, name: &str) -> Vec<String> {
        suggest_from(&self.sources.read(), name)
    }
}

impl fmt::Debug for SourceChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

fn remove_named(sources: &mut Vec<SharedSource>, name: &str) -> Option<SharedSource> {
    let idx = sources.iter().position(|s| s.name() == name)?;
    Some(sources.remove(idx))
}
