//! The resolver: typed, placeholder-expanded access to a [`SourceChain`],
//! plus the active/default profile state.
//!
//! Resolution walks a snapshot of the chain from highest to lowest
//! precedence. The first source that contains the key supplies the raw
//! value; placeholders in it are expanded against the same snapshot and the
//! result is converted to the requested type. A conversion failure is an
//! error, never a reason to try the next source.
//!
//! A placeholder that carries its own fallback (`#{port:8080}`) only sees
//! sources at least as significant as the one that supplied the text it
//! appears in. Placeholders without a fallback see the whole chain.

pub mod builder;

pub use builder::EnvironmentBuilder;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::chain::SourceChain;
use crate::convert::{ConversionService, FromValue};
use crate::error::{Error, Result};
use crate::placeholder::{Mode, PlaceholderExpander, ScopedLookup};
use crate::profiles::{self, Profiles};
use crate::source::SharedSource;
use crate::value::Value;

/// Key listing the active profiles, comma-separated.
pub const ACTIVE_PROFILES_KEY: &str = "propchain.profiles.active";

/// Key listing the default profiles, comma-separated.
pub const DEFAULT_PROFILES_KEY: &str = "propchain.profiles.default";

/// Key that, when truthy, keeps the system environment out of the chain.
pub const IGNORE_GETENV_KEY: &str = "propchain.getenv.ignore";

/// Profile that is active when nothing else is.
pub const RESERVED_DEFAULT_PROFILE: &str = "default";

#[derive(Debug)]
struct ProfileState {
    active: Vec<String>,
    default: Vec<String>,
    active_resolved: bool,
    default_resolved: bool,
}

impl Default for ProfileState {
    fn default() -> Self {
        Self {
            active: Vec::new(),
            default: vec![RESERVED_DEFAULT_PROFILE.to_string()],
            active_resolved: false,
            default_resolved: false,
        }
    }
}

/// Resolves properties from a source chain and tracks active profiles.
///
/// `Environment` is `Send + Sync`; share it with `Arc`.
///
/// # Examples
///
/// ```
/// use propchain::source::MapSource;
/// use propchain::Environment;
///
/// let env = Environment::new();
/// env.sources().add_last(std::sync::Arc::new(
///     MapSource::new("app")
///         .with("host", "localhost")
///         .with("url", "http://#{host}:#{port:8080}"),
/// ));
///
/// assert_eq!(env.get("url").unwrap().as_deref(), Some("http://localhost:8080"));
/// assert_eq!(env.get("missing").unwrap(), None);
/// ```
pub struct Environment {
    chain: SourceChain,
    expander: PlaceholderExpander,
    conversion: ConversionService,
    ignore_unresolvable: AtomicBool,
    profiles: Mutex<ProfileState>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("sources", &self.chain.names())
            .field("expander", &self.expander)
            .field(
                "ignore_unresolvable",
                &self.ignore_unresolvable.load(Ordering::Relaxed),
            )
            .finish_non_exhaustive()
    }
}

impl Environment {
    /// Creates an environment with an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::with_chain(SourceChain::new())
    }

    /// Creates an environment over an existing chain.
    #[must_use]
    pub fn with_chain(chain: SourceChain) -> Self {
        Self {
            chain,
            expander: PlaceholderExpander::default(),
            conversion: ConversionService::new(),
            ignore_unresolvable: AtomicBool::new(false),
            profiles: Mutex::new(ProfileState::default()),
        }
    }

    /// Starts building an environment from layered sources.
    #[must_use]
    pub fn builder() -> EnvironmentBuilder {
        EnvironmentBuilder::new()
    }

    /// Replaces the placeholder syntax.
    #[must_use]
    pub fn with_expander(mut self, expander: PlaceholderExpander) -> Self {
        self.expander = expander;
        self
    }

    /// The source chain. Mutations are visible to subsequent lookups.
    pub fn sources(&self) -> &SourceChain {
        &self.chain
    }

    /// The conversion service used by the typed getters.
    pub fn conversion_service(&self) -> &ConversionService {
        &self.conversion
    }

    /// The placeholder syntax in use.
    pub fn expander(&self) -> &PlaceholderExpander {
        &self.expander
    }

    /// When `true`, unresolvable placeholders inside property values are left
    /// as they are instead of failing the lookup.
    pub fn set_ignore_unresolvable_nested_placeholders(&self, ignore: bool) {
        self.ignore_unresolvable.store(ignore, Ordering::Relaxed);
    }

    fn nested_mode(&self) -> Mode {
        if self.ignore_unresolvable.load(Ordering::Relaxed) {
            Mode::Permissive
        } else {
            Mode::Strict
        }
    }

    // ---- property access ----

    /// Whether any source defines `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.chain
            .snapshot()
            .iter()
            .any(|source| source.contains_property(key))
    }

    /// The expanded value of `key`, or `None` if no source defines it.
    ///
    /// # Errors
    ///
    /// Fails on placeholder cycles and, unless nested placeholders are
    /// ignored, on unresolvable placeholders.
    pub fn get_value(&self, key: &str) -> Result<Option<Value>> {
        let sources = self.chain.snapshot();
        let Some((index, raw)) = find(&sources, key) else {
            log::trace!("property '{key}' not found in {} sources", sources.len());
            return Ok(None);
        };
        log::trace!("property '{key}' found in '{}'", sources[index].name());

        let lookup = ChainLookup { sources: &sources };
        self.expand_value(raw, &lookup, index).map(Some)
    }

    fn expand_value(&self, value: Value, lookup: &ChainLookup<'_>, scope: usize) -> Result<Value> {
        match value {
            Value::String(text) => self
                .expander
                .replace_placeholders_scoped(&text, self.nested_mode(), lookup, &scope)
                .map(Value::String),
            Value::List(items) => items
                .into_iter()
                .map(|item| self.expand_value(item, lookup, scope))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| self.expand_value(v, lookup, scope).map(|v| (k, v)))
                .collect::<Result<BTreeMap<_, _>>>()
                .map(Value::Map),
            other => Ok(other),
        }
    }

    /// The value of `key` as text.
    ///
    /// # Errors
    ///
    /// See [`get_value`](Self::get_value); also fails if the value cannot be
    /// rendered as text.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_as(key)
    }

    /// The value of `key` as text, or `default` if absent.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub fn get_or(&self, key: &str, default: &str) -> Result<String> {
        Ok(self.get(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// The value of `key` converted to `T`.
    ///
    /// # Errors
    ///
    /// See [`get_value`](Self::get_value); also returns
    /// [`Error::Conversion`] if the value does not convert.
    pub fn get_as<T: FromValue>(&self, key: &str) -> Result<Option<T>> {
        match self.get_value(key)? {
            Some(value) => self.conversion.convert_to(&value).map(Some),
            None => Ok(None),
        }
    }

    /// The value of `key` converted to `T`, or `default` if absent.
    ///
    /// # Errors
    ///
    /// See [`get_as`](Self::get_as).
    pub fn get_as_or<T: FromValue>(&self, key: &str, default: T) -> Result<T> {
        Ok(self.get_as(key)?.unwrap_or(default))
    }

    /// The value of `key` as text; absence is an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PropertyNotFound`] if no source defines `key`.
    pub fn get_required(&self, key: &str) -> Result<String> {
        self.get_required_as(key)
    }

    /// The value of `key` converted to `T`; absence is an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PropertyNotFound`] if no source defines `key`, or
    /// [`Error::Conversion`] if the value does not convert.
    pub fn get_required_as<T: FromValue>(&self, key: &str) -> Result<T> {
        self.get_as(key)?.ok_or_else(|| Error::PropertyNotFound {
            key: key.to_string(),
        })
    }

    /// Expands placeholders in `text`, leaving unresolvable ones untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CircularReference`] on cycles.
    pub fn expand(&self, text: &str) -> Result<String> {
        self.expand_with(text, Mode::Permissive)
    }

    /// Expands placeholders in `text`; unresolvable ones are an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvablePlaceholder`] or
    /// [`Error::CircularReference`].
    pub fn expand_required(&self, text: &str) -> Result<String> {
        self.expand_with(text, Mode::Strict)
    }

    fn expand_with(&self, text: &str, mode: Mode) -> Result<String> {
        let sources = self.chain.snapshot();
        let lookup = ChainLookup { sources: &sources };
        self.expander
            .replace_placeholders_scoped(text, mode, &lookup, &usize::MAX)
    }

    /// Name of the source that supplies `key`, if any.
    pub fn origin_of(&self, key: &str) -> Option<String> {
        self.chain
            .snapshot()
            .iter()
            .find(|source| source.contains_property(key))
            .map(|source| source.name().to_string())
    }

    /// Every key of every enumerable source, sorted and deduplicated.
    pub fn property_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .chain
            .snapshot()
            .iter()
            .filter_map(|source| source.property_names())
            .flatten()
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Registered source names resembling `name`.
    pub fn suggest_source(&self, name: &str) -> Vec<String> {
        self.chain.suggest(name)
    }

    // ---- profiles ----

    /// Whether `label` is active.
    ///
    /// When any profile is explicitly active, only the active set counts and
    /// the default set is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] for an invalid label, or any error
    /// raised while reading the profile keys.
    pub fn is_profile_active(&self, label: &str) -> Result<bool> {
        profiles::validate_label(label)?;
        Ok(self.effective_profiles()?.iter().any(|p| p == label))
    }

    /// Whether `profiles` matches the current profile state.
    ///
    /// # Errors
    ///
    /// Fails if the profile keys cannot be read.
    pub fn accepts_profiles(&self, profiles: &Profiles) -> Result<bool> {
        let effective = self.effective_profiles()?;
        Ok(profiles.matches(|label| effective.iter().any(|p| p == label)))
    }

    /// Parses `expressions` and matches them against the current state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProfileParse`] for malformed expressions.
    pub fn accepts<S: AsRef<str>>(&self, expressions: &[S]) -> Result<bool> {
        self.accepts_profiles(&Profiles::parse(expressions)?)
    }

    /// The labels currently deciding activation: the active set, or the
    /// default set when nothing is active.
    fn effective_profiles(&self) -> Result<Vec<String>> {
        let mut state = self.profiles.lock();
        self.resolve_active(&mut state)?;
        if !state.active.is_empty() {
            return Ok(state.active.clone());
        }
        self.resolve_default(&mut state)?;
        Ok(state.default.clone())
    }

    /// Explicitly active profiles.
    ///
    /// # Errors
    ///
    /// Fails if [`ACTIVE_PROFILES_KEY`] holds an invalid label.
    pub fn active_profiles(&self) -> Result<Vec<String>> {
        let mut state = self.profiles.lock();
        self.resolve_active(&mut state)?;
        Ok(state.active.clone())
    }

    /// Profiles used when none are active.
    ///
    /// # Errors
    ///
    /// Fails if [`DEFAULT_PROFILES_KEY`] holds an invalid label.
    pub fn default_profiles(&self) -> Result<Vec<String>> {
        let mut state = self.profiles.lock();
        self.resolve_default(&mut state)?;
        Ok(state.default.clone())
    }

    /// Replaces the active set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if any label is invalid; the set is
    /// left unchanged in that case.
    pub fn set_active_profiles<I, S>(&self, labels: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels = validated(labels)?;
        log::debug!("activating profiles {labels:?}");
        let mut state = self.profiles.lock();
        state.active = labels;
        state.active_resolved = true;
        Ok(())
    }

    /// Adds one label to the active set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if the label is invalid.
    pub fn add_active_profile(&self, label: &str) -> Result<()> {
        profiles::validate_label(label)?;
        let mut state = self.profiles.lock();
        self.resolve_active(&mut state)?;
        if !state.active.iter().any(|p| p == label) {
            log::debug!("activating profile '{label}'");
            state.active.push(label.to_string());
        }
        Ok(())
    }

    /// Replaces the default set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if any label is invalid.
    pub fn set_default_profiles<I, S>(&self, labels: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels = validated(labels)?;
        log::debug!("default profiles set to {labels:?}");
        let mut state = self.profiles.lock();
        state.default = labels;
        state.default_resolved = true;
        Ok(())
    }

    // Both resolvers run under the profile lock and take the chain lock
    // through get_as; nothing takes them in the other order.

    fn resolve_active(&self, state: &mut ProfileState) -> Result<()> {
        if state.active_resolved {
            return Ok(());
        }
        if state.active.is_empty() {
            if let Some(labels) = self.get_as::<Vec<String>>(ACTIVE_PROFILES_KEY)? {
                let labels = validated(labels)?;
                if !labels.is_empty() {
                    log::debug!("activating profiles {labels:?} from '{ACTIVE_PROFILES_KEY}'");
                    state.active = labels;
                }
            }
        }
        state.active_resolved = true;
        Ok(())
    }

    fn resolve_default(&self, state: &mut ProfileState) -> Result<()> {
        if state.default_resolved {
            return Ok(());
        }
        if let Some(labels) = self.get_as::<Vec<String>>(DEFAULT_PROFILES_KEY)? {
            let labels = validated(labels)?;
            if !labels.is_empty() {
                log::debug!("default profiles {labels:?} from '{DEFAULT_PROFILES_KEY}'");
                state.default = labels;
            }
        }
        state.default_resolved = true;
        Ok(())
    }
}

/// Validates labels and drops duplicates, keeping first occurrences.
fn validated<I, S>(labels: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    for label in labels {
        let label = label.into();
        profiles::validate_label(&label)?;
        if !out.contains(&label) {
            out.push(label);
        }
    }
    Ok(out)
}

/// First source defining `key`, with its position. Later sources are not
/// consulted.
fn find(sources: &[SharedSource], key: &str) -> Option<(usize, Value)> {
    let (index, source) = sources
        .iter()
        .enumerate()
        .find(|(_, source)| source.contains_property(key))?;
    source.get_property(key).map(|value| (index, value))
}

/// Placeholder lookup over a chain snapshot. The scope is the index of the
/// source that supplied the text being expanded.
struct ChainLookup<'a> {
    sources: &'a [SharedSource],
}

impl ScopedLookup for ChainLookup<'_> {
    type Scope = usize;

    fn lookup(&self, key: &str, scope: &usize, has_fallback: bool) -> Option<(String, usize)> {
        let visible = if has_fallback {
            &self.sources[..scope.saturating_add(1).min(self.sources.len())]
        } else {
            self.sources
        };
        find(visible, key).map(|(index, value)| (value.to_string(), index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MapSource;
    use std::sync::Arc;
    use std::time::Duration;

    fn env_with(sources: Vec<MapSource>) -> Environment {
        let env = Environment::new();
        for source in sources {
            env.sources().add_last(Arc::new(source));
        }
        env
    }

    #[test]
    fn test_first_source_wins() {
        let env = env_with(vec![
            MapSource::new("high").with("k", "1"),
            MapSource::new("low").with("k", "2").with("only.low", "x"),
        ]);
        assert_eq!(env.get("k").unwrap().as_deref(), Some("1"));
        assert_eq!(env.get("only.low").unwrap().as_deref(), Some("x"));
        assert_eq!(env.origin_of("k").as_deref(), Some("high"));
    }

    #[test]
    fn test_typed_access() {
        let env = env_with(vec![MapSource::new("m")
            .with("port", "8080")
            .with("debug", "on")
            .with("timeout", "1m")
            .with("hosts", "a, b")
            .with("ratio", 0.5)]);
        assert_eq!(env.get_as::<u16>("port").unwrap(), Some(8080));
        assert_eq!(env.get_as::<bool>("debug").unwrap(), Some(true));
        assert_eq!(
            env.get_as::<Duration>("timeout").unwrap(),
            Some(Duration::from_secs(60))
        );
        assert_eq!(
            env.get_as::<Vec<String>>("hosts").unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(env.get("ratio").unwrap().as_deref(), Some("0.5"));
        assert_eq!(env.get_as_or::<i64>("absent", 3).unwrap(), 3);
        assert_eq!(env.get_or("absent", "dflt").unwrap(), "dflt");
    }

    #[test]
    fn test_typed_value_is_expanded_first() {
        let env = env_with(vec![MapSource::new("m")
            .with("base", "8000")
            .with("port", "#{base}")]);
        assert_eq!(env.get_as::<i64>("port").unwrap(), Some(8000));
    }

    #[test]
    fn test_required() {
        let env = env_with(vec![MapSource::new("m").with("a", "1")]);
        assert_eq!(env.get_required("a").unwrap(), "1");
        let err = env.get_required("missing").unwrap_err();
        assert!(matches!(err, Error::PropertyNotFound { ref key } if key == "missing"));
        assert!(err.is_not_found());
        assert_eq!(env.get("missing").unwrap(), None);
    }

    #[test]
    fn test_nested_unresolvable_strict_by_default() {
        let env = env_with(vec![MapSource::new("m").with("a", "x-#{nope}")]);
        assert!(matches!(
            env.get("a").unwrap_err(),
            Error::UnresolvablePlaceholder { .. }
        ));

        env.set_ignore_unresolvable_nested_placeholders(true);
        assert_eq!(env.get("a").unwrap().as_deref(), Some("x-#{nope}"));
    }

    #[test]
    fn test_expand_modes() {
        let env = env_with(vec![MapSource::new("m").with("a", "1")]);
        assert_eq!(env.expand("#{a}/#{b}").unwrap(), "1/#{b}");
        assert!(env.expand_required("#{a}/#{b}").is_err());
        assert_eq!(env.expand_required("#{a}/#{b:2}").unwrap(), "1/2");
    }

    #[test]
    fn test_non_text_values_substitute_their_rendering() {
        let env = env_with(vec![MapSource::new("m")
            .with("n", 3_i64)
            .with("on", true)
            .with("msg", "#{n} #{on}")]);
        assert_eq!(env.get("msg").unwrap().as_deref(), Some("3 true"));
    }

    #[test]
    fn test_list_entries_are_expanded() {
        let env = env_with(vec![MapSource::new("m")
            .with("host", "h")
            .with("urls", vec![Value::from("#{host}:1"), Value::from("#{host}:2")])]);
        assert_eq!(
            env.get_as::<Vec<String>>("urls").unwrap(),
            Some(vec!["h:1".to_string(), "h:2".to_string()])
        );
    }

    #[test]
    fn test_fallback_ignores_lower_precedence_sources() {
        let env = env_with(vec![
            MapSource::new("app").with("url", "#{proto:http}://x"),
            MapSource::new("low").with("proto", "https"),
        ]);
        assert_eq!(env.get("url").unwrap().as_deref(), Some("http://x"));
        // Without a fallback the whole chain is visible.
        assert_eq!(env.expand("#{proto}").unwrap(), "https");
    }

    #[test]
    fn test_fallback_sees_higher_precedence_sources() {
        let env = env_with(vec![
            MapSource::new("high").with("proto", "https"),
            MapSource::new("app").with("url", "#{proto:http}://x"),
        ]);
        assert_eq!(env.get("url").unwrap().as_deref(), Some("https://x"));
    }

    #[test]
    fn test_contains_and_names() {
        let env = env_with(vec![
            MapSource::new("a").with("x", "1").with("y", "2"),
            MapSource::new("b").with("y", "3").with("z", "4"),
        ]);
        assert!(env.contains_key("z"));
        assert!(!env.contains_key("w"));
        assert_eq!(env.property_names(), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_suggest_source() {
        let env = env_with(vec![MapSource::new("applicationConfig")]);
        assert_eq!(env.suggest_source("config"), vec!["applicationConfig"]);
    }

    #[test]
    fn test_default_profile_active_initially() {
        let env = Environment::new();
        assert!(env.is_profile_active("default").unwrap());
        assert!(!env.is_profile_active("dev").unwrap());
        assert!(env.active_profiles().unwrap().is_empty());
        assert_eq!(env.default_profiles().unwrap(), vec!["default"]);
    }

    #[test]
    fn test_active_set_bypasses_default() {
        let env = Environment::new();
        env.set_active_profiles(["dev"]).unwrap();
        assert!(env.is_profile_active("dev").unwrap());
        assert!(!env.is_profile_active("default").unwrap());
    }

    #[test]
    fn test_add_active_profile_deduplicates() {
        let env = Environment::new();
        env.add_active_profile("dev").unwrap();
        env.add_active_profile("cloud").unwrap();
        env.add_active_profile("dev").unwrap();
        assert_eq!(env.active_profiles().unwrap(), vec!["dev", "cloud"]);
    }

    #[test]
    fn test_invalid_labels_rejected() {
        let env = Environment::new();
        assert!(env.is_profile_active("").is_err());
        assert!(env.is_profile_active("!dev").is_err());
        assert!(env.set_active_profiles(["ok", "!bad"]).is_err());
        assert!(env.active_profiles().unwrap().is_empty());
        assert!(env.set_default_profiles([" "]).is_err());
    }

    #[test]
    fn test_accepts() {
        let env = Environment::new();
        env.set_active_profiles(["dev"]).unwrap();
        assert!(env.accepts(&["dev & !test"]).unwrap());
        assert!(!env.accepts(&["prod", "test"]).unwrap());
        assert!(env.accepts(&["(", "x"]).is_err());
    }

    #[test]
    fn test_profiles_read_lazily_from_properties() {
        let env = Environment::new();
        env.sources().add_last(Arc::new(
            MapSource::new("m")
                .with(ACTIVE_PROFILES_KEY, "dev, cloud")
                .with(DEFAULT_PROFILES_KEY, "base"),
        ));
        assert_eq!(env.active_profiles().unwrap(), vec!["dev", "cloud"]);
        assert_eq!(env.default_profiles().unwrap(), vec!["base"]);
        assert!(env.is_profile_active("cloud").unwrap());
    }

    #[test]
    fn test_programmatic_profiles_win_over_properties() {
        let env = Environment::new();
        env.sources()
            .add_last(Arc::new(MapSource::new("m").with(ACTIVE_PROFILES_KEY, "dev")));
        env.set_active_profiles(["prod"]).unwrap();
        assert_eq!(env.active_profiles().unwrap(), vec!["prod"]);
    }

    #[test]
    fn test_invalid_profile_property() {
        let env = Environment::new();
        env.sources()
            .add_last(Arc::new(MapSource::new("m").with(ACTIVE_PROFILES_KEY, "!dev")));
        assert!(matches!(
            env.active_profiles().unwrap_err(),
            Error::IllegalArgument { .. }
        ));
    }
}
