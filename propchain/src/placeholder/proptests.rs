//! Property-based tests for placeholder expansion.

use super::{Mode, PlaceholderExpander};
use proptest::prelude::*;

fn lookup(key: &str) -> Option<String> {
    match key {
        "k1" => Some("x".to_string()),
        "k2" => Some("#{k1}-y".to_string()),
        "k3" => Some("#{k2}#{k1}".to_string()),
        "name" => Some("k1".to_string()),
        _ => None,
    }
}

// Literal text, resolvable placeholders, fallbacks and unresolvable ones,
// but never the escape character.
fn segment_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z :/.-]{0,6}",
        Just("#{k1}".to_string()),
        Just("#{k2}".to_string()),
        Just("#{k3}".to_string()),
        Just("#{#{name}}".to_string()),
        Just("#{port:8080}".to_string()),
        Just("#{nope}".to_string()),
        Just("#{nope:#{k1}}".to_string()),
    ]
}

fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(segment_strategy(), 0..8).prop_map(|parts| parts.concat())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 2000,
        .. ProptestConfig::default()
    })]

    // Expanding already expanded text changes nothing
    #[test]
    fn permissive_expansion_is_idempotent(text in text_strategy()) {
        let expander = PlaceholderExpander::default();
        let once = expander.replace_placeholders(&text, Mode::Permissive, lookup).unwrap();
        let twice = expander.replace_placeholders(&once, Mode::Permissive, lookup).unwrap();
        prop_assert_eq!(once, twice);
    }

    // Strict mode fails exactly when an unresolvable placeholder is present
    #[test]
    fn strict_fails_only_on_unresolvable(text in text_strategy()) {
        let expander = PlaceholderExpander::default();
        let strict = expander.replace_placeholders(&text, Mode::Strict, lookup);
        let has_unresolvable = text.contains("#{nope}");
        prop_assert_eq!(strict.is_err(), has_unresolvable);
        if let Ok(expanded) = strict {
            prop_assert!(!expanded.contains("#{"));
        }
    }

    // Text without the prefix passes through unchanged
    #[test]
    fn text_without_prefix_is_unchanged(text in "[^#\\\\]{0,40}") {
        let expander = PlaceholderExpander::default();
        let out = expander.replace_placeholders(&text, Mode::Strict, lookup).unwrap();
        prop_assert_eq!(out, text);
    }
}
