//! Property-based tests for profile expressions.

use super::{ProfileExpr, Profiles};
use proptest::prelude::*;

const LABELS: [&str; 4] = ["dev", "prod", "cloud", "test"];

fn expr_strategy() -> impl Strategy<Value = ProfileExpr> {
    let leaf = prop::sample::select(LABELS.to_vec()).prop_map(|l| ProfileExpr::Literal(l.to_string()));
    leaf.prop_recursive(4, 24, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(|e| ProfileExpr::Not(Box::new(e))),
            prop::collection::vec(inner.clone(), 2..4).prop_map(ProfileExpr::And),
            prop::collection::vec(inner, 2..4).prop_map(ProfileExpr::Or),
        ]
    })
}

fn active_strategy() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), LABELS.len())
}

proptest! {
    // The canonical rendering parses back to an equivalent expression
    #[test]
    fn display_round_trips_semantics(expr in expr_strategy(), flags in active_strategy()) {
        let is_active = |label: &str| {
            LABELS.iter().position(|l| *l == label).is_some_and(|i| flags[i])
        };
        let reparsed = ProfileExpr::parse(&expr.to_string()).unwrap();
        prop_assert_eq!(reparsed.eval(&is_active), expr.eval(&is_active));
    }

    // A negated expression is the complement of the expression
    #[test]
    fn negation_is_complement(expr in expr_strategy(), flags in active_strategy()) {
        let is_active = |label: &str| {
            LABELS.iter().position(|l| *l == label).is_some_and(|i| flags[i])
        };
        let negated = Profiles::parse(&[format!("!{expr}")]).unwrap();
        prop_assert_eq!(negated.matches(is_active), !expr.eval(&is_active));
    }
}
