//! Property-based tests for policy parsers.
//!
//! Ensures the document loader and the MLS and conditional expression
//! parsers don't panic on arbitrary input, and that well-formed
//! expressions survive a display/parse cycle.

use proptest::prelude::*;
use poldiff::model::{CondExpr, LevelExpr, RangeExpr, RuleCondition};
use poldiff::parsers::{detect_format, parse_policy_str};

/// A well-formed level such as `s0:c0.c3,c7`.
fn level_string() -> impl Strategy<Value = String> {
    (
        0u8..16,
        prop::collection::vec((0u8..64, prop::option::of(0u8..64)), 0..4),
    )
        .prop_map(|(sens, cats)| {
            let mut level = format!("s{sens}");
            for (i, (first, last)) in cats.iter().enumerate() {
                level.push(if i == 0 { ':' } else { ',' });
                match last {
                    Some(last) => level.push_str(&format!("c{first}.c{last}")),
                    None => level.push_str(&format!("c{first}")),
                }
            }
            level
        })
}

/// Reverse-polish tokens of a random expression over at most five booleans.
fn cond_tokens() -> impl Strategy<Value = Vec<String>> {
    let leaf = "[a-e]_bool".prop_map(|name| vec![name]);
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|mut tokens| {
                tokens.push("!".to_string());
                tokens
            }),
            (
                inner.clone(),
                inner,
                prop::sample::select(vec!["&&", "||", "^", "==", "!="])
            )
                .prop_map(|(mut left, right, op)| {
                    left.extend(right);
                    left.push(op.to_string());
                    left
                }),
        ]
    })
}

proptest! {
    // Parser tests only assert no-panic for random input, which is expected
    // to be rejected almost always.
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn parse_policy_str_doesnt_panic(s in "\\PC{0,2000}") {
        let _ = parse_policy_str(&s);
    }

    #[test]
    fn detect_format_doesnt_panic(s in "\\PC{0,2000}") {
        let _ = detect_format(&s);
    }

    #[test]
    fn yaml_like_input_doesnt_panic(
        key in "(name|types|classes|av_rules|roles|users)",
        value in "\\PC{0,200}",
    ) {
        let input = format!("{key}: {value}");
        let _ = parse_policy_str(&input);
    }

    #[test]
    fn json_like_input_doesnt_panic(
        s in prop::string::string_regex(r#"\{[^\}]{0,500}\}"#).unwrap()
    ) {
        let _ = parse_policy_str(&s);
    }

    #[test]
    fn level_and_range_parsers_dont_panic(s in "\\PC{0,100}") {
        let _ = s.parse::<LevelExpr>();
        let _ = s.parse::<RangeExpr>();
    }

    #[test]
    fn cond_parser_doesnt_panic(tokens in prop::collection::vec("(!|&&|\\|\\||\\^|==|!=|[a-c])", 0..12)) {
        if let Ok(expr) = CondExpr::parse(&tokens) {
            let _ = expr.truth_table();
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn level_display_reparses(level in level_string()) {
        let parsed: LevelExpr = level.parse().expect("generated level should parse");
        prop_assert_eq!(parsed.to_string(), level.clone());
        let reparsed: LevelExpr = parsed.to_string().parse().unwrap();
        prop_assert_eq!(reparsed, parsed);
    }

    #[test]
    fn single_level_range_is_degenerate(level in level_string()) {
        let range: RangeExpr = level.parse().expect("level should parse as a range");
        prop_assert_eq!(&range.low, &range.high);
        prop_assert_eq!(range.to_string(), level);
    }

    #[test]
    fn range_display_reparses(low in level_string(), high in level_string()) {
        let text = format!("{low} - {high}");
        let range: RangeExpr = text.parse().expect("generated range should parse");
        let reparsed: RangeExpr = range.to_string().parse().unwrap();
        prop_assert_eq!(reparsed, range);
    }

    #[test]
    fn well_formed_conditions_parse(tokens in cond_tokens()) {
        let expr = CondExpr::parse(&tokens).expect("generated expression should parse");
        let booleans = expr.booleans();
        prop_assert!(booleans.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(booleans.len() <= 5);
        prop_assert!(expr.truth_table().is_ok());
    }

    #[test]
    fn conjunction_with_itself_is_equivalent(tokens in cond_tokens()) {
        let expr = CondExpr::parse(&tokens).unwrap();
        let mut doubled = tokens.clone();
        doubled.extend(tokens.iter().cloned());
        doubled.push("&&".to_string());
        let doubled = CondExpr::parse(&doubled).unwrap();
        prop_assert_eq!(expr.truth_table().unwrap(), doubled.truth_table().unwrap());
    }

    #[test]
    fn else_branch_matches_negated_if_branch(tokens in cond_tokens()) {
        let else_branch = RuleCondition {
            expr: CondExpr::parse(&tokens).unwrap(),
            branch: false,
        };
        let mut negated = tokens.clone();
        negated.push("!".to_string());
        let if_branch = RuleCondition {
            expr: CondExpr::parse(&negated).unwrap(),
            branch: true,
        };
        prop_assert_eq!(else_branch.key().unwrap(), if_branch.key().unwrap());
    }
}
