/// Property-based tests using proptest
/// Tests invariants and properties that should hold for all inputs
use chrono::Utc;
use proptest::prelude::*;
use rust_bookkeeper_api::indexer::{build_index, corpus_for, IGNORE_SENTINEL};
use rust_bookkeeper_api::matcher::{similar_text, AccountMatcher, AliasMap, AliasMatcher, FuzzyMatcher};
use rust_bookkeeper_api::models::{Account, AccountId, AccountSet};
use rust_bookkeeper_api::speech::render_balance;
use serde_json::{json, Map};
use std::collections::BTreeSet;

fn account_with_fields(fields: [Option<String>; 5]) -> Account {
    let [fi_login_display_name, user_name, account_name, yodlee_name, fi_name] = fields;
    Account {
        id: AccountId::Number(1),
        user_name,
        fi_login_display_name,
        yodlee_name,
        account_name,
        fi_name,
        account_type: Some("bank".to_string()),
        current_balance: 0.0,
        extra: Map::new(),
    }
}

fn token_set(corpus: &str) -> BTreeSet<String> {
    corpus.split_whitespace().map(str::to_string).collect()
}

fn account_set(names: &[String]) -> AccountSet {
    let raw: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            json!({
                "id": i as i64 + 1,
                "userName": name,
                "fiName": "Bank",
                "accountType": "bank",
                "currentBalance": 1.0
            })
        })
        .collect();
    AccountSet::from_raw("owner", Utc::now(), &serde_json::Value::Array(raw).to_string()).unwrap()
}

// Property: Balance rendering should never panic
proptest! {
    #[test]
    fn render_balance_never_panics(amount in -1.0e15f64..1.0e15f64) {
        let _ = render_balance(amount);
    }

    #[test]
    fn render_balance_always_ends_in_dollars_or_cents(amount in -1.0e12f64..1.0e12f64) {
        let text = render_balance(amount);
        prop_assert!(text.ends_with("dollars") || text.ends_with("cents"), "{}", text);
    }

    #[test]
    fn small_whole_amounts_are_plain_dollars(dollars in 0u32..1000u32) {
        prop_assert_eq!(render_balance(dollars as f64), format!("{} dollars", dollars));
    }

    #[test]
    fn thousands_name_the_leading_group(high in 1u32..1000u32, low in 1u32..1000u32) {
        let amount = (high as f64) * 1000.0 + low as f64;
        prop_assert_eq!(
            render_balance(amount),
            format!("{} thousand {} dollars", high, low)
        );
    }
}

// Property: Indexing depends on which words are present, not where
proptest! {
    #[test]
    fn corpus_token_set_ignores_field_order(
        values in proptest::collection::vec(proptest::option::of("[a-z]{1,8}( [a-z]{1,8}){0,2}"), 5),
        rotation in 0usize..5
    ) {
        let mut rotated = values.clone();
        rotated.rotate_left(rotation);

        let original = corpus_for(&account_with_fields(values.clone().try_into().unwrap()));
        let reordered = corpus_for(&account_with_fields(rotated.try_into().unwrap()));

        prop_assert_eq!(token_set(&original), token_set(&reordered));
    }

    #[test]
    fn ignored_accounts_never_indexed(
        names in proptest::collection::vec("[A-Za-z]{1,10}", 1..6),
        ignored in proptest::collection::vec(any::<bool>(), 6)
    ) {
        let names: Vec<String> = names
            .iter()
            .enumerate()
            .map(|(i, name)| if ignored[i] { IGNORE_SENTINEL.to_string() } else { name.clone() })
            .collect();
        let accounts = account_set(&names);

        let index = build_index(&accounts);

        for (i, name) in names.iter().enumerate() {
            let id = AccountId::Number(i as i64 + 1);
            prop_assert_eq!(index.get(&id).is_none(), name == IGNORE_SENTINEL);
        }
    }
}

// Property: Matching is deterministic
proptest! {
    #[test]
    fn fuzzy_resolution_is_deterministic(
        names in proptest::collection::vec("[A-Za-z ]{1,12}", 1..6),
        keyword in "[a-z ]{1,12}"
    ) {
        prop_assume!(names.iter().any(|name| name != IGNORE_SENTINEL));
        let accounts = account_set(&names);

        let first = FuzzyMatcher.resolve(&keyword, &accounts).unwrap();
        let second = FuzzyMatcher.resolve(&keyword, &accounts).unwrap();

        prop_assert_eq!(first, second);
    }

    #[test]
    fn similarity_is_bounded_by_shorter_input(first in "\\PC{0,20}", second in "\\PC{0,20}") {
        let score = similar_text(&first, &second);
        prop_assert!(score <= first.len().min(second.len()));
    }

    #[test]
    fn alias_lookup_ignores_case_and_padding(
        alias in "[a-z]{1,8}( [a-z]{1,8}){0,2}",
        upper in proptest::collection::vec(any::<bool>(), 26),
        left in " {0,3}",
        right in " {0,3}"
    ) {
        let matcher = AliasMatcher::new(AliasMap::new(vec![(AccountId::Number(7), vec![alias.clone()])]));
        let accounts = account_set(&["Checking".to_string()]);
        let spoken: String = alias
            .chars()
            .enumerate()
            .map(|(i, c)| if upper[i % 26] { c.to_ascii_uppercase() } else { c })
            .collect();

        let canonical = matcher.resolve(&alias, &accounts).unwrap();
        let varied = matcher.resolve(&format!("{}{}{}", left, spoken, right), &accounts).unwrap();

        prop_assert_eq!(canonical, varied);
    }
}
