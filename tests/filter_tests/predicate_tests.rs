//! Tests for the filter engine
//!
//! These tests verify:
//! - Literal equality and every comparison operator
//! - `$and` / `$or` / `$not` combinators
//! - Substring field-name fallback
//! - Non-numeric ordering and malformed predicates never erroring
//! - Sort, skip, limit and projection

use jsondb::document::Document;
use jsondb::filter::{compare_numbers, matches, resolve_field, Filter, FindOptions, SortOrder};
use jsondb::Value;
use serde_json::json;
use std::cmp::Ordering;

// =============================================================================
// Helper Functions
// =============================================================================

fn doc(value: serde_json::Value) -> Document {
    Document::from_json(value).unwrap()
}

fn check(document: serde_json::Value, predicate: serde_json::Value) -> bool {
    matches(&doc(document), &doc(predicate))
}

// =============================================================================
// Equality Tests
// =============================================================================

#[test]
fn test_empty_predicate_matches_everything() {
    assert!(check(json!({"a": 1}), json!({})));
}

#[test]
fn test_literal_equality() {
    assert!(check(json!({"status": "active"}), json!({"status": "active"})));
    assert!(!check(json!({"status": "active"}), json!({"status": "banned"})));
}

#[test]
fn test_equality_has_no_cross_type_coercion() {
    assert!(!check(json!({"n": 1}), json!({"n": "1"})));
    assert!(!check(json!({"n": true}), json!({"n": 1})));
    assert!(check(json!({"n": 1}), json!({"n": 1.0})));
}

#[test]
fn test_eq_and_ne_operators() {
    assert!(check(json!({"a": 5}), json!({"a": {"$eq": 5}})));
    assert!(check(json!({"a": 5}), json!({"a": {"$ne": 6}})));
    assert!(!check(json!({"a": 5}), json!({"a": {"$ne": 5}})));
}

#[test]
fn test_literal_map_is_matched_whole() {
    let d = json!({"addr": {"city": "Oslo", "zip": 150}});
    assert!(check(d.clone(), json!({"addr": {"city": "Oslo", "zip": 150}})));
    assert!(!check(d, json!({"addr": {"city": "Oslo"}})));
}

#[test]
fn test_empty_map_operand_is_a_literal() {
    assert!(check(json!({"meta": {}}), json!({"meta": {}})));
    assert!(!check(json!({"meta": {"k": 1}}), json!({"meta": {}})));
}

#[test]
fn test_dot_path_keys() {
    let d = json!({"addr": {"city": "Oslo"}});
    assert!(check(d.clone(), json!({"addr.city": "Oslo"})));
    assert!(!check(d, json!({"addr.city": "Bergen"})));
}

// =============================================================================
// Ordering Tests
// =============================================================================

#[test]
fn test_numeric_ordering_operators() {
    let d = json!({"age": 20});
    assert!(check(d.clone(), json!({"age": {"$gt": 18}})));
    assert!(check(d.clone(), json!({"age": {"$gte": 20}})));
    assert!(check(d.clone(), json!({"age": {"$lt": 21}})));
    assert!(check(d.clone(), json!({"age": {"$lte": 20}})));
    assert!(!check(d.clone(), json!({"age": {"$gt": 20}})));
    assert!(!check(d, json!({"age": {"$lt": 20}})));
}

#[test]
fn test_range_conditions_are_anded() {
    let predicate = json!({"age": {"$gte": 18, "$lt": 65}});
    assert!(check(json!({"age": 30}), predicate.clone()));
    assert!(!check(json!({"age": 70}), predicate.clone()));
    assert!(!check(json!({"age": 10}), predicate));
}

#[test]
fn test_non_numeric_values_compare_equal() {
    assert_eq!(
        compare_numbers(&Value::from("b"), &Value::from("a")),
        Ordering::Equal
    );
    assert_eq!(compare_numbers(&Value::from(1), &Value::from("a")), Ordering::Equal);

    // Strict ordering never matches, inclusive ordering always does
    assert!(!check(json!({"name": "bob"}), json!({"name": {"$gt": "alice"}})));
    assert!(!check(json!({"name": "bob"}), json!({"name": {"$lt": "zed"}})));
    assert!(check(json!({"name": "bob"}), json!({"name": {"$gte": "zed"}})));
    assert!(check(json!({"name": "bob"}), json!({"name": {"$lte": "alice"}})));
}

// =============================================================================
// Membership and Regex Tests
// =============================================================================

#[test]
fn test_in_and_nin() {
    let d = json!({"color": "red"});
    assert!(check(d.clone(), json!({"color": {"$in": ["red", "blue"]}})));
    assert!(!check(d.clone(), json!({"color": {"$in": ["green"]}})));
    assert!(check(d.clone(), json!({"color": {"$nin": ["green"]}})));
    assert!(!check(d, json!({"color": {"$nin": ["red"]}})));
}

#[test]
fn test_in_with_non_list_operand_never_matches() {
    assert!(!check(json!({"a": 1}), json!({"a": {"$in": 1}})));
    assert!(!check(json!({"a": 1}), json!({"a": {"$nin": 2}})));
}

#[test]
fn test_regex_is_a_search_not_a_full_match() {
    let d = json!({"email": "ann@example.com"});
    assert!(check(d.clone(), json!({"email": {"$regex": "example"}})));
    assert!(check(d.clone(), json!({"email": {"$regex": "^ann@"}})));
    assert!(!check(d, json!({"email": {"$regex": "^bob"}})));
}

#[test]
fn test_regex_requires_string_value() {
    assert!(!check(json!({"n": 123}), json!({"n": {"$regex": "1"}})));
}

#[test]
fn test_invalid_regex_never_matches() {
    assert!(!check(json!({"s": "(("}), json!({"s": {"$regex": "(("}})));
}

// =============================================================================
// Combinator Tests
// =============================================================================

#[test]
fn test_and_with_not() {
    let predicate = json!({"$and": [{"age": {"$gte": 18}}, {"$not": {"status": "banned"}}]});
    assert!(check(json!({"age": 20, "status": "active"}), predicate.clone()));
    assert!(!check(json!({"age": 16, "status": "active"}), predicate.clone()));
    assert!(!check(json!({"age": 30, "status": "banned"}), predicate));
}

#[test]
fn test_or() {
    let predicate = json!({"$or": [{"a": 1}, {"b": 2}]});
    assert!(check(json!({"a": 1, "b": 0}), predicate.clone()));
    assert!(check(json!({"a": 0, "b": 2}), predicate.clone()));
    assert!(!check(json!({"a": 0, "b": 0}), predicate));
}

#[test]
fn test_empty_combinator_lists() {
    assert!(check(json!({"a": 1}), json!({"$and": []})));
    assert!(!check(json!({"a": 1}), json!({"$or": []})));
}

#[test]
fn test_malformed_combinators_never_match() {
    assert!(!check(json!({"a": 1}), json!({"$and": {"a": 1}})));
    assert!(!check(json!({"a": 1}), json!({"$or": "a"})));
    assert!(!check(json!({"a": 1}), json!({"$not": [{"a": 2}]})));
    assert!(!check(json!({"a": 1}), json!({"$and": [{"a": 1}, 5]})));
}

#[test]
fn test_unknown_operator_never_matches() {
    assert!(!check(json!({"a": 1}), json!({"a": {"$near": 1}})));
}

// =============================================================================
// Field Resolution Tests
// =============================================================================

#[test]
fn test_missing_field_never_matches() {
    assert!(!check(json!({"a": 1}), json!({"zzz": 1})));
    assert!(!check(json!({"a": 1}), json!({"zzz": {"$ne": 1}})));
}

#[test]
fn test_substring_fallback_on_top_level_names() {
    let d = json!({"user_name": "ann"});
    assert!(check(d.clone(), json!({"name": "ann"})));
    assert!(check(d, json!({"user": {"$regex": "^a"}})));
}

#[test]
fn test_substring_fallback_takes_first_field_in_key_order() {
    let d = doc(json!({"b_name": "second", "a_name": "first"}));
    assert_eq!(resolve_field(&d, "name"), Some(&Value::from("first")));
}

#[test]
fn test_exact_path_wins_over_fallback() {
    let d = doc(json!({"name": "exact", "aname": "fuzzy"}));
    assert_eq!(resolve_field(&d, "name"), Some(&Value::from("exact")));
}

#[test]
fn test_compiled_filter_is_reusable() {
    let filter = Filter::compile(&doc(json!({"n": {"$gt": 2}})));
    let hits = (0..5)
        .map(|n| doc(json!({"n": n})))
        .filter(|d| filter.matches(d))
        .count();
    assert_eq!(hits, 2);
}

// =============================================================================
// Find Options Tests
// =============================================================================

#[test]
fn test_sort_skip_limit() {
    let docs: Vec<Document> = [5, 3, 9, 1, 7].iter().map(|n| doc(json!({"n": n}))).collect();
    let options = FindOptions::new()
        .sort_by("n", SortOrder::Ascending)
        .skip(1)
        .limit(2);

    let out: Vec<f64> = options
        .apply(docs)
        .iter()
        .map(|d| d.get("n").and_then(Value::as_f64).unwrap())
        .collect();
    assert_eq!(out, vec![3.0, 5.0]);
}

#[test]
fn test_multi_key_sort_falls_through_on_ties() {
    let docs = vec![
        doc(json!({"g": 1, "n": 1})),
        doc(json!({"g": 2, "n": 5})),
        doc(json!({"g": 1, "n": 3})),
    ];
    let options = FindOptions::new()
        .sort_by("g", SortOrder::Ascending)
        .sort_by("n", SortOrder::Descending);

    let out: Vec<(f64, f64)> = options
        .apply(docs)
        .iter()
        .map(|d| {
            (
                d.get("g").and_then(Value::as_f64).unwrap(),
                d.get("n").and_then(Value::as_f64).unwrap(),
            )
        })
        .collect();
    assert_eq!(out, vec![(1.0, 3.0), (1.0, 1.0), (2.0, 5.0)]);
}

#[test]
fn test_sort_keeps_order_of_incomparable_values() {
    let docs = vec![
        doc(json!({"k": "b", "pos": 0})),
        doc(json!({"k": "a", "pos": 1})),
        doc(json!({"pos": 2})),
    ];
    let out = FindOptions::new().sort_by("k", SortOrder::Ascending).apply(docs);
    let positions: Vec<f64> = out
        .iter()
        .map(|d| d.get("pos").and_then(Value::as_f64).unwrap())
        .collect();
    assert_eq!(positions, vec![0.0, 1.0, 2.0]);
}

#[test]
fn test_skip_past_end_is_empty() {
    let docs = vec![doc(json!({"a": 1}))];
    assert!(FindOptions::new().skip(5).apply(docs).is_empty());
}

#[test]
fn test_projection() {
    let docs = vec![doc(json!({"_id": "x", "a": 1, "b": 2}))];
    let out = FindOptions::new().project(["b"]).apply(docs);
    assert_eq!(serde_json::Value::from(out[0].clone()), json!({"_id": "x", "b": 2}));
}

#[test]
fn test_sort_direction_from_number() {
    assert_eq!(SortOrder::from_direction(1), SortOrder::Ascending);
    assert_eq!(SortOrder::from_direction(-1), SortOrder::Descending);
}
