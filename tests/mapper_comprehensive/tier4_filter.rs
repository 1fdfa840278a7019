//! Tier 4: Filter Translation
//!
//! Filters are conjunctions of clauses. Each clause becomes one fragment
//! addressed by storage name; the whole filter is parenthesised, and an empty
//! or missing filter matches everything.

use crate::test_utils::*;
use std::sync::Arc;
use stratamap::{
    translate_filter, DataSpec, DataType, Filter, FilterClause, FilterValue, QueryConfigError,
    Schema, Value, MATCH_ALL,
};

fn tagged_schema() -> Arc<Schema> {
    Arc::new(
        Schema::builder()
            .key("hotel_id")
            .data(DataSpec::new("amenities", DataType::StringList).storage_name("amenity_tags"))
            .data(DataSpec::new("floors", DataType::Int64))
            .build()
            .unwrap(),
    )
}

#[test]
fn test_missing_and_empty_filters_match_all() {
    let schema = hotel_schema();
    assert_eq!(translate_filter(&schema, None).unwrap(), MATCH_ALL);
    assert_eq!(translate_filter(&schema, Some(&Filter::new())).unwrap(), MATCH_ALL);
}

#[test]
fn test_renamed_field_addressed_by_storage_name() {
    let filter = Filter::new().eq("city", "Lisbon");
    assert_eq!(
        translate_filter(&hotel_schema(), Some(&filter)).unwrap(),
        "(@city_name:{Lisbon})"
    );
}

#[test]
fn test_float_equality_range() {
    let filter = Filter::new().eq("rating", 4.5);
    assert_eq!(
        translate_filter(&hotel_schema(), Some(&filter)).unwrap(),
        "(@rating:[4.5 4.5])"
    );
}

/// Integer values are accepted for float fields and vice versa
#[test]
fn test_numeric_kinds_interchangeable() {
    let schema = hotel_schema();
    let filter = Filter::new().eq("rating", 4).eq("rooms", 10.0);
    assert_eq!(
        translate_filter(&schema, Some(&filter)).unwrap(),
        "(@rating:[4 4] @rooms:[10 10])"
    );
}

#[test]
fn test_tag_containment_on_list_field() {
    let filter = Filter::new()
        .any_tag_eq("amenities", "sea view")
        .eq("floors", 12i64);
    assert_eq!(
        translate_filter(&tagged_schema(), Some(&filter)).unwrap(),
        r"(@amenity_tags:{sea\ view} @floors:[12 12])"
    );
}

#[test]
fn test_clause_accessors() {
    let filter = Filter::new().eq("city", "Faro").any_tag_eq("amenities", "spa");
    assert_eq!(filter.len(), 2);
    assert_eq!(filter.clauses()[0].field(), "city");
    assert_eq!(
        filter.clauses()[1],
        FilterClause::AnyTagEquals {
            field: "amenities".to_string(),
            tag: "spa".to_string()
        }
    );
}

#[test]
fn test_try_eq_from_record_value() {
    let filter = Filter::new()
        .try_eq("name", Value::from("Grand"))
        .unwrap()
        .try_eq("rooms", Value::Int32(50))
        .unwrap();
    assert_eq!(
        filter.clauses()[1],
        FilterClause::Equality {
            field: "rooms".to_string(),
            value: FilterValue::Int32(50)
        }
    );
    assert_eq!(
        translate_filter(&hotel_schema(), Some(&filter)).unwrap(),
        "(@name:{Grand} @rooms:[50 50])"
    );
}

#[test]
fn test_injection_attempt_escaped() {
    let filter = Filter::new().eq("name", "x} @rating:[0 5");
    assert_eq!(
        translate_filter(&hotel_schema(), Some(&filter)).unwrap(),
        r"(@name:{x\}\ \@rating\:\[0\ 5})"
    );
}

#[test]
fn test_first_bad_clause_fails_whole_filter() {
    let filter = Filter::new().eq("name", "Grand").eq("stars", 5);
    let err = translate_filter(&hotel_schema(), Some(&filter)).unwrap_err();
    assert_eq!(
        err,
        QueryConfigError::UnknownField {
            field: "stars".to_string()
        }
    );
}

#[test]
fn test_vector_field_not_filterable_by_storage_or_logical_name() {
    let err = translate_filter(
        &hotel_schema(),
        Some(&Filter::new().eq("description_embedding", "x")),
    )
    .unwrap_err();
    assert!(matches!(err, QueryConfigError::NotFilterable { .. }));
}
