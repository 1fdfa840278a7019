//! Tier 5: Query Building
//!
//! A similarity search becomes one native query: the filter fragment, a KNN
//! clause over `top + skip` neighbours on the vector's storage name, the
//! query vector as a bound parameter, and a `LIMIT skip top+skip` window.

use crate::test_utils::*;
use stratamap::{
    encode_vector, DistanceFunction, Filter, MapperConfig, QueryArg, QueryBuilder, QueryConfig,
    QueryConfigError, Record, SearchOptions, SortOrder, VectorValue,
};

fn builder() -> QueryBuilder<Record> {
    QueryBuilder::new(hotel_schema(), QueryConfig::default()).unwrap()
}

fn query_vector() -> VectorValue {
    VectorValue::Float32(random_vector(HOTEL_DIMENSION, 42))
}

#[test]
fn test_knn_clause_uses_vector_storage_name() {
    let query = builder()
        .build(&query_vector(), &SearchOptions::new().with_top(4))
        .unwrap();
    assert_eq!(query.query, "*=>[KNN 4 @desc_vec $vector AS vector_score]");
}

#[test]
fn test_filtered_paged_search() {
    let options = SearchOptions::new()
        .with_top(10)
        .with_skip(5)
        .with_filter(Filter::new().eq("city", "Lisbon").eq("rooms", 100));
    let query = builder().build(&query_vector(), &options).unwrap();

    assert_eq!(
        query.query,
        "(@city_name:{Lisbon} @rooms:[100 100])=>[KNN 15 @desc_vec $vector AS vector_score]"
    );
    assert_eq!(query.offset, 5);
    assert_eq!(query.count, 15);
    assert_eq!(query.limit_clause(), "LIMIT 5 15");
}

#[test]
fn test_sorted_ascending_by_score() {
    let query = builder().build(&query_vector(), &SearchOptions::new()).unwrap();
    assert_eq!(query.sort_by, Some(("vector_score".to_string(), SortOrder::Asc)));
    let score = query.score.unwrap();
    assert_eq!(score.name, "vector_score");
    assert_eq!(score.distance, DistanceFunction::CosineSimilarity);
}

#[test]
fn test_default_projection_is_data_fields_and_score() {
    let query = builder().build(&query_vector(), &SearchOptions::new()).unwrap();
    assert_eq!(
        query.return_fields,
        Some(vec![
            "name".to_string(),
            "city_name".to_string(),
            "rating".to_string(),
            "rooms".to_string(),
            "vector_score".to_string(),
        ])
    );
}

#[test]
fn test_packed_bytes_accepted_as_query_vector() {
    let bytes = encode_vector(&query_vector());
    let from_bytes = builder().build_with_bytes(&bytes, &SearchOptions::new()).unwrap();
    let from_value = builder().build(&query_vector(), &SearchOptions::new()).unwrap();
    assert_eq!(from_bytes, from_value);
}

#[test]
fn test_query_settings_from_config() {
    let config = MapperConfig::from_toml_str(
        r#"
storage_type = "hash"

[query]
score_field = "dist"
vector_param = "qv"
dialect = 3
default_top = 7
"#,
    )
    .unwrap();
    let builder = QueryBuilder::from_config(hotel_schema(), &config).unwrap();
    let query = builder.build(&query_vector(), &SearchOptions::new()).unwrap();

    assert_eq!(query.query, "*=>[KNN 7 @desc_vec $qv AS dist]");
    assert_eq!(query.dialect, 3);
    assert_eq!(query.params[0].0, "qv");
    assert_eq!(query.return_fields.as_ref().unwrap().last().unwrap(), "dist");
}

#[test]
fn test_rendered_arguments_for_full_record_search() {
    let options = SearchOptions::new().with_top(1).with_include_vectors(true);
    let query = builder().build(&query_vector(), &options).unwrap();
    let args = query.to_args("hotels");

    assert_eq!(args[0], QueryArg::Text("hotels".to_string()));
    assert!(!args.contains(&QueryArg::Text("RETURN".to_string())));
    assert!(args.contains(&QueryArg::Blob(encode_vector(&query_vector()))));
    assert_eq!(
        &args[args.len() - 2..],
        &[QueryArg::Text("DIALECT".to_string()), QueryArg::Text("2".to_string())]
    );
}

/// Vector resolution happens before filter translation
#[test]
fn test_vector_errors_reported_before_filter_errors() {
    let options = SearchOptions::new()
        .with_vector_property("photo_embedding")
        .with_filter(Filter::new().eq("stars", 5));
    let err = builder().build(&query_vector(), &options).unwrap_err();
    assert!(matches!(err, QueryConfigError::VectorFieldNotFound { .. }));
}

#[test]
fn test_dimension_mismatch_rejected() {
    let err = builder()
        .build(&VectorValue::Float32(vec![0.0; 8]), &SearchOptions::new())
        .unwrap_err();
    assert!(matches!(err, QueryConfigError::VectorMismatch { .. }));
}

#[test]
fn test_filter_only_query() {
    let options = SearchOptions::new()
        .with_top(20)
        .with_filter(Filter::new().eq("name", "Grand"))
        .with_projection(["name", "rating"]);
    let query = builder().build_filter_query(&options).unwrap();

    assert_eq!(query.query, "(@name:{Grand})");
    assert_eq!(
        query.return_fields,
        Some(vec!["name".to_string(), "rating".to_string()])
    );
    assert!(query.sort_by.is_none());
    assert_eq!(query.limit_clause(), "LIMIT 0 20");
}
