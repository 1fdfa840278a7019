//! Tier 6: End to End
//!
//! Config-driven flows through every layer: configuration and schema
//! definitions from TOML, encoding for storage, query building, and decoding
//! the rows a store would return.

use crate::test_utils::*;
use std::sync::Arc;
use stratamap::{
    Filter, FlatValue, MapperConfig, QueryBuilder, RawRow, Record, RecordMapper, ResultProcessor,
    SchemaDefinition, SearchOptions, StorageType, StoragePayload, Value, VectorValue,
    CONFIG_FILE_NAME,
};
use tempfile::TempDir;

const HOTEL_SCHEMA_TOML: &str = r#"
[key]
name = "hotel_id"

[[data]]
name = "name"
type = "string"

[[data]]
name = "city"
storage_name = "city_name"
type = "string"

[[data]]
name = "rating"
type = "float64"

[[vectors]]
name = "description_embedding"
storage_name = "desc_vec"
element_kind = "float32"
dimension = 4
distance = "cosine_similarity"
"#;

/// Rows as a hash store returns them: stored fields plus the score column
fn hash_row(payload: &StoragePayload, score: &str) -> RawRow {
    let StoragePayload::Flat(flat) = payload else {
        panic!("expected a flat payload");
    };
    let mut fields = flat.to_wire();
    fields.push(field("vector_score", score.as_bytes()));
    RawRow::new(flat.key.clone(), fields)
}

/// Rows as a document store returns them for a full-record search
fn document_row(payload: &StoragePayload, score: &str) -> RawRow {
    let StoragePayload::Document(doc) = payload else {
        panic!("expected a document payload");
    };
    let text = format!("[{}]", doc.to_json_text().unwrap());
    RawRow::new(
        doc.key.clone(),
        vec![field("vector_score", score.as_bytes()), field("$", text.as_bytes())],
    )
}

// ============================================================================
// Basic hash scenario
// ============================================================================

#[test]
fn test_hash_encode_then_decode_without_vectors() {
    let mapper = RecordMapper::from_config(color_schema(), &MapperConfig::default()).unwrap();
    let record = Record::new()
        .with("id", "a")
        .with("color", "red")
        .with("embedding", vec![0.0f32, 1.0, 2.0, 3.0]);

    let payload = mapper.to_payload(&record).unwrap();
    assert_eq!(payload.key(), "a");
    let StoragePayload::Flat(flat) = &payload else {
        panic!("default storage is hash");
    };
    assert_eq!(flat.len(), 2);
    assert_eq!(flat.get("color"), Some(&FlatValue::String("red".to_string())));
    let Some(FlatValue::Bytes(bytes)) = flat.get("embedding") else {
        panic!("embedding should be packed bytes");
    };
    assert_eq!(bytes.len(), 16);
    assert_eq!(&bytes[4..8], &1.0f32.to_le_bytes());

    let decoded = mapper.from_payload(&payload, false).unwrap();
    assert_eq!(decoded, Record::new().with("id", "a").with("color", "red"));
}

// ============================================================================
// Config files
// ============================================================================

#[test]
fn test_default_config_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);

    MapperConfig::write_default_if_missing(&path).unwrap();
    let config = MapperConfig::from_file(&path).unwrap();
    assert_eq!(config, MapperConfig::default());

    let custom = MapperConfig::new(StorageType::Json)
        .with_collection("hotels")
        .with_prefix_keys(true);
    custom.write_to_file(&path).unwrap();
    MapperConfig::write_default_if_missing(&path).unwrap();
    assert_eq!(MapperConfig::from_file(&path).unwrap(), custom);
}

#[test]
fn test_prefix_without_collection_rejected() {
    let err = MapperConfig::from_toml_str("prefix_keys = true").unwrap_err();
    assert!(err.to_string().contains("collection_name"));
}

#[test]
fn test_in_code_prefix_without_collection_rejected() {
    let config = MapperConfig::new(StorageType::Hash).with_prefix_keys(true);

    let err = RecordMapper::from_config(hotel_schema(), &config).unwrap_err();
    assert!(err.is_config_error());
    assert!(err.to_string().contains("collection_name"));

    assert!(QueryBuilder::from_config(hotel_schema(), &config).is_err());
}

// ============================================================================
// Document collection flow
// ============================================================================

#[test]
fn test_document_collection_search_flow() {
    let schema = Arc::new(
        SchemaDefinition::from_toml_str(HOTEL_SCHEMA_TOML)
            .unwrap()
            .into_schema()
            .unwrap(),
    );
    let config = MapperConfig::from_toml_str(
        r#"
storage_type = "json"
collection_name = "hotels"
prefix_keys = true
"#,
    )
    .unwrap();

    let mapper = RecordMapper::from_config(Arc::clone(&schema), &config).unwrap();
    assert_eq!(mapper.storage_type(), StorageType::Json);

    let records = vec![
        Record::new()
            .with("hotel_id", "h1")
            .with("name", "Grand")
            .with("city", "Lisbon")
            .with("rating", 4.5)
            .with("description_embedding", random_vector(HOTEL_DIMENSION, 1)),
        Record::new()
            .with("hotel_id", "h2")
            .with("name", "Plaza")
            .with("city", "Lisbon")
            .with("rating", 3.0)
            .with("description_embedding", random_vector(HOTEL_DIMENSION, 2)),
    ];
    let payloads: Vec<StoragePayload> = mapper
        .to_payloads(&records, &Default::default())
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(payloads[0].key(), "hotels:h1");

    let builder = QueryBuilder::from_config(Arc::clone(&schema), &config).unwrap();
    let options = SearchOptions::new()
        .with_top(2)
        .with_include_vectors(true)
        .with_filter(Filter::new().eq("city", "Lisbon"));
    let query = builder
        .build(&VectorValue::Float32(random_vector(HOTEL_DIMENSION, 1)), &options)
        .unwrap();
    assert_eq!(
        query.query,
        "(@city_name:{Lisbon})=>[KNN 2 @desc_vec $vector AS vector_score]"
    );
    assert_eq!(query.return_fields, None);

    let rows = vec![document_row(&payloads[0], "0"), document_row(&payloads[1], "0.5")];
    let hits = ResultProcessor::new(mapper).process(&query, rows);

    let first = hits[0].as_ref().unwrap();
    assert_eq!(first.score, Some(1.0));
    assert_eq!(first.record, records[0]);
    let second = hits[1].as_ref().unwrap();
    assert_eq!(second.score, Some(0.5));
    assert_eq!(second.record.get("hotel_id"), Some(&Value::from("h2")));
}

// ============================================================================
// Hash collection flow
// ============================================================================

#[test]
fn test_hash_collection_search_flow() {
    let schema = hotel_schema();
    let config = MapperConfig::new(StorageType::Hash)
        .with_collection("hotels")
        .with_prefix_keys(true);
    let mapper = RecordMapper::from_config(Arc::clone(&schema), &config).unwrap();

    let record = hotel("h1", "Grand", "Lisbon", 4.5, 9);
    let payload = mapper.to_payload(&record).unwrap();
    assert_eq!(payload.key(), "hotels:h1");

    let builder = QueryBuilder::from_config(Arc::clone(&schema), &config).unwrap();
    let query = builder
        .build(
            &VectorValue::Float32(random_vector(HOTEL_DIMENSION, 9)),
            &SearchOptions::new().with_top(1),
        )
        .unwrap();

    let hits = ResultProcessor::new(mapper).process(&query, vec![hash_row(&payload, "0.25")]);
    let hit = hits[0].as_ref().unwrap();
    assert_eq!(hit.score, Some(0.75));

    let mut expected = record.clone();
    expected.remove("description_embedding");
    assert_eq!(hit.record, expected);
}

/// Projected document rows carry one JSON-encoded value per field
#[test]
fn test_document_projected_rows() {
    let schema = hotel_schema();
    let config = MapperConfig::new(StorageType::Json);
    let mapper = RecordMapper::from_config(Arc::clone(&schema), &config).unwrap();
    let query = QueryBuilder::from_config(Arc::clone(&schema), &config)
        .unwrap()
        .build(
            &VectorValue::Float32(random_vector(HOTEL_DIMENSION, 3)),
            &SearchOptions::new().with_projection(["name", "rooms"]),
        )
        .unwrap();
    assert_eq!(
        query.return_fields,
        Some(vec!["name".to_string(), "rooms".to_string(), "vector_score".to_string()])
    );

    let row = RawRow::new(
        "h5",
        vec![
            field("name", b"Seaside"),
            field("rooms", b"42"),
            field("vector_score", b"0.1"),
        ],
    );
    let hit = ResultProcessor::new(mapper).process_row(&query, row).unwrap();
    assert_eq!(
        hit.record,
        Record::new()
            .with("hotel_id", "h5")
            .with("name", "Seaside")
            .with("rooms", 42i32)
    );
    assert!((hit.score.unwrap() - 0.9).abs() < 1e-12);
}
