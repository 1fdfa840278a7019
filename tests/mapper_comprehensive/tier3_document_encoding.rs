//! Tier 3: Document Encoding
//!
//! Document payloads are one JSON object per record keyed by storage name.
//! Nulls are written explicitly, absent properties are left out, and vectors
//! are arrays of numbers. Stored results may arrive wrapped in a one-element
//! array.

use crate::test_utils::*;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use stratamap::{
    DataSpec, DataType, DefaultValuePolicy, DocumentMapper, DocumentPayload, ElementKind,
    GeneratedEmbeddings, MappingError, Record, Schema, Value, ValuePolicy, VectorSpec,
};

fn mapper() -> DocumentMapper<Record> {
    DocumentMapper::new(hotel_schema())
}

// ============================================================================
// Encode
// ============================================================================

#[test]
fn test_document_keyed_by_storage_name() {
    let record = Record::new()
        .with("hotel_id", "h1")
        .with("name", "Grand")
        .with("city", "Lisbon")
        .with("rating", 4.5)
        .with("rooms", 10i32)
        .with("description_embedding", vec![0.5f32, 0.25, 0.0, 1.0]);

    let payload = mapper().to_payload(&record).unwrap();
    assert_eq!(payload.key, "h1");
    assert_eq!(
        payload.document,
        json!({
            "name": "Grand",
            "city_name": "Lisbon",
            "rating": 4.5,
            "rooms": 10,
            "desc_vec": [0.5, 0.25, 0.0, 1.0]
        })
    );
}

#[test]
fn test_explicit_null_written_absent_omitted() {
    let record = Record::new()
        .with("hotel_id", "h1")
        .with("name", "Grand")
        .with("rooms", Value::Null);

    let payload = mapper().to_payload(&record).unwrap();
    let object = payload.document.as_object().unwrap();
    assert_eq!(object.get("rooms"), Some(&JsonValue::Null));
    assert!(!object.contains_key("city_name"));
    assert!(!object.contains_key("desc_vec"));
}

#[test]
fn test_key_not_in_document() {
    let payload = mapper()
        .to_payload(&hotel("h1", "Grand", "Lisbon", 4.5, 1))
        .unwrap();
    assert!(!payload.document.as_object().unwrap().contains_key("hotel_id"));
}

#[test]
fn test_non_finite_number_rejected() {
    let record = hotel("h1", "Grand", "Lisbon", f64::NAN, 1);
    let err = mapper().to_payload(&record).unwrap_err();
    assert!(matches!(err, MappingError::Serialization(_)));
}

#[test]
fn test_string_list_written_as_array() {
    let schema = Arc::new(
        Schema::builder()
            .key("id")
            .data(DataSpec::new("tags", DataType::StringList))
            .build()
            .unwrap(),
    );
    let record = Record::new()
        .with("id", "a")
        .with("tags", vec!["pool".to_string(), "spa".to_string()]);

    let payload = DocumentMapper::new(schema).to_payload(&record).unwrap();
    assert_eq!(payload.document, json!({ "tags": ["pool", "spa"] }));
}

// ============================================================================
// Decode
// ============================================================================

#[test]
fn test_round_trip_through_json_text() {
    let mapper = mapper();
    let record = hotel("h1", "Grand", "Lisbon", 4.5, 3);
    let text = mapper.to_payload(&record).unwrap().to_json_text().unwrap();

    let payload = DocumentPayload::from_json_text("h1", &text).unwrap();
    assert_eq!(mapper.from_payload(&payload, true).unwrap(), record);
}

#[test]
fn test_array_wrapped_document_accepted() {
    let payload = DocumentPayload::new("h1", json!([{ "name": "Grand", "rooms": 3 }]));
    let decoded = mapper().from_payload(&payload, false).unwrap();
    assert_eq!(decoded.get("name"), Some(&Value::from("Grand")));
    assert_eq!(decoded.get("rooms"), Some(&Value::Int32(3)));
}

#[test]
fn test_multi_element_array_is_malformed() {
    let payload = DocumentPayload::new("h1", json!([{ "name": "a" }, { "name": "b" }]));
    let err = mapper().from_payload(&payload, false).unwrap_err();
    assert!(matches!(err, MappingError::MalformedResult { ref key, .. } if key == "h1"));
}

#[test]
fn test_scalar_document_is_malformed() {
    let payload = DocumentPayload::new("h1", json!("Grand"));
    let err = mapper().from_payload(&payload, false).unwrap_err();
    assert!(matches!(err, MappingError::MalformedResult { .. }));
}

#[test]
fn test_invalid_json_text_is_malformed() {
    let err = DocumentPayload::from_json_text("h1", "{not json").unwrap_err();
    assert!(matches!(err, MappingError::MalformedResult { .. }));
}

/// Document decoding returns every vector present, whatever the flag says
#[test]
fn test_vectors_decoded_regardless_of_flag() {
    let payload = DocumentPayload::new("h1", json!({ "desc_vec": [1.0, 0.0, 0.0, 0.0] }));
    let decoded = mapper().from_payload(&payload, false).unwrap();
    assert_eq!(
        decoded.get("description_embedding"),
        Some(&Value::from(vec![1.0f32, 0.0, 0.0, 0.0]))
    );
}

#[test]
fn test_wrong_type_is_conversion_error() {
    let payload = DocumentPayload::new("h1", json!({ "rooms": "many" }));
    let err = mapper().from_payload(&payload, false).unwrap_err();
    assert!(matches!(err, MappingError::Conversion { .. }));
}

#[test]
fn test_prefix_stripped_on_decode() {
    let mapper = mapper().with_key_prefix(Some("hotels:".to_string()));
    let decoded = mapper
        .from_payload(&DocumentPayload::new("hotels:h7", json!({})), false)
        .unwrap();
    assert_eq!(decoded.get("hotel_id"), Some(&Value::from("h7")));
}

// ============================================================================
// Generated embeddings
// ============================================================================

fn generated_schema(generator: Arc<LengthGenerator>) -> Arc<Schema> {
    Arc::new(
        Schema::builder()
            .key("id")
            .data(DataSpec::new("text", DataType::String))
            .vector(
                VectorSpec::new("text_embedding", ElementKind::Float32)
                    .dimension(3)
                    .generator(generator),
            )
            .build()
            .unwrap(),
    )
}

#[test]
fn test_generated_embedding_written() {
    let generator = Arc::new(LengthGenerator::new(3));
    let schema = generated_schema(Arc::clone(&generator));
    let records = vec![
        Record::new().with("id", "a").with("text_embedding", "hello"),
        Record::new().with("id", "b"),
        Record::new().with("id", "c").with("text_embedding", "hi"),
    ];

    let generated = GeneratedEmbeddings::generate(&schema, &records).unwrap();
    assert_eq!(generator.call_count(), 1);

    let mapper = DocumentMapper::new(schema);
    let payloads: Vec<_> = mapper
        .to_payloads(&records, &generated)
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(payloads[0].document, json!({ "text_embedding": [5.0, 0.0, 0.0] }));
    assert_eq!(payloads[1].document, json!({}));
    assert_eq!(payloads[2].document, json!({ "text_embedding": [2.0, 0.0, 0.0] }));
}

#[test]
fn test_generator_source_without_embedding_rejected() {
    let schema = generated_schema(Arc::new(LengthGenerator::new(3)));
    let record = Record::new().with("id", "a").with("text_embedding", "hello");
    let err = DocumentMapper::new(schema).to_payload(&record).unwrap_err();
    assert!(matches!(err, MappingError::EmbeddingNotGenerated { .. }));
}

#[test]
fn test_generated_vectors_skipped_on_decode() {
    let schema = generated_schema(Arc::new(LengthGenerator::new(3)));
    let payload = DocumentPayload::new(
        "a",
        json!({ "text": "hello", "text_embedding": [5.0, 0.0, 0.0] }),
    );
    let decoded = DocumentMapper::new(schema).from_payload(&payload, true).unwrap();
    assert!(!decoded.contains("text_embedding"));
    assert_eq!(decoded.get("text"), Some(&Value::from("hello")));
}

// ============================================================================
// Custom value policy
// ============================================================================

/// Stores strings upper-cased, everything else as the default policy does
#[derive(Debug)]
struct UpperCasePolicy;

impl ValuePolicy for UpperCasePolicy {
    fn serialize_data(
        &self,
        field: &str,
        data_type: DataType,
        value: &Value,
    ) -> Result<JsonValue, MappingError> {
        match value {
            Value::String(s) => Ok(JsonValue::String(s.to_uppercase())),
            other => DefaultValuePolicy.serialize_data(field, data_type, other),
        }
    }

    fn deserialize_data(
        &self,
        field: &str,
        data_type: DataType,
        json: &JsonValue,
    ) -> Result<Value, MappingError> {
        DefaultValuePolicy.deserialize_data(field, data_type, json)
    }
}

#[test]
fn test_custom_policy_used_for_data() {
    let mapper = mapper().with_policy(Arc::new(UpperCasePolicy));
    let payload = mapper
        .to_payload(&hotel("h1", "Grand", "Lisbon", 4.5, 1))
        .unwrap();
    assert_eq!(payload.document["name"], json!("GRAND"));
    assert!(payload.document["desc_vec"].is_array());
}
