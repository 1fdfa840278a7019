//! Document (JSON-style) encoding
//!
//! A record becomes its key plus one JSON object holding every data and
//! vector property under its storage name. The key itself is carried out of
//! band and never appears in the document.
//!
//! Differences from the [flat encoding](crate::flat):
//!
//! - Vectors are arrays of numbers, never packed bytes.
//! - Null data *and* null vector values are written as explicit JSON nulls.
//! - Vector properties with an attached generator are skipped on decode,
//!   since the generated vector cannot be turned back into its source value.
//! - `include_vectors` does not filter decoded vectors. Callers that asked
//!   the store not to return vectors simply get none back to decode.
//!
//! Scalar serialization goes through a [`ValuePolicy`], so callers can
//! change how values are represented without touching the mapping rules.

use crate::convert::{coerce_value, parse_scalar};
use crate::{check_vector, read_key, strip_prefix};
use serde_json::{Map, Number, Value as JsonValue};
use std::fmt::Debug;
use std::sync::Arc;
use stratamap_core::{
    DataType, ElementKind, GeneratedEmbeddings, MappingError, Schema, Value, VectorElements,
    VectorShape, VectorValue,
};
use tracing::debug;

// ============================================================================
// Value policy
// ============================================================================

/// Serialization policy for document values
///
/// Data conversion is required; vector conversion has a default that writes
/// plain arrays of numbers.
pub trait ValuePolicy: Send + Sync + Debug {
    /// Serialize a non-null data value already converted to `data_type`
    fn serialize_data(
        &self,
        field: &str,
        data_type: DataType,
        value: &Value,
    ) -> Result<JsonValue, MappingError>;

    /// Deserialize a non-null document value into `data_type`
    fn deserialize_data(
        &self,
        field: &str,
        data_type: DataType,
        json: &JsonValue,
    ) -> Result<Value, MappingError>;

    /// Serialize vector elements
    fn serialize_vector(
        &self,
        field: &str,
        elements: VectorElements<'_>,
    ) -> Result<JsonValue, MappingError> {
        let numbers = match elements {
            VectorElements::Float32(v) => v
                .iter()
                .map(|&x| finite_number(field, x as f64))
                .collect::<Result<Vec<_>, _>>()?,
            VectorElements::Float64(v) => v
                .iter()
                .map(|&x| finite_number(field, x))
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(JsonValue::Array(numbers))
    }

    /// Deserialize a non-null document value into a vector
    fn deserialize_vector(
        &self,
        field: &str,
        json: &JsonValue,
        kind: ElementKind,
        shape: VectorShape,
    ) -> Result<VectorValue, MappingError> {
        let items = json.as_array().ok_or_else(|| {
            MappingError::conversion(field, "vector", "expected an array of numbers")
        })?;
        let elements = items
            .iter()
            .map(|item| {
                item.as_f64().ok_or_else(|| {
                    MappingError::conversion(
                        field,
                        kind.name(),
                        format!("non-numeric element {}", item),
                    )
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        Ok(match kind {
            ElementKind::Float32 => {
                VectorValue::from_f32(elements.into_iter().map(|x| x as f32).collect(), shape)
            }
            ElementKind::Float64 => VectorValue::from_f64(elements, shape),
        })
    }
}

/// Plain JSON scalars: numbers, booleans, strings and string arrays
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValuePolicy;

impl ValuePolicy for DefaultValuePolicy {
    fn serialize_data(
        &self,
        field: &str,
        data_type: DataType,
        value: &Value,
    ) -> Result<JsonValue, MappingError> {
        match value {
            Value::Bool(b) => Ok(JsonValue::Bool(*b)),
            Value::Int32(n) => Ok(JsonValue::from(*n)),
            Value::Int64(n) => Ok(JsonValue::from(*n)),
            Value::Float32(n) => finite_number(field, *n as f64),
            Value::Float64(n) => finite_number(field, *n),
            Value::String(s) => Ok(JsonValue::String(s.clone())),
            Value::StringList(list) => Ok(JsonValue::Array(
                list.iter().cloned().map(JsonValue::String).collect(),
            )),
            Value::Null => Ok(JsonValue::Null),
            Value::Vector(_) => Err(MappingError::conversion(
                field,
                data_type.name(),
                "found vector",
            )),
        }
    }

    fn deserialize_data(
        &self,
        field: &str,
        data_type: DataType,
        json: &JsonValue,
    ) -> Result<Value, MappingError> {
        let mismatch = || {
            MappingError::conversion(field, data_type.name(), format!("found JSON {}", json))
        };
        match (data_type, json) {
            (_, JsonValue::Null) => Ok(Value::Null),
            (DataType::String, JsonValue::String(s)) => Ok(Value::String(s.clone())),
            // Projected fields arrive as JSON text, so "123" reads back as a number
            (DataType::String, JsonValue::Number(n)) => Ok(Value::String(n.to_string())),
            (DataType::String, JsonValue::Bool(b)) => Ok(Value::String(b.to_string())),
            (_, JsonValue::String(s)) => parse_scalar(field, s, data_type),
            (DataType::Bool, JsonValue::Bool(b)) => Ok(Value::Bool(*b)),
            (DataType::Int32 | DataType::Int64, JsonValue::Number(n)) => {
                let n = n.as_i64().ok_or_else(mismatch)?;
                coerce_value(field, Value::Int64(n), data_type)
            }
            (DataType::Float32 | DataType::Float64, JsonValue::Number(n)) => {
                let n = n.as_f64().ok_or_else(mismatch)?;
                coerce_value(field, Value::Float64(n), data_type)
            }
            (DataType::StringList, JsonValue::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or_else(mismatch))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::StringList),
            _ => Err(mismatch()),
        }
    }
}

fn finite_number(field: &str, n: f64) -> Result<JsonValue, MappingError> {
    Number::from_f64(n).map(JsonValue::Number).ok_or_else(|| {
        MappingError::Serialization(format!(
            "field '{}': {} is not representable in JSON",
            field, n
        ))
    })
}

// ============================================================================
// Payload
// ============================================================================

/// Document storage payload: key plus one JSON tree
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPayload {
    /// Storage key (prefixed if prefixing is enabled)
    pub key: String,
    /// Document body, without the key
    pub document: JsonValue,
}

impl DocumentPayload {
    /// Create a payload
    pub fn new(key: impl Into<String>, document: JsonValue) -> Self {
        DocumentPayload {
            key: key.into(),
            document,
        }
    }

    /// Parse the document from JSON text
    pub fn from_json_text(key: impl Into<String>, text: &str) -> Result<Self, MappingError> {
        let key = key.into();
        let document = serde_json::from_str(text)
            .map_err(|e| MappingError::malformed(key.clone(), format!("invalid JSON: {}", e)))?;
        Ok(DocumentPayload { key, document })
    }

    /// Serialize the document to JSON text
    pub fn to_json_text(&self) -> Result<String, MappingError> {
        serde_json::to_string(&self.document)
            .map_err(|e| MappingError::Serialization(e.to_string()))
    }

    /// The document object, unwrapping a one-element array
    fn object(&self) -> Result<&Map<String, JsonValue>, MappingError> {
        match &self.document {
            JsonValue::Object(map) => Ok(map),
            JsonValue::Array(items) if items.len() == 1 => match &items[0] {
                JsonValue::Object(map) => Ok(map),
                _ => Err(MappingError::malformed(
                    &self.key,
                    "array element is not an object",
                )),
            },
            JsonValue::Array(items) => Err(MappingError::malformed(
                &self.key,
                format!("expected one document, got an array of {}", items.len()),
            )),
            other => Err(MappingError::malformed(
                &self.key,
                format!("expected a JSON object, got {}", json_kind(other)),
            )),
        }
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

// ============================================================================
// Mapper
// ============================================================================

/// Maps records to and from [`DocumentPayload`]s
#[derive(Debug)]
pub struct DocumentMapper<R> {
    schema: Arc<Schema<R>>,
    policy: Arc<dyn ValuePolicy>,
    key_prefix: Option<String>,
}

impl<R> Clone for DocumentMapper<R> {
    fn clone(&self) -> Self {
        DocumentMapper {
            schema: Arc::clone(&self.schema),
            policy: Arc::clone(&self.policy),
            key_prefix: self.key_prefix.clone(),
        }
    }
}

impl<R> DocumentMapper<R> {
    /// Create a mapper using [`DefaultValuePolicy`]
    pub fn new(schema: Arc<Schema<R>>) -> Self {
        DocumentMapper {
            schema,
            policy: Arc::new(DefaultValuePolicy),
            key_prefix: None,
        }
    }

    /// Builder: replace the value policy
    pub fn with_policy(mut self, policy: Arc<dyn ValuePolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Builder: prefix storage keys
    pub fn with_key_prefix(mut self, prefix: Option<String>) -> Self {
        self.key_prefix = prefix;
        self
    }

    /// The schema this mapper encodes
    pub fn schema(&self) -> &Arc<Schema<R>> {
        &self.schema
    }

    /// Key prefix, if any
    pub fn key_prefix(&self) -> Option<&str> {
        self.key_prefix.as_deref()
    }

    /// Encode one record without generated embeddings
    pub fn to_payload(&self, record: &R) -> Result<DocumentPayload, MappingError> {
        self.encode(record, 0, None)
    }

    /// Encode record `index` of a batch, using its generated embeddings
    pub fn to_payload_with(
        &self,
        record: &R,
        index: usize,
        generated: &GeneratedEmbeddings,
    ) -> Result<DocumentPayload, MappingError> {
        self.encode(record, index, Some(generated))
    }

    /// Encode a batch; each record succeeds or fails on its own
    pub fn to_payloads(
        &self,
        records: &[R],
        generated: &GeneratedEmbeddings,
    ) -> Vec<Result<DocumentPayload, MappingError>> {
        records
            .iter()
            .enumerate()
            .map(|(i, record)| self.to_payload_with(record, i, generated))
            .collect()
    }

    fn encode(
        &self,
        record: &R,
        index: usize,
        generated: Option<&GeneratedEmbeddings>,
    ) -> Result<DocumentPayload, MappingError> {
        let key = read_key(&self.schema, record, self.key_prefix.as_deref())?;
        let mut document = Map::new();

        for property in self.schema.data_properties() {
            let json = match property.get(record) {
                None => continue,
                Some(Value::Null) => JsonValue::Null,
                Some(value) => {
                    let value = coerce_value(property.name(), value, property.data_type())?;
                    self.policy
                        .serialize_data(property.storage_name(), property.data_type(), &value)?
                }
            };
            document.insert(property.storage_name().to_string(), json);
        }

        for property in self.schema.vector_properties() {
            let storage_name = property.storage_name();
            if let Some(embedding) = generated.and_then(|g| g.get(property.name(), index)) {
                let vector = VectorValue::Embedding(embedding.clone());
                check_vector(property, &vector)?;
                let json = self.policy.serialize_vector(storage_name, vector.elements())?;
                document.insert(storage_name.to_string(), json);
                continue;
            }
            let json = match property.get(record) {
                None => continue,
                Some(Value::Null) => JsonValue::Null,
                Some(Value::Vector(vector)) => {
                    check_vector(property, &vector)?;
                    self.policy.serialize_vector(storage_name, vector.elements())?
                }
                Some(_) if property.has_generator() => {
                    return Err(MappingError::EmbeddingNotGenerated {
                        property: property.name().to_string(),
                    });
                }
                Some(other) => {
                    return Err(MappingError::conversion(
                        property.name(),
                        "vector",
                        format!("found {}", other.type_name()),
                    ));
                }
            };
            document.insert(storage_name.to_string(), json);
        }

        debug!(
            target: "stratamap::document",
            key = %key,
            fields = document.len(),
            "Encoded record"
        );
        Ok(DocumentPayload {
            key,
            document: JsonValue::Object(document),
        })
    }
}

impl<R: Default> DocumentMapper<R> {
    /// Decode one payload into a fresh record
    ///
    /// Accepts a document object or a one-element array holding one.
    /// `include_vectors` does not filter output here; every vector present in
    /// the document is decoded.
    pub fn from_payload(
        &self,
        payload: &DocumentPayload,
        include_vectors: bool,
    ) -> Result<R, MappingError> {
        let object = payload.object()?;
        let mut record = R::default();
        let key = strip_prefix(&payload.key, self.key_prefix.as_deref());
        self.schema.key().set(&mut record, key.to_string())?;

        for property in self.schema.data_properties() {
            let value = match object.get(property.storage_name()) {
                None => continue,
                Some(JsonValue::Null) => Value::Null,
                Some(json) => {
                    self.policy
                        .deserialize_data(property.storage_name(), property.data_type(), json)?
                }
            };
            property.set(&mut record, value)?;
        }

        for property in self.schema.vector_properties() {
            if property.has_generator() {
                debug!(
                    target: "stratamap::document",
                    key = %key,
                    property = property.name(),
                    "Skipping generated vector property"
                );
                continue;
            }
            let value = match object.get(property.storage_name()) {
                None => continue,
                Some(JsonValue::Null) => Value::Null,
                Some(json) => {
                    let vector = self.policy.deserialize_vector(
                        property.storage_name(),
                        json,
                        property.element_kind(),
                        property.shape(),
                    )?;
                    check_vector(property, &vector)?;
                    Value::Vector(vector)
                }
            };
            property.set(&mut record, value)?;
        }

        debug!(
            target: "stratamap::document",
            key = %key,
            include_vectors,
            "Decoded record"
        );
        Ok(record)
    }

    /// Decode a batch; each payload succeeds or fails on its own
    pub fn from_payloads(
        &self,
        payloads: &[DocumentPayload],
        include_vectors: bool,
    ) -> Vec<Result<R, MappingError>> {
        payloads
            .iter()
            .map(|payload| self.from_payload(payload, include_vectors))
            .collect()
    }
}
