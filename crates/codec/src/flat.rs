//! Flat (hash-style) encoding
//!
//! A record becomes its key plus an ordered list of `(storage name, value)`
//! pairs. Scalars stay scalars and vectors are packed by the
//! [vector codec](crate::vector_codec) into opaque byte buffers.
//!
//! ## Null handling
//!
//! | Record state          | Data property         | Vector property |
//! |-----------------------|-----------------------|-----------------|
//! | absent                | no field              | no field        |
//! | explicit null         | `FlatValue::Null`     | no field        |
//! | value                 | scalar field          | packed bytes    |
//!
//! Dropping null vectors while keeping null data fields is intentional.
//!
//! ## Wire form
//!
//! [`FlatPayload::to_wire`] renders every value as bytes: primitives as UTF-8
//! text, vectors as their packed bytes, null as an empty buffer. Fields read
//! back with [`FlatPayload::from_wire`] are all [`FlatValue::Bytes`] and are
//! converted to their declared types during decode.

use crate::convert::{coerce_value, parse_scalar};
use crate::vector_codec::{decode_vector_checked, encode_vector};
use crate::{check_vector, read_key, strip_prefix};
use std::sync::Arc;
use stratamap_core::{
    DataProperty, DataType, GeneratedEmbeddings, MappingError, Schema, SchemaError, Value,
    VectorValue,
};
use tracing::debug;

// ============================================================================
// Payload
// ============================================================================

/// One field value of a flat payload
#[derive(Debug, Clone, PartialEq)]
pub enum FlatValue {
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    Int32(i32),
    /// 64-bit integer
    Int64(i64),
    /// 32-bit float
    Float32(f32),
    /// 64-bit float
    Float64(f64),
    /// UTF-8 string
    String(String),
    /// Opaque bytes (packed vectors, or raw wire values)
    Bytes(Vec<u8>),
}

impl FlatValue {
    /// Render as wire bytes
    pub fn to_wire(&self) -> Vec<u8> {
        match self {
            FlatValue::Null => Vec::new(),
            FlatValue::Bool(b) => b.to_string().into_bytes(),
            FlatValue::Int32(n) => n.to_string().into_bytes(),
            FlatValue::Int64(n) => n.to_string().into_bytes(),
            FlatValue::Float32(n) => n.to_string().into_bytes(),
            FlatValue::Float64(n) => n.to_string().into_bytes(),
            FlatValue::String(s) => s.clone().into_bytes(),
            FlatValue::Bytes(b) => b.clone(),
        }
    }
}

/// Flat storage payload: key plus ordered fields
#[derive(Debug, Clone, PartialEq)]
pub struct FlatPayload {
    /// Storage key (prefixed if prefixing is enabled)
    pub key: String,
    /// Fields in schema order
    pub fields: Vec<(String, FlatValue)>,
}

impl FlatPayload {
    /// Create a payload
    pub fn new(key: impl Into<String>, fields: Vec<(String, FlatValue)>) -> Self {
        FlatPayload {
            key: key.into(),
            fields,
        }
    }

    /// Find a field by storage name
    pub fn get(&self, name: &str) -> Option<&FlatValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Field count
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if there are no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render every field as `(name, bytes)`
    pub fn to_wire(&self) -> Vec<(String, Vec<u8>)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_wire()))
            .collect()
    }

    /// Build a payload from raw `(name, bytes)` pairs
    pub fn from_wire(key: impl Into<String>, fields: Vec<(String, Vec<u8>)>) -> Self {
        FlatPayload {
            key: key.into(),
            fields: fields
                .into_iter()
                .map(|(name, bytes)| (name, FlatValue::Bytes(bytes)))
                .collect(),
        }
    }
}

// ============================================================================
// Mapper
// ============================================================================

/// Maps records to and from [`FlatPayload`]s
#[derive(Debug)]
pub struct FlatMapper<R> {
    schema: Arc<Schema<R>>,
    key_prefix: Option<String>,
}

impl<R> Clone for FlatMapper<R> {
    fn clone(&self) -> Self {
        FlatMapper {
            schema: Arc::clone(&self.schema),
            key_prefix: self.key_prefix.clone(),
        }
    }
}

impl<R> FlatMapper<R> {
    /// Create a mapper over a schema
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedForStorage` if a data property is a string list,
    /// which has no flat scalar form.
    pub fn new(schema: Arc<Schema<R>>) -> Result<Self, SchemaError> {
        if let Some(property) = schema
            .data_properties()
            .iter()
            .find(|p| p.data_type() == DataType::StringList)
        {
            return Err(SchemaError::UnsupportedForStorage {
                property: property.name().to_string(),
                type_name: property.data_type().name().to_string(),
                storage: "hash".to_string(),
            });
        }
        Ok(FlatMapper {
            schema,
            key_prefix: None,
        })
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
    pub fn to_payload(&self, record: &R) -> Result<FlatPayload, MappingError> {
        self.encode(record, 0, None)
    }

    /// Encode record `index` of a batch, using its generated embeddings
    pub fn to_payload_with(
        &self,
        record: &R,
        index: usize,
        generated: &GeneratedEmbeddings,
    ) -> Result<FlatPayload, MappingError> {
        self.encode(record, index, Some(generated))
    }

    /// Encode a batch; each record succeeds or fails on its own
    pub fn to_payloads(
        &self,
        records: &[R],
        generated: &GeneratedEmbeddings,
    ) -> Vec<Result<FlatPayload, MappingError>> {
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
    ) -> Result<FlatPayload, MappingError> {
        let key = read_key(&self.schema, record, self.key_prefix.as_deref())?;
        let mut fields = Vec::with_capacity(
            self.schema.data_properties().len() + self.schema.vector_properties().len(),
        );

        for property in self.schema.data_properties() {
            let Some(value) = property.get(record) else {
                continue;
            };
            let value = coerce_value(property.name(), value, property.data_type())?;
            fields.push((property.storage_name().to_string(), to_flat(value)));
        }

        for property in self.schema.vector_properties() {
            if let Some(embedding) = generated.and_then(|g| g.get(property.name(), index)) {
                let vector = VectorValue::Embedding(embedding.clone());
                check_vector(property, &vector)?;
                fields.push((
                    property.storage_name().to_string(),
                    FlatValue::Bytes(encode_vector(&vector)),
                ));
                continue;
            }
            match property.get(record) {
                None | Some(Value::Null) => {}
                Some(Value::Vector(vector)) => {
                    check_vector(property, &vector)?;
                    fields.push((
                        property.storage_name().to_string(),
                        FlatValue::Bytes(encode_vector(&vector)),
                    ));
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
            }
        }

        debug!(target: "stratamap::flat", key = %key, fields = fields.len(), "Encoded record");
        Ok(FlatPayload { key, fields })
    }
}

impl<R: Default> FlatMapper<R> {
    /// Decode one payload into a fresh record
    ///
    /// Absent fields leave the record's default untouched. With
    /// `include_vectors` false, vector properties are never read.
    pub fn from_payload(
        &self,
        payload: &FlatPayload,
        include_vectors: bool,
    ) -> Result<R, MappingError> {
        let mut record = R::default();
        let key = strip_prefix(&payload.key, self.key_prefix.as_deref());
        self.schema.key().set(&mut record, key.to_string())?;

        for property in self.schema.data_properties() {
            let Some(stored) = payload.get(property.storage_name()) else {
                continue;
            };
            let value = from_flat(property, stored)?;
            property.set(&mut record, value)?;
        }

        if include_vectors {
            for property in self.schema.vector_properties() {
                match payload.get(property.storage_name()) {
                    None | Some(FlatValue::Null) => {}
                    Some(FlatValue::Bytes(bytes)) => {
                        let vector = decode_vector_checked(
                            property.storage_name(),
                            bytes,
                            property.element_kind(),
                            property.shape(),
                            property.dimension(),
                        )?;
                        property.set(&mut record, Value::Vector(vector))?;
                    }
                    Some(_) => {
                        return Err(MappingError::conversion(
                            property.storage_name(),
                            "vector",
                            "stored value is not a byte buffer",
                        ));
                    }
                }
            }
        }

        debug!(
            target: "stratamap::flat",
            key = %key,
            include_vectors,
            "Decoded record"
        );
        Ok(record)
    }

    /// Decode a batch; each payload succeeds or fails on its own
    pub fn from_payloads(
        &self,
        payloads: &[FlatPayload],
        include_vectors: bool,
    ) -> Vec<Result<R, MappingError>> {
        payloads
            .iter()
            .map(|payload| self.from_payload(payload, include_vectors))
            .collect()
    }
}

fn to_flat(value: Value) -> FlatValue {
    match value {
        Value::Null => FlatValue::Null,
        Value::Bool(b) => FlatValue::Bool(b),
        Value::Int32(n) => FlatValue::Int32(n),
        Value::Int64(n) => FlatValue::Int64(n),
        Value::Float32(n) => FlatValue::Float32(n),
        Value::Float64(n) => FlatValue::Float64(n),
        Value::String(s) => FlatValue::String(s),
        // Rejected by coerce_value and FlatMapper::new before reaching here
        Value::StringList(list) => FlatValue::String(list.join(",")),
        Value::Vector(v) => FlatValue::Bytes(encode_vector(&v)),
    }
}

fn from_flat<R>(property: &DataProperty<R>, stored: &FlatValue) -> Result<Value, MappingError> {
    let field = property.storage_name();
    let target = property.data_type();
    match stored {
        FlatValue::Null => Ok(Value::Null),
        FlatValue::Bytes(bytes) if bytes.is_empty() => {
            if target == DataType::String && !property.is_nullable() {
                Ok(Value::String(String::new()))
            } else {
                Ok(Value::Null)
            }
        }
        FlatValue::Bytes(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|e| {
                MappingError::conversion(field, target.name(), format!("invalid UTF-8: {}", e))
            })?;
            parse_scalar(field, text, target)
        }
        FlatValue::String(s) => parse_scalar(field, s, target),
        FlatValue::Bool(b) => coerce_value(field, Value::Bool(*b), target),
        FlatValue::Int32(n) => coerce_value(field, Value::Int32(*n), target),
        FlatValue::Int64(n) => coerce_value(field, Value::Int64(*n), target),
        FlatValue::Float32(n) => coerce_value(field, Value::Float32(*n), target),
        FlatValue::Float64(n) => coerce_value(field, Value::Float64(*n), target),
    }
}
