//! Record encoders for stratamap
//!
//! This crate turns schema-described records into storage payloads and back:
//! - [`vector_codec`]: little-endian packing of vector values
//! - [`flat`]: hash-style encoding (one field per property)
//! - [`document`]: JSON-style encoding (one document per record)
//!
//! [`RecordMapper`] selects one of the two encoders from a
//! [`MapperConfig`], so callers can stay agnostic of the collection's
//! storage type.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod convert;
pub mod document;
pub mod flat;
pub mod vector_codec;

pub use document::{DefaultValuePolicy, DocumentMapper, DocumentPayload, ValuePolicy};
pub use flat::{FlatMapper, FlatPayload, FlatValue};
pub use vector_codec::{decode_vector, decode_vector_checked, encode_elements, encode_vector};

use std::sync::Arc;
use stratamap_core::{
    Error, GeneratedEmbeddings, MapperConfig, MappingError, Schema, StorageType, Value,
    VectorProperty, VectorValue,
};

// ============================================================================
// StoragePayload
// ============================================================================

/// A payload in either storage encoding
#[derive(Debug, Clone, PartialEq)]
pub enum StoragePayload {
    /// Flat field/value payload
    Flat(FlatPayload),
    /// Document payload
    Document(DocumentPayload),
}

impl StoragePayload {
    /// Storage key
    pub fn key(&self) -> &str {
        match self {
            StoragePayload::Flat(p) => &p.key,
            StoragePayload::Document(p) => &p.key,
        }
    }

    /// Storage type this payload belongs to
    pub fn storage_type(&self) -> StorageType {
        match self {
            StoragePayload::Flat(_) => StorageType::Hash,
            StoragePayload::Document(_) => StorageType::Json,
        }
    }
}

impl From<FlatPayload> for StoragePayload {
    fn from(p: FlatPayload) -> Self {
        StoragePayload::Flat(p)
    }
}

impl From<DocumentPayload> for StoragePayload {
    fn from(p: DocumentPayload) -> Self {
        StoragePayload::Document(p)
    }
}

// ============================================================================
// RecordMapper
// ============================================================================

/// The encoder selected for a collection
#[derive(Debug)]
pub enum RecordMapper<R> {
    /// Flat encoding
    Flat(FlatMapper<R>),
    /// Document encoding
    Document(DocumentMapper<R>),
}

impl<R> Clone for RecordMapper<R> {
    fn clone(&self) -> Self {
        match self {
            RecordMapper::Flat(m) => RecordMapper::Flat(m.clone()),
            RecordMapper::Document(m) => RecordMapper::Document(m.clone()),
        }
    }
}

impl<R> RecordMapper<R> {
    /// Build the encoder named by `config`
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `config` does not validate, or
    /// `Error::Schema` if the schema cannot be stored flat.
    pub fn from_config(schema: Arc<Schema<R>>, config: &MapperConfig) -> Result<Self, Error> {
        config.validate()?;
        let prefix = config.key_prefix();
        Ok(match config.storage_type {
            StorageType::Hash => {
                RecordMapper::Flat(FlatMapper::new(schema)?.with_key_prefix(prefix))
            }
            StorageType::Json => {
                RecordMapper::Document(DocumentMapper::new(schema).with_key_prefix(prefix))
            }
        })
    }

    /// Storage type of this encoder
    pub fn storage_type(&self) -> StorageType {
        match self {
            RecordMapper::Flat(_) => StorageType::Hash,
            RecordMapper::Document(_) => StorageType::Json,
        }
    }

    /// The schema this encoder maps
    pub fn schema(&self) -> &Arc<Schema<R>> {
        match self {
            RecordMapper::Flat(m) => m.schema(),
            RecordMapper::Document(m) => m.schema(),
        }
    }

    /// Key prefix, if any
    pub fn key_prefix(&self) -> Option<&str> {
        match self {
            RecordMapper::Flat(m) => m.key_prefix(),
            RecordMapper::Document(m) => m.key_prefix(),
        }
    }

    /// Encode one record without generated embeddings
    pub fn to_payload(&self, record: &R) -> Result<StoragePayload, MappingError> {
        match self {
            RecordMapper::Flat(m) => m.to_payload(record).map(StoragePayload::Flat),
            RecordMapper::Document(m) => m.to_payload(record).map(StoragePayload::Document),
        }
    }

    /// Encode a batch; each record succeeds or fails on its own
    pub fn to_payloads(
        &self,
        records: &[R],
        generated: &GeneratedEmbeddings,
    ) -> Vec<Result<StoragePayload, MappingError>> {
        match self {
            RecordMapper::Flat(m) => m
                .to_payloads(records, generated)
                .into_iter()
                .map(|r| r.map(StoragePayload::Flat))
                .collect(),
            RecordMapper::Document(m) => m
                .to_payloads(records, generated)
                .into_iter()
                .map(|r| r.map(StoragePayload::Document))
                .collect(),
        }
    }
}

impl<R: Default> RecordMapper<R> {
    /// Decode one payload with the encoder's own semantics
    ///
    /// # Errors
    ///
    /// Returns `MalformedResult` if the payload belongs to the other encoding.
    pub fn from_payload(
        &self,
        payload: &StoragePayload,
        include_vectors: bool,
    ) -> Result<R, MappingError> {
        match (self, payload) {
            (RecordMapper::Flat(m), StoragePayload::Flat(p)) => m.from_payload(p, include_vectors),
            (RecordMapper::Document(m), StoragePayload::Document(p)) => {
                m.from_payload(p, include_vectors)
            }
            (mapper, payload) => Err(MappingError::malformed(
                payload.key(),
                format!(
                    "{} payload given to {} encoder",
                    payload.storage_type().name(),
                    mapper.storage_type().name()
                ),
            )),
        }
    }

    /// Decode a batch; each payload succeeds or fails on its own
    pub fn from_payloads(
        &self,
        payloads: &[StoragePayload],
        include_vectors: bool,
    ) -> Vec<Result<R, MappingError>> {
        payloads
            .iter()
            .map(|payload| self.from_payload(payload, include_vectors))
            .collect()
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Read the key property and apply the storage prefix
pub(crate) fn read_key<R>(
    schema: &Schema<R>,
    record: &R,
    prefix: Option<&str>,
) -> Result<String, MappingError> {
    let property = schema.key();
    match property.get(record) {
        None => Err(MappingError::MissingKey {
            property: property.name().to_string(),
        }),
        Some(Value::String(key)) => Ok(match prefix {
            Some(prefix) => format!("{}{}", prefix, key),
            None => key,
        }),
        Some(other) => Err(MappingError::KeyNotString {
            property: property.name().to_string(),
            found: other.type_name().to_string(),
        }),
    }
}

/// Remove the storage prefix from a key, if it carries one
pub(crate) fn strip_prefix<'a>(key: &'a str, prefix: Option<&str>) -> &'a str {
    match prefix {
        Some(prefix) => key.strip_prefix(prefix).unwrap_or(key),
        None => key,
    }
}

/// Check a vector against its property's element kind and dimension
pub(crate) fn check_vector<R>(
    property: &VectorProperty<R>,
    vector: &VectorValue,
) -> Result<(), MappingError> {
    if vector.element_kind() != property.element_kind() {
        return Err(MappingError::conversion(
            property.name(),
            property.element_kind().name(),
            format!("found {} elements", vector.element_kind()),
        ));
    }
    if let Some(expected) = property.dimension() {
        if vector.dimension() != expected {
            return Err(MappingError::DimensionMismatch {
                field: property.name().to_string(),
                expected,
                got: vector.dimension(),
            });
        }
    }
    Ok(())
}
