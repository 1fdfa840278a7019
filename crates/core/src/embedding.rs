//! Embedding generation seam
//!
//! Vector properties may carry an [`EmbeddingGenerator`] that turns a
//! non-vector source value (usually text) into an [`Embedding`] at encode
//! time. The generator itself is an external collaborator; this module only
//! defines the contract and collects its output per property and per record
//! index into [`GeneratedEmbeddings`], which the encoders consume.

use crate::error::MappingError;
use crate::schema::Schema;
use crate::value::Value;
use crate::vector::Embedding;
use std::collections::HashMap;
use std::fmt::Debug;
use tracing::debug;

/// Boxed error returned by embedding generators
pub type GeneratorError = Box<dyn std::error::Error + Send + Sync>;

/// Produces one embedding per source value
///
/// Implementations must return exactly `sources.len()` embeddings, in order.
pub trait EmbeddingGenerator: Send + Sync + Debug {
    /// Generate embeddings for the given source values
    fn generate(&self, sources: &[Value]) -> Result<Vec<Embedding>, GeneratorError>;
}

/// Generated embeddings keyed by vector property name and record index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedEmbeddings {
    by_property: HashMap<String, Vec<Option<Embedding>>>,
}

impl GeneratedEmbeddings {
    /// Create an empty set
    pub fn new() -> Self {
        GeneratedEmbeddings::default()
    }

    /// Record the embedding for one property of one record
    pub fn insert(&mut self, property: impl Into<String>, index: usize, embedding: Embedding) {
        let slots = self.by_property.entry(property.into()).or_default();
        if slots.len() <= index {
            slots.resize(index + 1, None);
        }
        slots[index] = Some(embedding);
    }

    /// Embedding for one property of one record, if generated
    pub fn get(&self, property: &str, index: usize) -> Option<&Embedding> {
        self.by_property
            .get(property)
            .and_then(|slots| slots.get(index))
            .and_then(Option::as_ref)
    }

    /// Check if nothing was generated
    pub fn is_empty(&self) -> bool {
        self.by_property.values().all(|slots| slots.iter().all(Option::is_none))
    }

    /// Run every attached generator over a batch of records
    ///
    /// Each generator is invoked once per property with the non-null source
    /// values of all records. Records whose source value is absent or null
    /// get no embedding.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::Generator` if a generator fails or returns the
    /// wrong number of embeddings; no record can be encoded in that case.
    pub fn generate<R>(schema: &Schema<R>, records: &[R]) -> Result<Self, MappingError> {
        let mut generated = GeneratedEmbeddings::new();

        for property in schema.vector_properties() {
            let Some(generator) = property.generator() else {
                continue;
            };

            let mut indices = Vec::new();
            let mut sources = Vec::new();
            for (i, record) in records.iter().enumerate() {
                match property.get(record) {
                    None | Some(Value::Null) => {}
                    Some(source) => {
                        indices.push(i);
                        sources.push(source);
                    }
                }
            }
            if sources.is_empty() {
                continue;
            }

            let embeddings = generator
                .generate(&sources)
                .map_err(|e| MappingError::Generator {
                    property: property.name().to_string(),
                    message: e.to_string(),
                })?;
            if embeddings.len() != sources.len() {
                return Err(MappingError::Generator {
                    property: property.name().to_string(),
                    message: format!(
                        "expected {} embeddings, got {}",
                        sources.len(),
                        embeddings.len()
                    ),
                });
            }

            // Element kind and dimension are checked per record at encode
            // time, so one bad embedding fails only its own record
            for (index, embedding) in indices.into_iter().zip(embeddings) {
                generated.insert(property.name(), index, embedding);
            }

            debug!(
                target: "stratamap::schema",
                property = property.name(),
                count = sources.len(),
                "Generated embeddings"
            );
        }

        Ok(generated)
    }
}
