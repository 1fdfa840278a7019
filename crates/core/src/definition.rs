//! Declarative schema definitions
//!
//! A [`SchemaDefinition`] is the serde form of a generic-record schema, so a
//! collection's layout can live next to its [`MapperConfig`](crate::MapperConfig)
//! in TOML. Type, element-kind, shape and distance names are plain strings
//! here and are resolved (and rejected by name) in [`SchemaDefinition::into_schema`].
//!
//! ```toml
//! [key]
//! name = "id"
//!
//! [[data]]
//! name = "color"
//! type = "string"
//! nullable = true
//!
//! [[vectors]]
//! name = "embedding"
//! element_kind = "float32"
//! dimension = 4
//! distance = "cosine_similarity"
//! ```

use crate::embedding::EmbeddingGenerator;
use crate::error::{ConfigError, SchemaError};
use crate::schema::{DataSpec, DataType, KeySpec, Schema, VectorSpec};
use crate::value::Record;
use crate::vector::{DistanceFunction, ElementKind, VectorShape};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Key property definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDefinition {
    /// Logical name
    pub name: String,
    /// Storage name (defaults to the logical name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_name: Option<String>,
    /// Declared type (must be "string")
    #[serde(default = "default_key_type", rename = "type")]
    pub key_type: String,
}

fn default_key_type() -> String {
    "string".to_string()
}

/// Data property definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDefinition {
    /// Logical name
    pub name: String,
    /// Storage name (defaults to the logical name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_name: Option<String>,
    /// Declared type name
    #[serde(rename = "type")]
    pub data_type: String,
    /// Whether explicit nulls are allowed
    #[serde(default)]
    pub nullable: bool,
}

/// Vector property definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorDefinition {
    /// Logical name
    pub name: String,
    /// Storage name (defaults to the logical name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_name: Option<String>,
    /// Element kind name
    #[serde(default = "default_element_kind")]
    pub element_kind: String,
    /// Fixed dimension
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
    /// Decoded shape name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    /// Distance function name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
    /// Name of a registered embedding generator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
}

fn default_element_kind() -> String {
    "float32".to_string()
}

/// Serde form of a generic-record schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    /// Key property
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<KeyDefinition>,
    /// Data properties in order
    #[serde(default)]
    pub data: Vec<DataDefinition>,
    /// Vector properties in order
    #[serde(default)]
    pub vectors: Vec<VectorDefinition>,
}

impl SchemaDefinition {
    /// Parse a definition from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Build a schema, failing if any vector names a generator
    pub fn into_schema(self) -> Result<Schema<Record>, SchemaError> {
        self.into_schema_with(&HashMap::new())
    }

    /// Build a schema, resolving generator names against `generators`
    pub fn into_schema_with(
        self,
        generators: &HashMap<String, Arc<dyn EmbeddingGenerator>>,
    ) -> Result<Schema<Record>, SchemaError> {
        let key = self.key.ok_or(SchemaError::MissingKey)?;
        let key_type = parse_data_type(&key.name, &key.key_type)?;
        let mut key_spec = KeySpec::new(key.name).key_type(key_type);
        if let Some(storage_name) = key.storage_name {
            key_spec = key_spec.storage_name(storage_name);
        }
        let mut builder = Schema::builder().key(key_spec);

        for data in self.data {
            let data_type = parse_data_type(&data.name, &data.data_type)?;
            let mut spec = DataSpec::new(data.name, data_type);
            if let Some(storage_name) = data.storage_name {
                spec = spec.storage_name(storage_name);
            }
            if data.nullable {
                spec = spec.nullable();
            }
            builder = builder.data(spec);
        }

        for vector in self.vectors {
            let kind = ElementKind::parse(&vector.element_kind).ok_or_else(|| {
                SchemaError::UnsupportedElementKind {
                    property: vector.name.clone(),
                    kind: vector.element_kind.clone(),
                }
            })?;
            let mut spec = VectorSpec::new(vector.name.clone(), kind);
            if let Some(storage_name) = vector.storage_name {
                spec = spec.storage_name(storage_name);
            }
            if let Some(dimension) = vector.dimension {
                spec = spec.dimension(dimension);
            }
            if let Some(shape) = vector.shape {
                let shape = VectorShape::parse(&shape).ok_or_else(|| {
                    SchemaError::UnsupportedShape {
                        property: vector.name.clone(),
                        shape: shape.clone(),
                    }
                })?;
                spec = spec.shape(shape);
            }
            if let Some(distance) = vector.distance {
                let function = DistanceFunction::parse(&distance).ok_or_else(|| {
                    SchemaError::UnsupportedDistanceFunction {
                        property: vector.name.clone(),
                        function: distance.clone(),
                    }
                })?;
                spec = spec.distance(function);
            }
            if let Some(name) = vector.generator {
                let generator =
                    generators
                        .get(&name)
                        .ok_or_else(|| SchemaError::UnknownGenerator {
                            property: vector.name.clone(),
                            generator: name.clone(),
                        })?;
                spec = spec.generator(Arc::clone(generator));
            }
            builder = builder.vector(spec);
        }

        builder.build()
    }
}

fn parse_data_type(property: &str, name: &str) -> Result<DataType, SchemaError> {
    DataType::parse(name).ok_or_else(|| SchemaError::UnsupportedType {
        property: property.to_string(),
        type_name: name.to_string(),
    })
}
