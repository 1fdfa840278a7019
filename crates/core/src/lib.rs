//! Core types for stratamap
//!
//! This crate defines the foundational types shared by the codecs and the
//! query builder:
//! - Schema: immutable description of a record type (key, data, vectors)
//! - Value / Record: property values and the generic record
//! - VectorValue / Embedding: vector shapes and element kinds
//! - EmbeddingGenerator: seam for external embedding generation
//! - MapperConfig / SchemaDefinition: configuration loaded from TOML
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod definition;
pub mod embedding;
pub mod error;
pub mod schema;
pub mod value;
pub mod vector;

pub use config::{MapperConfig, QueryConfig, StorageType, CONFIG_FILE_NAME};
pub use definition::{DataDefinition, KeyDefinition, SchemaDefinition, VectorDefinition};
pub use embedding::{EmbeddingGenerator, GeneratedEmbeddings, GeneratorError};
pub use error::{ConfigError, Error, MappingError, QueryConfigError, Result, SchemaError};
pub use schema::{
    Accessor, DataProperty, DataSpec, DataType, KeyProperty, KeySpec, PropertyIndex, Schema,
    SchemaBuilder, VectorProperty, VectorSpec,
};
pub use value::{FieldState, Record, Value};
pub use vector::{
    DistanceFunction, ElementKind, Embedding, VectorElements, VectorShape, VectorValue,
};
