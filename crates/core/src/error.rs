//! Error types for stratamap
//!
//! Errors fall into three kinds, each with its own enum:
//!
//! - [`SchemaError`]: the schema itself is invalid. Raised while building a
//!   [`Schema`](crate::Schema) or constructing an encoder over it, never at use time.
//! - [`MappingError`]: one record could not be encoded or decoded. Raised per
//!   record, so a bad record never poisons its siblings in a batch.
//! - [`QueryConfigError`]: a search request references something the schema
//!   cannot satisfy. Raised before any query text is produced.
//!
//! All three are deterministic functions of their input. Nothing in this layer
//! retries. We use `thiserror` for `Display` and `Error` implementations.

use thiserror::Error;

/// Result type alias for stratamap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or validating a schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// No key property was declared
    #[error("Schema has no key property")]
    MissingKey,

    /// More than one key property was declared
    #[error("Schema declares more than one key property: '{first}' and '{second}'")]
    DuplicateKey {
        /// First declared key
        first: String,
        /// Second declared key
        second: String,
    },

    /// The key property is declared with a non-string type
    #[error("Key property '{property}' must be of type string, got {found}")]
    KeyNotString {
        /// Key property name
        property: String,
        /// Declared type name
        found: String,
    },

    /// Two properties share a logical name
    #[error("Duplicate property name: {name}")]
    DuplicatePropertyName {
        /// The repeated name
        name: String,
    },

    /// Two data/vector properties share a storage name
    #[error("Duplicate storage name '{storage_name}' (properties '{first}' and '{second}')")]
    DuplicateStorageName {
        /// The repeated storage name
        storage_name: String,
        /// First property using it
        first: String,
        /// Second property using it
        second: String,
    },

    /// A storage name cannot be referenced safely from query text
    #[error("Invalid storage name '{storage_name}' for property '{property}': {reason}")]
    InvalidStorageName {
        /// Property name
        property: String,
        /// Offending storage name
        storage_name: String,
        /// Why it was rejected
        reason: String,
    },

    /// A declared data type is not known
    #[error("Property '{property}' has unsupported type '{type_name}'")]
    UnsupportedType {
        /// Property name
        property: String,
        /// Declared type name
        type_name: String,
    },

    /// A vector element kind is not known
    #[error("Vector property '{property}' has unsupported element kind '{kind}'")]
    UnsupportedElementKind {
        /// Property name
        property: String,
        /// Declared element kind
        kind: String,
    },

    /// A vector shape is not known
    #[error("Vector property '{property}' has unsupported shape '{shape}'")]
    UnsupportedShape {
        /// Property name
        property: String,
        /// Declared shape
        shape: String,
    },

    /// A distance function is unknown or not offered by the store
    #[error("Vector property '{property}' has unsupported distance function '{function}'")]
    UnsupportedDistanceFunction {
        /// Property name
        property: String,
        /// Declared function
        function: String,
    },

    /// The property type cannot be represented by the selected storage encoding
    #[error("Property '{property}' of type {type_name} is not supported by {storage} storage")]
    UnsupportedForStorage {
        /// Property name
        property: String,
        /// Declared type name
        type_name: String,
        /// Storage encoding name
        storage: String,
    },

    /// A vector dimension of zero was declared
    #[error("Invalid dimension for vector property '{property}': {dimension} (must be > 0)")]
    InvalidDimension {
        /// Property name
        property: String,
        /// Declared dimension
        dimension: usize,
    },

    /// A declared generator name was not registered
    #[error("Vector property '{property}' references unknown generator '{generator}'")]
    UnknownGenerator {
        /// Property name
        property: String,
        /// Generator name
        generator: String,
    },
}

/// Errors raised while encoding or decoding a single record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MappingError {
    /// The record has no value for its key property
    #[error("Record is missing a value for key property '{property}'")]
    MissingKey {
        /// Key property name
        property: String,
    },

    /// The key value is not a string
    #[error("Key property '{property}' must hold a string, got {found}")]
    KeyNotString {
        /// Key property name
        property: String,
        /// Type name of the value found
        found: String,
    },

    /// A value could not be converted to the property's declared type
    #[error("Cannot convert field '{field}' to {target}: {reason}")]
    Conversion {
        /// Storage or property name of the field
        field: String,
        /// Target type name
        target: String,
        /// What went wrong
        reason: String,
    },

    /// A stored result does not have a shape this encoder can read
    #[error("Malformed stored result for key '{key}': {reason}")]
    MalformedResult {
        /// Record key
        key: String,
        /// What was wrong with it
        reason: String,
    },

    /// A vector's length disagrees with the declared dimension
    #[error("Dimension mismatch for '{field}': expected {expected}, got {got}")]
    DimensionMismatch {
        /// Field name
        field: String,
        /// Declared dimension
        expected: usize,
        /// Actual dimension
        got: usize,
    },

    /// A byte buffer is not a whole number of vector elements
    #[error("Invalid vector byte length {len}: not a multiple of element size {element_size}")]
    InvalidVectorBytes {
        /// Buffer length in bytes
        len: usize,
        /// Element size in bytes
        element_size: usize,
    },

    /// A generator-backed vector property was encoded without a generated embedding
    #[error("No generated embedding supplied for vector property '{property}'")]
    EmbeddingNotGenerated {
        /// Vector property name
        property: String,
    },

    /// The embedding generator failed
    #[error("Embedding generation failed for '{property}': {message}")]
    Generator {
        /// Vector property name
        property: String,
        /// Generator error message
        message: String,
    },

    /// Document serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MappingError {
    /// Build a conversion error
    pub fn conversion(
        field: impl Into<String>,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        MappingError::Conversion {
            field: field.into(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Build a malformed-result error
    pub fn malformed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        MappingError::MalformedResult {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while building a search query
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryConfigError {
    /// A filter or projection names a property the schema does not have
    #[error("Unknown field '{field}'")]
    UnknownField {
        /// Logical field name
        field: String,
    },

    /// The requested vector property does not exist
    #[error("Vector property '{field}' not found in schema")]
    VectorFieldNotFound {
        /// Requested property name
        field: String,
    },

    /// The schema has no vector properties to search
    #[error("Schema has no vector properties")]
    NoVectorProperty,

    /// The field exists but cannot be used in a filter
    #[error("Field '{field}' cannot be filtered: {reason}")]
    NotFilterable {
        /// Logical field name
        field: String,
        /// Why not
        reason: String,
    },

    /// A filter value has a type the query grammar cannot express
    #[error("Unsupported filter value for '{field}': {reason}")]
    UnsupportedFilterValue {
        /// Logical field name
        field: String,
        /// Why it was rejected
        reason: String,
    },

    /// The query vector does not match the target vector property
    #[error("Query vector mismatch for '{field}': {reason}")]
    VectorMismatch {
        /// Target vector property
        field: String,
        /// What differs
        reason: String,
    },

    /// Paging or other options are out of range
    #[error("Invalid search options: {0}")]
    InvalidOptions(String),
}

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written
    #[error("Failed to access config file '{path}': {message}")]
    Io {
        /// File path
        path: String,
        /// Underlying I/O error message
        message: String,
    },

    /// The configuration text could not be parsed
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// The configuration parsed but is not usable
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level error type for stratamap
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid schema
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Record encode/decode failure
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Invalid search request
    #[error(transparent)]
    QueryConfig(#[from] QueryConfigError),

    /// Configuration failure
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Check if this error was raised while building a schema
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Error::Schema(_))
    }

    /// Check if this error concerns a single record
    pub fn is_mapping_error(&self) -> bool {
        matches!(self, Error::Mapping(_))
    }

    /// Check if this error was raised while building a query
    pub fn is_query_config_error(&self) -> bool {
        matches!(self, Error::QueryConfig(_))
    }

    /// Check if this error comes from mapper configuration
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}
