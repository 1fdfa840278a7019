//! Schema Model
//!
//! A [`Schema`] describes one record type: exactly one string key property,
//! an ordered list of data properties and an ordered list of vector
//! properties. Each property carries a logical name, a storage name and an
//! [`Accessor`] pair captured when the schema is built, so encoders never
//! inspect record types at run time.
//!
//! Schemas are immutable once built and are shared read-only (usually behind
//! an `Arc`) by every encoder, decoder and query builder of a collection.
//!
//! ## Invariants
//!
//! - Exactly one key property, declared as a string.
//! - Logical names are unique across key, data and vector properties.
//! - Storage names are unique across data and vector properties (the key is
//!   carried out of band and never collides).
//! - Storage names contain only ASCII alphanumerics and `_`, so they can be
//!   referenced from query text without escaping.
//!
//! Violations fail [`SchemaBuilder::build`], never a later encode or query.
//!
//! # Example
//!
//! ```
//! use stratamap_core::{DataSpec, DataType, ElementKind, Schema, VectorSpec};
//!
//! let schema = Schema::builder()
//!     .key("id")
//!     .data(DataSpec::new("color", DataType::String))
//!     .vector(VectorSpec::new("embedding", ElementKind::Float32).dimension(4))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(schema.key().name(), "id");
//! assert_eq!(schema.storage_name("color"), Some("color"));
//! ```

use crate::embedding::EmbeddingGenerator;
use crate::error::{MappingError, SchemaError};
use crate::value::{Record, Value};
use crate::vector::{DistanceFunction, ElementKind, VectorShape};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

// ============================================================================
// DataType
// ============================================================================

/// Declared type of a key or data property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Boolean
    Bool,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 32-bit float
    Float32,
    /// 64-bit float
    Float64,
    /// UTF-8 string
    String,
    /// List of strings (tag set)
    StringList,
}

impl DataType {
    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::String => "string",
            DataType::StringList => "string_list",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bool" | "boolean" => Some(DataType::Bool),
            "int32" | "int" | "i32" => Some(DataType::Int32),
            "int64" | "long" | "i64" => Some(DataType::Int64),
            "float32" | "float" | "f32" => Some(DataType::Float32),
            "float64" | "double" | "f64" => Some(DataType::Float64),
            "string" | "str" => Some(DataType::String),
            "string_list" | "tags" => Some(DataType::StringList),
            _ => None,
        }
    }

    /// Check if values of this type are numbers
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Int32 | DataType::Int64 | DataType::Float32 | DataType::Float64
        )
    }

    /// Check if values of this type are single scalars
    pub fn is_scalar(&self) -> bool {
        !matches!(self, DataType::StringList)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Accessor
// ============================================================================

type Getter<R> = dyn Fn(&R) -> Option<Value> + Send + Sync;
type Setter<R> = dyn Fn(&mut R, Value) -> Result<(), MappingError> + Send + Sync;

/// Getter/setter pair for one property of record type `R`
///
/// The getter returns `None` when the property is absent and `Some(Value::Null)`
/// for an explicit null.
pub struct Accessor<R> {
    get: Arc<Getter<R>>,
    set: Arc<Setter<R>>,
}

impl<R> Accessor<R> {
    /// Create an accessor from a getter and a setter
    pub fn new<G, S>(get: G, set: S) -> Self
    where
        G: Fn(&R) -> Option<Value> + Send + Sync + 'static,
        S: Fn(&mut R, Value) -> Result<(), MappingError> + Send + Sync + 'static,
    {
        Accessor {
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }

    /// Read the property
    pub fn get(&self, record: &R) -> Option<Value> {
        (self.get)(record)
    }

    /// Write the property
    pub fn set(&self, record: &mut R, value: Value) -> Result<(), MappingError> {
        (self.set)(record, value)
    }
}

impl Accessor<Record> {
    /// Accessor reading and writing a named entry of a generic record
    pub fn field(name: impl Into<String>) -> Self {
        let name: Arc<str> = Arc::from(name.into());
        let get_name = Arc::clone(&name);
        Accessor::new(
            move |record: &Record| record.get(&get_name).cloned(),
            move |record: &mut Record, value| {
                record.insert(name.to_string(), value);
                Ok(())
            },
        )
    }
}

impl<R> Clone for Accessor<R> {
    fn clone(&self) -> Self {
        Accessor {
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

impl<R> fmt::Debug for Accessor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Accessor")
    }
}

// ============================================================================
// Property specs (builder input)
// ============================================================================

/// Declaration of the key property
#[derive(Debug, Clone, PartialEq)]
pub struct KeySpec {
    name: String,
    storage_name: Option<String>,
    key_type: DataType,
}

impl KeySpec {
    /// Declare a string key property
    pub fn new(name: impl Into<String>) -> Self {
        KeySpec {
            name: name.into(),
            storage_name: None,
            key_type: DataType::String,
        }
    }

    /// Builder: set the storage name
    pub fn storage_name(mut self, storage_name: impl Into<String>) -> Self {
        self.storage_name = Some(storage_name.into());
        self
    }

    /// Builder: set the declared key type (only `String` builds)
    pub fn key_type(mut self, key_type: DataType) -> Self {
        self.key_type = key_type;
        self
    }
}

impl From<&str> for KeySpec {
    fn from(name: &str) -> Self {
        KeySpec::new(name)
    }
}

/// Declaration of a data property
#[derive(Debug, Clone, PartialEq)]
pub struct DataSpec {
    name: String,
    storage_name: Option<String>,
    data_type: DataType,
    nullable: bool,
}

impl DataSpec {
    /// Declare a non-nullable data property
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        DataSpec {
            name: name.into(),
            storage_name: None,
            data_type,
            nullable: false,
        }
    }

    /// Builder: set the storage name
    pub fn storage_name(mut self, storage_name: impl Into<String>) -> Self {
        self.storage_name = Some(storage_name.into());
        self
    }

    /// Builder: allow explicit nulls
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// Declaration of a vector property
#[derive(Debug, Clone)]
pub struct VectorSpec {
    name: String,
    storage_name: Option<String>,
    element_kind: ElementKind,
    shape: VectorShape,
    dimension: Option<usize>,
    distance: DistanceFunction,
    generator: Option<Arc<dyn EmbeddingGenerator>>,
}

impl VectorSpec {
    /// Declare a vector property of the given element kind
    pub fn new(name: impl Into<String>, element_kind: ElementKind) -> Self {
        VectorSpec {
            name: name.into(),
            storage_name: None,
            element_kind,
            shape: VectorShape::default(),
            dimension: None,
            distance: DistanceFunction::default(),
            generator: None,
        }
    }

    /// Builder: set the storage name
    pub fn storage_name(mut self, storage_name: impl Into<String>) -> Self {
        self.storage_name = Some(storage_name.into());
        self
    }

    /// Builder: set the shape decoded vectors are restored into
    pub fn shape(mut self, shape: VectorShape) -> Self {
        self.shape = shape;
        self
    }

    /// Builder: set a fixed dimension
    pub fn dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    /// Builder: set the distance function
    pub fn distance(mut self, distance: DistanceFunction) -> Self {
        self.distance = distance;
        self
    }

    /// Builder: attach an embedding generator
    pub fn generator(mut self, generator: Arc<dyn EmbeddingGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }
}

// ============================================================================
// Properties (built schema)
// ============================================================================

/// The key property of a schema
#[derive(Debug)]
pub struct KeyProperty<R> {
    name: String,
    storage_name: String,
    accessor: Accessor<R>,
}

impl<R> KeyProperty<R> {
    /// Logical name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage name
    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }

    /// Read the key value from a record
    pub fn get(&self, record: &R) -> Option<Value> {
        self.accessor.get(record)
    }

    /// Write the key value into a record
    pub fn set(&self, record: &mut R, key: String) -> Result<(), MappingError> {
        self.accessor.set(record, Value::String(key))
    }
}

/// A data property of a schema
#[derive(Debug)]
pub struct DataProperty<R> {
    name: String,
    storage_name: String,
    data_type: DataType,
    nullable: bool,
    accessor: Accessor<R>,
}

impl<R> DataProperty<R> {
    /// Logical name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage name
    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }

    /// Declared type
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Whether explicit nulls are allowed
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Read the value from a record
    pub fn get(&self, record: &R) -> Option<Value> {
        self.accessor.get(record)
    }

    /// Write the value into a record
    pub fn set(&self, record: &mut R, value: Value) -> Result<(), MappingError> {
        self.accessor.set(record, value)
    }
}

/// A vector property of a schema
#[derive(Debug)]
pub struct VectorProperty<R> {
    name: String,
    storage_name: String,
    element_kind: ElementKind,
    shape: VectorShape,
    dimension: Option<usize>,
    distance: DistanceFunction,
    generator: Option<Arc<dyn EmbeddingGenerator>>,
    accessor: Accessor<R>,
}

impl<R> VectorProperty<R> {
    /// Logical name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage name
    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }

    /// Element kind
    pub fn element_kind(&self) -> ElementKind {
        self.element_kind
    }

    /// Shape decoded vectors are restored into
    pub fn shape(&self) -> VectorShape {
        self.shape
    }

    /// Declared dimension, if fixed
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Distance function
    pub fn distance_function(&self) -> DistanceFunction {
        self.distance
    }

    /// Attached embedding generator
    pub fn generator(&self) -> Option<&Arc<dyn EmbeddingGenerator>> {
        self.generator.as_ref()
    }

    /// Whether the stored vector is generated from a source value
    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Read the raw value (a vector, or the generator's source value)
    pub fn get(&self, record: &R) -> Option<Value> {
        self.accessor.get(record)
    }

    /// Write the value into a record
    pub fn set(&self, record: &mut R, value: Value) -> Result<(), MappingError> {
        self.accessor.set(record, value)
    }
}

/// Position of a property inside a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyIndex {
    /// The key property
    Key,
    /// Index into [`Schema::data_properties`]
    Data(usize),
    /// Index into [`Schema::vector_properties`]
    Vector(usize),
}

// ============================================================================
// Schema
// ============================================================================

/// Immutable description of a record type
#[derive(Debug)]
pub struct Schema<R = Record> {
    key: KeyProperty<R>,
    data: Vec<DataProperty<R>>,
    vectors: Vec<VectorProperty<R>>,
    by_name: HashMap<String, PropertyIndex>,
}

impl Schema<Record> {
    /// Start building a schema over generic records
    ///
    /// Static record types start from [`SchemaBuilder::new`] instead.
    pub fn builder() -> SchemaBuilder<Record> {
        SchemaBuilder::new()
    }
}

impl<R> Schema<R> {
    /// The key property
    pub fn key(&self) -> &KeyProperty<R> {
        &self.key
    }

    /// Data properties in declaration order
    pub fn data_properties(&self) -> &[DataProperty<R>] {
        &self.data
    }

    /// Vector properties in declaration order
    pub fn vector_properties(&self) -> &[VectorProperty<R>] {
        &self.vectors
    }

    /// Locate a property by logical name
    pub fn lookup(&self, name: &str) -> Option<PropertyIndex> {
        self.by_name.get(name).copied()
    }

    /// Find a data property by logical name
    pub fn data_property(&self, name: &str) -> Option<&DataProperty<R>> {
        match self.lookup(name)? {
            PropertyIndex::Data(i) => self.data.get(i),
            _ => None,
        }
    }

    /// Find a vector property by logical name
    pub fn vector_property(&self, name: &str) -> Option<&VectorProperty<R>> {
        match self.lookup(name)? {
            PropertyIndex::Vector(i) => self.vectors.get(i),
            _ => None,
        }
    }

    /// The first declared vector property
    pub fn first_vector_property(&self) -> Option<&VectorProperty<R>> {
        self.vectors.first()
    }

    /// Storage name of any property, by logical name
    pub fn storage_name(&self, name: &str) -> Option<&str> {
        match self.lookup(name)? {
            PropertyIndex::Key => Some(self.key.storage_name()),
            PropertyIndex::Data(i) => self.data.get(i).map(|p| p.storage_name()),
            PropertyIndex::Vector(i) => self.vectors.get(i).map(|p| p.storage_name()),
        }
    }
}

// ============================================================================
// SchemaBuilder
// ============================================================================

/// Builder for [`Schema`]
///
/// Generic records use [`SchemaBuilder::key`], [`SchemaBuilder::data`] and
/// [`SchemaBuilder::vector`], which capture map accessors automatically.
/// Static record types supply their own accessors through the `*_with`
/// variants.
pub struct SchemaBuilder<R> {
    keys: Vec<(KeySpec, Accessor<R>)>,
    data: Vec<(DataSpec, Accessor<R>)>,
    vectors: Vec<(VectorSpec, Accessor<R>)>,
}

impl<R> Default for SchemaBuilder<R> {
    fn default() -> Self {
        SchemaBuilder {
            keys: Vec::new(),
            data: Vec::new(),
            vectors: Vec::new(),
        }
    }
}

impl<R> SchemaBuilder<R> {
    /// Create an empty builder
    pub fn new() -> Self {
        SchemaBuilder::default()
    }

    /// Declare the key property with an explicit accessor
    pub fn key_with(mut self, spec: impl Into<KeySpec>, accessor: Accessor<R>) -> Self {
        self.keys.push((spec.into(), accessor));
        self
    }

    /// Declare a data property with an explicit accessor
    pub fn data_with(mut self, spec: DataSpec, accessor: Accessor<R>) -> Self {
        self.data.push((spec, accessor));
        self
    }

    /// Declare a vector property with an explicit accessor
    pub fn vector_with(mut self, spec: VectorSpec, accessor: Accessor<R>) -> Self {
        self.vectors.push((spec, accessor));
        self
    }

    /// Validate the declarations and build the schema
    pub fn build(self) -> Result<Schema<R>, SchemaError> {
        let mut keys = self.keys.into_iter();
        let (key_spec, key_accessor) = keys.next().ok_or(SchemaError::MissingKey)?;
        if let Some((second, _)) = keys.next() {
            return Err(SchemaError::DuplicateKey {
                first: key_spec.name,
                second: second.name,
            });
        }
        if key_spec.key_type != DataType::String {
            return Err(SchemaError::KeyNotString {
                property: key_spec.name,
                found: key_spec.key_type.name().to_string(),
            });
        }

        let mut names = NameRegistry::default();

        let key_storage = key_spec
            .storage_name
            .unwrap_or_else(|| key_spec.name.clone());
        validate_storage_name(&key_spec.name, &key_storage)?;
        names.logical(&key_spec.name, PropertyIndex::Key)?;
        let key = KeyProperty {
            name: key_spec.name,
            storage_name: key_storage,
            accessor: key_accessor,
        };

        let mut data = Vec::with_capacity(self.data.len());
        for (i, (spec, accessor)) in self.data.into_iter().enumerate() {
            let storage_name = spec.storage_name.unwrap_or_else(|| spec.name.clone());
            validate_storage_name(&spec.name, &storage_name)?;
            names.logical(&spec.name, PropertyIndex::Data(i))?;
            names.storage(&spec.name, &storage_name)?;
            data.push(DataProperty {
                name: spec.name,
                storage_name,
                data_type: spec.data_type,
                nullable: spec.nullable,
                accessor,
            });
        }

        let mut vectors = Vec::with_capacity(self.vectors.len());
        for (i, (spec, accessor)) in self.vectors.into_iter().enumerate() {
            let storage_name = spec.storage_name.unwrap_or_else(|| spec.name.clone());
            validate_storage_name(&spec.name, &storage_name)?;
            if spec.dimension == Some(0) {
                return Err(SchemaError::InvalidDimension {
                    property: spec.name,
                    dimension: 0,
                });
            }
            if !spec.distance.is_supported() {
                return Err(SchemaError::UnsupportedDistanceFunction {
                    property: spec.name,
                    function: spec.distance.name().to_string(),
                });
            }
            names.logical(&spec.name, PropertyIndex::Vector(i))?;
            names.storage(&spec.name, &storage_name)?;
            vectors.push(VectorProperty {
                name: spec.name,
                storage_name,
                element_kind: spec.element_kind,
                shape: spec.shape,
                dimension: spec.dimension,
                distance: spec.distance,
                generator: spec.generator,
                accessor,
            });
        }

        info!(
            target: "stratamap::schema",
            key = %key.name,
            data = data.len(),
            vectors = vectors.len(),
            "Schema built"
        );

        Ok(Schema {
            key,
            data,
            vectors,
            by_name: names.by_name,
        })
    }
}

impl SchemaBuilder<Record> {
    /// Declare the key property of a generic record
    pub fn key(self, spec: impl Into<KeySpec>) -> Self {
        let spec = spec.into();
        let accessor = Accessor::field(spec.name.clone());
        self.key_with(spec, accessor)
    }

    /// Declare a data property of a generic record
    pub fn data(self, spec: DataSpec) -> Self {
        let accessor = Accessor::field(spec.name.clone());
        self.data_with(spec, accessor)
    }

    /// Declare a vector property of a generic record
    pub fn vector(self, spec: VectorSpec) -> Self {
        let accessor = Accessor::field(spec.name.clone());
        self.vector_with(spec, accessor)
    }
}

/// Tracks logical and storage names while building
#[derive(Default)]
struct NameRegistry {
    by_name: HashMap<String, PropertyIndex>,
    storage_owner: HashMap<String, String>,
}

impl NameRegistry {
    fn logical(&mut self, name: &str, index: PropertyIndex) -> Result<(), SchemaError> {
        if self.by_name.insert(name.to_string(), index).is_some() {
            return Err(SchemaError::DuplicatePropertyName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn storage(&mut self, name: &str, storage_name: &str) -> Result<(), SchemaError> {
        if let Some(first) = self
            .storage_owner
            .insert(storage_name.to_string(), name.to_string())
        {
            return Err(SchemaError::DuplicateStorageName {
                storage_name: storage_name.to_string(),
                first,
                second: name.to_string(),
            });
        }
        Ok(())
    }
}

fn validate_storage_name(property: &str, storage_name: &str) -> Result<(), SchemaError> {
    let reason = if storage_name.is_empty() {
        Some("must not be empty")
    } else if !storage_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Some("only ASCII letters, digits and '_' are allowed")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(SchemaError::InvalidStorageName {
            property: property.to_string(),
            storage_name: storage_name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
