//! Vector types for vector properties
//!
//! A vector value can arrive in several in-memory shapes: an owned sequence,
//! a fixed boxed array, or a wrapped [`Embedding`] produced by a generator.
//! [`VectorValue`] is the closed set of those shapes. Every shape exposes a
//! contiguous element view through [`VectorValue::elements`], which is what
//! the codecs pack.

use serde::{Deserialize, Serialize};

/// Numeric kind of each vector element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// 32-bit IEEE-754 float (default)
    #[default]
    Float32,
    /// 64-bit IEEE-754 float
    Float64,
}

impl ElementKind {
    /// Size of one element in bytes
    pub fn size(&self) -> usize {
        match self {
            ElementKind::Float32 => 4,
            ElementKind::Float64 => 8,
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Float32 => "float32",
            ElementKind::Float64 => "float64",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "float32" | "f32" | "float" => Some(ElementKind::Float32),
            "float64" | "f64" | "double" => Some(ElementKind::Float64),
            _ => None,
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// In-memory shape a decoded vector is restored into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorShape {
    /// Growable owned sequence (`Vec<T>`)
    #[default]
    Sequence,
    /// Fixed boxed array (`Box<[T]>`)
    Array,
    /// Wrapped [`Embedding`]
    Embedding,
}

impl VectorShape {
    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            VectorShape::Sequence => "sequence",
            VectorShape::Array => "array",
            VectorShape::Embedding => "embedding",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sequence" | "vec" | "list" => Some(VectorShape::Sequence),
            "array" => Some(VectorShape::Array),
            "embedding" => Some(VectorShape::Embedding),
            _ => None,
        }
    }
}

/// Distance function configured for a vector property
///
/// The store reports a raw distance for every metric (lower = closer).
/// Similarity functions are converted back to "higher = more similar"
/// by [`DistanceFunction::score_from_distance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceFunction {
    /// Cosine similarity (default)
    #[default]
    CosineSimilarity,
    /// Cosine distance (1 - cosine similarity)
    CosineDistance,
    /// Dot product similarity
    DotProductSimilarity,
    /// Euclidean distance. Not offered by the store (it only computes the
    /// squared form), so schemas declaring it are rejected.
    EuclideanDistance,
    /// Squared Euclidean distance
    EuclideanSquaredDistance,
}

impl DistanceFunction {
    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            DistanceFunction::CosineSimilarity => "cosine_similarity",
            DistanceFunction::CosineDistance => "cosine_distance",
            DistanceFunction::DotProductSimilarity => "dot_product_similarity",
            DistanceFunction::EuclideanDistance => "euclidean_distance",
            DistanceFunction::EuclideanSquaredDistance => "euclidean_squared_distance",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cosine_similarity" | "cosine" => Some(DistanceFunction::CosineSimilarity),
            "cosine_distance" => Some(DistanceFunction::CosineDistance),
            "dot_product_similarity" | "dot_product" | "ip" => {
                Some(DistanceFunction::DotProductSimilarity)
            }
            "euclidean_distance" | "euclidean" => Some(DistanceFunction::EuclideanDistance),
            "euclidean_squared_distance" | "l2" => {
                Some(DistanceFunction::EuclideanSquaredDistance)
            }
            _ => None,
        }
    }

    /// Whether the store can compute this function
    pub fn is_supported(&self) -> bool {
        !matches!(self, DistanceFunction::EuclideanDistance)
    }

    /// Native metric name used by the store
    pub fn native_metric(&self) -> &'static str {
        match self {
            DistanceFunction::CosineSimilarity | DistanceFunction::CosineDistance => "COSINE",
            DistanceFunction::DotProductSimilarity => "IP",
            DistanceFunction::EuclideanDistance | DistanceFunction::EuclideanSquaredDistance => {
                "L2"
            }
        }
    }

    /// Convert the store's raw distance into the caller-facing score
    pub fn score_from_distance(&self, distance: f64) -> f64 {
        match self {
            DistanceFunction::CosineSimilarity | DistanceFunction::DotProductSimilarity => {
                1.0 - distance
            }
            _ => distance,
        }
    }
}

/// Embedding produced by a generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Embedding {
    /// 32-bit elements
    Float32(Vec<f32>),
    /// 64-bit elements
    Float64(Vec<f64>),
}

impl Embedding {
    /// Number of elements
    pub fn dimension(&self) -> usize {
        match self {
            Embedding::Float32(v) => v.len(),
            Embedding::Float64(v) => v.len(),
        }
    }

    /// Element kind
    pub fn element_kind(&self) -> ElementKind {
        match self {
            Embedding::Float32(_) => ElementKind::Float32,
            Embedding::Float64(_) => ElementKind::Float64,
        }
    }

    /// Contiguous view of the elements
    pub fn elements(&self) -> VectorElements<'_> {
        match self {
            Embedding::Float32(v) => VectorElements::Float32(v),
            Embedding::Float64(v) => VectorElements::Float64(v),
        }
    }
}

/// Borrowed contiguous element view of any vector shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VectorElements<'a> {
    /// 32-bit elements
    Float32(&'a [f32]),
    /// 64-bit elements
    Float64(&'a [f64]),
}

impl VectorElements<'_> {
    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            VectorElements::Float32(v) => v.len(),
            VectorElements::Float64(v) => v.len(),
        }
    }

    /// Check if there are no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element kind
    pub fn element_kind(&self) -> ElementKind {
        match self {
            VectorElements::Float32(_) => ElementKind::Float32,
            VectorElements::Float64(_) => ElementKind::Float64,
        }
    }

    /// Elements widened to f64
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            VectorElements::Float32(v) => v.iter().map(|&x| x as f64).collect(),
            VectorElements::Float64(v) => v.to_vec(),
        }
    }
}

/// A vector value in one of the supported in-memory shapes
#[derive(Debug, Clone, PartialEq)]
pub enum VectorValue {
    /// Owned f32 sequence
    Float32(Vec<f32>),
    /// Owned f64 sequence
    Float64(Vec<f64>),
    /// Boxed f32 array
    Float32Array(Box<[f32]>),
    /// Boxed f64 array
    Float64Array(Box<[f64]>),
    /// Wrapped embedding
    Embedding(Embedding),
}

impl VectorValue {
    /// Contiguous view of the elements
    pub fn elements(&self) -> VectorElements<'_> {
        match self {
            VectorValue::Float32(v) => VectorElements::Float32(v),
            VectorValue::Float64(v) => VectorElements::Float64(v),
            VectorValue::Float32Array(v) => VectorElements::Float32(v),
            VectorValue::Float64Array(v) => VectorElements::Float64(v),
            VectorValue::Embedding(e) => e.elements(),
        }
    }

    /// Number of elements
    pub fn dimension(&self) -> usize {
        self.elements().len()
    }

    /// Element kind
    pub fn element_kind(&self) -> ElementKind {
        self.elements().element_kind()
    }

    /// In-memory shape
    pub fn shape(&self) -> VectorShape {
        match self {
            VectorValue::Float32(_) | VectorValue::Float64(_) => VectorShape::Sequence,
            VectorValue::Float32Array(_) | VectorValue::Float64Array(_) => VectorShape::Array,
            VectorValue::Embedding(_) => VectorShape::Embedding,
        }
    }

    /// Rebuild a value of the requested shape from f32 elements
    pub fn from_f32(elements: Vec<f32>, shape: VectorShape) -> Self {
        match shape {
            VectorShape::Sequence => VectorValue::Float32(elements),
            VectorShape::Array => VectorValue::Float32Array(elements.into_boxed_slice()),
            VectorShape::Embedding => VectorValue::Embedding(Embedding::Float32(elements)),
        }
    }

    /// Rebuild a value of the requested shape from f64 elements
    pub fn from_f64(elements: Vec<f64>, shape: VectorShape) -> Self {
        match shape {
            VectorShape::Sequence => VectorValue::Float64(elements),
            VectorShape::Array => VectorValue::Float64Array(elements.into_boxed_slice()),
            VectorShape::Embedding => VectorValue::Embedding(Embedding::Float64(elements)),
        }
    }
}

impl From<Vec<f32>> for VectorValue {
    fn from(v: Vec<f32>) -> Self {
        VectorValue::Float32(v)
    }
}

impl From<Vec<f64>> for VectorValue {
    fn from(v: Vec<f64>) -> Self {
        VectorValue::Float64(v)
    }
}

impl From<Embedding> for VectorValue {
    fn from(e: Embedding) -> Self {
        VectorValue::Embedding(e)
    }
}
