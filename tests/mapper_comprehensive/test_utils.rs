//! Test utilities for mapper comprehensive tests
//!
//! Provides common helpers for:
//! - The hotel schema used across tiers
//! - Deterministic vector generation
//! - A fake embedding generator
//! - Raw result row construction

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use stratamap::{
    DataSpec, DataType, DistanceFunction, ElementKind, Embedding, EmbeddingGenerator,
    GeneratorError, Record, Schema, Value, VectorSpec,
};

// ============================================================================
// Schemas
// ============================================================================

/// Dimension of the hotel embedding
pub const HOTEL_DIMENSION: usize = 4;

/// Hotel schema: string key, four data properties (two renamed), one vector
pub fn hotel_schema() -> Arc<Schema> {
    Arc::new(
        Schema::builder()
            .key("hotel_id")
            .data(DataSpec::new("name", DataType::String))
            .data(DataSpec::new("city", DataType::String).storage_name("city_name"))
            .data(DataSpec::new("rating", DataType::Float64))
            .data(DataSpec::new("rooms", DataType::Int32).nullable())
            .vector(
                VectorSpec::new("description_embedding", ElementKind::Float32)
                    .storage_name("desc_vec")
                    .dimension(HOTEL_DIMENSION)
                    .distance(DistanceFunction::CosineSimilarity),
            )
            .build()
            .expect("hotel schema is valid"),
    )
}

/// Minimal schema: key `id`, string `color`, f32[4] `embedding`
pub fn color_schema() -> Arc<Schema> {
    Arc::new(
        Schema::builder()
            .key("id")
            .data(DataSpec::new("color", DataType::String))
            .vector(VectorSpec::new("embedding", ElementKind::Float32).dimension(4))
            .build()
            .expect("color schema is valid"),
    )
}

/// A complete hotel record
pub fn hotel(id: &str, name: &str, city: &str, rating: f64, seed: u64) -> Record {
    Record::new()
        .with("hotel_id", id)
        .with("name", name)
        .with("city", city)
        .with("rating", rating)
        .with("rooms", 120i32)
        .with("description_embedding", random_vector(HOTEL_DIMENSION, seed))
}

// ============================================================================
// Vectors
// ============================================================================

/// Simple LCG for reproducible vectors
fn lcg_next(state: &mut u64) -> u64 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
    *state
}

/// Deterministic vector with elements in [-1, 1)
pub fn random_vector(dimension: usize, seed: u64) -> Vec<f32> {
    let mut state = seed;
    (0..dimension)
        .map(|_| {
            let bits = (lcg_next(&mut state) >> 40) as u32;
            (bits as f32 / (1u32 << 24) as f32) * 2.0 - 1.0
        })
        .collect()
}

// ============================================================================
// Embedding generators
// ============================================================================

/// Generator returning `[len, 0, 0, ...]` for each text source
#[derive(Debug)]
pub struct LengthGenerator {
    pub dimension: usize,
    pub calls: AtomicUsize,
}

impl LengthGenerator {
    pub fn new(dimension: usize) -> Self {
        LengthGenerator {
            dimension,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingGenerator for LengthGenerator {
    fn generate(&self, sources: &[Value]) -> Result<Vec<Embedding>, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        sources
            .iter()
            .map(|source| -> Result<Embedding, GeneratorError> {
                let text = source.as_str().ok_or("source is not text")?;
                let mut v = vec![0.0f32; self.dimension];
                if let Some(first) = v.first_mut() {
                    *first = text.len() as f32;
                }
                Ok(Embedding::Float32(v))
            })
            .collect()
    }
}

// ============================================================================
// Result rows
// ============================================================================

/// One raw `(field, bytes)` pair
pub fn field(name: &str, value: &[u8]) -> (String, Vec<u8>) {
    (name.to_string(), value.to_vec())
}
