//! Tier 1: Vector Codec
//!
//! Packed vectors are little-endian elements laid end to end. The byte length
//! must be a whole number of elements, and fixed-dimension properties reject
//! vectors of any other length.

use crate::test_utils::*;
use stratamap::{
    decode_vector, decode_vector_checked, encode_vector, ElementKind, MappingError, VectorShape,
    VectorValue,
};

#[test]
fn test_f32_layout_is_little_endian() {
    let bytes = encode_vector(&VectorValue::Float32(vec![1.0, -2.5]));
    let mut expected = Vec::new();
    expected.extend_from_slice(&1.0f32.to_le_bytes());
    expected.extend_from_slice(&(-2.5f32).to_le_bytes());
    assert_eq!(bytes, expected);
}

#[test]
fn test_f64_uses_eight_bytes_per_element() {
    let bytes = encode_vector(&VectorValue::Float64(vec![0.5, 0.25, 0.125]));
    assert_eq!(bytes.len(), 24);
    assert_eq!(&bytes[8..16], &0.25f64.to_le_bytes());
}

#[test]
fn test_round_trip_preserves_bits() {
    for dimension in [1, 4, 128, 1536] {
        let v = random_vector(dimension, dimension as u64);
        let bytes = encode_vector(&VectorValue::Float32(v.clone()));
        let decoded = decode_vector(&bytes, ElementKind::Float32, VectorShape::Sequence).unwrap();
        assert_eq!(decoded, VectorValue::Float32(v));
    }
}

/// Array and embedding shapes decode into their own variants
#[test]
fn test_decode_honours_shape() {
    let bytes = encode_vector(&VectorValue::Float32(vec![1.0, 2.0]));

    let array = decode_vector(&bytes, ElementKind::Float32, VectorShape::Array).unwrap();
    assert!(matches!(array, VectorValue::Float32Array(_)));

    let embedding = decode_vector(&bytes, ElementKind::Float32, VectorShape::Embedding).unwrap();
    assert!(matches!(embedding, VectorValue::Embedding(_)));
    assert_eq!(embedding.dimension(), 2);
}

#[test]
fn test_empty_bytes_decode_to_empty_vector() {
    let decoded = decode_vector(&[], ElementKind::Float64, VectorShape::Sequence).unwrap();
    assert_eq!(decoded, VectorValue::Float64(Vec::new()));
}

#[test]
fn test_partial_element_rejected() {
    let err = decode_vector(&[0u8; 6], ElementKind::Float32, VectorShape::Sequence).unwrap_err();
    assert!(matches!(
        err,
        MappingError::InvalidVectorBytes {
            len: 6,
            element_size: 4
        }
    ));
}

#[test]
fn test_checked_decode_rejects_wrong_dimension() {
    let bytes = encode_vector(&VectorValue::Float32(vec![0.0; 3]));
    let err = decode_vector_checked(
        "embedding",
        &bytes,
        ElementKind::Float32,
        VectorShape::Sequence,
        Some(4),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        MappingError::DimensionMismatch {
            expected: 4,
            got: 3,
            ..
        }
    ));
}

#[test]
fn test_checked_decode_without_dimension_accepts_any_length() {
    let bytes = encode_vector(&VectorValue::Float32(vec![0.0; 7]));
    let decoded =
        decode_vector_checked("free", &bytes, ElementKind::Float32, VectorShape::Sequence, None)
            .unwrap();
    assert_eq!(decoded.dimension(), 7);
}
