//! Binary vector codec
//!
//! Vectors are packed as raw little-endian elements with no length prefix and
//! no framing, so a buffer's length is always `dimension * element_size`:
//!
//! ```text
//! float32: [e0: f32 LE][e1: f32 LE]...[eN-1: f32 LE]
//! float64: [e0: f64 LE][e1: f64 LE]...[eN-1: f64 LE]
//! ```
//!
//! Every in-memory shape of [`VectorValue`] packs through the same contiguous
//! element view, and decoding restores whichever shape the caller asks for.

use byteorder::{ByteOrder, LittleEndian};
use stratamap_core::{ElementKind, MappingError, VectorElements, VectorShape, VectorValue};

/// Pack a vector into little-endian bytes
pub fn encode_vector(vector: &VectorValue) -> Vec<u8> {
    encode_elements(vector.elements())
}

/// Pack an element view into little-endian bytes
pub fn encode_elements(elements: VectorElements<'_>) -> Vec<u8> {
    match elements {
        VectorElements::Float32(src) => {
            let mut buf = vec![0u8; src.len() * 4];
            LittleEndian::write_f32_into(src, &mut buf);
            buf
        }
        VectorElements::Float64(src) => {
            let mut buf = vec![0u8; src.len() * 8];
            LittleEndian::write_f64_into(src, &mut buf);
            buf
        }
    }
}

/// Unpack little-endian bytes into a vector of the requested kind and shape
///
/// # Errors
///
/// Returns `InvalidVectorBytes` if the length is not a multiple of the
/// element size.
pub fn decode_vector(
    bytes: &[u8],
    kind: ElementKind,
    shape: VectorShape,
) -> Result<VectorValue, MappingError> {
    let element_size = kind.size();
    if bytes.len() % element_size != 0 {
        return Err(MappingError::InvalidVectorBytes {
            len: bytes.len(),
            element_size,
        });
    }

    let dimension = bytes.len() / element_size;
    Ok(match kind {
        ElementKind::Float32 => {
            let mut elements = vec![0f32; dimension];
            LittleEndian::read_f32_into(bytes, &mut elements);
            VectorValue::from_f32(elements, shape)
        }
        ElementKind::Float64 => {
            let mut elements = vec![0f64; dimension];
            LittleEndian::read_f64_into(bytes, &mut elements);
            VectorValue::from_f64(elements, shape)
        }
    })
}

/// Decode and check the result against a declared dimension
pub fn decode_vector_checked(
    field: &str,
    bytes: &[u8],
    kind: ElementKind,
    shape: VectorShape,
    dimension: Option<usize>,
) -> Result<VectorValue, MappingError> {
    let vector = decode_vector(bytes, kind, shape)?;
    if let Some(expected) = dimension {
        if vector.dimension() != expected {
            return Err(MappingError::DimensionMismatch {
                field: field.to_string(),
                expected,
                got: vector.dimension(),
            });
        }
    }
    Ok(vector)
}
