//! Scalar conversions shared by both encoders
//!
//! Values are converted to a property's declared [`DataType`] on the way in
//! and on the way out. Integers widen to larger integers and to floats,
//! floats narrow only from f64 to f32, and text parses into any scalar type.

use stratamap_core::{DataType, MappingError, Value};

/// Convert a value to the declared type of `field`
///
/// `Value::Null` passes through unchanged; whether the destination accepts
/// it is decided by its setter.
pub fn coerce_value(field: &str, value: Value, target: DataType) -> Result<Value, MappingError> {
    let mismatch = |found: &Value| {
        MappingError::conversion(field, target.name(), format!("found {}", found.type_name()))
    };

    match (target, value) {
        (_, Value::Null) => Ok(Value::Null),
        (_, Value::String(text)) if target != DataType::String => {
            parse_scalar(field, &text, target)
        }

        (DataType::Bool, v @ Value::Bool(_)) => Ok(v),

        (DataType::Int32, v @ Value::Int32(_)) => Ok(v),
        (DataType::Int32, Value::Int64(n)) => i32::try_from(n)
            .map(Value::Int32)
            .map_err(|_| MappingError::conversion(field, "int32", format!("{} out of range", n))),

        (DataType::Int64, Value::Int32(n)) => Ok(Value::Int64(n as i64)),
        (DataType::Int64, v @ Value::Int64(_)) => Ok(v),

        (DataType::Float32, v @ Value::Float32(_)) => Ok(v),
        (DataType::Float32, Value::Float64(n)) => Ok(Value::Float32(n as f32)),
        (DataType::Float32, Value::Int32(n)) => Ok(Value::Float32(n as f32)),
        (DataType::Float32, Value::Int64(n)) => Ok(Value::Float32(n as f32)),

        (DataType::Float64, Value::Float32(n)) => Ok(Value::Float64(n as f64)),
        (DataType::Float64, v @ Value::Float64(_)) => Ok(v),
        (DataType::Float64, Value::Int32(n)) => Ok(Value::Float64(n as f64)),
        (DataType::Float64, Value::Int64(n)) => Ok(Value::Float64(n as f64)),

        (DataType::String, v @ Value::String(_)) => Ok(v),
        (DataType::StringList, v @ Value::StringList(_)) => Ok(v),

        (_, other) => Err(mismatch(&other)),
    }
}

/// Parse UTF-8 text into the declared scalar type of `field`
pub fn parse_scalar(field: &str, text: &str, target: DataType) -> Result<Value, MappingError> {
    let fail = |reason: String| MappingError::conversion(field, target.name(), reason);

    match target {
        DataType::Bool => match text {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            other => Err(fail(format!("'{}' is not a boolean", other))),
        },
        DataType::Int32 => text
            .parse::<i32>()
            .map(Value::Int32)
            .map_err(|e| fail(e.to_string())),
        DataType::Int64 => text
            .parse::<i64>()
            .map(Value::Int64)
            .map_err(|e| fail(e.to_string())),
        DataType::Float32 => text
            .parse::<f32>()
            .map(Value::Float32)
            .map_err(|e| fail(e.to_string())),
        DataType::Float64 => text
            .parse::<f64>()
            .map(Value::Float64)
            .map_err(|e| fail(e.to_string())),
        DataType::String => Ok(Value::String(text.to_string())),
        DataType::StringList => Err(fail("text cannot be read as a string list".to_string())),
    }
}
