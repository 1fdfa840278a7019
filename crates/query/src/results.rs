//! Search result processing
//!
//! The transport hands back ordered rows of `(key, [(field, bytes)])`. Each
//! row is turned into a [`SearchHit`]: the score column is removed and
//! converted through the searched property's distance function, and the
//! remaining fields are decoded by the collection's [`RecordMapper`].
//!
//! Flat rows decode their fields directly. Document rows carry either the
//! whole document as JSON text under `$`, or one JSON-encoded value per
//! returned field.

use crate::builder::NativeQuery;
use serde_json::{Map, Value as JsonValue};
use stratamap_codec::{DocumentPayload, FlatPayload, RecordMapper, StoragePayload};
use stratamap_core::{DataType, MappingError, Schema};
use tracing::warn;

/// Field under which the store returns a whole JSON document
pub const DOCUMENT_ROOT_FIELD: &str = "$";

/// One raw result row
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// Storage key
    pub key: String,
    /// Returned fields
    pub fields: Vec<(String, Vec<u8>)>,
}

impl RawRow {
    /// Create a row
    pub fn new(key: impl Into<String>, fields: Vec<(String, Vec<u8>)>) -> Self {
        RawRow {
            key: key.into(),
            fields,
        }
    }
}

/// One decoded search result
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<R> {
    /// Decoded record
    pub record: R,
    /// Caller-facing score, if the row carried one
    pub score: Option<f64>,
}

/// Decodes raw rows for one collection
#[derive(Debug)]
pub struct ResultProcessor<R> {
    mapper: RecordMapper<R>,
}

impl<R: Default> ResultProcessor<R> {
    /// Create a processor over the collection's encoder
    pub fn new(mapper: RecordMapper<R>) -> Self {
        ResultProcessor { mapper }
    }

    /// Decode all rows of a query; each row succeeds or fails on its own
    pub fn process(
        &self,
        query: &NativeQuery,
        rows: Vec<RawRow>,
    ) -> Vec<Result<SearchHit<R>, MappingError>> {
        rows.into_iter().map(|row| self.process_row(query, row)).collect()
    }

    /// Decode one row
    pub fn process_row(
        &self,
        query: &NativeQuery,
        row: RawRow,
    ) -> Result<SearchHit<R>, MappingError> {
        let RawRow { key, mut fields } = row;

        let score = match &query.score {
            Some(score_field) => {
                match fields.iter().position(|(name, _)| *name == score_field.name) {
                    Some(pos) => {
                        let (_, raw) = fields.remove(pos);
                        let distance = parse_score(&key, &raw)?;
                        Some(score_field.distance.score_from_distance(distance))
                    }
                    None => {
                        warn!(
                            target: "stratamap::query",
                            key = %key,
                            score_field = %score_field.name,
                            "Result row has no score"
                        );
                        None
                    }
                }
            }
            None => None,
        };

        let payload = match &self.mapper {
            RecordMapper::Flat(_) => StoragePayload::Flat(FlatPayload::from_wire(key, fields)),
            RecordMapper::Document(_) => {
                StoragePayload::Document(document_payload(self.mapper.schema(), key, fields)?)
            }
        };
        let record = self.mapper.from_payload(&payload, query.include_vectors)?;
        Ok(SearchHit { record, score })
    }
}

fn parse_score(key: &str, raw: &[u8]) -> Result<f64, MappingError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|text| text.trim().parse::<f64>().ok())
        .ok_or_else(|| MappingError::malformed(key, "score is not a number"))
}

fn document_payload<R>(
    schema: &Schema<R>,
    key: String,
    fields: Vec<(String, Vec<u8>)>,
) -> Result<DocumentPayload, MappingError> {
    if let Some((_, raw)) = fields.iter().find(|(name, _)| name == DOCUMENT_ROOT_FIELD) {
        let text = std::str::from_utf8(raw)
            .map_err(|e| MappingError::malformed(key.clone(), format!("invalid UTF-8: {}", e)))?;
        return DocumentPayload::from_json_text(key, text);
    }

    let mut document = Map::new();
    for (name, raw) in fields {
        let text = String::from_utf8(raw)
            .map_err(|e| MappingError::malformed(key.clone(), format!("invalid UTF-8: {}", e)))?;
        // String fields are taken verbatim; text like "null" or "[1]" stays text
        let is_string = schema
            .data_properties()
            .iter()
            .any(|p| p.storage_name() == name && p.data_type() == DataType::String);
        let value = if is_string {
            JsonValue::String(text)
        } else {
            serde_json::from_str(&text).unwrap_or(JsonValue::String(text))
        };
        document.insert(name, value);
    }
    Ok(DocumentPayload::new(key, JsonValue::Object(document)))
}
