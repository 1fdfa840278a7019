//! Filter clauses and their translation to query fragments
//!
//! A [`Filter`] is an ordered list of clauses combined with AND semantics.
//! [`translate_filter`] resolves each clause's logical field name through the
//! schema and emits the store's filter grammar:
//!
//! ```text
//! no filter / empty filter   *
//! numeric equality           @field:[v v]
//! string equality            @field:{value}
//! tag containment            @field:{tag}
//! several clauses            (@a:{x} @b:[1 1])
//! ```
//!
//! Tag values are escaped, so user text can never close the braces or start
//! another clause.

use stratamap_core::{DataType, PropertyIndex, QueryConfigError, Schema, Value};
use tracing::debug;

/// Fragment that matches every record
pub const MATCH_ALL: &str = "*";

// ============================================================================
// FilterValue
// ============================================================================

/// Value of an equality clause
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Exact string (tag) match
    String(String),
    /// 32-bit integer
    Int32(i32),
    /// 64-bit integer
    Int64(i64),
    /// 32-bit float
    Float32(f32),
    /// 64-bit float
    Float64(f64),
}

impl FilterValue {
    /// Check if this is a numeric value
    pub fn is_numeric(&self) -> bool {
        !matches!(self, FilterValue::String(_))
    }

    /// Human-readable type name
    pub fn type_name(&self) -> &'static str {
        match self {
            FilterValue::String(_) => "string",
            FilterValue::Int32(_) => "int32",
            FilterValue::Int64(_) => "int64",
            FilterValue::Float32(_) => "float32",
            FilterValue::Float64(_) => "float64",
        }
    }

    /// Render a numeric value, rejecting NaN and infinities
    fn numeric_text(&self) -> Option<String> {
        match self {
            FilterValue::String(_) => None,
            FilterValue::Int32(n) => Some(n.to_string()),
            FilterValue::Int64(n) => Some(n.to_string()),
            FilterValue::Float32(n) => n.is_finite().then(|| n.to_string()),
            FilterValue::Float64(n) => n.is_finite().then(|| n.to_string()),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::String(s)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        FilterValue::Int32(n)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Int64(n)
    }
}

impl From<f32> for FilterValue {
    fn from(n: f32) -> Self {
        FilterValue::Float32(n)
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        FilterValue::Float64(n)
    }
}

impl TryFrom<Value> for FilterValue {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(FilterValue::String(s)),
            Value::Int32(n) => Ok(FilterValue::Int32(n)),
            Value::Int64(n) => Ok(FilterValue::Int64(n)),
            Value::Float32(n) => Ok(FilterValue::Float32(n)),
            Value::Float64(n) => Ok(FilterValue::Float64(n)),
            other => Err(format!(
                "{} values cannot be used in equality clauses",
                other.type_name()
            )),
        }
    }
}

// ============================================================================
// Filter
// ============================================================================

/// One filter clause
#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    /// Field equals value
    Equality {
        /// Logical field name
        field: String,
        /// Expected value
        value: FilterValue,
    },
    /// Tag-set field contains tag
    AnyTagEquals {
        /// Logical field name
        field: String,
        /// Tag that must be present
        tag: String,
    },
}

impl FilterClause {
    /// Logical field name of the clause
    pub fn field(&self) -> &str {
        match self {
            FilterClause::Equality { field, .. } | FilterClause::AnyTagEquals { field, .. } => {
                field
            }
        }
    }
}

/// Ordered clauses combined with AND
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<FilterClause>,
}

impl Filter {
    /// Create an empty filter (matches all)
    pub fn new() -> Self {
        Filter::default()
    }

    /// Add an equality clause
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.clauses.push(FilterClause::Equality {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Add an equality clause from a dynamic value
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFilterValue` for nulls, booleans, lists and vectors.
    pub fn try_eq(
        self,
        field: impl Into<String>,
        value: Value,
    ) -> Result<Self, QueryConfigError> {
        let field = field.into();
        let value = FilterValue::try_from(value).map_err(|reason| {
            QueryConfigError::UnsupportedFilterValue {
                field: field.clone(),
                reason,
            }
        })?;
        Ok(self.eq(field, value))
    }

    /// Add a tag containment clause
    pub fn any_tag_eq(mut self, field: impl Into<String>, tag: impl Into<String>) -> Self {
        self.clauses.push(FilterClause::AnyTagEquals {
            field: field.into(),
            tag: tag.into(),
        });
        self
    }

    /// Clauses in declaration order
    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    /// Check if filter is empty (matches all)
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Get the number of clauses in the filter
    pub fn len(&self) -> usize {
        self.clauses.len()
    }
}

// ============================================================================
// Translation
// ============================================================================

/// Translate a filter into a query fragment
///
/// # Errors
///
/// Fails without producing a fragment if any clause names an unknown field,
/// targets a field that cannot be filtered, or carries a value the field's
/// type cannot match.
pub fn translate_filter<R>(
    schema: &Schema<R>,
    filter: Option<&Filter>,
) -> Result<String, QueryConfigError> {
    let Some(filter) = filter.filter(|f| !f.is_empty()) else {
        return Ok(MATCH_ALL.to_string());
    };

    let parts = filter
        .clauses()
        .iter()
        .map(|clause| translate_clause(schema, clause))
        .collect::<Result<Vec<_>, _>>()?;
    let fragment = format!("({})", parts.join(" "));

    debug!(
        target: "stratamap::filter",
        clauses = parts.len(),
        fragment = %fragment,
        "Translated filter"
    );
    Ok(fragment)
}

fn translate_clause<R>(
    schema: &Schema<R>,
    clause: &FilterClause,
) -> Result<String, QueryConfigError> {
    let field = clause.field();
    let property = match schema.lookup(field) {
        None => {
            return Err(QueryConfigError::UnknownField {
                field: field.to_string(),
            })
        }
        Some(PropertyIndex::Key) => {
            return Err(not_filterable(field, "the key is not an indexed field"))
        }
        Some(PropertyIndex::Vector(_)) => {
            return Err(not_filterable(field, "vector fields only support similarity search"))
        }
        Some(PropertyIndex::Data(_)) => schema
            .data_property(field)
            .ok_or_else(|| QueryConfigError::UnknownField {
                field: field.to_string(),
            })?,
    };
    let storage_name = property.storage_name();
    let data_type = property.data_type();

    match clause {
        FilterClause::Equality { value, .. } => match value {
            FilterValue::String(s) => {
                if data_type.is_numeric() {
                    return Err(unsupported_value(
                        field,
                        format!("string value against {} field", data_type),
                    ));
                }
                tag_fragment(field, storage_name, s)
            }
            numeric => {
                if !data_type.is_numeric() {
                    return Err(unsupported_value(
                        field,
                        format!("{} value against {} field", numeric.type_name(), data_type),
                    ));
                }
                let text = numeric
                    .numeric_text()
                    .ok_or_else(|| unsupported_value(field, "non-finite number".to_string()))?;
                Ok(format!("@{}:[{} {}]", storage_name, text, text))
            }
        },
        FilterClause::AnyTagEquals { tag, .. } => {
            if !matches!(data_type, DataType::StringList | DataType::String) {
                return Err(not_filterable(
                    field,
                    &format!(
                        "tag containment needs a string or string list field, not {}",
                        data_type
                    ),
                ));
            }
            tag_fragment(field, storage_name, tag)
        }
    }
}

/// `@field:{tag}`; the store rejects empty braces, so empty text is refused
fn tag_fragment(field: &str, storage_name: &str, text: &str) -> Result<String, QueryConfigError> {
    if text.is_empty() {
        return Err(unsupported_value(field, "empty tag text".to_string()));
    }
    Ok(format!("@{}:{{{}}}", storage_name, escape_tag(text)))
}

fn not_filterable(field: &str, reason: &str) -> QueryConfigError {
    QueryConfigError::NotFilterable {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn unsupported_value(field: &str, reason: String) -> QueryConfigError {
    QueryConfigError::UnsupportedFilterValue {
        field: field.to_string(),
        reason,
    }
}

/// Backslash-escape everything in a tag value except letters, digits and `_`
pub fn escape_tag(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if (c.is_ascii_punctuation() && c != '_') || c.is_whitespace() {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
