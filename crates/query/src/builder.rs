//! KNN query building
//!
//! [`QueryBuilder`] composes a similarity search into one [`NativeQuery`]:
//!
//! ```text
//! {filter}=>[KNN {top+skip} @{vector field} ${param} AS {score field}]
//! RETURN n f1 .. fn       (omitted when the full record is wanted)
//! SORTBY {score field} ASC
//! LIMIT {skip} {top+skip}
//! PARAMS 2 {param} <vector bytes>
//! DIALECT {dialect}
//! ```
//!
//! The store cannot page a similarity search by offset alone, so the KNN
//! clause over-fetches `top + skip` neighbours and LIMIT slices the window.
//! The query vector is always a bound parameter and never appears in the
//! query text.

use crate::filter::{translate_filter, Filter};
use std::sync::Arc;
use stratamap_codec::encode_vector;
use stratamap_core::{
    ConfigError, DistanceFunction, MapperConfig, PropertyIndex, QueryConfig, QueryConfigError,
    Schema, VectorProperty, VectorValue,
};
use tracing::debug;

// ============================================================================
// SearchOptions
// ============================================================================

/// Options for one search request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    /// Number of results (defaults to the configured `default_top`)
    pub top: Option<usize>,
    /// Number of leading results to skip
    pub skip: usize,
    /// Logical name of the vector property to search (defaults to the first)
    pub vector_property: Option<String>,
    /// Filter clauses
    pub filter: Option<Filter>,
    /// Return vector properties with each hit
    pub include_vectors: bool,
    /// Logical names of the properties to return (defaults to the full record)
    pub projection: Option<Vec<String>>,
}

impl SearchOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        SearchOptions::default()
    }

    /// Builder: set result count
    pub fn with_top(mut self, top: usize) -> Self {
        self.top = Some(top);
        self
    }

    /// Builder: set skip count
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Builder: choose the vector property
    pub fn with_vector_property(mut self, name: impl Into<String>) -> Self {
        self.vector_property = Some(name.into());
        self
    }

    /// Builder: set filter
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Builder: return vectors with hits
    pub fn with_include_vectors(mut self, include_vectors: bool) -> Self {
        self.include_vectors = include_vectors;
        self
    }

    /// Builder: restrict returned properties
    pub fn with_projection<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

// ============================================================================
// NativeQuery
// ============================================================================

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

impl SortOrder {
    /// Keyword used by the store
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Score column requested alongside results
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreField {
    /// Alias the raw distance is returned under
    pub name: String,
    /// Distance function of the searched vector property
    pub distance: DistanceFunction,
}

/// One argument of a rendered query command
#[derive(Debug, Clone, PartialEq)]
pub enum QueryArg {
    /// UTF-8 text argument
    Text(String),
    /// Binary argument
    Blob(Vec<u8>),
}

impl From<&str> for QueryArg {
    fn from(s: &str) -> Self {
        QueryArg::Text(s.to_string())
    }
}

impl From<String> for QueryArg {
    fn from(s: String) -> Self {
        QueryArg::Text(s)
    }
}

/// A complete query in the store's native form
#[derive(Debug, Clone, PartialEq)]
pub struct NativeQuery {
    /// Query text (filter and optional KNN clause)
    pub query: String,
    /// Bound parameters
    pub params: Vec<(String, Vec<u8>)>,
    /// Storage names to return; `None` returns the full record
    pub return_fields: Option<Vec<String>>,
    /// Sort column and direction
    pub sort_by: Option<(String, SortOrder)>,
    /// Results to skip
    pub offset: usize,
    /// Results to fetch
    pub count: usize,
    /// Query dialect
    pub dialect: u32,
    /// Score column, for KNN queries
    pub score: Option<ScoreField>,
    /// Whether vectors were requested
    pub include_vectors: bool,
}

impl NativeQuery {
    /// The `LIMIT` clause
    pub fn limit_clause(&self) -> String {
        format!("LIMIT {} {}", self.offset, self.count)
    }

    /// Render as a search command argument list for `index`
    pub fn to_args(&self, index: &str) -> Vec<QueryArg> {
        let mut args: Vec<QueryArg> = vec![index.into(), self.query.as_str().into()];

        if let Some(fields) = &self.return_fields {
            args.push("RETURN".into());
            args.push(fields.len().to_string().into());
            args.extend(fields.iter().map(|f| QueryArg::Text(f.clone())));
        }
        if let Some((field, order)) = &self.sort_by {
            args.push("SORTBY".into());
            args.push(field.as_str().into());
            args.push(order.keyword().into());
        }
        args.push("LIMIT".into());
        args.push(self.offset.to_string().into());
        args.push(self.count.to_string().into());
        if !self.params.is_empty() {
            args.push("PARAMS".into());
            args.push((self.params.len() * 2).to_string().into());
            for (name, value) in &self.params {
                args.push(name.as_str().into());
                args.push(QueryArg::Blob(value.clone()));
            }
        }
        args.push("DIALECT".into());
        args.push(self.dialect.to_string().into());
        args
    }
}

// ============================================================================
// QueryBuilder
// ============================================================================

/// Builds native queries for one schema
#[derive(Debug)]
pub struct QueryBuilder<R> {
    schema: Arc<Schema<R>>,
    config: QueryConfig,
}

impl<R> Clone for QueryBuilder<R> {
    fn clone(&self) -> Self {
        QueryBuilder {
            schema: Arc::clone(&self.schema),
            config: self.config.clone(),
        }
    }
}

impl<R> QueryBuilder<R> {
    /// Create a builder with explicit query settings
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the settings cannot appear in query
    /// text.
    pub fn new(schema: Arc<Schema<R>>, config: QueryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(QueryBuilder { schema, config })
    }

    /// Create a builder from mapper configuration
    pub fn from_config(schema: Arc<Schema<R>>, config: &MapperConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        QueryBuilder::new(schema, config.query.clone())
    }

    /// Query settings in use
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Build a KNN query for a query vector
    ///
    /// # Errors
    ///
    /// Returns a `QueryConfigError` if the options are out of range, the
    /// vector property cannot be resolved, the vector does not match it, or
    /// the filter or projection name something the schema cannot satisfy.
    pub fn build(
        &self,
        vector: &VectorValue,
        options: &SearchOptions,
    ) -> Result<NativeQuery, QueryConfigError> {
        let property = self.resolve_vector_property(options)?;
        if vector.element_kind() != property.element_kind() {
            return Err(QueryConfigError::VectorMismatch {
                field: property.name().to_string(),
                reason: format!(
                    "expected {} elements, got {}",
                    property.element_kind(),
                    vector.element_kind()
                ),
            });
        }
        self.build_knn(property, encode_vector(vector), options)
    }

    /// Build a KNN query from an already packed query vector
    pub fn build_with_bytes(
        &self,
        vector_bytes: &[u8],
        options: &SearchOptions,
    ) -> Result<NativeQuery, QueryConfigError> {
        let property = self.resolve_vector_property(options)?;
        let element_size = property.element_kind().size();
        if vector_bytes.len() % element_size != 0 {
            return Err(QueryConfigError::VectorMismatch {
                field: property.name().to_string(),
                reason: format!(
                    "{} bytes is not a whole number of {} elements",
                    vector_bytes.len(),
                    property.element_kind()
                ),
            });
        }
        self.build_knn(property, vector_bytes.to_vec(), options)
    }

    /// Build a filter-only query (no similarity clause)
    pub fn build_filter_query(
        &self,
        options: &SearchOptions,
    ) -> Result<NativeQuery, QueryConfigError> {
        let (top, skip, count) = self.window(options)?;
        let query = translate_filter(&self.schema, options.filter.as_ref())?;
        let return_fields = self.return_fields(options, None)?;

        debug!(target: "stratamap::query", query = %query, top, skip, "Built filter query");
        Ok(NativeQuery {
            query,
            params: Vec::new(),
            return_fields,
            sort_by: None,
            offset: skip,
            count,
            dialect: self.config.dialect,
            score: None,
            include_vectors: options.include_vectors,
        })
    }

    fn build_knn(
        &self,
        property: &VectorProperty<R>,
        vector_bytes: Vec<u8>,
        options: &SearchOptions,
    ) -> Result<NativeQuery, QueryConfigError> {
        if let Some(expected) = property.dimension() {
            let got = vector_bytes.len() / property.element_kind().size();
            if got != expected {
                return Err(QueryConfigError::VectorMismatch {
                    field: property.name().to_string(),
                    reason: format!("expected dimension {}, got {}", expected, got),
                });
            }
        }

        let (top, skip, count) = self.window(options)?;
        let filter = translate_filter(&self.schema, options.filter.as_ref())?;
        let score_field = &self.config.score_field;
        let return_fields = self.return_fields(options, Some(score_field))?;

        let query = format!(
            "{}=>[KNN {} @{} ${} AS {}]",
            filter,
            count,
            property.storage_name(),
            self.config.vector_param,
            score_field
        );

        debug!(
            target: "stratamap::query",
            query = %query,
            vector = property.name(),
            top,
            skip,
            "Built KNN query"
        );
        Ok(NativeQuery {
            query,
            params: vec![(self.config.vector_param.clone(), vector_bytes)],
            return_fields,
            sort_by: Some((score_field.clone(), SortOrder::Asc)),
            offset: skip,
            count,
            dialect: self.config.dialect,
            score: Some(ScoreField {
                name: score_field.clone(),
                distance: property.distance_function(),
            }),
            include_vectors: options.include_vectors,
        })
    }

    fn resolve_vector_property(
        &self,
        options: &SearchOptions,
    ) -> Result<&VectorProperty<R>, QueryConfigError> {
        match &options.vector_property {
            Some(name) => self.schema.vector_property(name).ok_or_else(|| {
                QueryConfigError::VectorFieldNotFound {
                    field: name.clone(),
                }
            }),
            None => self
                .schema
                .first_vector_property()
                .ok_or(QueryConfigError::NoVectorProperty),
        }
    }

    /// Returns `(top, skip, top + skip)`
    fn window(&self, options: &SearchOptions) -> Result<(usize, usize, usize), QueryConfigError> {
        let top = options.top.unwrap_or(self.config.default_top);
        if top == 0 {
            return Err(QueryConfigError::InvalidOptions("top must be > 0".to_string()));
        }
        let count = top
            .checked_add(options.skip)
            .ok_or_else(|| QueryConfigError::InvalidOptions("top + skip overflows".to_string()))?;
        Ok((top, options.skip, count))
    }

    fn return_fields(
        &self,
        options: &SearchOptions,
        score_field: Option<&String>,
    ) -> Result<Option<Vec<String>>, QueryConfigError> {
        let mut fields = match &options.projection {
            Some(names) => {
                let mut fields = Vec::with_capacity(names.len() + 1);
                for name in names {
                    match self.schema.lookup(name) {
                        None => {
                            return Err(QueryConfigError::UnknownField {
                                field: name.clone(),
                            })
                        }
                        // Keys come back as the row id, never as a field
                        Some(PropertyIndex::Key) => {}
                        Some(_) => {
                            if let Some(storage_name) = self.schema.storage_name(name) {
                                fields.push(storage_name.to_string());
                            }
                        }
                    }
                }
                fields
            }
            None if options.include_vectors => return Ok(None),
            None => self
                .schema
                .data_properties()
                .iter()
                .map(|p| p.storage_name().to_string())
                .collect(),
        };
        if let Some(score_field) = score_field {
            fields.push(score_field.clone());
        }
        Ok(Some(fields))
    }
}
