//! stratamap - schema-driven record mapping for vector stores
//!
//! stratamap sits between an application's record types and a key-value or
//! document store with vector similarity search. It encodes records into the
//! store's flat (hash) or document (JSON) representation, decodes them back,
//! and translates similarity searches into the store's native query syntax.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use stratamap::{
//!     DataSpec, DataType, ElementKind, Filter, MapperConfig, QueryBuilder, Record,
//!     RecordMapper, Schema, SearchOptions, VectorSpec, VectorValue,
//! };
//!
//! let schema = Arc::new(
//!     Schema::builder()
//!         .key("id")
//!         .data(DataSpec::new("color", DataType::String))
//!         .vector(VectorSpec::new("embedding", ElementKind::Float32).dimension(4))
//!         .build()?,
//! );
//! let config = MapperConfig::default();
//!
//! // Encode a record for storage
//! let mapper = RecordMapper::from_config(Arc::clone(&schema), &config)?;
//! let record = Record::new()
//!     .with("id", "a")
//!     .with("color", "red")
//!     .with("embedding", vec![0.0f32, 1.0, 2.0, 3.0]);
//! let payload = mapper.to_payload(&record)?;
//! assert_eq!(payload.key(), "a");
//!
//! // Build a filtered similarity search
//! let builder = QueryBuilder::from_config(schema, &config)?;
//! let query = builder.build(
//!     &VectorValue::Float32(vec![0.0, 1.0, 0.0, 0.0]),
//!     &SearchOptions::new().with_top(5).with_filter(Filter::new().eq("color", "red")),
//! )?;
//! assert_eq!(query.query, "(@color:{red})=>[KNN 5 @embedding $vector AS vector_score]");
//! # Ok::<(), stratamap::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `stratamap-core`: schema model, values, configuration, errors
//! - `stratamap-codec`: vector codec, flat and document encoders
//! - `stratamap-query`: filter translation, query building, result rows

pub use stratamap_codec::*;
pub use stratamap_core::*;
pub use stratamap_query::*;
