//! Query translation for stratamap
//!
//! - [`filter`]: structured filter clauses and their query fragments
//! - [`builder`]: KNN and filter-only native queries
//! - [`results`]: raw result rows back into scored records
//!
//! Everything here is a pure function of the schema and the request. Query
//! execution belongs to the transport.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod filter;
pub mod results;

pub use builder::{NativeQuery, QueryArg, QueryBuilder, ScoreField, SearchOptions, SortOrder};
pub use filter::{escape_tag, translate_filter, Filter, FilterClause, FilterValue, MATCH_ALL};
pub use results::{RawRow, ResultProcessor, SearchHit, DOCUMENT_ROOT_FIELD};
