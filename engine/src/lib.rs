//! Query composition for faceted search.
//!
//! A [`QueryContext`] holds the free-text query, the returned fields, the facet
//! filters and their selections, and the results fetched so far. The
//! [`QueryCompiler`] turns that state into one JSON request in which every facet is
//! counted under all selections except its own.

pub mod compiler;
pub mod config;
pub mod context;
pub mod error;
pub mod field_spec;
pub mod filter_spec;
pub mod ordered;
pub mod query_term;
pub mod toggle;

pub use common::{
    facet::{Facet, FacetKey, FilterValue, RangeBounds, Scalar},
    search_query::{PageRequest, SearchRequest},
    search_response::SearchResponse,
    search_result::{Choice, SearchResult},
};
pub use compiler::{CompilerOptions, QueryCompiler};
pub use config::{EngineConfig, FieldDefinition, FilterDefinition, FilterKindConfig};
pub use context::{
    ChangeScope, FetchMode, ListenerId, OrderBy, QueryContext, QueryEvent, SearchTransport, SelectOptions,
};
pub use error::{QueryError, QueryResult};
pub use field_spec::{FieldSpec, SortDirection};
pub use filter_spec::{
    FacetCounts, FacetLabel, FilterKind, FilterSpec, MultiOperator, NumericFilter, RangeBucket, RangeFilter, TermFilter, TermOrder,
};
pub use query_term::QueryTerm;
pub use toggle::Toggle;
